fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .init();

    let code = p4c_drv::run(std::env::args().skip(1));
    std::process::exit(code);
}
