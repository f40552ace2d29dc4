//! Parser benchmarks.
//!
//! Run with `cargo bench --package p4c-ast`.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use p4c_ast::parse;
use p4c_util::Handler;

fn parse_source(source: &str) -> p4c_ast::Ast {
    let mut handler = Handler::new();
    parse(source, &mut handler)
}

fn bench_parser_header(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_header");

    let source = "header Ethernet { bit<48> dst; bit<48> src; bit<16> etherType; }";
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("header_decl", |b| b.iter(|| parse_source(black_box(source))));

    group.finish();
}

fn bench_parser_types(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_types");

    let source = r#"
        typedef bit<32> Word;
        typedef tuple<bit<8>, bit<8>> Pair;
        enum bit<8> Color { Red = 1, Green = 2, Blue = 4 }
        error { NoError, PacketTooShort, InvalidChecksum }
        match_kind { exact, ternary, lpm }
        struct Headers {
            Ethernet ethernet;
            Ipv4 ipv4;
        }
    "#;
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("type_declarations", |b| b.iter(|| parse_source(black_box(source))));

    group.finish();
}

fn bench_parser_parser_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_parser_block");

    let source = r#"
        parser MyParser(packet_in pkt, out Headers hdr) {
            state start {
                pkt.extract(hdr.ethernet);
                transition select(hdr.ethernet.etherType) {
                    16w0x0800: parseIpv4;
                    default: accept;
                }
            }
            state parseIpv4 {
                pkt.extract(hdr.ipv4);
                transition accept;
            }
        }
    "#;
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("parser_decl", |b| b.iter(|| parse_source(black_box(source))));

    group.finish();
}

fn bench_parser_control_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_control_block");

    let source = r#"
        control MyIngress(inout Headers hdr) {
            action drop() {
                mark_to_drop();
            }
            action forward(bit<9> port) {
                standard_metadata.egress_spec = port;
            }
            table routing {
                key = { hdr.ipv4.dstAddr: lpm; }
                actions = { forward; drop; NoAction; }
            }
            apply {
                if (hdr.ipv4.isValid()) {
                    routing.apply();
                } else {
                    drop();
                }
            }
        }
    "#;
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("control_decl", |b| b.iter(|| parse_source(black_box(source))));

    group.finish();
}

fn bench_parser_full_program(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser_full_program");

    let source = r#"
        header Ethernet { bit<48> dst; bit<48> src; bit<16> etherType; }
        struct Headers { Ethernet ethernet; }

        parser MyParser(packet_in pkt, out Headers hdr) {
            state start {
                pkt.extract(hdr.ethernet);
                transition accept;
            }
        }

        extern Checksum {
            Checksum();
            void update(in bit<16> data);
            bit<16> get();
        }

        control MyIngress(inout Headers hdr) {
            action drop() {
                mark_to_drop();
            }
            table t {
                key = { hdr.ethernet.dst: exact; }
                actions = { drop; }
            }
            apply {
                t.apply();
            }
        }

        package Switch(MyParser p, MyIngress c);
        Switch(MyParser(), MyIngress()) main;
    "#;
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("full_program", |b| b.iter(|| parse_source(black_box(source))));

    group.finish();
}

criterion_group!(
    benches,
    bench_parser_header,
    bench_parser_types,
    bench_parser_parser_block,
    bench_parser_control_block,
    bench_parser_full_program
);
criterion_main!(benches);
