//! p4c-drv — command-line driver for the P4 front end pipeline.
//!
//! Wires `p4c_ast::parse` and `p4c_sem::analyze` together behind one entry
//! point: a source file in, a process exit code out. The pipeline runs
//! lexing, parsing, scope/name binding, declared types, and the
//! potential/select type passes in that fixed order and stops there — there
//! is no lowering or code generation stage to hand off to.
//!
//! Every error from either stage is fatal: the first stage that reports one
//! prints its diagnostics and the driver exits without attempting the next
//! stage.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use p4c_util::{Diagnostic, Handler, Level};

/// The one positional argument the core pipeline consumes, plus whatever
/// leading `--name[=value]` tokens preceded it.
///
/// The core does not interpret any flag itself; they are recorded only as a
/// forward-compatibility hook for a caller that wants to inspect them.
#[derive(Debug)]
pub struct Cli {
    pub input: PathBuf,
    pub ignored_flags: Vec<String>,
}

#[derive(Debug)]
pub struct MissingInput;

impl fmt::Display for MissingInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error: no input file given")
    }
}

impl std::error::Error for MissingInput {}

impl Cli {
    /// Scans leading `--name` / `--name=value` tokens into `ignored_flags`
    /// and takes the first remaining token as the input path. Anything after
    /// the input path is ignored outright — the core grammar has nothing
    /// else to say about it.
    pub fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, MissingInput> {
        let mut ignored_flags = Vec::new();
        let mut input = None;
        for arg in args {
            if input.is_some() {
                break;
            }
            if arg.starts_with("--") {
                ignored_flags.push(arg);
                continue;
            }
            input = Some(PathBuf::from(arg));
        }
        input
            .map(|input| Cli { input, ignored_flags })
            .ok_or(MissingInput)
    }
}

/// Marker error: diagnostics for this failure were already written to
/// stderr by `report`, so `run` must not print anything further for it.
#[derive(Debug)]
struct DiagnosticsReported;

impl fmt::Display for DiagnosticsReported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "diagnostics already reported")
    }
}

impl std::error::Error for DiagnosticsReported {}

/// Runs the full driver over a process-style argument list and returns the
/// exit code the caller should use.
pub fn run(args: impl IntoIterator<Item = String>) -> i32 {
    let cli = match Cli::parse(args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            return 1;
        }
    };

    match compile(&cli.input) {
        Ok(()) => 0,
        Err(e) => {
            if e.downcast_ref::<DiagnosticsReported>().is_none() {
                eprintln!("error: {e}");
            }
            1
        }
    }
}

#[tracing::instrument(skip_all, fields(file = %path.display()))]
fn compile(path: &Path) -> Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    let file_name = path.display().to_string();

    let mut parse_handler = Handler::new();
    let ast = p4c_ast::parse(&source, &mut parse_handler);
    if parse_handler.has_errors() {
        report(&file_name, &parse_handler);
        return Err(DiagnosticsReported.into());
    }

    let sema_handler = Handler::new();
    let (_scope, _types, _tables, _potential) = p4c_sem::analyze(&ast, &sema_handler);
    if sema_handler.has_errors() {
        report(&file_name, &sema_handler);
        return Err(DiagnosticsReported.into());
    }

    tracing::info!("analysis complete, no diagnostics");
    Ok(())
}

/// Prints every accumulated diagnostic in the `<file>:<line>:<column>:
/// <level>: <message>` form for located diagnostics, or a single-line
/// sentence for diagnostics with no real source position.
fn report(file_name: &str, handler: &Handler) {
    for diag in handler.diagnostics() {
        eprintln!("{}", format_diagnostic(file_name, &diag));
    }
}

fn format_diagnostic(file_name: &str, diag: &Diagnostic) -> String {
    if diag.span.line == 0 {
        format!("{}: {}", diag.level, diag.message)
    } else {
        format!(
            "{}:{}:{}: {}: {}",
            file_name, diag.span.line, diag.span.column, diag.level, diag.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_takes_first_non_flag_as_input() {
        let cli = Cli::parse(["--emit=none".to_string(), "prog.p4".to_string()]).unwrap();
        assert_eq!(cli.input, PathBuf::from("prog.p4"));
        assert_eq!(cli.ignored_flags, vec!["--emit=none".to_string()]);
    }

    #[test]
    fn cli_parse_with_no_flags() {
        let cli = Cli::parse(["prog.p4".to_string()]).unwrap();
        assert_eq!(cli.input, PathBuf::from("prog.p4"));
        assert!(cli.ignored_flags.is_empty());
    }

    #[test]
    fn cli_parse_rejects_empty_args() {
        assert!(Cli::parse(std::iter::empty::<String>()).is_err());
    }

    #[test]
    fn cli_parse_rejects_flags_only() {
        assert!(Cli::parse(["--verbose".to_string()]).is_err());
    }

    #[test]
    fn run_reports_missing_file() {
        let code = run(["/no/such/file/anywhere.p4".to_string()]);
        assert_eq!(code, 1);
    }

    #[test]
    fn run_succeeds_on_well_typed_program() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.p4");
        std::fs::write(&path, "header H { bit<8> f; }").unwrap();
        let code = run([path.to_string_lossy().into_owned()]);
        assert_eq!(code, 0);
    }

    #[test]
    fn run_reports_unresolved_type_and_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.p4");
        std::fs::write(&path, "struct S { DoesNotExist f; }").unwrap();
        let code = run([path.to_string_lossy().into_owned()]);
        assert_eq!(code, 1);
    }
}
