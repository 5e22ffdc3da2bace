use std::env;
use std::io;
use std::process::ExitCode;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use regenum_rs::{parse, ParsedPath};

const EXIT_USAGE: u8 = 4;
const EXIT_PARSE: u8 = 8;

fn usage(program: &str) {
    eprintln!(r"usage: {program} [\\Machine\]{{HKLM | HKCU | HKCR | HKU | HKCC}}[\Subkey]");
}

/// `RUST_LOG` when set, otherwise `warn`: per-entry diagnostics such as
/// the timestamp-conversion warning must reach stderr without any
/// environment setup.
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(io::stderr)
        .init();

    let mut args = env::args_os();
    let program = args
        .next()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "regenum-rs".into());
    let full_key = match (args.next(), args.next()) {
        (Some(arg), None) => arg.to_string_lossy().into_owned(),
        _ => {
            usage(&program);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let parsed = match parse(&full_key) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("could not parse {full_key:?}: {e}");
            return ExitCode::from(EXIT_PARSE);
        }
    };
    debug!(machine = ?parsed.machine, root = %parsed.root, subkey = ?parsed.subkey,
           "parsed registry path");

    enumerate(&parsed)
}

#[cfg(windows)]
fn enumerate(parsed: &ParsedPath) -> ExitCode {
    let api = regenum_rs::native::WindowsRegistry;
    let mut sink = regenum_rs::TabSeparated::new(io::stdout().lock());
    match regenum_rs::run(&api, parsed, &mut sink) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

#[cfg(not(windows))]
fn enumerate(_parsed: &ParsedPath) -> ExitCode {
    eprintln!("registry access requires Windows; only path parsing is available on this platform");
    ExitCode::from(2)
}
