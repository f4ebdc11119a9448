//! Entry point for the `courier` command-line interface.
#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

#[expect(clippy::print_stderr, reason = "the binary reports fatal errors on stderr")]
fn main() {
    init_logging();
    if let Err(err) = courier_cli::run() {
        eprintln!("courier: {err}");
        std::process::exit(1);
    }
}

/// Send library `log` records to stderr, filtered by `RUST_LOG` (default `info`).
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
