use rusty_crm::prelude::run_app;
use std::process::exit;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run_app() {
        eprintln!("{e}");
        // Conflicts can be retried after a refresh, I/O failures as they are
        let code = if e.is_version_conflict() {
            2
        } else if e.is_io_failure() {
            3
        } else {
            1
        };
        exit(code);
    }
}
