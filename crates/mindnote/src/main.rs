//! `mindnote` command-line interface.
//!
//! Set `RUST_LOG=debug` to see what the store and the sync coordinator are doing.

/// CLI module - command-line interface for mindnote
mod cli;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    cli::run_cli();
}
