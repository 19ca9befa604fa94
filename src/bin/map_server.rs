//! JSON-RPC map host over stdio
//!
//! Responses and event notifications go to stdout, logs to stderr.

use std::io;

use travel_map::server::{serve, ServerState};

fn main() -> anyhow::Result<()> {
    let env = env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "travel_map=info");
    env_logger::Builder::from_env(env).init();

    log::info!("Starting travel map server...");
    let mut state = ServerState::new();
    serve(&mut state, io::stdin().lock(), &mut io::stdout())?;
    log::info!("Shutting down...");
    Ok(())
}
