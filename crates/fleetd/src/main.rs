use std::error::Error;
use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::mpsc;

use clap::Parser;
use tracing::{error, info, warn};

use fleet_protocol::Request;
use fleetd::reactor::Reactor;
use fleetd::{CommandContext, ServerConfig, persistence, telemetry};

const MAIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::main");

fn main() -> ExitCode {
    let config = ServerConfig::parse();
    if let Err(report) = telemetry::initialise(&config.log_filter) {
        eprintln!("fleetd: {report}");
        return ExitCode::FAILURE;
    }
    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            error!(target: MAIN_TARGET, error = %report, "daemon failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &ServerConfig) -> Result<(), Box<dyn Error>> {
    let registry = persistence::load_snapshot(&config.snapshot)?;
    let context = CommandContext::new(registry, config.snapshot.clone());

    let (console, receiver) = mpsc::channel();
    let reactor = Reactor::bind(&config.bind_address(), context, receiver)?;
    info!(
        target: MAIN_TARGET,
        address = %reactor.local_addr(),
        snapshot = %config.snapshot.display(),
        "fleetd started"
    );
    let handle = reactor.start();

    // Operator console on the main thread: `save` snapshots the collection
    // through the reactor's dispatch path, `exit` stops the daemon. When
    // stdin closes without an `exit` the daemon keeps serving.
    let mut exit_requested = false;
    for line in io::stdin().lock().lines() {
        match line?.trim() {
            "" => {}
            "save" => console.send(Request::new("save", Vec::new()))?,
            "exit" => {
                exit_requested = true;
                break;
            }
            other => {
                warn!(target: MAIN_TARGET, "unknown console command '{other}'");
            }
        }
    }

    if exit_requested {
        handle.shutdown();
    }
    handle.join()?;
    Ok(())
}
