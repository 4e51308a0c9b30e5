use std::io;
use std::process::ExitCode;

use clap::Parser;

use fleet_cli::{ClientConfig, errors, run};

fn main() -> ExitCode {
    let config = ClientConfig::parse();
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();

    match run(&config, &mut input, &mut output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if errors::is_daemon_not_running(&error) {
                eprintln!(
                    "fleet: no daemon appears to be listening at {}",
                    config.endpoint()
                );
            } else {
                eprintln!("fleet: {error}");
            }
            ExitCode::FAILURE
        }
    }
}
