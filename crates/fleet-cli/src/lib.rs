//! Interactive client for the fleet daemon.
//!
//! The client keeps one socket open for the whole session and strictly
//! alternates request and response on it. Commands are typed one per line;
//! when the daemon answers that it needs the record body, the client prompts
//! for each field and re-sends the same command with the fields attached.
//! `exit` ends the session locally and is never sent to the daemon.

pub mod cli;
pub mod errors;
pub mod input;
pub mod session;

use std::io::{BufRead, Write};

use fleet_protocol::{Request, Response, ResponseKind};

pub use cli::ClientConfig;
pub use errors::AppError;
use session::Session;

/// Runs the interactive loop over the given console streams.
///
/// # Errors
///
/// Returns connection, transport, and console IO failures; a failed command
/// is rendered, not returned, and the loop continues.
pub fn run(
    config: &ClientConfig,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<(), AppError> {
    let mut session = Session::connect(&config.host, config.port)?;

    if let Some((command, arguments)) = config.one_shot() {
        let response = execute(&mut session, Request::new(command, arguments), input, output)?;
        return render(&response, output);
    }

    writeln!(output, "Connected to {}", config.endpoint()).map_err(AppError::WriteOutput)?;
    loop {
        write!(output, "> ").map_err(AppError::WriteOutput)?;
        output.flush().map_err(AppError::WriteOutput)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(AppError::ReadInput)? == 0 {
            break;
        }
        let Some((command, arguments)) = input::tokenize(&line) else {
            continue;
        };
        if command == "exit" {
            break;
        }

        let response = execute(&mut session, Request::new(command, arguments), input, output)?;
        render(&response, output)?;
    }
    Ok(())
}

/// One full interaction: the initial exchange plus, when the daemon asks for
/// it, the body collection and continuation exchange.
fn execute(
    session: &mut Session,
    request: Request,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> Result<Response, AppError> {
    let response = session.exchange(&request)?;
    if response.kind == ResponseKind::NeedsMoreData {
        let fields = input::collect_body(input, output)?;
        return session.exchange(&request.into_continuation(fields));
    }
    Ok(response)
}

fn render(response: &Response, output: &mut impl Write) -> Result<(), AppError> {
    for line in &response.output {
        writeln!(output, "{line}").map_err(AppError::WriteOutput)?;
    }
    for line in &response.errors {
        writeln!(output, "error: {line}").map_err(AppError::WriteOutput)?;
    }
    Ok(())
}
