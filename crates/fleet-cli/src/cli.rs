//! Client command-line configuration.

use clap::Parser;

use fleet_protocol::DEFAULT_PORT;

/// Connection settings parsed from the command line.
#[derive(Debug, Clone, Parser)]
#[command(name = "fleet", version, about = "Interactive client for the fleet daemon")]
pub struct ClientConfig {
    /// Daemon host to connect to.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Daemon TCP port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// One command to run instead of the interactive loop, e.g.
    /// `fleet -- remove_key 5`.
    #[arg(trailing_var_arg = true)]
    pub command: Vec<String>,
}

impl ClientConfig {
    /// The one-shot command and its arguments, when one was given.
    #[must_use]
    pub fn one_shot(&self) -> Option<(String, Vec<String>)> {
        let mut tokens = self.command.iter().cloned();
        let command = tokens.next()?;
        Some((command, tokens.collect()))
    }

    /// Endpoint in `host:port` form, for diagnostics.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_local_daemon() {
        let config = ClientConfig::try_parse_from(["fleet"]).expect("parse");
        assert_eq!(config.endpoint(), format!("127.0.0.1:{DEFAULT_PORT}"));
        assert!(config.one_shot().is_none());
    }

    #[test]
    fn trailing_tokens_form_a_one_shot_command() {
        let config =
            ClientConfig::try_parse_from(["fleet", "remove_key", "5"]).expect("parse");
        let (command, arguments) = config.one_shot().expect("one-shot");
        assert_eq!(command, "remove_key");
        assert_eq!(arguments, vec!["5".to_owned()]);
    }

    #[test]
    fn host_and_port_can_be_overridden() {
        let config =
            ClientConfig::try_parse_from(["fleet", "--host", "fleet.internal", "--port", "9000"])
                .expect("parse");
        assert_eq!(config.endpoint(), "fleet.internal:9000");
    }
}
