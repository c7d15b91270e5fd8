//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI arguments for agent-relay
#[derive(Parser, Debug)]
#[command(name = "agent-relay")]
#[command(author, version, about = "Agent conversation engine with tool dispatch and execution traces")]
#[command(long_about = r#"
agent-relay runs LLM agents that call business tools mid-conversation,
streams their progress over Server-Sent Events, and records every tool call
as a span in a per-request execution trace.

Configuration files are loaded from (in priority order):
1. AGENT_RELAY_* env    e.g. AGENT_RELAY_SERVER__BIND=0.0.0.0:8080
2. --config <path>      Explicit config file
3. ./agent-relay.toml   Project-level config
4. ~/.config/agent-relay/config.toml   Global config

Example:
  agent-relay serve
  agent-relay --config prod.toml check-config
  agent-relay trace 3f1c0b6e-8a55-4c8e-9d1e-0c2d6b1f4a7e
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Override `server.bind`
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Validate the merged configuration and show where it came from
    CheckConfig,

    /// Print a stored trace as an indented tree
    Trace {
        /// Trace id returned in the `done` event
        trace_id: String,

        /// Print the raw JSON nodes instead of a tree
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve_with_globals() {
        let cli = Cli::parse_from(["agent-relay", "-vv", "serve", "--bind", "0.0.0.0:9000"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(
            cli.command,
            Command::Serve {
                bind: Some("0.0.0.0:9000".to_string())
            }
        );
    }

    #[test]
    fn test_parse_trace_and_config() {
        let cli = Cli::parse_from(["agent-relay", "trace", "abc", "--json", "--config", "x.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert_eq!(
            cli.command,
            Command::Trace {
                trace_id: "abc".to_string(),
                json: true
            }
        );
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["agent-relay"]).is_err());
    }
}
