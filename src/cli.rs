use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "edgecoder",
    about = "Peer-to-peer compute mesh node: BLE relay, gossip overlay, swarm worker, credit ledger",
    version,
    long_about = None,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to the node config file.
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node: gossip HTTP server, BLE mesh manager, routing waterfall.
    Start,

    /// Bootstrap the gossip peer table from one or more seed addresses, then exit.
    Bootstrap {
        /// Seed gossip addresses, e.g. http://203.0.113.5:8787
        #[arg(required = true)]
        seeds: Vec<String>,
    },

    /// Print a snapshot of local identity, peer count, and credit balance.
    Status,

    /// Print the merged configuration and exit.
    ShowConfig,

    /// Generate a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: ShellArg,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

impl From<ShellArg> for Shell {
    fn from(value: ShellArg) -> Self {
        match value {
            ShellArg::Bash => Shell::Bash,
            ShellArg::Zsh => Shell::Zsh,
            ShellArg::Fish => Shell::Fish,
            ShellArg::PowerShell => Shell::PowerShell,
        }
    }
}

pub fn print_completions(shell: ShellArg) {
    let mut cmd = Cli::command();
    generate(Shell::from(shell), &mut cmd, "edgecoder", &mut std::io::stdout());
}
