pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "accountctl")]
#[command(about = "Operator tools for the account functions service")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Inspect bearer tokens")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "Compute recovery credential hashes for seeding")]
    Hash {
        #[command(subcommand)]
        cmd: commands::hash::HashCommands,
    },

    #[command(about = "Check a running service's /health endpoint")]
    Ping {
        #[arg(default_value = "http://127.0.0.1:3000", help = "Service base URL")]
        url: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Token { cmd } => commands::token::handle(cmd, output_format),
        Commands::Hash { cmd } => commands::hash::handle(cmd, output_format),
        Commands::Ping { url } => commands::ping::handle(&url, output_format).await,
    }
}
