use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::services::recovery::{hash_answer, hash_recovery_code};

#[derive(Subcommand)]
pub enum HashCommands {
    #[command(about = "Hash a security answer (trimmed, lowercased)")]
    Answer {
        #[arg(help = "Answer text")]
        text: String,
    },

    #[command(about = "Hash a one-time recovery code (trimmed, uppercased)")]
    Code {
        #[arg(help = "Recovery code")]
        text: String,
    },
}

pub fn handle(cmd: HashCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let (kind, hash) = match cmd {
        HashCommands::Answer { text } => ("answer", hash_answer(&text)),
        HashCommands::Code { text } => ("code", hash_recovery_code(&text)),
    };

    match output_format {
        OutputFormat::Json => output_success(output_format, &format!("{} hash", kind), Some(json!({ "hash": hash }))),
        OutputFormat::Text => {
            println!("{}", hash);
            Ok(())
        }
    }
}
