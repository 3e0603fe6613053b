use anyhow::bail;
use clap::Subcommand;
use serde_json::json;

use crate::auth::TokenVerifier;
use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Decode a token's claims and show the subject the service would act on")]
    Inspect {
        #[arg(help = "Access token")]
        token: String,
        #[arg(long, env = "SUPABASE_JWT_SECRET", help = "Verify the HS256 signature with this secret")]
        secret: Option<String>,
    },
}

pub fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Inspect { token, secret } => {
            let verifier = TokenVerifier::new(secret.as_deref());

            let claims = match verifier.claims(token.trim()) {
                Ok(claims) => claims,
                Err(e) => {
                    output_error(output_format, &e.to_string(), Some("unauthorized"))?;
                    bail!("token rejected");
                }
            };

            let subject = claims.subject().ok().map(str::to_string);
            let message = match &subject {
                Some(sub) => format!("Token subject: {}", sub),
                None => "Token has no subject claim".to_string(),
            };

            output_success(
                output_format,
                &message,
                Some(json!({
                    "verified": verifier.verifies_signature(),
                    "subject": subject,
                    "claims": claims,
                })),
            )
        }
    }
}
