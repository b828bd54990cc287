//! Interactive prompt on the terminal
//!
//! Prompts go to stderr so that `--json` output on stdout stays clean.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use launchgate_core::launch::{PromptCollaborator, PromptRequest, UserDecision};
use launchgate_core::signing::TrustVerdict;
use std::io::{self, BufRead, Write};

pub struct ConsolePrompt;

impl ConsolePrompt {
    fn render(request: &PromptRequest) -> String {
        let mut out = String::new();

        match request.verdict {
            TrustVerdict::NoFullySigningCertificate => {
                out.push_str("⚠️  The application is not signed by a single certificate.\n");
                out.push_str(
                    "   Parts of it may have been modified or come from another publisher.\n",
                );
            }
            TrustVerdict::FullySignedButUntrusted => {
                out.push_str("⚠️  The application is signed, but the publisher is not trusted.\n");
            }
            TrustVerdict::FullyTrustedSigned => {}
        }

        out.push_str("\nArchives:\n");
        for archive in &request.archives {
            out.push_str(&format!("  - {archive}\n"));
        }

        if !request.fully_signing_paths.is_empty() {
            out.push_str("\nSigned by:\n");
            for path in &request.fully_signing_paths {
                out.push_str(&format!("  {path}\n"));
                if let Some(info) = request.info_by_path.get(path) {
                    if info.is_root_in_trust_store {
                        out.push_str("    root authority is trusted\n");
                    }
                    for issue in &info.issues {
                        out.push_str(&format!("    ❌ {issue}\n"));
                    }
                    for warning in &info.warnings {
                        out.push_str(&format!("    ⚠️  {warning:?}\n"));
                    }
                }
            }
        }

        out.push_str("\nRun with full access to your computer? [y/N] ");
        out
    }
}

#[async_trait]
impl PromptCollaborator for ConsolePrompt {
    async fn decide(&self, request: &PromptRequest) -> Result<UserDecision> {
        let text = Self::render(request);

        let answer = tokio::task::spawn_blocking(move || -> Result<String> {
            let mut stderr = io::stderr();
            stderr.write_all(text.as_bytes())?;
            stderr.flush()?;

            let mut line = String::new();
            let read = io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read answer from stdin")?;
            if read == 0 {
                return Err(anyhow!("stdin closed before an answer was given"));
            }
            Ok(line)
        })
        .await??;

        Ok(parse_answer(&answer))
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

/// Only an explicit yes accepts
fn parse_answer(answer: &str) -> UserDecision {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => UserDecision::Accept,
        _ => UserDecision::Reject,
    }
}
