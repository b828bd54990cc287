//! launchgate - trust decisions for network-launched applications
//!
//! Thin front end over `launchgate_core`: compare descriptors, run a launch
//! attempt against a signature catalog, and print archive digests.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use launchgate_core::descriptor::{Node, SignedDescriptor, TemplateMatcher};
use launchgate_core::launch::{
    FixedPrompt, LaunchDecision, LaunchOutcome, LaunchRequest, PromptCollaborator, TrustValidator,
    UserDecision,
};
use launchgate_core::signing::{digest_archive, ArchiveRef, CatalogExtractor};
use launchgate_core::LaunchPolicy;

mod console_prompt;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Non-interactive answer to the trust prompt
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Assume {
    Accept,
    Reject,
}

impl From<Assume> for UserDecision {
    fn from(assume: Assume) -> Self {
        match assume {
            Assume::Accept => UserDecision::Accept,
            Assume::Reject => UserDecision::Reject,
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "launchgate",
    about = "Decide whether a network-launched application may leave the sandbox",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Set log level
    #[clap(long, default_value = "warn", global = true)]
    log_level: LogLevel,
}

#[derive(Parser, Debug)]
enum Command {
    /// Compare a launching descriptor with a signed descriptor or template
    Match {
        /// Signed descriptor or template (JSON or YAML tree)
        template: PathBuf,

        /// Launching descriptor (JSON or YAML tree)
        candidate: PathBuf,

        /// Treat `*` values in the template as wildcards
        #[clap(long = "template")]
        template_mode: bool,
    },

    /// Run a launch attempt and report the trust decision
    Evaluate {
        /// Archives taking part in the launch
        #[clap(required = true)]
        archives: Vec<PathBuf>,

        /// Signature catalog produced by the signing subsystem
        #[clap(long)]
        catalog: PathBuf,

        /// Launch policy file (default: .launchgate/policy.yml, then user config)
        #[clap(long)]
        policy: Option<PathBuf>,

        /// Force sandbox-only execution
        #[clap(long)]
        sandbox: bool,

        /// Launching descriptor claiming conformance to a signed one
        #[clap(long, requires = "signed")]
        descriptor: Option<PathBuf>,

        /// Signed copy of the application descriptor carried by the main archive
        #[clap(long, group = "signed", requires = "descriptor")]
        signed_application: Option<PathBuf>,

        /// Signed descriptor template carried by the main archive
        #[clap(long, group = "signed", requires = "descriptor")]
        signed_template: Option<PathBuf>,

        /// Answer the trust prompt without asking
        #[clap(long, value_enum)]
        assume: Option<Assume>,

        /// Output the decision as JSON
        #[clap(long)]
        json: bool,
    },

    /// Print the catalog digest of each archive
    Digest {
        #[clap(required = true)]
        archives: Vec<PathBuf>,
    },
}

/// Initialize tracing from the --log-level flag; RUST_LOG directives are added on top
fn initialize_tracing(log_level: &LogLevel) {
    let mut filter = EnvFilter::new(log_level.to_filter_directive());
    if let Ok(env) = std::env::var("RUST_LOG") {
        for directive in env.split(',') {
            if let Ok(parsed) = directive.parse() {
                filter = filter.add_directive(parsed);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    initialize_tracing(&cli.log_level);

    match cli.command {
        Command::Match {
            template,
            candidate,
            template_mode,
        } => match_command(template, candidate, template_mode),
        Command::Evaluate {
            archives,
            catalog,
            policy,
            sandbox,
            descriptor,
            signed_application,
            signed_template,
            assume,
            json,
        } => {
            let claim = match (descriptor, signed_application, signed_template) {
                (Some(descriptor), Some(signed), None) => Some((descriptor, signed, false)),
                (Some(descriptor), None, Some(signed)) => Some((descriptor, signed, true)),
                _ => None,
            };
            evaluate_command(archives, catalog, policy, sandbox, claim, assume, json).await
        }
        Command::Digest { archives } => digest_command(archives).await,
    }
}

fn match_command(
    template: PathBuf,
    candidate: PathBuf,
    template_mode: bool,
) -> Result<ExitCode> {
    let template = Node::load(&template)
        .with_context(|| format!("Failed to load template {}", template.display()))?;
    let candidate = Node::load(&candidate)
        .with_context(|| format!("Failed to load candidate {}", candidate.display()))?;

    let matcher = TemplateMatcher::new(template, candidate, template_mode);
    if matcher.is_match() {
        println!("✅ Descriptors match");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("❌ Descriptors do not match");
        println!("   Template:  {}", matcher.template());
        println!("   Launching: {}", matcher.launching());
        Ok(ExitCode::FAILURE)
    }
}

async fn evaluate_command(
    archives: Vec<PathBuf>,
    catalog: PathBuf,
    policy: Option<PathBuf>,
    sandbox: bool,
    claim: Option<(PathBuf, PathBuf, bool)>,
    assume: Option<Assume>,
    json: bool,
) -> Result<ExitCode> {
    let working_dir = std::env::current_dir().context("Failed to resolve working directory")?;
    let policy = LaunchPolicy::discover(&working_dir, policy)?;
    let extractor = CatalogExtractor::load(&catalog)?;

    let prompt: Arc<dyn PromptCollaborator> = match assume {
        Some(answer) => Arc::new(FixedPrompt(answer.into())),
        None => Arc::new(console_prompt::ConsolePrompt),
    };

    let mut request = LaunchRequest::new(archives.into_iter().map(ArchiveRef::new).collect());
    if let Some((descriptor, signed, is_template)) = claim {
        let launching = Node::load(&descriptor)?;
        let signed = Node::load(&signed)?;
        let signed = if is_template {
            SignedDescriptor::Template(signed)
        } else {
            SignedDescriptor::Application(signed)
        };
        request = request.with_descriptor(signed, launching);
    }

    let validator = TrustValidator::from_policy(&policy, Arc::new(extractor), prompt)
        .run_in_sandbox(policy.run_in_sandbox || sandbox);
    debug!("Starting launch attempt {}", validator.attempt_id());

    let decision = validator.validate(request).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        print_decision(&decision);
    }

    Ok(match decision.outcome {
        LaunchOutcome::Denied(_) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

fn print_decision(decision: &LaunchDecision) {
    match &decision.outcome {
        LaunchOutcome::Approved => {
            println!("✅ Approved - the application may run with full access")
        }
        LaunchOutcome::Sandboxed => println!("📦 Sandboxed - the application runs restricted"),
        LaunchOutcome::Denied(reason) => {
            println!("❌ Denied - {}", reason.describe());
        }
    }

    if let Some(verdict) = decision.verdict {
        println!("   Verdict: {verdict:?}");
    }
    for assessment in &decision.certificates {
        println!("   Signer:  {}", assessment.path);
        for issue in &assessment.info.issues {
            println!("            ❌ {issue}");
        }
    }
    println!("   Attempt: {}", decision.attempt_id);
}

async fn digest_command(archives: Vec<PathBuf>) -> Result<ExitCode> {
    for location in archives {
        let archive = ArchiveRef::new(location);
        let digest = digest_archive(&archive).await?;
        println!("{digest}  {archive}");
    }
    Ok(ExitCode::SUCCESS)
}
