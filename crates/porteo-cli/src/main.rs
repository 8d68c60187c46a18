//! # porteo — Operator CLI
//!
//! Runs the pipeline's pure stages against the bundled catalog snapshot:
//! validate a draft from JSON, or validate and emit the canonical artifact.
//! No network, no ledger, no certification; those belong to the service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use porteo_artifact::{ArtifactStore, Generator};
use porteo_catalog::SnapshotCatalog;
use porteo_core::DocumentDraft;
use porteo_validation::{Severity, ValidationEngine, ValidationResult};

#[derive(Parser)]
#[command(name = "porteo", about = "Carta Porte draft validation and canonical generation")]
struct Cli {
    /// Emit machine-readable JSON instead of the human report.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a draft and report findings.
    Validate {
        /// Path to the draft JSON file.
        #[arg(long)]
        draft: PathBuf,
    },
    /// Validate a draft and write its canonical artifact.
    Generate {
        /// Path to the draft JSON file.
        #[arg(long)]
        draft: PathBuf,
        /// Where to write the canonical bytes.
        #[arg(long)]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Validate { draft } => {
            let validation = validate_file(&draft).await?;
            report(&validation, cli.json)?;
            if !validation.is_certifiable() {
                std::process::exit(1);
            }
        }
        Command::Generate { draft, out } => {
            let parsed = load_draft(&draft)?;
            let validation = validate_draft(&parsed).await?;
            report(&validation, cli.json)?;
            if !validation.is_certifiable() {
                anyhow::bail!("draft is not certifiable, artifact not generated");
            }

            let generator = Generator::new(Arc::new(ArtifactStore::new()));
            let artifact = generator
                .generate(&parsed, &validation)
                .context("canonical generation failed")?;
            std::fs::write(&out, artifact.bytes.as_bytes())
                .with_context(|| format!("writing {}", out.display()))?;
            eprintln!(
                "canonical artifact written to {} ({})",
                out.display(),
                artifact.content_digest
            );
        }
    }
    Ok(())
}

fn load_draft(path: &PathBuf) -> anyhow::Result<DocumentDraft> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing draft {}", path.display()))
}

async fn validate_file(path: &PathBuf) -> anyhow::Result<ValidationResult> {
    let draft = load_draft(path)?;
    validate_draft(&draft).await
}

async fn validate_draft(draft: &DocumentDraft) -> anyhow::Result<ValidationResult> {
    let engine = ValidationEngine::new(Arc::new(SnapshotCatalog::with_builtin_data()));
    engine.validate(draft).await.context("validation failed to run")
}

fn report(validation: &ValidationResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(validation)?);
        return Ok(());
    }

    for finding in &validation.findings {
        let label = match finding.severity {
            Severity::Blocking => "BLOCKING",
            Severity::Warning => "WARNING ",
            Severity::Advisory => "ADVISORY",
        };
        println!(
            "{label} [{code}] {field}: {message}",
            code = finding.code,
            field = finding.field,
            message = finding.message
        );
    }
    println!(
        "score {score}/100, {n} finding(s), certifiable: {ok}",
        score = validation.score,
        n = validation.findings.len(),
        ok = if validation.is_certifiable() { "yes" } else { "no" }
    );
    Ok(())
}
