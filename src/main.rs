use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use docsum::pipeline::{ReduceOptions, reduce};
use docsum::summarization::GroqClient;
use docsum::{config, extract, logging};

/// Summarize a document at a first-grade reading level.
#[derive(Debug, Parser)]
#[command(name = "docsum", version, about)]
struct Cli {
    /// Path to the document to summarize.
    filename: PathBuf,
}

fn main() -> anyhow::Result<()> {
    config::init_config();
    logging::init_tracing();
    let cli = Cli::parse();
    let config = config::get_config();

    let text = extract::extract_text(&cli.filename)
        .with_context(|| format!("failed to extract text from {}", cli.filename.display()))?;
    tracing::debug!(chars = text.chars().count(), "Extracted document text");

    let client = GroqClient::from_config(config);
    let options = ReduceOptions::from_config(config);
    let summary = reduce(&text, &client, &options).context("summarization failed")?;

    println!("{summary}");
    Ok(())
}
