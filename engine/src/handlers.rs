//! Command handlers for CLI operations
//!
//! - run: explore the corpus for a change request and write the report
//! - index: regenerate and print the corpus index

use anyhow::{Context, Result};
use sdk::errors::{EngineError, RegentErrorExt};
use serde_json::json;
use std::sync::Arc;

use crate::conductor::Explorer;
use crate::config::Config;
use crate::corpus::{CorpusIndex, DATA_DIR_NAME};
use crate::fetcher::FetcherRegistry;
use crate::llm::router::LLMRouter;
use crate::llm::{LLMProvider, ModelSelector};
use crate::report::{
    LLMTranslator, Reflector, Report, ReportCompiler, ReportRenderer, ReportWriter, Translator,
};
use crate::secrets::SecretManager;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Arguments of the `run` command
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub query: String,
    pub model: Option<String>,
    pub experiment: String,
    pub skip_index_regeneration: bool,
}

/// Run one exploration and write its report.
///
/// Fails when the corpus index cannot be obtained, no backend can be
/// configured, the plan is empty, or the report cannot be written.
pub async fn handle_run(request: RunRequest, config: &Config, format: OutputFormat) -> Result<()> {
    let selector = request
        .model
        .as_deref()
        .map(str::parse::<ModelSelector>)
        .transpose()
        .map_err(|e| anyhow::anyhow!("Invalid --model selector: {}", e))?;

    let base_dir = config.exploration.experiment_dir(&request.experiment);
    let corpus = Arc::new(
        CorpusIndex::retrieve(
            &base_dir,
            &config.exploration.index_file_name,
            !request.skip_index_regeneration,
        )
        .with_context(|| format!("Failed to obtain corpus index for {}", base_dir.display()))?,
    );
    tracing::info!("Corpus index holds {} documents", corpus.len());

    let source = Arc::new(FetcherRegistry::with_defaults(
        base_dir.join(DATA_DIR_NAME),
        config.exploration.max_document_chars,
    ));

    let secrets = SecretManager::new("regent");
    let router = LLMRouter::from_config(&config.llm, &secrets, selector.as_ref())
        .context("Failed to configure LLM providers")?;
    for (provider, healthy) in router.check_health().await {
        if !healthy {
            tracing::warn!("Provider {} is not reachable, it will likely be skipped", provider);
        }
    }
    let llm: Arc<dyn LLMProvider> = Arc::new(router);

    if let OutputFormat::Text = format {
        println!("Exploring {} for: {}", request.experiment, request.query);
        println!();
    }

    let explorer = Explorer::new(
        llm.clone(),
        source,
        corpus.clone(),
        config.exploration.time_budget(),
    );
    let outcome = match explorer.explore(&request.query).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if let OutputFormat::Json = format {
                let output = json!({
                    "status": "failed",
                    "error": e.to_string()
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            return Err(e).context("Exploration failed");
        }
    };

    let draft = ReportCompiler::compile(&outcome);
    let translator: Option<Arc<dyn Translator>> = if config.report.translate {
        Some(Arc::new(LLMTranslator::new(llm.clone())))
    } else {
        None
    };
    let variants = ReportRenderer::new(config.report.languages.clone(), translator)
        .render(&draft)
        .await;
    let mut report = Report { draft, variants };
    if config.report.reflection {
        report = Reflector::new(llm).with_corpus(corpus).reflect(report).await;
    }

    let writer = ReportWriter::new(config.exploration.results_dir_for(&request.experiment));
    let written = writer.write(&report).context("Failed to write report")?;

    let coverage = &report.draft.coverage;
    match format {
        OutputFormat::Text => {
            println!("✓ Report written");
            for path in &written.variants {
                println!("  {}", path.display());
            }
            println!("  {}", written.structured.display());
            println!();
            println!("  Documents to revise: {}", report.draft.entries.len());
            println!("  Reviewed:            {}", coverage.completed.len());
            println!("  Skipped:             {}", coverage.failed.len());
            if coverage.timed_out {
                println!(
                    "  Not reviewed:        {} (time budget exhausted)",
                    coverage.remaining.len()
                );
            }
            println!("  Duration:            {}ms", coverage.elapsed_ms);
        }
        OutputFormat::Json => {
            let output = json!({
                "status": "completed",
                "run_id": report.draft.run_id,
                "affected": report.draft.affected_documents().collect::<Vec<_>>(),
                "coverage": coverage,
                "report": written,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Hint for the first engine error found in an error chain
pub fn error_hint(err: &anyhow::Error) -> Option<&str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<EngineError>())
        .map(|e| e.user_hint())
}

/// Rescan an experiment's data directory and persist the index
pub async fn handle_index(experiment: &str, config: &Config, format: OutputFormat) -> Result<()> {
    let base_dir = config.exploration.experiment_dir(experiment);
    let corpus = CorpusIndex::retrieve(&base_dir, &config.exploration.index_file_name, true)
        .with_context(|| format!("Failed to index {}", base_dir.display()))?;
    let index_path = base_dir.join(&config.exploration.index_file_name);

    match format {
        OutputFormat::Text => {
            print!("{}", corpus.render_tree());
            println!();
            println!(
                "{} documents indexed to {}",
                corpus.len(),
                index_path.display()
            );
        }
        OutputFormat::Json => {
            let output = json!({
                "index": index_path,
                "documents": corpus.iter().collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
