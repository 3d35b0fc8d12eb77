//! tabsight - dataset upload and analysis from the terminal
//!
//! Drives one workflow instance: uploads tabular files to the remote
//! training service, runs the analysis and prints the validated result.
//! Progress is rendered to stderr from the controller's published state.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tabsight_client::models::{OverviewReport, RankingReport};
use tabsight_client::{
    ClientSettings, DirectoryId, FileSelection, ValidatedAnalysis, WorkflowController,
    WorkflowSnapshot, WorkflowState,
};
use tabsight_common::config::TomlConfig;
use tokio::signal;
use tokio::sync::watch;
use tracing::info;

/// Command-line arguments for tabsight
#[derive(Parser, Debug)]
#[command(name = "tabsight")]
#[command(about = "Upload a tabular dataset and fetch the remote model analysis")]
#[command(version)]
struct Args {
    /// Config file (default: $TABSIGHT_CONFIG, then the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base address of the analysis service (overrides TABSIGHT_SERVICE_URL)
    #[arg(long, global = true)]
    service_url: Option<String>,

    /// Print the analysis result as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload files and print the server directory id
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Analyse a previously uploaded directory
    Analyze { directory: String },
    /// Upload files, then analyse them
    Run {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, config_source) =
        TomlConfig::discover(args.config.as_deref()).context("Failed to load configuration")?;
    tabsight_common::logging::init_logging(&config.logging)?;
    config_source.log();

    let settings = ClientSettings::resolve(&config, args.service_url.as_deref())?;
    let controller =
        WorkflowController::from_settings(&settings).context("Failed to initialize workflow")?;

    info!(instance = %controller.instance_id(), "Starting tabsight workflow");

    let renderer = tokio::spawn(render_progress(controller.subscribe()));

    let outcome = tokio::select! {
        outcome = execute(&controller, args.command) => outcome,
        _ = shutdown_signal() => {
            controller.teardown();
            Err(anyhow!("Interrupted"))
        }
    };

    // Dropping the controller closes the channel; the renderer prints the
    // final state, then exits.
    drop(controller);
    let _ = renderer.await;

    match outcome? {
        Output::Directory(directory) => println!("{}", directory),
        Output::Analysis(analysis) if args.json => {
            println!("{}", serde_json::to_string_pretty(&analysis)?);
        }
        Output::Analysis(analysis) => print_analysis(&analysis),
    }

    Ok(())
}

enum Output {
    Directory(DirectoryId),
    Analysis(ValidatedAnalysis),
}

async fn execute(controller: &WorkflowController, command: Command) -> Result<Output> {
    let output = match command {
        Command::Upload { files } => {
            let selection = FileSelection::from_paths(&files).await?;
            controller.select_files(selection)?;
            Output::Directory(controller.confirm_upload().await?)
        }
        Command::Analyze { directory } => {
            let directory =
                DirectoryId::new(directory).ok_or_else(|| anyhow!("Directory id must not be empty"))?;
            Output::Analysis(controller.enter_analysis(directory).await?)
        }
        Command::Run { files } => {
            let selection = FileSelection::from_paths(&files).await?;
            Output::Analysis(controller.run(selection).await?)
        }
    };
    Ok(output)
}

/// Render each published phase change
async fn render_progress(mut state_rx: watch::Receiver<WorkflowSnapshot>) {
    while state_rx.changed().await.is_ok() {
        let line = match &state_rx.borrow_and_update().state {
            WorkflowState::Idle => continue,
            WorkflowState::FilesSelected { files } => {
                format!("Selected {} file(s), {} bytes", files.len(), files.total_bytes())
            }
            WorkflowState::Uploading { files } => format!("Uploading {} file(s)...", files.len()),
            WorkflowState::Uploaded { directory } => format!("Uploaded to directory {}", directory),
            WorkflowState::UploadFailed { error, .. } => format!("Upload failed: {}", error),
            WorkflowState::Analyzing { directory } => format!("Analyzing directory {}...", directory),
            WorkflowState::AnalysisFailed { error, .. } => format!("Analysis failed: {}", error),
            WorkflowState::Complete { .. } => "Analysis complete".to_string(),
        };
        eprintln!("[tabsight] {}", line);
    }
}

fn print_analysis(analysis: &ValidatedAnalysis) {
    match analysis {
        ValidatedAnalysis::Ranking(report) => print_ranking(report),
        ValidatedAnalysis::Overview(report) => print_overview(report),
    }
}

fn percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

fn print_ranking(report: &RankingReport) {
    println!("Task:            {}", report.task_completed);
    println!("Best model:      {}", report.best_model);
    println!("Best AUC:        {}", percent(report.best_auc_score));
    println!(
        "CV AUC:          {} ± {:.2}%",
        percent(report.cv_auc_mean),
        report.cv_auc_std * 100.0
    );
    println!("Stability:       {}", report.model_stability);
    println!();
    println!("Model rankings:");
    for (model, score) in &report.model_rankings {
        println!("  {:<24} {}", model, percent(*score));
    }
    println!();
    println!("Top features:");
    for feature in &report.top_features {
        println!("  • {}", feature);
    }
    println!();
    println!("Recommendation:  {}", report.recommendation);
}

fn print_overview(report: &OverviewReport) {
    let dataset = &report.dataset_analysis;
    println!("Samples:         {}", dataset.samples);
    println!("Features:        {}", dataset.features);
    println!("Feature types:   {}", dataset.feature_types);
    println!("Target balance:  {}", dataset.target_balance);
    println!("Data quality:    {}", dataset.data_quality);

    if let Some(performance) = &report.model_performance {
        println!();
        println!("Best model:      {}", performance.best_model);
        println!("Test AUC:        {}", percent(performance.test_auc));
        println!("Test accuracy:   {}", percent(performance.test_accuracy));
        println!("CV AUC:          {}", performance.cv_auc);
        println!(
            "Features used:   {} ({} removed)",
            performance.features_used, performance.features_removed
        );
    }

    println!();
    println!("Key insights:");
    for insight in &report.key_insights {
        println!("  • {}", insight);
    }
}

/// Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, abandoning workflow"),
        _ = terminate => info!("Received terminate signal, abandoning workflow"),
    }
}
