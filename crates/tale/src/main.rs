//! Tale Exporter
//!
//! Exports the dialogs and state machines of a project to code.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use tale::export::{ExportOptions, ProjectExporter};
use tale::project::ProjectLoader;
use tale_types::TemplateEngineKind;

/// Template engine override
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Engine {
    Legacy,
    Scripting,
}

impl From<Engine> for TemplateEngineKind {
    fn from(engine: Engine) -> Self {
        match engine {
            Engine::Legacy => TemplateEngineKind::Legacy,
            Engine::Scripting => TemplateEngineKind::Scripting,
        }
    }
}

/// Tale Node Graph Exporter
#[derive(Parser, Debug)]
#[command(name = "tale")]
#[command(about = "Exports dialogs and state machines of a tale project", long_about = None)]
struct Args {
    /// Path to the project directory
    #[arg(short, long, default_value = "./project")]
    project: PathBuf,

    /// Output directory, defaults to <project>/export
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Only export objects whose name matches this glob
    #[arg(long)]
    only: Option<String>,

    /// Render every template with this engine
    #[arg(long, value_enum)]
    engine: Option<Engine>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tale=info,tale_export=info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse command line arguments
    let args = Args::parse();

    info!("Starting tale exporter v{}", env!("CARGO_PKG_VERSION"));

    let project_path = &args.project;
    let mut project = match ProjectLoader::load(project_path).await {
        Ok(project) => project,
        Err(e) => {
            error!("Failed to load project from {}: {}", project_path.display(), e);
            std::process::exit(1);
        }
    };
    info!("Loaded project: {} ({})", project.name(), project.id());

    if let Some(engine) = args.engine {
        project.templates.set_engine(engine.into());
    }

    let options = ExportOptions {
        out_dir: args.out.clone().unwrap_or_else(|| project_path.join("export")),
        only: args.only.clone(),
    };

    // Cancel the export on Ctrl+C
    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling export");
            ctrl_c.cancel();
        }
    });

    let exporter = ProjectExporter::open(&project)?;
    let summary = exporter.export(&project, &options, cancel).await?;

    for err in &summary.errors {
        if err.is_fatal() {
            error!("{}", err);
        } else {
            warn!("{}", err);
        }
    }

    info!(
        files = summary.files.len(),
        language_keys = summary.language_keys,
        errors = summary.errors.len(),
        skipped = summary.skipped,
        "Export finished into {}",
        options.out_dir.display()
    );

    if summary.has_fatal_error() {
        error!("Export finished with fatal errors");
        std::process::exit(2);
    }

    Ok(())
}
