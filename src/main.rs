use anyhow::{Context, Result};
use clap::Parser;
use recon_archiver::db::{ConnectionRegistry, MySqlConnector};
use recon_archiver::reconcile::PromptConfirmer;
use recon_archiver::{report, task, BackupExporter, Config, Reconciler};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recon-archiver")]
#[command(about = "Reconcile table row counts and archive-then-delete mismatched rows")]
#[command(version)]
struct Args {
    /// Task file: target_host,database_name,table_name,search_condition,expected_row_count
    tasks: PathBuf,

    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Also write the run summary as JSON to this path
    #[arg(long)]
    summary_json: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::from(1);
        }
        Err(e) => {
            // --help / --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("❌ {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load(&args.config).context("Failed to load configuration")?;
    let exporter = BackupExporter::new(config.backup_dir.clone());

    let registry = ConnectionRegistry::open(MySqlConnector::new(config))
        .await
        .context("Failed to connect to the archive mapping database")?;
    println!("✓ Connected to the archive mapping database");

    let tasks = match task::load_tasks(&args.tasks) {
        Ok(tasks) => tasks,
        Err(e) => {
            registry.close().await;
            return Err(e).context(format!("Failed to read task file {}", args.tasks.display()));
        }
    };
    println!("✓ Loaded {} tasks", tasks.len());
    info!("Loaded {} tasks from {}", tasks.len(), args.tasks.display());

    let mut reconciler = Reconciler::new(registry, exporter);
    let mut confirmer = PromptConfirmer::stdio();
    let summary = reconciler.run(&tasks, &mut confirmer).await;
    reconciler.shutdown().await;

    report::print_summary(&summary);

    if let Some(path) = &args.summary_json {
        let json = serde_json::to_string_pretty(&report::summary_json(&summary))?;
        if let Err(e) = std::fs::write(path, json) {
            error!("Failed to write summary to {}: {}", path.display(), e);
        }
    }

    Ok(())
}
