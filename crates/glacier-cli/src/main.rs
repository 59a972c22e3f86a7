//! glacier-uploader: upload files to, and retrieve archives from, Glacier vaults.
//!
//! Credentials, vault, region and log type come from `glacier.properties`
//! (working directory, else `~/.glacier-uploader`, else `--properties-dir`).
//! Tunables come from `GLACIER_*` environment variables.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use glacier_cli::{init_tracing, split_uploadable, AppState, Session};
use glacier_core::{regions, JobKind, LogType, PropertyStore, Settings};
use glacier_worker::{
    export_text_log, JobEvent, RetrievalWorkflow, UploadBatch, UploadError, UploadEvent,
    UploadLog, UploadOrchestrator,
};
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

#[derive(Parser)]
#[command(name = "glacier-uploader", about = "Glacier vault upload and retrieval client")]
struct Cli {
    /// Directory holding glacier.properties and the upload logs
    #[arg(long, value_name = "DIR")]
    properties_dir: Option<PathBuf>,

    /// Vault to use for this invocation (not saved)
    #[arg(long)]
    vault: Option<String>,

    /// Region index to use for this invocation (not saved), see `regions`
    #[arg(long, value_name = "INDEX")]
    region: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change the saved configuration
    Config {
        #[command(subcommand)]
        sub: ConfigCommands,
    },
    /// List known regions and their indices
    Regions,
    /// Vault operations
    Vaults {
        #[command(subcommand)]
        sub: VaultCommands,
    },
    /// Upload files, one archive per file
    Upload {
        /// Files to upload, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Do not record uploads in the log
        #[arg(long)]
        no_log: bool,
    },
    /// Request the vault inventory and save it once ready (takes hours)
    Inventory {
        /// Directory to write the inventory to (default: current directory)
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },
    /// Request an archive and save its content once ready (takes hours)
    Retrieve {
        archive_id: String,
        /// File to write the archive to
        #[arg(long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Delete an archive from the vault
    DeleteArchive { archive_id: String },
    /// Export the text upload log with CRLF line endings
    ExportLog { dest: PathBuf },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the current configuration (secret masked)
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update saved values; the file is only written when something changed
    Set {
        #[arg(long)]
        access_key: Option<String>,
        #[arg(long)]
        secret_key: Option<String>,
        #[arg(long)]
        vault: Option<String>,
        /// Region index, see `regions`
        #[arg(long)]
        region: Option<usize>,
        /// 0 text, 1 csv, 2 yaml, 3 json
        #[arg(long)]
        log_type: Option<usize>,
    },
}

#[derive(Subcommand)]
enum VaultCommands {
    /// List all vaults in the region
    List,
    /// Create a vault
    Create { name: String },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let properties = match &cli.properties_dir {
        Some(dir) => PropertyStore::load(PropertyStore::resolve_directory(dir, dir)?),
        None => PropertyStore::open_default().context("Failed to locate the properties directory")?,
    };
    tracing::debug!(path = %properties.file_path().display(), "Loaded properties");

    let mut state =
        AppState::new(properties, Settings::from_env()).with_overrides(cli.vault, cli.region);

    dispatch(&mut state, cli.command).await
}

async fn dispatch(state: &mut AppState, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Config { sub } => match sub {
            ConfigCommands::Show { json } => show_config(state, json),
            ConfigCommands::Set {
                access_key,
                secret_key,
                vault,
                region,
                log_type,
            } => set_config(state, access_key, secret_key, vault, region, log_type),
        },
        Commands::Regions => {
            for region in regions::REGIONS {
                println!("{:>2}: {} ({})", region.index, region.title, region.name);
            }
            Ok(())
        }
        Commands::Vaults { sub } => {
            let session = Session::snapshot(state)?;
            let store = session.client()?;
            match sub {
                VaultCommands::List => {
                    let vaults = store.list_vaults().await.context("Failed to list vaults")?;
                    if vaults.is_empty() {
                        println!("No vaults in {}", session.region.title);
                    }
                    for name in vaults {
                        println!("{}", name);
                    }
                }
                VaultCommands::Create { name } => {
                    let name = name.trim();
                    glacier_core::validation::validate_vault(name)?;
                    let location = store
                        .create_vault(name)
                        .await
                        .with_context(|| format!("Failed to create vault {}", name))?;
                    println!(
                        "Added vault {} successfully.{}",
                        name,
                        location.map(|l| format!(" Location: {}", l)).unwrap_or_default()
                    );
                }
            }
            Ok(())
        }
        Commands::Upload { files, no_log } => upload(Session::snapshot(state)?, files, !no_log).await,
        Commands::Inventory { output_dir } => {
            let output_dir = match output_dir {
                Some(dir) => dir,
                None => std::env::current_dir()?,
            };
            retrieve(
                Session::snapshot(state)?,
                JobKind::InventoryRetrieval,
                output_dir,
                None,
            )
            .await
        }
        Commands::Retrieve { archive_id, output } => {
            let archive_id = archive_id.trim().to_string();
            if archive_id.is_empty() {
                bail!("Enter the Archive ID of the file to be requested.");
            }
            retrieve(
                Session::snapshot(state)?,
                JobKind::ArchiveRetrieval { archive_id },
                std::env::current_dir()?,
                output,
            )
            .await
        }
        Commands::DeleteArchive { archive_id } => {
            let archive_id = archive_id.trim();
            if archive_id.is_empty() {
                bail!("Enter the Archive ID of the file to be deleted.");
            }
            let session = Session::snapshot(state)?;
            let vault = session.require_vault()?;
            session
                .client()?
                .delete_archive(vault, archive_id)
                .await
                .context("Failed to delete archive")?;
            println!("Deleted archive successfully.");
            Ok(())
        }
        Commands::ExportLog { dest } => {
            let count = export_text_log(state.properties().dir(), &dest)?;
            println!("Exported {} records to {}", count, dest.display());
            Ok(())
        }
    }
}

fn show_config(state: &AppState, json: bool) -> anyhow::Result<()> {
    let view = state.view();
    if json {
        return print_json(&view);
    }
    println!("Properties file: {}", view.properties_file.display());
    println!("Access key:      {}", view.access_key);
    println!("Secret key:      {}", view.secret_key);
    println!("Vault:           {}", view.vault);
    println!(
        "Region:          {} {}",
        view.region_index,
        view.region.as_deref().unwrap_or("(unknown)")
    );
    println!("Log type:        {}", view.log_type);
    Ok(())
}

fn set_config(
    state: &mut AppState,
    access_key: Option<String>,
    secret_key: Option<String>,
    vault: Option<String>,
    region: Option<usize>,
    log_type: Option<usize>,
) -> anyhow::Result<()> {
    if let Some(index) = region {
        regions::by_index(index)?;
    }
    if let Some(index) = log_type {
        LogType::from_index(index)?;
    }

    let properties = state.properties_mut();
    let mut changed = false;
    if let Some(value) = access_key {
        changed |= properties.set_access_key(Some(&value));
    }
    if let Some(value) = secret_key {
        changed |= properties.set_secret_key(Some(&value));
    }
    if let Some(value) = vault {
        changed |= properties.set_vault_key(Some(&value));
    }
    if let Some(index) = region {
        changed |= properties.set_location_index(index);
    }
    if let Some(index) = log_type {
        changed |= properties.set_log_type_index(index);
    }

    if changed {
        properties
            .try_save()
            .with_context(|| format!("Failed to save {}", properties.file_path().display()))?;
        println!("Saved {}", properties.file_path().display());
    } else {
        println!("No changes");
    }
    Ok(())
}

/// Await a worker while printing the events it sends.
async fn drive<T, E>(
    mut handle: JoinHandle<T>,
    mut events: UnboundedReceiver<E>,
    mut render: impl FnMut(E),
) -> anyhow::Result<T> {
    loop {
        tokio::select! {
            biased;
            Some(event) = events.recv() => render(event),
            result = &mut handle => {
                while let Ok(event) = events.try_recv() {
                    render(event);
                }
                return result.context("Worker task failed");
            }
        }
    }
}

async fn upload(session: Session, files: Vec<PathBuf>, log: bool) -> anyhow::Result<()> {
    let vault = session.require_vault()?.to_string();

    let (files, directories) = split_uploadable(files);
    for dir in &directories {
        eprintln!("Skipping {}: directories cannot be uploaded", dir.display());
    }
    let batch = UploadBatch::new(files, vault).context("Nothing to upload")?;

    let store = session.client()?;
    let log = if log {
        Some(UploadLog::new(&session.log_dir, session.log_type()?))
    } else {
        None
    };
    let (tx, rx) = mpsc::unbounded_channel();
    let orchestrator =
        UploadOrchestrator::new(store, log, session.settings.upload.clone()).with_events(tx);

    let handle = tokio::spawn(async move { orchestrator.run(batch).await });
    let result = drive(handle, rx, render_upload_event).await?;

    let report = match result {
        Ok(report) => report,
        Err(UploadError::LogWrite(e)) => {
            // Provenance is lost from here on; stop the whole process.
            eprintln!("Fatal: {}", e);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    println!("Upload complete!");
    for line in report.summary() {
        println!("{}", line);
    }
    if !report.uploaded.is_empty() {
        println!("It may take some time for the vault inventory to reflect new archives.");
    }
    Ok(())
}

fn render_upload_event(event: UploadEvent) {
    match event {
        UploadEvent::FileStarted {
            index,
            total_files,
            path,
        } => println!("({}/{}) Uploading: {}", index + 1, total_files, path.display()),
        UploadEvent::Transfer { index, progress } => tracing::debug!(
            index,
            transferred = progress.bytes_transferred,
            total = progress.bytes_total,
            "Transfer progress"
        ),
        UploadEvent::FileCompleted { path, bytes, .. } => {
            println!("Finished {} ({} bytes)", path.display(), bytes)
        }
        UploadEvent::FileFailed { path, error, .. } => {
            eprintln!("Error uploading {}: {}", path.display(), error)
        }
        UploadEvent::BatchProgress { percent } => println!("Batch progress: {}%", percent),
    }
}

async fn retrieve(
    session: Session,
    kind: JobKind,
    output_dir: PathBuf,
    destination: Option<PathBuf>,
) -> anyhow::Result<()> {
    let vault = session.require_vault()?.to_string();
    let store = session.client()?;

    let (tx, rx) = mpsc::unbounded_channel();
    let workflow =
        RetrievalWorkflow::new(store, session.settings.poll.clone(), output_dir).with_events(tx);

    let handle = tokio::spawn(async move { workflow.run(&vault, kind, destination).await });
    let outcome = drive(handle, rx, render_job_event)
        .await?
        .context("Retrieval failed")?;

    println!(
        "Successfully retrieved {} ({} bytes) to {}",
        outcome.job.kind,
        outcome.bytes,
        outcome.path.display()
    );
    Ok(())
}

fn render_job_event(event: JobEvent) {
    match event {
        JobEvent::Submitted {
            job_id,
            estimated_ready_at,
        } => {
            println!("Job {} submitted.", job_id);
            println!(
                "Estimated completion: {}. Keep this process running until then.",
                estimated_ready_at.format("%Y-%m-%d %H:%M:%S")
            );
        }
        JobEvent::StatusChecked { attempt, completed } => {
            if completed {
                println!("Status check {}: job complete", attempt);
            } else {
                println!("Status check {}: not ready yet", attempt);
            }
        }
        JobEvent::StatusCheckFailed { attempt, error } => {
            eprintln!("Status check {} failed: {}", attempt, error)
        }
        JobEvent::Fetching => println!("Downloading job output..."),
        JobEvent::Written { path, bytes } => {
            println!("Wrote {} bytes to {}", bytes, path.display())
        }
    }
}
