//! blobsync-cli - Command-line interface for blobsync
//!
//! Exposes the sync engine as subcommands:
//! - Classify a remote URI as bucket, directory, file or absent
//! - Pull objects or trees, skipping local copies that are already current
//! - Push local files or trees, recording their mtimes remotely
//! - Aggregate the modification time of a remote tree
//! - Remove objects and create directory markers

use anyhow::{Context, Result};
use blobsync_cloud::{CloudConfig, CloudStore, SUPPORTED_SCHEMES};
use blobsync_core::{
    aggregate_mtime, classify, clear, create_dir_marker, download_dir, download_file, upload_dir,
    upload_file, Access, Config, EntryKind, ObjectKind, ObjectUri,
};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::process;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// blobsync - Mtime-aware mirroring between local paths and object storage
#[derive(Parser)]
#[command(name = "blobsync")]
#[command(author, version, about = "Mtime-aware mirroring between local paths and object storage", long_about = None)]
struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file to use instead of the user configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Service account key file, overriding the configuration
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether a URI is a bucket, directory, file or absent
    Type {
        /// Remote URI, e.g. gs://bucket/path
        uri: String,
    },

    /// Download a remote object or tree
    Pull {
        /// Remote URI to download
        uri: String,

        /// Local destination
        local: PathBuf,

        /// Download even when the local copy is current
        #[arg(long)]
        force: bool,
    },

    /// Upload a local file or directory tree
    Push {
        /// Local file or directory
        local: PathBuf,

        /// Remote destination URI
        uri: String,
    },

    /// Print the modification time of a remote object or tree
    Mtime {
        /// Remote URI
        uri: String,

        /// Levels below a directory that count (defaults to the configuration)
        #[arg(long)]
        depth: Option<usize>,
    },

    /// Remove a remote object or every object under a directory
    Rm {
        /// Remote URI
        uri: String,
    },

    /// Create a directory marker unless the directory already exists
    Mkdir {
        /// Remote URI
        uri: String,
    },

    /// Show or initialize configuration
    Config {
        /// Show the effective configuration
        #[arg(long, conflicts_with_all = ["path", "init"])]
        show: bool,

        /// Show configuration file path
        #[arg(long, conflicts_with_all = ["show", "init"])]
        path: bool,

        /// Write a default configuration file if none exists
        #[arg(long, conflicts_with_all = ["show", "path"])]
        init: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let result = run();

    match result {
        Ok(_) => process::exit(0),
        Err(e) => {
            error!("Error: {:#}", e);

            // Map errors to exit codes
            let exit_code = map_error_to_exit_code(&e);
            process::exit(exit_code);
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    match cli.command {
        Commands::Type { uri } => {
            let uri = ObjectUri::parse(&uri)?;
            let provider = open_provider(&uri, &config, cli.credentials, Access::Read)?;
            let kind = classify(&provider, &uri)?;

            if cli.json {
                println!("{}", json!({ "uri": uri.to_string(), "kind": kind.to_string() }));
            } else {
                println!("{}", kind);
            }
        }

        Commands::Pull { uri, local, force } => {
            let uri = ObjectUri::parse(&uri)?;
            let provider = open_provider(&uri, &config, cli.credentials, Access::Read)?;
            let force = force || config.localize.force;

            match classify(&provider, &uri)? {
                ObjectKind::File => {
                    let outcome = download_file(&provider, &uri, &local, force)
                        .with_context(|| format!("Failed to download {}", uri))?;
                    info!("{} -> {:?}: {:?}", uri, local, outcome);
                    if cli.json {
                        println!("{}", json!({ "uri": uri.to_string(), "outcome": format!("{:?}", outcome) }));
                    }
                }
                ObjectKind::Directory | ObjectKind::Bucket => {
                    let summary = download_dir(&provider, &uri, &local, force)
                        .with_context(|| format!("Failed to download {}", uri))?;
                    if cli.json {
                        println!(
                            "{}",
                            json!({
                                "uri": uri.to_string(),
                                "transferred": summary.transferred,
                                "skipped": summary.skipped,
                                "directories": summary.directories,
                            })
                        );
                    }
                }
                ObjectKind::Absent => {
                    return Err(blobsync_core::Error::not_found(&uri, Access::Read).into());
                }
            }
        }

        Commands::Push { local, uri } => {
            let uri = ObjectUri::parse(&uri)?;
            let provider = open_provider(&uri, &config, cli.credentials, Access::Write)?;

            let transferred = if local.is_dir() {
                upload_dir(&provider, &local, &uri)
                    .with_context(|| format!("Failed to upload {:?}", local))?
                    .transferred
            } else {
                upload_file(&provider, &local, &uri)
                    .with_context(|| format!("Failed to upload {:?}", local))?;
                info!("Uploaded {:?} to {}", local, uri);
                1
            };

            if cli.json {
                println!("{}", json!({ "uri": uri.to_string(), "transferred": transferred }));
            }
        }

        Commands::Mtime { uri, depth } => {
            let uri = ObjectUri::parse(&uri)?;
            let provider = open_provider(&uri, &config, cli.credentials, Access::Read)?;
            let depth = depth.unwrap_or(config.mtime.dir_depth);
            let mtime = aggregate_mtime(&provider, &uri, depth)?;

            if cli.json {
                println!("{}", json!({ "uri": uri.to_string(), "depth": depth, "mtime": mtime }));
            } else {
                println!("{}", mtime);
            }
        }

        Commands::Rm { uri } => {
            let uri = ObjectUri::parse(&uri)?;
            let provider = open_provider(&uri, &config, cli.credentials, Access::Delete)?;
            let kind = match classify(&provider, &uri)? {
                ObjectKind::Directory => EntryKind::Directory,
                _ => EntryKind::File,
            };
            let deleted = clear(&provider, &uri, kind)?;
            info!("Deleted {} object(s) under {}", deleted, uri);

            if cli.json {
                println!("{}", json!({ "uri": uri.to_string(), "deleted": deleted }));
            }
        }

        Commands::Mkdir { uri } => {
            let uri = ObjectUri::parse(&uri)?;
            let provider = open_provider(&uri, &config, cli.credentials, Access::Write)?;
            let created = create_dir_marker(&provider, &uri)?;
            if created {
                info!("Created directory marker {}", uri.to_dir());
            } else {
                info!("Directory {} already exists", uri);
            }

            if cli.json {
                println!("{}", json!({ "uri": uri.to_dir().to_string(), "created": created }));
            }
        }

        Commands::Config { show, path, init } => {
            let config_path = match &cli.config {
                Some(path) => path.clone(),
                None => Config::config_path()?,
            };

            if show {
                let toml_str = toml::to_string_pretty(&config)?;
                println!("{}", toml_str);
            } else if path {
                println!("{}", config_path.display());
            } else if init {
                if config_path.exists() {
                    info!("Configuration already exists at {:?}", config_path);
                } else {
                    if let Some(parent) = config_path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&config_path, Config::default_config_content())
                        .with_context(|| format!("Failed to write {:?}", config_path))?;
                    info!("Created default configuration at {:?}", config_path);
                }
            } else {
                eprintln!("Please specify --show, --path, or --init");
            }
        }
    }

    Ok(())
}

/// Build the provider serving a URI's scheme
fn open_provider(
    uri: &ObjectUri,
    config: &Config,
    credentials: Option<PathBuf>,
    access: Access,
) -> Result<CloudStore> {
    if !SUPPORTED_SCHEMES.contains(&uri.scheme()) {
        return Err(blobsync_core::Error::invalid_uri(
            uri,
            access,
            format!("unsupported scheme '{}'", uri.scheme()),
        )
        .into());
    }

    let cloud_config = CloudConfig {
        service_account_path: credentials.or_else(|| config.credentials.service_account.clone()),
    };
    CloudStore::new(uri.scheme(), cloud_config)
        .with_context(|| format!("Failed to open storage for {}", uri))
}

/// Map errors to exit codes: 2 for invalid URIs, 3 for missing objects
fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<blobsync_core::Error>() {
        Some(blobsync_core::Error::InvalidUri { .. }) => 2,
        Some(blobsync_core::Error::ObjectNotFound { .. }) => 3,
        _ => 1,
    }
}
