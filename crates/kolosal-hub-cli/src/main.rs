//! Kolosal Hub CLI - browse model entries and artifacts from the registry.
//!
//! Every listing command goes through the cache-first resolver, so the CLI
//! keeps working offline as long as something was cached before. Which
//! source answered is reported on stderr.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use kolosal_hub::{
    classify, ArtifactFile, BackendKind, HubConfig, ModelHub, ModelReference, ResolutionOrigin, UnifiedItem,
};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "kolosal-hub")]
#[command(about = "Browse Kolosal model entries and GGUF artifacts")]
struct Args {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct GlobalOpts {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cache directory (overrides the configuration)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Store the cache in SQLite instead of JSON files
    #[arg(long, global = true)]
    sqlite: bool,

    /// Skip reading artifact headers for KV cache estimates
    #[arg(long, global = true)]
    no_memory: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registry entries in a namespace
    Entries {
        /// Namespace to search (defaults to the configured one)
        #[arg(long)]
        namespace: Option<String>,
    },
    /// List the GGUF artifacts of an entry, best quantization first
    Files {
        /// Entry id, e.g. kolosal/qwen3-8b
        entry: String,
    },
    /// Show the merged local + registry candidate list
    Unified {
        /// Model name from the local configuration (repeatable)
        #[arg(long = "configured")]
        configured: Vec<String>,
        /// Previously downloaded model name (repeatable)
        #[arg(long = "downloaded")]
        downloaded: Vec<String>,
    },
    /// Show the quantization detected in filenames
    Classify {
        #[arg(required = true)]
        filenames: Vec<String>,
    },
    /// Tell what kind of model reference an input is
    Inspect { input: String },
    /// List engine libraries for this platform
    Engines {
        /// Registry entry holding the engines
        #[arg(long)]
        repo: Option<String>,
    },
    /// Remove every cached listing
    ClearCache,
}

fn init_logging(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn build_hub(args: &GlobalOpts) -> Result<ModelHub> {
    let mut config = match &args.config {
        Some(path) => HubConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => HubConfig::default(),
    };

    if args.no_memory {
        config.memory_estimates = false;
    }

    let mut builder = ModelHub::builder().config(config).auto_create_dirs(true);
    if let Some(dir) = &args.cache_dir {
        builder = builder.cache_dir(dir);
    }
    if args.sqlite {
        builder = builder.backend(BackendKind::Sqlite);
    }

    let hub = builder.build().context("Failed to initialise the model hub")?;
    debug!("Cache directory: {}", hub.cache_dir().display());
    Ok(hub)
}

fn report(origin: ResolutionOrigin) {
    eprintln!("{}", origin.advisory());
}

fn render_file(file: &ArtifactFile) -> String {
    let memory = file.memory.as_ref().map_or("-", |m| m.display.as_str());
    format!(
        "{:<12} {}\t{}\t{}",
        file.quantization_tag, file.filename, memory, file.download_url
    )
}

fn render_unified(item: &UnifiedItem) -> String {
    match item.selection_token() {
        Some(token) => format!("{}\t{}", item.label(), token),
        None => item.label(),
    }
}

fn render_reference(reference: &ModelReference) -> String {
    match reference {
        ModelReference::DirectUrl(url) => format!("direct-url\t{}", url),
        ModelReference::LocalPath(path) => format!("local-path\t{}", path),
        ModelReference::Repository(id) => format!("repository\t{}", id),
        ModelReference::Invalid => "invalid".to_string(),
    }
}

async fn run(args: Args) -> Result<()> {
    let hub = || build_hub(&args.global);

    match args.command {
        Command::Classify { filenames } => {
            for name in &filenames {
                let quant = classify(name);
                println!(
                    "{}\t{}\t{}\t{}",
                    name, quant.tag, quant.rank, quant.description
                );
            }
        }
        Command::Entries { namespace } => {
            let hub = hub()?;
            let namespace = namespace.unwrap_or_else(|| hub.config().default_namespace.clone());
            let resolved = hub.resolve_entries_traced(&namespace).await;
            for entry in &resolved.items {
                println!("{}", entry);
            }
            report(resolved.origin);
        }
        Command::Files { entry } => {
            let resolved = hub()?.resolve_files_traced(&entry).await;
            for file in &resolved.items {
                println!("{}", render_file(file));
            }
            report(resolved.origin);
        }
        Command::Unified {
            configured,
            downloaded,
        } => {
            let items = hub()?.resolve_unified(&configured, &downloaded).await;
            if items.is_empty() {
                eprintln!("No models found. You can still use direct model URLs or local GGUF files.");
            }
            for item in &items {
                println!("{}", render_unified(item));
            }
        }
        Command::Inspect { input } => {
            let reference = hub()?.classify_input(&input);
            if reference == ModelReference::Invalid {
                bail!("'{}' is not a model URL, GGUF path or owner/name id", input);
            }
            println!("{}", render_reference(&reference));
        }
        Command::Engines { repo } => {
            let files = hub()?.list_engine_files(repo.as_deref()).await;
            if files.is_empty() {
                eprintln!("No engine libraries found for this platform.");
            }
            for file in files {
                println!("{}", file);
            }
        }
        Command::ClearCache => {
            let removed = hub()?.clear_cache()?;
            println!("Cache cleared ({} records removed)", removed);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.global.debug);
    run(args).await
}
