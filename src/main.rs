use clap::{Parser, Subcommand, ValueEnum};
use featsearch::headless::{run_query, PickSpec, QueryRequest};
use featsearch_backend::{Fixture, HttpBackend, MemoryBackend, StaticDataset};
use featsearch_core::config::Config;
use featsearch_core::TypeFilter;
use featsearch_session::SessionSettings;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "featsearch", about = "Categorized feature search over single-cell datasets")]
struct Cli {
    /// Write debug logs to /tmp/featsearch-debug.log (tail -f to inspect).
    #[arg(long, global = true)]
    debug: bool,

    /// Config file to use instead of ~/.config/featsearch/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one search and print the bucketed results.
    Query(QueryArgs),
}

#[derive(clap::Args)]
struct QueryArgs {
    /// Query text, as if typed into the search box.
    text: String,

    /// Restrict results to one category: all, gene, regulon or cluster.
    #[arg(long = "type", default_value = "all")]
    type_filter: TypeFilter,

    /// Commit a result, given as <bucket>:<index>.
    #[arg(long)]
    pick: Option<PickSpec>,

    /// Field the committed feature is reported for.
    #[arg(long, default_value_t = 0)]
    field: usize,

    /// Answer from a JSON fixture instead of the HTTP backend.
    #[arg(long)]
    fixture: Option<PathBuf>,

    /// Dataset to search when talking to the HTTP backend. Its clusterings
    /// are read from the backend's dataset listing.
    #[arg(long, default_value = "")]
    dataset: String,

    #[arg(long, value_enum, default_value_t = Format::Plain)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Plain,
    Json,
}

fn init_logging(debug: bool) -> anyhow::Result<()> {
    let filter = |fallback: &str| {
        tracing_subscriber::EnvFilter::try_from_env("RUST_LOG")
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback))
    };
    if debug {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open("/tmp/featsearch-debug.log")?;
        tracing_subscriber::fmt()
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .with_env_filter(filter("debug"))
            .init();
        tracing::info!("featsearch debug log started, tail -f /tmp/featsearch-debug.log");
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(filter("warn"))
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug)?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let settings = SessionSettings::from(&config.search);

    let Command::Query(args) = cli.command;
    let request = QueryRequest {
        field: args.field,
        text: args.text,
        type_filter: args.type_filter,
        pick: args.pick,
    };

    let report = match &args.fixture {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            let fixture = Fixture::from_json(&json)?;
            let backend = Arc::new(MemoryBackend::from_fixture(&fixture));
            let dataset = Arc::new(StaticDataset::from_fixture(&fixture));
            run_query(backend, dataset, settings, request).await?
        }
        None => {
            let backend = Arc::new(HttpBackend::from_config(&config.backend));
            let dataset = Arc::new(backend.load_dataset(args.dataset).await);
            run_query(backend, dataset, settings, request).await?
        }
    };

    match args.format {
        Format::Plain => print!("{}", report.to_plain()?),
        Format::Json => println!("{}", report.to_json()?),
    }
    Ok(())
}
