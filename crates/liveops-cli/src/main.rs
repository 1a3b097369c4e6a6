use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use liveops_ai::{LLMProviderFactory, SummarizationPipeline};
use liveops_cache::SummaryCache;
use liveops_core::{
    ConfigManager, DumpReviewSource, LoggingConfig, ReviewQuery, ReviewSort, ReviewSource,
    SummaryResult, MAX_REVIEWS_PER_REQUEST,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{
    filter::EnvFilter, fmt::MakeWriter, layer::SubscriberExt, Registry,
};

#[derive(Parser)]
#[command(name = "liveops")]
#[command(about = "LiveOps Lens - summarize game reviews into LiveOps pain points", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (default: ./.liveops.toml, then ~/.liveops/config.toml)
    #[arg(long, global = true, env = "LIVEOPS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Newest,
    #[value(name = "most_relevant", alias = "most-relevant")]
    MostRelevant,
}

impl From<SortArg> for ReviewSort {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Newest => ReviewSort::Newest,
            SortArg::MostRelevant => ReviewSort::MostRelevant,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize reviews from a dump into LiveOps problems
    Summarize {
        /// Review dump exported by the store scraper
        #[arg(short, long)]
        input: PathBuf,

        /// App identifier; must match the dump's appId when both are present
        #[arg(long, default_value = "")]
        app_id: String,

        /// Maximum number of reviews to summarize (capped at 100)
        #[arg(short, long, default_value_t = MAX_REVIEWS_PER_REQUEST)]
        max: usize,

        /// Review ordering
        #[arg(short, long, value_enum, default_value = "newest")]
        sort: SortArg,

        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        output: OutputFormat,
    },

    /// Print the app's store metadata from a dump as JSON
    App {
        /// Review dump exported by the store scraper
        #[arg(short, long)]
        input: PathBuf,

        /// App identifier; must match the dump's appId when both are present
        #[arg(long, default_value = "")]
        app_id: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let bootstrap_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let config = load_config(cli.config.as_deref(), bootstrap_filter, std::io::stderr)?;
    init_logging(&config.config().logging);

    if let Some(path) = config.config_path() {
        info!(path = %path.display(), "Loaded configuration file");
    }

    match cli.command {
        Commands::Summarize {
            input,
            app_id,
            max,
            sort,
            output,
        } => {
            let invoker = LLMProviderFactory::create_invoker(&config.config().llm)
                .context("Failed to initialize model providers")?;
            let pipeline = SummarizationPipeline::new(invoker, Arc::new(SummaryCache::new()));
            let source = DumpReviewSource::new(input);
            let query = ReviewQuery::new(max, sort.into());

            let summary = pipeline
                .summarize_from_source(&source, &app_id, &query)
                .await?;

            match output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Pretty => print_summary(&summary),
            }
        }

        Commands::App { input, app_id } => {
            let source = DumpReviewSource::new(input);
            let app = source.fetch_app(&app_id).await?;
            println!("{}", serde_json::to_string_pretty(&app)?);
        }
    }

    Ok(())
}

/// Load configuration under a provisional subscriber, since the configured one
/// can only be installed once the configuration is known.
fn load_config<W>(path: Option<&Path>, filter: EnvFilter, writer: W) -> Result<ConfigManager>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let subscriber = Registry::default().with(filter).with(
        tracing_subscriber::fmt::layer()
            .compact()
            .with_ansi(false)
            .with_writer(writer),
    );

    tracing::subscriber::with_default(subscriber, || ConfigManager::load(path))
        .context("Failed to load configuration")
}

/// Install the global subscriber. Logs go to stderr so stdout stays parseable.
fn init_logging(logging: &LoggingConfig) {
    let env_filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = Registry::default().with(env_filter);

    match logging.format.as_str() {
        "json" => {
            let subscriber = registry.with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            );
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        "compact" => {
            let subscriber = registry.with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            );
            tracing::subscriber::set_global_default(subscriber).ok();
        }
        _ => {
            let subscriber = registry.with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            );
            tracing::subscriber::set_global_default(subscriber).ok();
        }
    }
}

fn print_summary(summary: &SummaryResult) {
    println!("{}", summary.summary_line.bold());
    println!(
        "{} {}",
        "Reviews analyzed:".cyan().bold(),
        summary.total_analyzed.to_string().yellow()
    );

    if summary.problems.is_empty() {
        println!("{}", "No LiveOps problems found.".green());
        return;
    }

    println!();
    for (i, problem) in summary.problems.iter().enumerate() {
        let severity = format!("[{}/5]", problem.severity);
        let severity = match problem.severity {
            5 | 4 => severity.red().bold(),
            3 => severity.yellow(),
            _ => severity.green(),
        };
        println!("{}. {} {}", i + 1, severity, problem.title.cyan().bold());
        println!("   {}", problem.description);
    }
}
