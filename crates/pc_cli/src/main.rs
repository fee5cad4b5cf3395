use clap::Parser;
use pc_core::{ClusterStrategy, ClusteringConfig, ClusteringEngine, Result, Tables};
use pc_inference::{ClusterAnalyzer, LlmClusterer};
use pc_providers::{
    default_providers, handle_command, init_logging, Acquirer, AcquirerConfig, NewsQuery,
    Pipeline, ProviderArgs, ProviderKeys,
};
use pc_web::AppState;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};

#[derive(Debug, Clone, Copy, PartialEq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if let Ok(num) = current_number.parse::<u64>() {
                let unit = match c {
                    's' => 1,
                    'm' => 60,
                    'h' => 3600,
                    'd' => 86400,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_seconds = num
                    .checked_mul(unit)
                    .and_then(|secs| total_seconds.checked_add(secs))
                    .ok_or_else(|| "Duration too large".to_string())?;
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // bare number means seconds
        if !current_number.is_empty() {
            let num = current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_seconds = total_seconds
                .checked_add(num)
                .ok_or_else(|| "Duration too large".to_string())?;
            has_unit = true;
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }
        if total_seconds == 0 {
            return Err("Duration must be positive".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Multi-outlet news clustering with bias coverage", long_about = None)]
pub struct Cli {
    /// JSON file overriding the built-in bias, stop-word, scope and category tables
    #[arg(long)]
    tables: Option<String>,
    #[arg(long, default_value = "memory", help = "Storage backend: memory (default) or json")]
    storage: String,
    /// Directory for the json storage backend
    #[arg(long)]
    storage_path: Option<String>,
    #[arg(long, default_value = "gemini-2.0-flash", help = "Model for analysis and grouping: gemini-*, deepseek-* or dummy")]
    model: String,
    /// Group articles with the model first, falling back to the deterministic engine
    #[arg(long)]
    llm_clustering: bool,
    /// Per-provider request timeout (e.g. 15s, 1m)
    #[arg(long, default_value = "15s")]
    timeout: HumanDuration,
    #[arg(short, long)]
    verbose: bool,

    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true)]
    newsapi_key: Option<String>,
    #[arg(long, env = "NEWSDATA_API_KEY", hide_env_values = true)]
    newsdata_key: Option<String>,
    #[arg(long, env = "GNEWS_API_KEY", hide_env_values = true)]
    gnews_key: Option<String>,
    #[arg(long, env = "WORLD_NEWS_API_KEY", hide_env_values = true)]
    worldnews_key: Option<String>,
    #[arg(long, env = "CURRENTS_API_KEY", hide_env_values = true)]
    currents_key: Option<String>,
    #[arg(long, env = "GOOGLE_GENERATIVE_AI_API_KEY", hide_env_values = true)]
    gemini_key: Option<String>,
    #[arg(long, env = "DEEPSEEK_API_KEY", hide_env_values = true)]
    deepseek_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn provider_keys(&self) -> ProviderKeys {
        ProviderKeys {
            newsapi: self.newsapi_key.clone(),
            newsdata: self.newsdata_key.clone(),
            gnews: self.gnews_key.clone(),
            worldnews: self.worldnews_key.clone(),
            currents: self.currents_key.clone(),
        }
    }

    fn model_key(&self) -> Option<String> {
        if self.model.starts_with("deepseek") {
            self.deepseek_key.clone()
        } else {
            self.gemini_key.clone()
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Fetch, cluster and print the stories for one scope
    News {
        #[arg(default_value = "nacional")]
        scope: String,
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// Restrict to one publisher domain
        #[arg(short, long)]
        source: Option<String>,
        #[arg(short, long, default_value = "auto")]
        provider: String,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Build and store a digest for each scope
    Digest {
        /// Scopes to digest. Defaults to every configured scope.
        scopes: Vec<String>,
        /// Run in periodic mode with the specified interval (e.g. 1h, 30m, 1d, 1h15m30s)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    Providers(ProviderArgs),
    /// Serve the HTTP API
    Serve {
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
    },
}

async fn build_pipeline(cli: &Cli, tables: Arc<Tables>) -> Result<Pipeline> {
    let acquirer = Acquirer::new(
        default_providers(&cli.provider_keys()),
        tables.clone(),
        AcquirerConfig {
            timeout: cli.timeout.0,
        },
    );
    let engine = ClusteringEngine::from_tables(&tables, ClusteringConfig::default());

    let config = pc_inference::Config {
        api_key: cli.model_key(),
        model_name: Some(cli.model.clone()),
        ..Default::default()
    };
    let deadline = config.deadline;
    let model = match pc_inference::create_model(Some(config)).await {
        Ok(model) => Some(model),
        Err(e) => {
            warn!("⚠️ No inference model, analysis disabled: {}", e);
            None
        }
    };

    let mut strategy = ClusterStrategy::deterministic(engine.clone());
    if let (true, Some(model)) = (cli.llm_clustering, &model) {
        strategy = strategy.with_enhanced(Arc::new(LlmClusterer::new(model.clone(), engine)), deadline);
    }

    let storage = pc_storage::create_storage(&cli.storage, cli.storage_path.as_deref()).await?;
    let mut pipeline = Pipeline::new(acquirer, strategy).with_storage(storage);
    if let Some(model) = model {
        pipeline = pipeline.with_analyzer(Arc::new(ClusterAnalyzer::new(model)));
    }
    Ok(pipeline)
}

async fn print_news(pipeline: &Pipeline, query: NewsQuery, json: bool) -> Result<()> {
    let report = pipeline.run(&query).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for report in &report.reports {
        let half = report.half.map(|h| format!(" ({})", h)).unwrap_or_default();
        info!("{}{}: {}", report.provider, half, report.outcome);
    }
    if let Some(warning) = &report.warning {
        println!("⚠️ {}", warning);
    }
    println!(
        "{} stories from {} articles ({:?}, {:?})",
        report.clusters.len(),
        report.raw_article_count,
        report.status,
        report.origin
    );
    for cluster in &report.clusters {
        let blindspot = cluster
            .blindspot_side
            .map(|side| format!(" [blindspot: {:?}]", side))
            .unwrap_or_default();
        println!("• {} ({} outlets){}", cluster.main_title, cluster.len(), blindspot);
        for item in &cluster.items {
            let bias = item.bias.map(|b| b.to_string()).unwrap_or_else(|| "?".to_string());
            println!("    [{}] {} - {}", bias, item.source, item.url);
        }
    }
    Ok(())
}

async fn run_digest(pipeline: &Pipeline, scopes: &[String]) -> Result<()> {
    for outcome in pipeline.run_digest(scopes).await? {
        println!("{}", outcome);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(if cli.verbose { Level::DEBUG } else { Level::INFO });

    let tables = Arc::new(match &cli.tables {
        Some(path) => Tables::from_json_file(path)?,
        None => Tables::default(),
    });
    let pipeline = build_pipeline(&cli, tables.clone()).await?;
    info!(
        "🦗 Providers ready: {}",
        pipeline
            .acquirer()
            .providers()
            .iter()
            .map(|p| p.metadata().name)
            .collect::<Vec<_>>()
            .join(", ")
    );

    match cli.command {
        Commands::News {
            scope,
            query,
            category,
            source,
            provider,
            json,
        } => {
            let query = NewsQuery {
                query,
                category,
                source,
                provider: Some(provider),
                ..NewsQuery::new(scope)
            };
            print_news(&pipeline, query, json).await?;
        }
        Commands::Digest { scopes, interval } => {
            let scopes = if scopes.is_empty() {
                tables.scopes.iter().map(|s| s.id.clone()).collect()
            } else {
                scopes
            };
            if let Some(interval) = interval {
                info!("Running in periodic mode with {}s interval", interval.0.as_secs());
                loop {
                    info!("Starting digest cycle");
                    if let Err(e) = run_digest(&pipeline, &scopes).await {
                        eprintln!("Error during digest: {}", e);
                    }
                    info!("Waiting {}s before next digest", interval.0.as_secs());
                    tokio::time::sleep(interval.0).await;
                }
            } else {
                run_digest(&pipeline, &scopes).await?;
            }
        }
        Commands::Providers(args) => handle_command(args, pipeline.acquirer()).await?,
        Commands::Serve { addr } => pc_web::serve(addr, AppState::new(pipeline)).await?,
    }

    Ok(())
}
