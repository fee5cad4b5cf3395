use clap::{Args, Subcommand};
use pc_core::{prepare, BiasClassifier, Result};

use crate::acquirer::{Acquirer, NewsQuery};

#[derive(Args, Clone, Debug)]
pub struct ProviderArgs {
    #[command(subcommand)]
    pub command: ProviderCommands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ProviderCommands {
    /// Fetch and normalize articles for a scope without clustering them
    Fetch {
        /// Scope id (nacional, espanol, internacional, anglo)
        #[arg(default_value = "nacional")]
        scope: String,
        /// Free-text query
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// Restrict to one publisher domain
        #[arg(short, long)]
        source: Option<String>,
        /// Provider id, or `auto` for the fallback chain
        #[arg(short, long, default_value = "auto")]
        provider: String,
    },
    /// List providers in fallback order
    List,
}

pub async fn handle_command(args: ProviderArgs, acquirer: &Acquirer) -> Result<()> {
    match args.command {
        ProviderCommands::Fetch {
            scope,
            query,
            category,
            source,
            provider,
        } => {
            let request = NewsQuery {
                query,
                category,
                source,
                provider: Some(provider),
                ..NewsQuery::new(scope)
            };
            let acquisition = acquirer.acquire(&request).await?;
            for report in &acquisition.reports {
                let half = report.half.map(|h| format!(" ({})", h)).unwrap_or_default();
                println!("{}{}: {}", report.provider, half, report.outcome);
            }

            let status = acquisition.status();
            let classifier = BiasClassifier::new(acquirer.tables().bias.clone());
            let articles = prepare(acquisition.articles);
            println!("Found {} articles ({:?})", articles.len(), status);
            for article in articles {
                println!(
                    "[{}] {} - {} ({})",
                    classifier.classify(&article.source),
                    article.published_at.format("%Y-%m-%d %H:%M"),
                    article.title,
                    article.url
                );
            }
        }
        ProviderCommands::List => {
            println!("Available providers (fallback order):");
            for provider in acquirer.providers() {
                let meta = provider.metadata();
                let split = if provider.supports_domains() { ", domain split" } else { "" };
                println!("  {} {} [{}{}]", meta.emoji, meta.name, meta.id, split);
            }
        }
    }
    Ok(())
}
