use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;

use plugin_freshness::config::{self, Config};
use plugin_freshness::freshness::cache::{LookupStore, SqliteStore};
use plugin_freshness::freshness::clock::{Clock, SystemClock};
use plugin_freshness::freshness::memory::MemoryStore;
use plugin_freshness::freshness::registries::WordPressRegistry;
use plugin_freshness::freshness::resolver::StalenessResolver;
use plugin_freshness::freshness::staleness::StalenessPolicy;
use plugin_freshness::plugin::manifest::{load_plugin_list, parse_plugin_arg};
use plugin_freshness::plugin::types::PluginInfo;
use plugin_freshness::report::annotation::annotate;
use plugin_freshness::report::health::HealthCheck;
use plugin_freshness::report::table::LastUpdatedTable;

/// Exit code reported when the health check finds stale plugins
const EXIT_CRITICAL: u8 = 2;

#[derive(Parser)]
#[command(name = "plugin-freshness")]
#[command(version, about = "Show when plugins were last updated and flag stale ones")]
struct Cli {
    /// Path to config file (default: <data dir>/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Keep lookups in memory only
    #[arg(long, global = true)]
    no_persist: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a table of plugins and their last-updated dates
    List(PluginArgs),
    /// Print a "Last Updated" label per plugin
    Annotate(PluginArgs),
    /// Check whether any plugin has gone stale
    Health {
        #[command(flatten)]
        plugins: PluginArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage cached lookups
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove every cached lookup
    Clear,
    /// Remove expired lookups
    Prune,
}

#[derive(Args)]
struct PluginArgs {
    /// Plugins as `file[=Display Name]`, e.g. `akismet/akismet.php=Akismet`
    plugins: Vec<String>,

    /// JSON file listing plugins
    #[arg(long, short = 'f')]
    plugins_file: Option<PathBuf>,
}

impl PluginArgs {
    fn collect(&self) -> anyhow::Result<Vec<PluginInfo>> {
        let mut plugins = match &self.plugins_file {
            Some(path) => load_plugin_list(path)?,
            None => Vec::new(),
        };

        for arg in &self.plugins {
            plugins.push(parse_plugin_arg(arg)?);
        }

        anyhow::ensure!(
            !plugins.is_empty(),
            "no plugins given; pass plugin files or --plugins-file"
        );
        Ok(plugins)
    }
}

fn open_store(no_persist: bool) -> anyhow::Result<Arc<dyn LookupStore>> {
    if no_persist {
        return Ok(Arc::new(MemoryStore::new()));
    }

    let db_path = config::db_path();
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create data directory {:?}", dir))?;
    }
    Ok(Arc::new(SqliteStore::new(&db_path)?))
}

fn build_resolver(
    config: &Config,
    store: Arc<dyn LookupStore>,
) -> anyhow::Result<StalenessResolver> {
    let registry = WordPressRegistry::new(config.registry.base_url.clone());

    Ok(
        StalenessResolver::new(Arc::new(registry), store, Arc::new(SystemClock))
            .with_ttl(config.cache.ttl()?)
            .with_policy(StalenessPolicy::new(config.staleness.threshold_years)),
    )
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::load(cli.config.as_deref())?;
    let store = open_store(cli.no_persist)?;

    match cli.command {
        Command::List(args) => {
            let plugins = args.collect()?;
            let resolutions = build_resolver(&config, store)?.resolve_all(&plugins).await;
            print!("{}", LastUpdatedTable::from_resolutions(&resolutions));
        }
        Command::Annotate(args) => {
            let plugins = args.collect()?;
            let resolutions = build_resolver(&config, store)?.resolve_all(&plugins).await;
            for resolution in &resolutions {
                if let Some(annotation) = annotate(resolution) {
                    println!("{}: {}", resolution.name, annotation);
                }
            }
        }
        Command::Health { plugins, json } => {
            let plugins = plugins.collect()?;
            let resolver = build_resolver(&config, store)?;
            let resolutions = resolver.resolve_all(&plugins).await;
            let check = HealthCheck::evaluate(&resolutions, resolver.policy().threshold_years);

            if json {
                println!("{}", serde_json::to_string_pretty(&check)?);
            } else {
                print!("{}", check);
            }

            if !check.is_good() {
                return Ok(ExitCode::from(EXIT_CRITICAL));
            }
        }
        Command::Cache { action } => match action {
            CacheAction::Clear => {
                let removed = store.clear()?;
                info!("Cleared {} cached lookups", removed);
                println!("Removed {} cached lookups", removed);
            }
            CacheAction::Prune => {
                let removed = store.purge_expired(SystemClock.now())?;
                info!("Pruned {} expired lookups", removed);
                println!("Removed {} expired lookups", removed);
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = plugin_freshness::log::init(&config::log_path())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}
