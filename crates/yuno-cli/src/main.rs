mod api;
mod display;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use yuno_core::{PolicyQuery, ServiceConfig, SystemClock, UpstreamConfig};
use yuno_service::PolicyService;
use yuno_store::DuckPolicyStore;
use yuno_sync::OntongClient;

#[derive(Parser)]
#[command(name = "yuno", version, about = "Read-through cache for the youth-policy open API")]
struct Cli {
    /// DuckDB database file (in-memory when omitted)
    #[arg(long, env = "YUNO_DB", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(long, env = "YUNO_HOST", default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },

    /// Walk the whole upstream catalog into the cache
    Sync,

    /// List policies through the read-through cache
    List(ListArgs),

    /// Show one policy as a card
    Show {
        /// Policy id (upstream bizId)
        id: String,
    },

    /// List cached policies only, newest first within equal popularity
    Cached(ListArgs),
}

/// Listing options. Checked by the same rules as the HTTP query string.
#[derive(Args)]
struct ListArgs {
    /// Page number, from 1 (default 1)
    #[arg(long)]
    page: Option<String>,

    /// Page size, 1 to 100 (default 20)
    #[arg(long)]
    limit: Option<String>,

    /// Category name, e.g. 주거지원
    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    region: Option<String>,

    /// Substring of title or description, 2 to 100 characters
    #[arg(long)]
    search: Option<String>,

    #[arg(long)]
    age_min: Option<String>,

    #[arg(long)]
    age_max: Option<String>,
}

impl ListArgs {
    fn to_query(&self) -> anyhow::Result<PolicyQuery> {
        let params = api::PolicyParams {
            page: self.page.clone(),
            limit: self.limit.clone(),
            category: self.category.clone(),
            region: self.region.clone(),
            search: self.search.clone(),
            age_min: self.age_min.clone(),
            age_max: self.age_max.clone(),
        };
        params.validate().map_err(|errors| {
            let details: Vec<String> = errors
                .iter()
                .map(|e| format!("{}: {} (got {:?})", e.path, e.msg, e.value))
                .collect();
            anyhow!("invalid listing options: {}", details.join("; "))
        })
    }
}

fn open_store(db: Option<&Path>) -> anyhow::Result<DuckPolicyStore> {
    match db {
        Some(path) => DuckPolicyStore::open_persistent(path)
            .with_context(|| format!("opening policy database {}", path.display())),
        None => DuckPolicyStore::open().context("opening in-memory policy database"),
    }
}

fn build_service(store: Arc<DuckPolicyStore>) -> anyhow::Result<PolicyService> {
    let upstream_config = UpstreamConfig::from_env();
    let client = OntongClient::new(&upstream_config).context("building open API client")?;
    if !client.has_api_key() {
        warn!("ONTONG_API_KEY is not set; only cached policies can be served");
    }
    Ok(PolicyService::new(
        store,
        Arc::new(client),
        Arc::new(SystemClock),
        ServiceConfig::from_env(),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let store = Arc::new(open_store(cli.db.as_deref())?);
    let service = Arc::new(build_service(store.clone())?);
    info!(version = env!("CARGO_PKG_VERSION"), "yuno starting");

    match cli.command {
        Command::Serve { host, port } => {
            let state = api::AppState {
                service: Arc::clone(&service),
            };
            api::serve(state, &host, port).await?;
        }
        Command::Sync => {
            let total = service.sync_policies().await.context("policy sync failed")?;
            service.wait_for_refills().await;
            println!("Synced {total} policies ({} rows cached)", store.count()?);
        }
        Command::List(args) => {
            let page = service.list_policies(&args.to_query()?).await;
            print!("{}", display::format_policy_page(&page));
        }
        Command::Show { id } => match service.get_policy_detail(&id).await? {
            Some(policy) => print!("{}", display::format_policy_card(&policy)),
            None => bail!("policy {id} not found"),
        },
        Command::Cached(args) => {
            let page = service.list_cached_policies(&args.to_query()?).await;
            print!("{}", display::format_policy_page(&page));
        }
    }

    // Read-through refills run detached; let them land before the runtime stops.
    service.wait_for_refills().await;
    Ok(())
}
