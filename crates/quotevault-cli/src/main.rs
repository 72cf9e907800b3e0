use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quotevault_cache::{CacheBackend, MemoryCache};
use quotevault_core::config::ProviderKind;
use quotevault_core::providers::{FavQsProvider, ZenQuotesProvider};
use quotevault_core::{CachedQuote, Config, QuoteProvider, QuoteService};
use quotevault_store::QuoteStore;

#[derive(Parser)]
#[command(name = "quotevault")]
#[command(version, about = "Quote-of-the-day vault with favorites", long_about = None)]
struct Cli {
    /// User name to act as (created on first use)
    #[arg(short, long, default_value = "default")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Fetch a batch of quotes
    Fetch {
        /// How many quotes to fetch
        #[arg(short, long, default_value_t = 10)]
        count: usize,
    },
    /// Show the quote of the day
    Qotd,
    /// List your favorite quotes
    Favorites,
    /// Toggle a quote in/out of your favorites
    Toggle {
        /// External id of the quote
        id: String,
    },
    /// Clear the shared quote caches
    ClearCache,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging - helps when things go sideways
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quotevault=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    tracing::info!("Using provider: {:?}", config.provider);

    let provider: Box<dyn QuoteProvider> = match config.provider {
        ProviderKind::FavQs => Box::new(FavQsProvider::new(config.favqs.api_key.clone())),
        ProviderKind::ZenQuotes => match config.zenquotes.api_url.clone() {
            Some(url) => Box::new(ZenQuotesProvider::with_client(
                quotevault_api::ZenQuotesClient::with_base_url(url),
            )),
            None => Box::new(ZenQuotesProvider::new()),
        },
    };

    let db_path = config.database_path()?;
    tracing::info!("Database: {}", db_path.display());
    let store = Arc::new(QuoteStore::new(
        db_path.to_str().ok_or_else(|| anyhow::anyhow!("non-UTF8 database path"))?,
    )?);
    let cache: Arc<dyn CacheBackend> = Arc::new(MemoryCache::new());

    let service = QuoteService::new(provider, Arc::clone(&store), cache).with_ttls(
        Duration::from_secs(config.cache.pool_ttl_secs),
        Duration::from_secs(config.cache.favorite_ttl_secs),
    );

    let user_id = store.ensure_user(&cli.user)?;

    match cli.command {
        Commands::Fetch { count } => {
            let quotes = service.get_quotes(count, user_id).await?;
            for quote in &quotes {
                print_quote(quote);
            }
        }
        Commands::Qotd => {
            let quote = service.quote_of_the_day().await?;
            print_quote(&quote);
        }
        Commands::Favorites => {
            let favorites = service.get_favorites(user_id).await?;
            if favorites.is_empty() {
                println!("No favorites yet. Try `quotevault fetch` and `quotevault toggle <id>`.");
            }
            for quote in &favorites {
                print_quote(quote);
            }
        }
        Commands::Toggle { id } => {
            let is_favorite = service.toggle_favorite(&id, user_id).await?;
            if is_favorite {
                println!("Added {} to favorites", id);
            } else {
                println!("Removed {} from favorites", id);
            }
        }
        Commands::ClearCache => {
            service.clear_quote_cache()?;
            println!("Shared quote caches cleared");
        }
    }

    Ok(())
}

fn print_quote(quote: &CachedQuote) {
    let marker = if quote.is_favorite { "*" } else { " " };
    println!("{} [{}] \"{}\" - {}", marker, quote.id, quote.body, quote.author);
}
