use clap::{Parser, Subcommand};
use sqlx::PgPool;

use stockfeed_core::{build_document, CatalogSettings};

#[derive(Debug, Parser)]
#[command(name = "stockfeed-cli")]
#[command(about = "Stockfeed command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build the catalog document from the database and print it as JSON.
    Dump {
        /// Pretty-print the document.
        #[arg(long)]
        pretty: bool,
        /// Include products flagged hidden, overriding the configured value.
        #[arg(long, conflicts_with = "exclude_hidden")]
        include_hidden: bool,
        /// Exclude products flagged hidden, overriding the configured value.
        #[arg(long)]
        exclude_hidden: bool,
    },
    /// Apply pending database migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = stockfeed_core::load_app_config_from_env()?;
    let pool = stockfeed_db::connect_pool(
        &config.database_url,
        stockfeed_db::PoolConfig::from_app_config(&config),
    )
    .await?;

    match cli.command {
        Commands::Dump {
            pretty,
            include_hidden,
            exclude_hidden,
        } => {
            let mut settings = CatalogSettings::from_app_config(&config);
            if include_hidden {
                settings.include_hidden = true;
            } else if exclude_hidden {
                settings.include_hidden = false;
            }
            dump(&pool, &settings, pretty).await?;
        }
        Commands::Migrate => {
            stockfeed_db::run_migrations(&pool).await?;
            tracing::info!("migrations applied");
        }
    }

    Ok(())
}

/// Builds the document and writes it to stdout.
async fn dump(pool: &PgPool, settings: &CatalogSettings, pretty: bool) -> anyhow::Result<()> {
    let rows = stockfeed_db::fetch_catalog_rows(pool).await?;
    let prices = stockfeed_db::load_price_book(pool).await?;
    let document = build_document(&rows, &prices, settings);

    let json = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    println!("{json}");
    Ok(())
}
