//! # Seed Data Generator
//!
//! Populates the database with a demo catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the configured database
//! cargo run -p stockline-db --bin seed
//!
//! # Specify database path or config file
//! cargo run -p stockline-db --bin seed -- --db ./stockline_dev.db
//! cargo run -p stockline-db --bin seed -- --config ./stockline.toml
//! ```
//!
//! Skips seeding when the catalog already has products.

use std::env;
use std::path::PathBuf;

use stockline_core::{search, Money, LOW_STOCK_THRESHOLD};
use stockline_db::{AppConfig, Database, NewCatalogItem};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Demo catalog: (category, [(name, stock, price in cents)])
const CATALOG: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "Maquillaje",
        &[
            ("Base Líquida Mate TimeWise", 6, 31_000),
            ("Labial Gel Semi-Mate - Red Roma", 12, 18_500),
            ("Delineador Líquido Black", 4, 14_000),
            ("Máscara de Pestañas Lash Love", 2, 21_000),
            ("Polvo Compacto Translúcido", 0, 19_900),
        ],
    ),
    (
        "Cuidado de la piel",
        &[
            ("Crema Renovadora de Noche", 5, 42_000),
            ("Desmaquillante de Ojos", 8, 12_000),
            ("Gel Limpiador Facial", 3, 16_500),
            ("Protector Solar FPS 50", 9, 27_500),
        ],
    ),
    (
        "Fragancias",
        &[
            ("Alma Equídada Razza", 2, 55_000),
            ("Eau de Miefarran Climente", 1, 61_000),
        ],
    ),
    (
        "Suplementos",
        &[("Immun 2 Powder Radines", 7, 24_000)],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<String> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockline Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>        Database file path (overrides config)");
                println!("  -c, --config <PATH>    Config file (default: platform config dir)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = AppConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = PathBuf::from(path);
    }
    init_tracing(&config.logging.filter);

    if let Some(parent) = config.database.path.parent() {
        if !parent.as_os_str().is_empty() && !config.db_config().is_in_memory() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::new(config.db_config()).await?;
    info!(path = %config.database.path.display(), "Connected, migrations applied");

    let catalog = db.catalog();
    let existing = catalog.count().await?;
    if existing > 0 {
        warn!(existing, "Catalog already has products; skipping seed");
        return Ok(());
    }

    let mut inserted = 0;
    for (category_name, products) in CATALOG {
        let category = catalog.insert_category(category_name).await?;

        for (name, stock, cents) in products.iter() {
            let item = NewCatalogItem::new(*name, *stock, Money::from_cents(*cents))
                .in_category(category.id);
            catalog.insert(&item).await?;
            inserted += 1;
        }
    }
    info!(inserted, "Demo catalog seeded");

    // Smoke-check the search path against what was just written
    let listed = catalog.list_active().await?;
    for query in ["basee", "cremas", "delinador"] {
        let hits = search(query, &listed);
        let top = hits.first().map(|item| item.name.as_str()).unwrap_or("-");
        info!(query, top, results = hits.len(), "Search check");
    }

    for item in catalog.low_stock(LOW_STOCK_THRESHOLD).await? {
        info!(name = %item.name, stock = item.stock, "Running low");
    }

    Ok(())
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured filter.
fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
