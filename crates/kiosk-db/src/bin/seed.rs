//! # Seed Data
//!
//! Loads the house menu and default settings into a fresh database, and
//! optionally creates the first dashboard account.
//!
//! ## Usage
//! ```bash
//! # Seed ./kiosk_dev.db
//! cargo run -p kiosk-db --bin seed
//!
//! # Specify database path
//! cargo run -p kiosk-db --bin seed -- --db ./data/kiosk.db
//!
//! # Create an admin account as well
//! cargo run -p kiosk-db --bin seed -- --admin-email staff@matcha.cafe --admin-password '...'
//! ```
//!
//! `KIOSK_ADMIN_EMAIL` / `KIOSK_ADMIN_PASSWORD` work in place of the flags.

use anyhow::Context;
use kiosk_core::{AppSettings, Category, NewProduct};
use kiosk_db::{Database, DbConfig};
use std::env;
use tracing::{info, warn};

/// `(id, name_key, category, price_cents, requires_milk, image)`
const MENU: &[(&str, &str, Category, i64, bool, &str)] = &[
    ("1", "matchaLatte", Category::Matcha, 550, true, "photo-1515823064-d6e0c04616a7"),
    ("2", "strawberryMatcha", Category::Matcha, 650, true, "photo-1623065422902-30a2d299bbe4"),
    ("3", "blueberryCinnamonMatcha", Category::Matcha, 700, true, "photo-1536013455962-1c1d1c3a7e8d"),
    ("4", "matchaAzul", Category::Matcha, 650, true, "photo-1582793988951-9aed5509eb97"),
    ("5", "londonFogMatcha", Category::Matcha, 700, true, "photo-1571934811356-5cc061b6821f"),
    ("6", "matchaLimonada", Category::Matcha, 499, false, "photo-1556679343-c7306c1976bc"),
    ("7", "skinFood", Category::Protein, 950, true, "photo-1553530666-ba11a7da3888"),
    ("8", "mrsPeanut", Category::Protein, 950, true, "photo-1579954115545-a95591f28bfc"),
    ("9", "mochaDate", Category::Protein, 950, true, "photo-1572490122747-3968b75cc699"),
    ("10", "espresso", Category::Coffee, 250, false, "photo-1510591509098-f4fdc6d0ff04"),
    ("11", "americano", Category::Coffee, 300, false, "photo-1551030173-122aabc4489c"),
    ("12", "capuchino", Category::Coffee, 450, true, "photo-1572442388796-11668a67e53d"),
    ("13", "cafeLatte", Category::Coffee, 450, true, "photo-1561882468-9110e03e0f78"),
    ("14", "bananaBruleeLatte", Category::Coffee, 650, true, "photo-1517701604599-bb29b565090c"),
    ("15", "teFrio", Category::Coffee, 450, false, "photo-1499638673689-79a0b5115d87"),
    ("16", "sandwichVegano", Category::Snacks, 1099, false, "photo-1528735602780-2552fd46c7af"),
    ("17", "sandwichTuna", Category::Snacks, 1299, false, "photo-1553909489-cd47e0907980"),
    ("18", "sandwichCebolla", Category::Snacks, 1299, false, "photo-1481070414801-51fd732d7184"),
    ("19", "sandwichItaliano", Category::Snacks, 1350, false, "photo-1509722747041-616f39b57569"),
    ("20", "matchaCookie", Category::Sweets, 499, false, "photo-1499636136210-6f4ee915583e"),
];

const DEFAULT_STOCK: i64 = 50;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kiosk_dev.db");
    let mut admin_email = env::var("KIOSK_ADMIN_EMAIL").ok();
    let mut admin_password = env::var("KIOSK_ADMIN_PASSWORD").ok();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--admin-email" => {
                if i + 1 < args.len() {
                    admin_email = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--admin-password" => {
                if i + 1 < args.len() {
                    admin_password = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Matcha Kiosk Seed Data");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>             Database file path (default: ./kiosk_dev.db)");
                println!("      --admin-email <EMAIL>   Create a dashboard account");
                println!("      --admin-password <PW>   Password for that account");
                println!("  -h, --help                  Show this help message");
                return Ok(());
            }
            other => warn!(arg = other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {}", db_path))?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Menu already present, skipping products");
    } else {
        for (id, name_key, category, price_cents, requires_milk, image) in MENU {
            let product = NewProduct {
                id: Some(id.to_string()),
                name_key: name_key.to_string(),
                category: *category,
                price_cents: *price_cents,
                image_url: format!("https://images.unsplash.com/{}?w=400", image),
                requires_milk: *requires_milk,
                stock: DEFAULT_STOCK,
                low_stock_threshold: None,
                is_available: None,
            };
            db.products()
                .insert(&product)
                .await
                .with_context(|| format!("inserting {}", name_key))?;
        }
        info!(products = MENU.len(), "Menu seeded");

        db.settings().save(&AppSettings::default()).await?;
        info!("Default settings stored");
    }

    match (admin_email, admin_password) {
        (Some(email), Some(password)) => {
            if db.admins().find_by_email(&email).await?.is_some() {
                warn!(email = %email, "Admin account already exists");
            } else {
                db.admins()
                    .create_with_password(&email, &password)
                    .await
                    .context("creating admin account")?;
            }
        }
        (Some(_), None) | (None, Some(_)) => {
            warn!("Admin email and password must be given together, skipping account");
        }
        (None, None) => {}
    }

    db.close().await;
    info!("Seed complete");

    Ok(())
}
