//! # Seed Data Generator
//!
//! Populates the database with a demo jewelry catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./lustre_dev.db with every design in 3 purities
//! cargo run -p lustre-db --bin seed
//!
//! # Limit the number of products
//! cargo run -p lustre-db --bin seed -- --count 20
//!
//! # Specify database path
//! cargo run -p lustre-db --bin seed -- --db ./data/lustre.db
//! ```
//!
//! ## Generated Data
//! - Materials: Gold, Silver, Platinum
//! - Today's rate board for each material and purity
//! - Stones priced per carat
//! - Products across categories, SKU `{CATEGORY}-{PURITY}-{INDEX}`
//! - A "Bridal" themed collection

use chrono::Utc;
use std::env;
use tracing_subscriber::EnvFilter;

use lustre_core::storefront::ThemedCollection;
use lustre_core::{Material, Product, Stone};
use lustre_db::repository::generate_id;
use lustre_db::{Database, DbConfig};

/// (id, name, [(purity, rate paise per gram)])
const MATERIALS: &[(&str, &str, &[(&str, i64)])] = &[
    ("gold", "Gold", &[("24K", 720_000), ("22K", 660_000), ("18K", 540_000)]),
    ("silver", "Silver", &[("999", 9_500), ("925", 8_800)]),
    ("platinum", "Platinum", &[("950", 320_000)]),
];

/// (id, name, rate paise per carat)
const STONES: &[(&str, &str, i64)] = &[
    ("diamond", "Diamond", 6_500_000),
    ("ruby", "Ruby", 2_000_000),
    ("emerald", "Emerald", 1_800_000),
];

/// (category code, category, designs, gross weight mg, making paise per g)
const DESIGNS: &[(&str, &str, &[&str], i64, i64)] = &[
    ("RNG", "Ring", &["Solitaire", "Band", "Cocktail", "Twisted", "Signet"], 6_500, 45_000),
    ("NCK", "Necklace", &["Rani Haar", "Choker", "Layered", "Pendant Chain"], 38_000, 60_000),
    ("BNG", "Bangle", &["Kada", "Antique", "Filigree", "Plain"], 22_000, 40_000),
    ("EAR", "Earrings", &["Jhumka", "Stud", "Hoop", "Chandbali"], 8_000, 55_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("warn,lustre_db=info"))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = usize::MAX;
    let mut db_path = String::from("./lustre_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(usize::MAX);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Lustre Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Maximum number of products (default: all designs)");
                println!("  -d, --db <PATH>    Database file path (default: ./lustre_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Lustre Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();

    for (id, name, purities) in MATERIALS {
        db.catalog()
            .insert_material(&Material {
                id: id.to_string(),
                name: name.to_string(),
                is_active: true,
                created_at: now,
            })
            .await?;
        for (purity, rate) in purities.iter() {
            db.catalog().set_rate(id, purity, *rate, now).await?;
        }
    }
    println!("✓ {} materials with today's rates", MATERIALS.len());

    for (id, name, rate) in STONES {
        db.catalog()
            .upsert_stone(&Stone {
                id: id.to_string(),
                name: name.to_string(),
                rate_paise_per_ct: *rate,
                is_active: true,
                updated_at: now,
            })
            .await?;
    }
    println!("✓ {} stones", STONES.len());

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut bridal =
        ThemedCollection::new("Bridal", Some("Wedding season picks".to_string()), None);

    'outer: for (code, category, designs, weight, making) in DESIGNS {
        for (design_idx, design) in designs.iter().enumerate() {
            for (purity, _) in MATERIALS[0].2 {
                if generated >= count {
                    break 'outer;
                }

                let product = generate_product(
                    code,
                    category,
                    design,
                    purity,
                    *weight,
                    *making,
                    generated,
                );

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.sku, e);
                    continue;
                }
                if *category == "Necklace" && design_idx == 0 {
                    bridal.add_product(&product.id);
                }
                generated += 1;
            }
        }
    }

    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    db.storefront().create_collection(&bridal).await?;
    println!("✓ Bridal collection with {} products", bridal.product_ids.len());

    let found = db.products().search("kada", 10).await?;
    println!("  Search 'kada': {} results", found.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// One gold design at one purity. Every third piece carries a diamond.
fn generate_product(
    code: &str,
    category: &str,
    design: &str,
    purity: &str,
    gross_weight_mg: i64,
    making_rate_paise_per_g: i64,
    seed: usize,
) -> Product {
    let now = Utc::now();
    let with_stone = seed % 3 == 0;

    // Spread weights ±10% so the catalog isn't uniform.
    let gross = gross_weight_mg + gross_weight_mg * ((seed % 21) as i64 - 10) / 100;

    Product {
        id: generate_id(),
        sku: format!("{}-{}-{:03}", code, purity, seed),
        name: format!("{} {} {}", design, category, purity),
        description: None,
        category: category.to_string(),
        material_id: "gold".to_string(),
        purity: purity.to_string(),
        gross_weight_mg: gross,
        less_weight_mg: if with_stone { 200 } else { 0 },
        making_rate_paise_per_g,
        stone_id: with_stone.then(|| "diamond".to_string()),
        cw_weight_cents: if with_stone { 50 } else { 0 },
        va_charges_paise: if with_stone { 150_000 } else { 0 },
        discount_bps: 0,
        current_stock: 1 + (seed % 4) as i64,
        image_url: None,
        is_active: true,
        created_at: now,
        updated_at: now,
        materials: Vec::new(),
    }
}
