//! # Seed Data Generator
//!
//! Populates the database with a sample book catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default development database
//! cargo run -p vault-db --bin seed
//!
//! # Specify database path
//! cargo run -p vault-db --bin seed -- --db ./data/bookvault.db
//! ```
//!
//! ## Generated Data
//! A small realistic catalog across genres with prices $4.99 - $24.99.
//! Accounts are created through `POST /api/auth/signup` (password hashing
//! lives in the API layer, not here).

use chrono::{NaiveDate, Utc};
use std::env;
use uuid::Uuid;
use vault_core::Book;
use vault_db::{Database, DbConfig};

/// Demo catalog: (title, author, genre, price_cents, year, blurb)
const BOOKS: &[(&str, &str, &str, i64, i32, &str)] = &[
    (
        "The Digital Revolution",
        "Sarah Johnson",
        "Technology",
        1999,
        2024,
        "A comprehensive guide to understanding how technology is reshaping our world.",
    ),
    (
        "Dune",
        "Frank Herbert",
        "Sci-Fi",
        1299,
        1965,
        "Spice, sandworms, and statecraft on the desert planet Arrakis.",
    ),
    (
        "Neuromancer",
        "William Gibson",
        "Sci-Fi",
        1199,
        1984,
        "The novel that named cyberspace.",
    ),
    (
        "The Hobbit",
        "J.R.R. Tolkien",
        "Fantasy",
        999,
        1937,
        "There and back again.",
    ),
    (
        "A Brief History of Time",
        "Stephen Hawking",
        "Science",
        1499,
        1988,
        "From the Big Bang to black holes.",
    ),
    (
        "The Pragmatic Programmer",
        "David Thomas",
        "Technology",
        2499,
        1999,
        "Your journey to mastery.",
    ),
    (
        "Pride and Prejudice",
        "Jane Austen",
        "Classics",
        499,
        1813,
        "It is a truth universally acknowledged...",
    ),
    (
        "The Name of the Wind",
        "Patrick Rothfuss",
        "Fantasy",
        1399,
        2007,
        "The tale of Kvothe, told in his own voice.",
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./bookvault_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("BookVault Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bookvault_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 BookVault Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database (runs migrations)
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing catalog
    let existing = db.books().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} books", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding catalog...");

    let start = std::time::Instant::now();

    let mut seeded = 0;
    for (title, author, genre, price_cents, year, blurb) in BOOKS {
        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4().to_string(),
            title: title.to_string(),
            author: author.to_string(),
            description: Some(blurb.to_string()),
            price_cents: *price_cents,
            cover_image: None,
            genre: genre.to_string(),
            rating: 0.0,
            rating_count: 0,
            published_date: NaiveDate::from_ymd_opt(*year, 1, 15)
                .ok_or("invalid seed publication date")?,
            file_path: Some(format!("books/{}.epub", slugify(title))),
            file_size: Some(1_048_576),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = db.books().insert(&book).await {
            eprintln!("Failed to insert {}: {}", title, e);
            continue;
        }

        seeded += 1;
        println!("  + {} ({})", title, genre);
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Seeded {} books in {:?}", seeded, elapsed);

    // Verify the catalog answers a search
    let genres = db.books().list_genres().await?;
    println!("  Genres: {}", genres.join(", "));

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Lowercases and dashes a title into a file slug.
fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
