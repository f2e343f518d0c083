//! Basic usage example for taorm
//!
//! Run with: cargo run --example basic -p taorm
//!
//! Set TAORM_SQLITE_PATH in .env file or environment variable to use a file
//! database; an in-memory database is used otherwise. Statements are logged
//! through `tracing` under the `taorm.sql` target.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use taorm::prelude::*;

#[derive(Debug, Serialize, Deserialize)]
struct Reading {
    ts: DateTime<Utc>,
    current: f64,
    voltage: i64,
    location: String,
}

fn main() -> OrmResult<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let source = match env::var("TAORM_SQLITE_PATH") {
        Ok(path) => SqliteSource::open_path(path)?,
        Err(_) => SqliteSource::open_in_memory()?,
    };
    let db = Taos::new(source).with_config(ClientConfig::new().show_params(true));

    db.exec(
        "CREATE TABLE IF NOT EXISTS meters (
            ts TEXT NOT NULL,
            current REAL,
            voltage INTEGER,
            location TEXT
        )",
        args![],
    )
    .into_result()?;

    // Insert from a record and from a serializable struct
    db.table("meters")
        .insert(
            Record::new()
                .set("ts", Utc::now())
                .set("current", 10.3)
                .set("voltage", 219)
                .set("location", "California.SanFrancisco"),
        )
        .into_result()?;
    db.table("meters")
        .insert_entity(&Reading {
            ts: Utc::now(),
            current: 12.6,
            voltage: 221,
            location: "California.LosAngeles".into(),
        })
        .into_result()?;

    // Branch one filtered query into a count and a page
    let base = db
        .table("meters")
        .filter("location in ?", args![vec!["California.SanFrancisco", "California.LosAngeles"]])
        .filter("voltage > ?", args![200]);

    let mut total = 0;
    base.clone().count(&mut total).into_result()?;
    println!("matching readings: {total}");

    let mut page: Vec<Reading> = Vec::new();
    base.order("ts desc").limit(10).page(1).find(&mut page).into_result()?;
    for r in &page {
        println!("{} {} {}A {}V", r.ts, r.location, r.current, r.voltage);
    }

    let mut latest: Option<Reading> = None;
    db.table("meters").order("ts desc").take(&mut latest).into_result()?;
    println!("latest: {latest:?}");

    Ok(())
}
