// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

const UA: &str = concat!(
    "pocketledger/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/pocketledger/pocketledger)"
);

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_user(conn: &Connection, username: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM users WHERE username=?1")?;
    let id: i64 = stmt
        .query_row(params![username], |r| r.get(0))
        .with_context(|| format!("User '{}' not found", username))?;
    Ok(id)
}

pub fn id_for_account(conn: &Connection, user_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE user_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![user_id, name], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_investment_account(conn: &Connection, user_id: i64, name: &str) -> Result<i64> {
    let mut stmt =
        conn.prepare("SELECT id FROM investment_accounts WHERE user_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![user_id, name], |r| r.get(0))
        .with_context(|| format!("Investment account '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_category(conn: &Connection, user_id: i64, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE user_id=?1 AND name=?2")?;
    let id: i64 = stmt
        .query_row(params![user_id, name], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", name))?;
    Ok(id)
}

pub fn active_account_id(conn: &Connection, user_id: i64) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT account_id FROM active_accounts WHERE user_id=?1")?;
    let id: i64 = stmt
        .query_row(params![user_id], |r| r.get(0))
        .context("No active account set")?;
    Ok(id)
}

pub fn active_investment_account_id(conn: &Connection, user_id: i64) -> Result<i64> {
    let mut stmt = conn
        .prepare("SELECT investment_account_id FROM active_investment_accounts WHERE user_id=?1")?;
    let id: i64 = stmt
        .query_row(params![user_id], |r| r.get(0))
        .context("No active investment account set")?;
    Ok(id)
}

pub fn id_for_asset(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM assets WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Asset '{}' not found", name))?;
    Ok(id)
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
