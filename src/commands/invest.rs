// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger::{self, prices::PriceQuote};
use crate::models::TradeSide;
use crate::utils::{
    active_investment_account_id, http_client, id_for_asset, id_for_investment_account,
    id_for_user, maybe_print_json, parse_date, parse_decimal, pretty_table,
};
use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Deserialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("account", sub)) => handle_account(conn, sub)?,
        Some(("asset", sub)) => handle_asset(conn, sub)?,
        Some(("positions", sub)) => list_positions(conn, sub)?,
        Some(("buy", sub)) => trade(conn, sub, TradeSide::Buy)?,
        Some(("sell", sub)) => trade(conn, sub, TradeSide::Sell)?,
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let quantity = parse_decimal(sub.get_one::<String>("quantity").unwrap())?;
            let t = ledger::positions::update_investment_transaction(conn, id, quantity)?;
            println!("Updated trade {} to quantity {}", t.id, t.quantity);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            ledger::positions::delete_investment_transaction(conn, id)?;
            println!("Removed trade {}", id);
        }
        Some(("price", sub)) => handle_price(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn handle_account(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user_id = id_for_user(conn, sub.get_one::<String>("user").unwrap())?;
            let name = sub.get_one::<String>("name").unwrap();
            let acct = ledger::users::create_investment_account(conn, user_id, name)?;
            println!("Added investment account '{}' (id {})", acct.name, acct.id);
        }
        Some(("list", sub)) => {
            let user_id = id_for_user(conn, sub.get_one::<String>("user").unwrap())?;
            let mut stmt = conn.prepare(
                "SELECT i.id, i.name, i.amount_to_invest, i.total_investment, i.balance,
                        EXISTS(SELECT 1 FROM active_investment_accounts ai
                               WHERE ai.user_id=i.user_id AND ai.investment_account_id=i.id)
                 FROM investment_accounts i WHERE i.user_id=?1 ORDER BY i.name",
            )?;
            let accounts = stmt
                .query_map(params![user_id], |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, String>(3)?,
                        r.get::<_, String>(4)?,
                        r.get::<_, bool>(5)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
                return Ok(());
            }
            let rows = accounts
                .into_iter()
                .map(|(id, name, cash, invested, balance, active)| {
                    vec![
                        id.to_string(),
                        name,
                        cash,
                        invested,
                        balance,
                        if active { "*".into() } else { String::new() },
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Id", "Name", "Cash", "Invested", "Balance", "Active"], rows)
            );
        }
        Some(("rm", sub)) => {
            let user_id = id_for_user(conn, sub.get_one::<String>("user").unwrap())?;
            let name = sub.get_one::<String>("name").unwrap();
            let id = id_for_investment_account(conn, user_id, name)?;
            ledger::positions::delete_investment_account(conn, id, Local::now().date_naive())?;
            println!("Removed investment account '{}'", name);
        }
        Some(("use", sub)) => {
            let user_id = id_for_user(conn, sub.get_one::<String>("user").unwrap())?;
            let name = sub.get_one::<String>("name").unwrap();
            let id = id_for_investment_account(conn, user_id, name)?;
            ledger::users::set_active_investment_account(conn, user_id, id)?;
            println!("Active investment account is now '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

fn handle_asset(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => {
            let mut stmt = conn.prepare("SELECT id, name, value, kind FROM assets ORDER BY name")?;
            let assets = stmt
                .query_map([], |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, String>(3)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &assets)? {
                return Ok(());
            }
            let rows = assets
                .into_iter()
                .map(|(id, name, value, kind)| vec![id.to_string(), name, value, kind])
                .collect();
            println!("{}", pretty_table(&["Id", "Name", "Value", "Kind"], rows));
        }
        Some(("rm", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let id = id_for_asset(conn, name)?;
            ledger::positions::delete_asset(conn, id)?;
            println!("Removed asset '{}'", name);
        }
        _ => {}
    }
    Ok(())
}

fn list_positions(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let user_id = id_for_user(conn, m.get_one::<String>("user").unwrap())?;
    let account_id = match m.get_one::<String>("account") {
        Some(name) => id_for_investment_account(conn, user_id, name)?,
        None => active_investment_account_id(conn, user_id)?,
    };
    let mut stmt = conn.prepare(
        "SELECT p.id, s.name, p.quantity_have, s.value, p.total_value
         FROM positions p JOIN assets s ON s.id = p.asset_id
         WHERE p.investment_account_id=?1 ORDER BY s.name",
    )?;
    let positions = stmt
        .query_map(params![account_id], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &positions)? {
        return Ok(());
    }
    let rows = positions
        .into_iter()
        .map(|(id, name, qty, value, total)| vec![id.to_string(), name, qty, value, total])
        .collect();
    println!(
        "{}",
        pretty_table(&["Id", "Asset", "Quantity", "Price", "Value"], rows)
    );
    Ok(())
}

fn trade(conn: &mut Connection, m: &clap::ArgMatches, side: TradeSide) -> Result<()> {
    let user_id = id_for_user(conn, m.get_one::<String>("user").unwrap())?;
    let account_id = match m.get_one::<String>("account") {
        Some(name) => id_for_investment_account(conn, user_id, name)?,
        None => active_investment_account_id(conn, user_id)?,
    };
    let asset = m.get_one::<String>("asset").unwrap();
    let asset_id = id_for_asset(conn, asset)?;
    let quantity = parse_decimal(m.get_one::<String>("quantity").unwrap())?;
    let price = parse_decimal(m.get_one::<String>("price").unwrap())?;
    let date = match m.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => Local::now().date_naive(),
    };
    let position = ledger::positions::open_position(conn, account_id, asset_id)?;
    let t = ledger::positions::create_investment_transaction(
        conn,
        position.id,
        quantity,
        side,
        price,
        date,
    )?;
    println!(
        "{} {} x {} at {} (trade id {})",
        match side {
            TradeSide::Buy => "Bought",
            TradeSide::Sell => "Sold",
        },
        t.quantity,
        asset,
        t.initial_value,
        t.id
    );
    Ok(())
}

#[derive(Deserialize)]
struct GroupedDaily {
    #[serde(default)]
    results: Vec<DailyBar>,
}

#[derive(Deserialize)]
struct DailyBar {
    #[serde(rename = "T")]
    ticker: String,
    #[serde(rename = "c")]
    close: f64,
}

fn handle_price(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("fetch", sub)) => {
            let date = match sub.get_one::<String>("date") {
                Some(s) => parse_date(s)?,
                None => Local::now().date_naive(),
            };
            let key = std::env::var("POLYGON_API_KEY")
                .context("POLYGON_API_KEY environment variable not set")?;
            let url = format!(
                "https://api.polygon.io/v2/aggs/grouped/locale/us/market/stocks/{}?adjusted=true&apiKey={}",
                date, key
            );
            let resp: GroupedDaily = http_client()?.get(&url).send()?.json()?;

            // Only quote names that exist as assets; the feed covers the whole market.
            let mut known: std::collections::HashSet<String> = Default::default();
            {
                let mut stmt = conn.prepare("SELECT name FROM assets")?;
                for row in stmt.query_map([], |r| r.get::<_, String>(0))? {
                    known.insert(row?);
                }
            }
            let quotes: Vec<PriceQuote> = resp
                .results
                .into_iter()
                .filter(|bar| known.contains(&bar.ticker))
                .filter_map(|bar| {
                    Decimal::from_f64_retain(bar.close).map(|price| PriceQuote {
                        name: bar.ticker,
                        price,
                    })
                })
                .collect();
            let n = ledger::prices::refresh_asset_prices(conn, quotes)?;
            println!("Updated {} asset prices for {}", n, date);
        }
        Some(("set", sub)) => {
            let name = sub.get_one::<String>("asset").unwrap();
            let value = parse_decimal(sub.get_one::<String>("value").unwrap())?;
            ledger::prices::refresh_asset_prices(
                conn,
                [PriceQuote {
                    name: name.clone(),
                    price: value,
                }],
            )?;
            println!("Set '{}' to {}", name, value);
        }
        _ => {}
    }
    Ok(())
}
