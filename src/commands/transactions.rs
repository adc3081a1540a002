// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::models::{Transaction, TransactionKind};
use crate::utils::{
    active_account_id, id_for_account, id_for_category, id_for_user, maybe_print_json,
    parse_date, parse_decimal, pretty_table,
};
use anyhow::Result;
use chrono::Local;
use rusqlite::{params, Connection};

fn date_or_today(sub: &clap::ArgMatches) -> Result<chrono::NaiveDate> {
    match sub.get_one::<String>("date") {
        Some(s) => parse_date(s),
        None => Ok(Local::now().date_naive()),
    }
}

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user_id = id_for_user(conn, sub.get_one::<String>("user").unwrap())?;
            let account_id = match sub.get_one::<String>("account") {
                Some(name) => id_for_account(conn, user_id, name)?,
                None => active_account_id(conn, user_id)?,
            };
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let kind = TransactionKind::parse(sub.get_one::<String>("kind").unwrap())?;
            let category_id = sub
                .get_one::<String>("category")
                .map(|c| id_for_category(conn, user_id, c))
                .transpose()?;
            let date = date_or_today(sub)?;
            let description = sub
                .get_one::<String>("description")
                .map(String::as_str)
                .unwrap_or("");
            let t = ledger::transactions::create_transaction(
                conn, account_id, amount, kind, category_id, date, description,
            )?;
            println!("Recorded {} of {} (id {})", t.kind.as_str(), t.amount, t.id);
        }
        Some(("edit", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let date = sub
                .get_one::<String>("date")
                .map(|s| parse_date(s))
                .transpose()?;
            let description = sub.get_one::<String>("description").map(String::as_str);
            let t = ledger::transactions::update_transaction(conn, id, amount, date, description)?;
            println!("Updated transaction {} to {}", t.id, t.amount);
        }
        Some(("rm", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            ledger::transactions::delete_transaction(conn, id)?;
            println!("Removed transaction {}", id);
        }
        Some(("list", sub)) => {
            let user_id = id_for_user(conn, sub.get_one::<String>("user").unwrap())?;
            let account_id = sub
                .get_one::<String>("account")
                .map(|n| id_for_account(conn, user_id, n))
                .transpose()?;
            let category_id = sub
                .get_one::<String>("category")
                .map(|c| id_for_category(conn, user_id, c))
                .transpose()?;
            let limit = sub.get_one::<usize>("limit").copied().unwrap_or(50);

            let mut sql = String::from(
                "SELECT t.id, t.account_id, t.category_id, t.amount, t.kind, t.date, t.description
                 FROM transactions t
                 JOIN accounts a ON a.id = t.account_id
                 WHERE a.user_id = ?1",
            );
            let mut args: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(user_id)];
            if let Some(id) = account_id {
                args.push(Box::new(id));
                sql.push_str(&format!(" AND t.account_id = ?{}", args.len()));
            }
            if let Some(id) = category_id {
                args.push(Box::new(id));
                sql.push_str(&format!(" AND t.category_id = ?{}", args.len()));
            }
            args.push(Box::new(limit as i64));
            sql.push_str(&format!(" ORDER BY t.date DESC, t.id DESC LIMIT ?{}", args.len()));

            let mut stmt = conn.prepare(&sql)?;
            let txs = stmt
                .query_map(rusqlite::params_from_iter(args.iter().map(|b| b.as_ref())), |r| {
                    Ok(Transaction {
                        id: r.get(0)?,
                        account_id: r.get(1)?,
                        category_id: r.get(2)?,
                        amount: ledger::dec(&r.get::<_, String>(3)?)
                            .map_err(|_| rusqlite::Error::InvalidQuery)?,
                        kind: TransactionKind::parse(&r.get::<_, String>(4)?)
                            .map_err(|_| rusqlite::Error::InvalidQuery)?,
                        date: r.get(5)?,
                        description: r.get(6)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &txs)? {
                return Ok(());
            }
            let mut names: std::collections::HashMap<i64, String> = Default::default();
            {
                let mut s = conn.prepare("SELECT id, name FROM categories WHERE user_id=?1")?;
                for row in s.query_map(params![user_id], |r| {
                    Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?))
                })? {
                    let (id, name) = row?;
                    names.insert(id, name);
                }
            }
            let rows = txs
                .iter()
                .map(|t| {
                    vec![
                        t.id.to_string(),
                        t.date.to_string(),
                        t.kind.as_str().to_string(),
                        t.amount.to_string(),
                        t.category_id
                            .and_then(|id| names.get(&id).cloned())
                            .unwrap_or_default(),
                        t.description.clone(),
                    ]
                })
                .collect();
            println!(
                "{}",
                pretty_table(&["Id", "Date", "Kind", "Amount", "Category", "Description"], rows)
            );
        }
        _ => {}
    }
    Ok(())
}
