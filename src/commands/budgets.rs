// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::models::Budget;
use crate::utils::{id_for_category, id_for_user, maybe_print_json, parse_decimal, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let user_id = id_for_user(conn, sub.get_one::<String>("user").unwrap())?;
            let category = sub.get_one::<String>("category").unwrap();
            let category_id = id_for_category(conn, user_id, category)?;
            let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
            let b = ledger::budgets::set_budget(conn, user_id, category_id, amount)?;
            println!("Budget for '{}' set to {} (spent {})", category, b.amount, b.spent);
        }
        Some(("list", sub)) => {
            let user_id = id_for_user(conn, sub.get_one::<String>("user").unwrap())?;
            let mut stmt = conn.prepare(
                "SELECT b.id, b.user_id, b.category_id, b.amount, b.spent, c.name
                 FROM budgets b JOIN categories c ON c.id = b.category_id
                 WHERE b.user_id=?1 ORDER BY c.name",
            )?;
            let rows_raw = stmt
                .query_map(params![user_id], |r| {
                    Ok((
                        Budget {
                            id: r.get(0)?,
                            user_id: r.get(1)?,
                            category_id: r.get(2)?,
                            amount: ledger::dec(&r.get::<_, String>(3)?)
                                .map_err(|_| rusqlite::Error::InvalidQuery)?,
                            spent: ledger::dec(&r.get::<_, String>(4)?)
                                .map_err(|_| rusqlite::Error::InvalidQuery)?,
                        },
                        r.get::<_, String>(5)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            let budgets: Vec<&Budget> = rows_raw.iter().map(|(b, _)| b).collect();
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &budgets)? {
                return Ok(());
            }
            let rows = rows_raw
                .iter()
                .map(|(b, name)| {
                    vec![
                        name.clone(),
                        b.amount.to_string(),
                        b.spent.to_string(),
                        (b.amount - b.spent).to_string(),
                    ]
                })
                .collect();
            println!("{}", pretty_table(&["Category", "Cap", "Spent", "Remaining"], rows));
        }
        _ => {}
    }
    Ok(())
}
