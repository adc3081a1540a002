// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::models::User;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let email = sub.get_one::<String>("email").unwrap();
            let username = sub.get_one::<String>("username").unwrap();
            let password = sub.get_one::<String>("password").unwrap();
            let user = ledger::users::create_user(conn, email, username, password)?;
            println!("Added user '{}' (id {})", user.username, user.id);
        }
        Some(("list", sub)) => {
            let mut stmt = conn
                .prepare("SELECT id, email, username, balance FROM users ORDER BY username")?;
            let users = stmt
                .query_map([], |r| {
                    Ok(User {
                        id: r.get(0)?,
                        email: r.get(1)?,
                        username: r.get(2)?,
                        balance: ledger::dec(&r.get::<_, String>(3)?)
                            .map_err(|_| rusqlite::Error::InvalidQuery)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &users)? {
                return Ok(());
            }
            let rows = users
                .iter()
                .map(|u| {
                    vec![
                        u.id.to_string(),
                        u.username.clone(),
                        u.email.clone(),
                        u.balance.to_string(),
                    ]
                })
                .collect();
            println!("{}", pretty_table(&["Id", "Username", "Email", "Balance"], rows));
        }
        _ => {}
    }
    Ok(())
}
