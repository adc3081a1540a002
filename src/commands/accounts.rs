// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::utils::{id_for_account, id_for_user, maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user = sub.get_one::<String>("user").unwrap();
            let name = sub.get_one::<String>("name").unwrap();
            let user_id = id_for_user(conn, user)?;
            let account = ledger::users::create_account(conn, user_id, name)?;
            println!("Added account '{}' (id {})", account.name, account.id);
        }
        Some(("list", sub)) => {
            let user_id = id_for_user(conn, sub.get_one::<String>("user").unwrap())?;
            let mut stmt = conn.prepare(
                "SELECT a.id, a.name, a.balance,
                        EXISTS(SELECT 1 FROM active_accounts aa
                               WHERE aa.user_id=a.user_id AND aa.account_id=a.id)
                 FROM accounts a WHERE a.user_id=?1 ORDER BY a.name",
            )?;
            let accounts = stmt
                .query_map(params![user_id], |r| {
                    Ok((
                        r.get::<_, i64>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, String>(2)?,
                        r.get::<_, bool>(3)?,
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &accounts)? {
                return Ok(());
            }
            let rows = accounts
                .into_iter()
                .map(|(id, name, balance, active)| {
                    vec![
                        id.to_string(),
                        name,
                        balance,
                        if active { "*".into() } else { String::new() },
                    ]
                })
                .collect();
            println!("{}", pretty_table(&["Id", "Name", "Balance", "Active"], rows));
        }
        Some(("rm", sub)) => {
            let user_id = id_for_user(conn, sub.get_one::<String>("user").unwrap())?;
            let name = sub.get_one::<String>("name").unwrap();
            let account_id = id_for_account(conn, user_id, name)?;
            ledger::users::delete_account(conn, account_id)?;
            println!("Removed account '{}'", name);
        }
        Some(("use", sub)) => {
            let user_id = id_for_user(conn, sub.get_one::<String>("user").unwrap())?;
            let name = sub.get_one::<String>("name").unwrap();
            let account_id = id_for_account(conn, user_id, name)?;
            ledger::users::set_active_account(conn, user_id, account_id)?;
            println!("Active account is now '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
