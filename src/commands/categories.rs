// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::utils::{id_for_category, id_for_user, pretty_table};
use anyhow::Result;
use rusqlite::{params, Connection};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user_id = id_for_user(conn, sub.get_one::<String>("user").unwrap())?;
            let name = sub.get_one::<String>("name").unwrap();
            let cat = ledger::users::create_category(conn, user_id, name)?;
            println!("Added category '{}' (id {})", cat.name, cat.id);
        }
        Some(("list", sub)) => {
            let user_id = id_for_user(conn, sub.get_one::<String>("user").unwrap())?;
            let mut stmt =
                conn.prepare("SELECT id, name FROM categories WHERE user_id=?1 ORDER BY name")?;
            let rows = stmt
                .query_map(params![user_id], |r| {
                    Ok(vec![r.get::<_, i64>(0)?.to_string(), r.get::<_, String>(1)?])
                })?
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", pretty_table(&["Id", "Name"], rows));
        }
        Some(("rm", sub)) => {
            let user_id = id_for_user(conn, sub.get_one::<String>("user").unwrap())?;
            let name = sub.get_one::<String>("name").unwrap();
            let category_id = id_for_category(conn, user_id, name)?;
            ledger::users::delete_category(conn, category_id)?;
            println!("Removed category '{}'", name);
        }
        _ => {}
    }
    Ok(())
}
