// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::utils::{
    id_for_account, id_for_investment_account, id_for_user, parse_date, parse_decimal,
};
use anyhow::Result;
use chrono::Local;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    let user_id = id_for_user(conn, m.get_one::<String>("user").unwrap())?;
    let from = m.get_one::<String>("from").unwrap();
    let to = m.get_one::<String>("to").unwrap();
    let amount = parse_decimal(m.get_one::<String>("amount").unwrap())?;
    let date = match m.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => Local::now().date_naive(),
    };
    let from_id = id_for_account(conn, user_id, from)?;

    if m.get_flag("to-investment") {
        let target_id = id_for_investment_account(conn, user_id, to)?;
        ledger::transfers::transfer_to_investment(conn, from_id, target_id, amount, date)?;
        println!("Moved {} from '{}' to investment account '{}'", amount, from, to);
    } else {
        let description = m
            .get_one::<String>("description")
            .map(String::as_str)
            .unwrap_or("");
        let to_id = id_for_account(conn, user_id, to)?;
        ledger::transfers::transfer(conn, from_id, to_id, amount, date, description)?;
        println!("Moved {} from '{}' to '{}'", amount, from, to);
    }
    Ok(())
}
