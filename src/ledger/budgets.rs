// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget tracking in lock-step with categorized expenses.

use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use super::{dec, money};
use crate::error::{LedgerError, Result};
use crate::models::Budget;

/// Sets (or raises/lowers) the spending cap for a user/category pair.
///
/// The cap can never drop below what is already spent; that would break
/// the `spent <= amount` invariant at commit.
pub fn set_budget(
    conn: &mut Connection,
    user_id: i64,
    category_id: i64,
    amount: Decimal,
) -> Result<Budget> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::InvalidInput(
            "budget amount must not be negative".into(),
        ));
    }
    let amount = amount.round_dp(super::MONEY_DP);

    let tx = conn.transaction()?;
    let category = category_name(&tx, user_id, category_id)?;
    let spent = tx
        .query_row(
            "SELECT spent FROM budgets WHERE user_id=?1 AND category_id=?2",
            params![user_id, category_id],
            |r| r.get::<_, String>(0),
        )
        .optional()?
        .map(|s| dec(&s))
        .transpose()?
        .unwrap_or(Decimal::ZERO);
    if spent > amount {
        return Err(LedgerError::BudgetExceeded {
            category,
            spent,
            cap: amount,
        });
    }
    tx.execute(
        "INSERT INTO budgets(user_id, category_id, amount) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id, category_id) DO UPDATE SET amount=excluded.amount",
        params![user_id, category_id, money(amount)],
    )?;
    let id: i64 = tx.query_row(
        "SELECT id FROM budgets WHERE user_id=?1 AND category_id=?2",
        params![user_id, category_id],
        |r| r.get(0),
    )?;
    tx.commit()?;
    Ok(Budget {
        id,
        user_id,
        category_id,
        amount,
        spent,
    })
}

/// Applies a signed expense delta to the budget for (user, category),
/// creating a zero-cap budget row if none exists yet.
///
/// Runs inside the caller's transaction: a `BudgetExceeded` here rolls
/// back the transaction mutation that triggered it. `spent` is floored at
/// zero so reversals can never drive it negative.
pub(crate) fn apply_to_budget(
    conn: &Connection,
    user_id: i64,
    category_id: i64,
    signed_amount: Decimal,
) -> Result<()> {
    let category = category_name(conn, user_id, category_id)?;

    conn.execute(
        "INSERT OR IGNORE INTO budgets(user_id, category_id) VALUES (?1, ?2)",
        params![user_id, category_id],
    )?;
    let (amount_s, spent_s): (String, String) = conn.query_row(
        "SELECT amount, spent FROM budgets WHERE user_id=?1 AND category_id=?2",
        params![user_id, category_id],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    let cap = dec(&amount_s)?;
    let mut spent = dec(&spent_s)? + signed_amount;
    if spent < Decimal::ZERO {
        spent = Decimal::ZERO;
    }
    if spent > cap {
        return Err(LedgerError::BudgetExceeded {
            category,
            spent,
            cap,
        });
    }
    conn.execute(
        "UPDATE budgets SET spent=?1 WHERE user_id=?2 AND category_id=?3",
        params![money(spent), user_id, category_id],
    )?;
    Ok(())
}

fn category_name(conn: &Connection, user_id: i64, category_id: i64) -> Result<String> {
    conn.query_row(
        "SELECT name FROM categories WHERE id=?1 AND user_id=?2",
        params![category_id, user_id],
        |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| LedgerError::NotFound(format!("category {}", category_id)))
}
