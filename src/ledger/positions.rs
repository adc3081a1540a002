// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Investment positions: buy/sell lifecycle against held quantities and
//! uninvested funds, plus the deletion guards around positions, assets
//! and investment accounts.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use super::{
    balance, dec, fetch_asset, fetch_investment_account, fetch_investment_transaction,
    fetch_position, money, price, qty, transactions,
};
use crate::error::{LedgerError, Result};
use crate::models::{InvestmentTransaction, Position, TradeSide, TransactionKind};

/// Opens a zero-quantity position for (account, asset), or returns the
/// existing one.
pub fn open_position(
    conn: &mut Connection,
    investment_account_id: i64,
    asset_id: i64,
) -> Result<Position> {
    let tx = conn.transaction()?;
    fetch_investment_account(&tx, investment_account_id)?;
    fetch_asset(&tx, asset_id)?;
    let existing: Option<i64> = tx
        .query_row(
            "SELECT id FROM positions WHERE investment_account_id=?1 AND asset_id=?2",
            params![investment_account_id, asset_id],
            |r| r.get(0),
        )
        .optional()?;
    let id = match existing {
        Some(id) => id,
        None => {
            tx.execute(
                "INSERT INTO positions(investment_account_id, asset_id) VALUES (?1, ?2)",
                params![investment_account_id, asset_id],
            )?;
            tx.last_insert_rowid()
        }
    };
    let position = fetch_position(&tx, id)?;
    tx.commit()?;
    Ok(position)
}

pub fn create_investment_transaction(
    conn: &mut Connection,
    position_id: i64,
    quantity: Decimal,
    side: TradeSide,
    initial_value: Decimal,
    date: NaiveDate,
) -> Result<InvestmentTransaction> {
    let quantity = quantity.round_dp(super::QTY_DP);
    if quantity <= Decimal::ZERO {
        return Err(LedgerError::InvalidInput(
            "trade quantity must be positive".into(),
        ));
    }
    let initial_value = initial_value.round_dp(super::PRICE_DP);
    if initial_value < Decimal::ZERO {
        return Err(LedgerError::InvalidInput(
            "trade price must not be negative".into(),
        ));
    }

    let tx = conn.transaction()?;
    let position = fetch_position(&tx, position_id)?;
    let account = fetch_investment_account(&tx, position.investment_account_id)?;
    let cash = (quantity * initial_value).round_dp(super::MONEY_DP);

    match side {
        TradeSide::Buy => {
            if account.amount_to_invest < cash {
                return Err(LedgerError::InsufficientFunds {
                    available: account.amount_to_invest,
                    required: cash,
                });
            }
            settle(&tx, &account, &position, quantity, -cash)?;
        }
        TradeSide::Sell => {
            if position.quantity_have < quantity {
                return Err(LedgerError::InsufficientQuantity {
                    available: position.quantity_have,
                    required: quantity,
                });
            }
            settle(&tx, &account, &position, -quantity, cash)?;
        }
    }

    tx.execute(
        "INSERT INTO investment_transactions(investment_account_id, position_id, quantity,
             date, initial_value, side)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            account.id,
            position_id,
            qty(quantity),
            date.to_string(),
            price(initial_value),
            side.as_str()
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    Ok(InvestmentTransaction {
        id,
        investment_account_id: account.id,
        position_id,
        quantity,
        date,
        initial_value,
        side,
    })
}

/// Re-sizes a recorded trade. The quantity difference is applied with the
/// trade's own side and execution price, validated against the *current*
/// position and funds, not the state at original execution.
pub fn update_investment_transaction(
    conn: &mut Connection,
    id: i64,
    new_quantity: Decimal,
) -> Result<InvestmentTransaction> {
    let new_quantity = new_quantity.round_dp(super::QTY_DP);
    if new_quantity <= Decimal::ZERO {
        return Err(LedgerError::InvalidInput(
            "trade quantity must be positive".into(),
        ));
    }

    let tx = conn.transaction()?;
    let existing = fetch_investment_transaction(&tx, id)?;
    let position = fetch_position(&tx, existing.position_id)?;
    let account = fetch_investment_account(&tx, existing.investment_account_id)?;
    let diff = new_quantity - existing.quantity;
    let cash = (diff.abs() * existing.initial_value).round_dp(super::MONEY_DP);

    if !diff.is_zero() {
        match existing.side {
            TradeSide::Buy if diff > Decimal::ZERO => {
                if account.amount_to_invest < cash {
                    return Err(LedgerError::InsufficientFunds {
                        available: account.amount_to_invest,
                        required: cash,
                    });
                }
                settle(&tx, &account, &position, diff, -cash)?;
            }
            TradeSide::Buy => {
                if position.quantity_have < -diff {
                    return Err(LedgerError::InsufficientQuantity {
                        available: position.quantity_have,
                        required: -diff,
                    });
                }
                settle(&tx, &account, &position, diff, cash)?;
            }
            TradeSide::Sell if diff > Decimal::ZERO => {
                if position.quantity_have < diff {
                    return Err(LedgerError::InsufficientQuantity {
                        available: position.quantity_have,
                        required: diff,
                    });
                }
                settle(&tx, &account, &position, -diff, cash)?;
            }
            TradeSide::Sell => {
                if account.amount_to_invest < cash {
                    return Err(LedgerError::InsufficientFunds {
                        available: account.amount_to_invest,
                        required: cash,
                    });
                }
                settle(&tx, &account, &position, -diff, -cash)?;
            }
        }
    }

    tx.execute(
        "UPDATE investment_transactions SET quantity=?1 WHERE id=?2",
        params![qty(new_quantity), id],
    )?;
    tx.commit()?;
    Ok(InvestmentTransaction {
        quantity: new_quantity,
        ..existing
    })
}

/// Deletes a recorded trade by reversing it symmetrically. Intervening
/// trades can make the reversal impossible: a bought quantity already
/// sold on, or sale proceeds already spent.
pub fn delete_investment_transaction(conn: &mut Connection, id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let existing = fetch_investment_transaction(&tx, id)?;
    let position = fetch_position(&tx, existing.position_id)?;
    let account = fetch_investment_account(&tx, existing.investment_account_id)?;
    let cash = (existing.quantity * existing.initial_value).round_dp(super::MONEY_DP);

    match existing.side {
        TradeSide::Buy => {
            if position.quantity_have < existing.quantity {
                return Err(LedgerError::IrreversibleDeletion {
                    id,
                    reason: "bought quantity has already been sold".into(),
                });
            }
            settle(&tx, &account, &position, -existing.quantity, cash)?;
        }
        TradeSide::Sell => {
            if account.amount_to_invest < cash {
                return Err(LedgerError::IrreversibleDeletion {
                    id,
                    reason: "sale proceeds have already been spent".into(),
                });
            }
            settle(&tx, &account, &position, existing.quantity, -cash)?;
        }
    }

    tx.execute("DELETE FROM investment_transactions WHERE id=?1", params![id])?;
    tx.commit()?;
    Ok(())
}

/// Deletes a position. Only empty positions can go; a held quantity must
/// be sold (or its trades reversed) first.
pub fn delete_position(conn: &mut Connection, position_id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let position = fetch_position(&tx, position_id)?;
    if position.quantity_have > Decimal::ZERO {
        return Err(LedgerError::ActiveResourceProtected(format!(
            "position {}",
            position_id
        )));
    }
    tx.execute("DELETE FROM positions WHERE id=?1", params![position_id])?;
    let account = fetch_investment_account(&tx, position.investment_account_id)?;
    balance::recompute_investment_account(&tx, account.id)?;
    balance::recompute_user_balance(&tx, account.user_id)?;
    tx.commit()?;
    Ok(())
}

/// Deletes an asset. Empty positions referencing it are swept away with
/// it; a nonzero holding anywhere blocks the deletion.
pub fn delete_asset(conn: &mut Connection, asset_id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    fetch_asset(&tx, asset_id)?;
    {
        let mut stmt =
            tx.prepare("SELECT quantity_have FROM positions WHERE asset_id=?1")?;
        let mut rows = stmt.query(params![asset_id])?;
        while let Some(row) = rows.next()? {
            let quantity: String = row.get(0)?;
            if dec(&quantity)? > Decimal::ZERO {
                return Err(LedgerError::ActiveResourceProtected(format!(
                    "asset {}",
                    asset_id
                )));
            }
        }
    }
    tx.execute("DELETE FROM positions WHERE asset_id=?1", params![asset_id])?;
    tx.execute("DELETE FROM assets WHERE id=?1", params![asset_id])?;
    tx.commit()?;
    Ok(())
}

/// Deletes an investment account once all its positions are empty. If it
/// is the user's active investment account, its remaining balance is
/// handed back to the active cash account as an income transaction so no
/// value is silently discarded.
pub fn delete_investment_account(
    conn: &mut Connection,
    investment_account_id: i64,
    date: NaiveDate,
) -> Result<()> {
    let tx = conn.transaction()?;
    let account = fetch_investment_account(&tx, investment_account_id)?;
    {
        let mut stmt = tx.prepare(
            "SELECT quantity_have FROM positions WHERE investment_account_id=?1",
        )?;
        let mut rows = stmt.query(params![investment_account_id])?;
        while let Some(row) = rows.next()? {
            let quantity: String = row.get(0)?;
            if dec(&quantity)? > Decimal::ZERO {
                return Err(LedgerError::ActiveResourceProtected(format!(
                    "investment account {} still holds assets",
                    investment_account_id
                )));
            }
        }
    }

    let is_active: bool = tx
        .query_row(
            "SELECT 1 FROM active_investment_accounts WHERE investment_account_id=?1",
            params![investment_account_id],
            |_| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    let residual = account.amount_to_invest + account.total_investment;
    if is_active && residual > Decimal::ZERO {
        let cash_account: i64 = tx
            .query_row(
                "SELECT account_id FROM active_accounts WHERE user_id=?1",
                params![account.user_id],
                |r| r.get(0),
            )
            .optional()?
            .ok_or_else(|| {
                LedgerError::NotFound(format!("active account for user {}", account.user_id))
            })?;
        transactions::create_in_tx(
            &tx,
            cash_account,
            residual,
            TransactionKind::Income,
            None,
            date,
            &format!("Closed investment account '{}'", account.name),
        )?;
    }

    tx.execute(
        "DELETE FROM investment_accounts WHERE id=?1",
        params![investment_account_id],
    )?;
    balance::recompute_user_balance(&tx, account.user_id)?;
    tx.commit()?;
    Ok(())
}

/// Persists a quantity/cash delta and runs the propagation chain.
fn settle(
    conn: &Connection,
    account: &crate::models::InvestmentAccount,
    position: &Position,
    quantity_delta: Decimal,
    cash_delta: Decimal,
) -> Result<()> {
    conn.execute(
        "UPDATE positions SET quantity_have=?1 WHERE id=?2",
        params![qty(position.quantity_have + quantity_delta), position.id],
    )?;
    conn.execute(
        "UPDATE investment_accounts SET amount_to_invest=?1 WHERE id=?2",
        params![money(account.amount_to_invest + cash_delta), account.id],
    )?;
    balance::recompute_position(conn, position.id)?;
    balance::recompute_investment_account(conn, account.id)?;
    balance::recompute_user_balance(conn, account.user_id)?;
    Ok(())
}
