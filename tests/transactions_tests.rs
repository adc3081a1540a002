// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketledger::error::LedgerError;
use pocketledger::ledger::{transactions, users};
use pocketledger::models::TransactionKind;
use pocketledger::db;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> (Connection, i64, i64) {
    let mut conn = db::open_in_memory().unwrap();
    let user = users::create_user(&mut conn, "t@example.com", "t", "pw").unwrap();
    let account: i64 = conn
        .query_row(
            "SELECT account_id FROM active_accounts WHERE user_id=?1",
            [user.id],
            |r| r.get(0),
        )
        .unwrap();
    (conn, user.id, account)
}

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, n).unwrap()
}

fn account_balance(conn: &Connection, account: i64) -> String {
    conn.query_row("SELECT balance FROM accounts WHERE id=?1", [account], |r| r.get(0))
        .unwrap()
}

fn user_balance(conn: &Connection, user: i64) -> String {
    conn.query_row("SELECT balance FROM users WHERE id=?1", [user], |r| r.get(0))
        .unwrap()
}

#[test]
fn balance_tracks_transaction_history() {
    let (mut conn, user, account) = setup();
    transactions::create_transaction(
        &mut conn,
        account,
        d("1000"),
        TransactionKind::Income,
        None,
        day(1),
        "salary",
    )
    .unwrap();
    transactions::create_transaction(
        &mut conn,
        account,
        d("149.99"),
        TransactionKind::Expense,
        None,
        day(2),
        "groceries",
    )
    .unwrap();
    let spent = transactions::create_transaction(
        &mut conn,
        account,
        d("30"),
        TransactionKind::Expense,
        None,
        day(3),
        "",
    )
    .unwrap();

    assert_eq!(account_balance(&conn, account), "820.01");
    assert_eq!(user_balance(&conn, user), "820.01");

    transactions::update_transaction(&mut conn, spent.id, d("50"), None, None).unwrap();
    assert_eq!(account_balance(&conn, account), "800.01");

    transactions::delete_transaction(&mut conn, spent.id).unwrap();
    assert_eq!(account_balance(&conn, account), "850.01");

    // Balance equals the signed sum of the surviving transactions.
    let signed: Decimal = {
        let mut stmt = conn
            .prepare("SELECT amount, kind FROM transactions WHERE account_id=?1")
            .unwrap();
        let rows = stmt
            .query_map([account], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })
            .unwrap();
        let mut total = Decimal::ZERO;
        for row in rows {
            let (amount, kind) = row.unwrap();
            let amount: Decimal = amount.parse().unwrap();
            if kind == "income" {
                total += amount;
            } else {
                total -= amount;
            }
        }
        total
    };
    assert_eq!(signed.to_string(), "850.01");
}

#[test]
fn user_balance_spans_all_accounts() {
    let (mut conn, user, base) = setup();
    let savings = users::create_account(&mut conn, user, "Savings").unwrap();
    transactions::create_transaction(
        &mut conn,
        base,
        d("100"),
        TransactionKind::Income,
        None,
        day(1),
        "",
    )
    .unwrap();
    transactions::create_transaction(
        &mut conn,
        savings.id,
        d("250.50"),
        TransactionKind::Income,
        None,
        day(1),
        "",
    )
    .unwrap();
    assert_eq!(user_balance(&conn, user), "350.50");

    users::set_active_account(&mut conn, user, savings.id).unwrap();
    users::delete_account(&mut conn, base).unwrap();
    assert_eq!(user_balance(&conn, user), "250.50");
}

#[test]
fn expense_larger_than_balance_is_rejected() {
    let (mut conn, _, account) = setup();
    transactions::create_transaction(
        &mut conn,
        account,
        d("10"),
        TransactionKind::Income,
        None,
        day(1),
        "",
    )
    .unwrap();
    let err = transactions::create_transaction(
        &mut conn,
        account,
        d("10.01"),
        TransactionKind::Expense,
        None,
        day(2),
        "",
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientFunds { .. }));
    assert_eq!(account_balance(&conn, account), "10.00");
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM transactions WHERE account_id=?1",
            [account],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn income_backing_later_spending_cannot_be_removed() {
    let (mut conn, _, account) = setup();
    let income = transactions::create_transaction(
        &mut conn,
        account,
        d("100"),
        TransactionKind::Income,
        None,
        day(1),
        "",
    )
    .unwrap();
    transactions::create_transaction(
        &mut conn,
        account,
        d("60"),
        TransactionKind::Expense,
        None,
        day(2),
        "",
    )
    .unwrap();
    let err = transactions::delete_transaction(&mut conn, income.id).unwrap_err();
    assert!(matches!(err, LedgerError::NegativeBalance { .. }));
    assert_eq!(account_balance(&conn, account), "40.00");
}

#[test]
fn amounts_survive_storage_exactly() {
    let (mut conn, _, account) = setup();
    transactions::create_transaction(
        &mut conn,
        account,
        d("0.10"),
        TransactionKind::Income,
        None,
        day(1),
        "",
    )
    .unwrap();
    transactions::create_transaction(
        &mut conn,
        account,
        d("0.20"),
        TransactionKind::Income,
        None,
        day(1),
        "",
    )
    .unwrap();
    // Text-backed decimals: no float drift, 0.10 + 0.20 is exactly 0.30.
    assert_eq!(account_balance(&conn, account), "0.30");
    let stored: String = conn
        .query_row(
            "SELECT amount FROM transactions WHERE account_id=?1 ORDER BY id LIMIT 1",
            [account],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(stored.parse::<Decimal>().unwrap().to_string(), "0.10");
}
