// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketledger::db;
use pocketledger::error::LedgerError;
use pocketledger::ledger::prices::{self, PriceQuote};
use pocketledger::ledger::{positions, transactions, transfers, users};
use pocketledger::models::{TradeSide, TransactionKind};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn d(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, n).unwrap()
}

// User with 1000 in the investment account's cash leg and a NOK asset quoted at 100.
fn setup() -> (Connection, i64, i64, i64, i64) {
    let mut conn = db::open_in_memory().unwrap();
    let user = users::create_user(&mut conn, "t@example.com", "t", "pw").unwrap();
    let cash: i64 = conn
        .query_row(
            "SELECT account_id FROM active_accounts WHERE user_id=?1",
            [user.id],
            |r| r.get(0),
        )
        .unwrap();
    let invest: i64 = conn
        .query_row(
            "SELECT investment_account_id FROM active_investment_accounts WHERE user_id=?1",
            [user.id],
            |r| r.get(0),
        )
        .unwrap();
    transactions::create_transaction(
        &mut conn,
        cash,
        d("1000"),
        TransactionKind::Income,
        None,
        day(1),
        "",
    )
    .unwrap();
    transfers::transfer_to_investment(&mut conn, cash, invest, d("1000"), day(1)).unwrap();
    prices::refresh_asset_prices(
        &mut conn,
        [PriceQuote {
            name: "NOK".into(),
            price: d("100"),
        }],
    )
    .unwrap();
    let asset: i64 = conn
        .query_row("SELECT id FROM assets WHERE name='NOK'", [], |r| r.get(0))
        .unwrap();
    (conn, user.id, cash, invest, asset)
}

fn invest_row(conn: &Connection, invest: i64) -> (String, String, String) {
    conn.query_row(
        "SELECT amount_to_invest, total_investment, balance
         FROM investment_accounts WHERE id=?1",
        [invest],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )
    .unwrap()
}

#[test]
fn buy_reprice_sell_rolls_value_through_the_chain() {
    let (mut conn, user, _, invest, asset) = setup();
    let position = positions::open_position(&mut conn, invest, asset).unwrap();

    positions::create_investment_transaction(
        &mut conn,
        position.id,
        d("10"),
        TradeSide::Buy,
        d("100"),
        day(2),
    )
    .unwrap();
    assert_eq!(
        invest_row(&conn, invest),
        ("0.00".into(), "1000.00".into(), "1000.00".into())
    );

    prices::refresh_asset_prices(
        &mut conn,
        [PriceQuote {
            name: "NOK".into(),
            price: d("80"),
        }],
    )
    .unwrap();
    assert_eq!(
        invest_row(&conn, invest),
        ("0.00".into(), "800.00".into(), "800.00".into())
    );

    positions::create_investment_transaction(
        &mut conn,
        position.id,
        d("8"),
        TradeSide::Sell,
        d("100"),
        day(3),
    )
    .unwrap();
    assert_eq!(
        invest_row(&conn, invest),
        ("800.00".into(), "160.00".into(), "960.00".into())
    );
    let user_balance: String = conn
        .query_row("SELECT balance FROM users WHERE id=?1", [user], |r| r.get(0))
        .unwrap();
    assert_eq!(user_balance, "960.00");
}

#[test]
fn cannot_sell_more_than_held() {
    let (mut conn, _, _, invest, asset) = setup();
    let position = positions::open_position(&mut conn, invest, asset).unwrap();
    positions::create_investment_transaction(
        &mut conn,
        position.id,
        d("3"),
        TradeSide::Buy,
        d("100"),
        day(2),
    )
    .unwrap();
    let err = positions::create_investment_transaction(
        &mut conn,
        position.id,
        d("4"),
        TradeSide::Sell,
        d("100"),
        day(3),
    )
    .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientQuantity { .. }));
    let qty: String = conn
        .query_row(
            "SELECT quantity_have FROM positions WHERE id=?1",
            [position.id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(qty, "3.00");
}

#[test]
fn buy_cannot_be_deleted_after_the_shares_left() {
    let (mut conn, _, _, invest, asset) = setup();
    let position = positions::open_position(&mut conn, invest, asset).unwrap();
    let buy = positions::create_investment_transaction(
        &mut conn,
        position.id,
        d("5"),
        TradeSide::Buy,
        d("100"),
        day(2),
    )
    .unwrap();
    positions::create_investment_transaction(
        &mut conn,
        position.id,
        d("4"),
        TradeSide::Sell,
        d("100"),
        day(3),
    )
    .unwrap();
    let err = positions::delete_investment_transaction(&mut conn, buy.id).unwrap_err();
    assert!(matches!(err, LedgerError::IrreversibleDeletion { .. }));
}

#[test]
fn sell_cannot_be_deleted_after_proceeds_were_spent() {
    let (mut conn, _, _, invest, asset) = setup();
    let position = positions::open_position(&mut conn, invest, asset).unwrap();
    positions::create_investment_transaction(
        &mut conn,
        position.id,
        d("10"),
        TradeSide::Buy,
        d("100"),
        day(2),
    )
    .unwrap();
    let sell = positions::create_investment_transaction(
        &mut conn,
        position.id,
        d("6"),
        TradeSide::Sell,
        d("100"),
        day(3),
    )
    .unwrap();
    positions::create_investment_transaction(
        &mut conn,
        position.id,
        d("6"),
        TradeSide::Buy,
        d("100"),
        day(4),
    )
    .unwrap();
    let err = positions::delete_investment_transaction(&mut conn, sell.id).unwrap_err();
    assert!(matches!(err, LedgerError::IrreversibleDeletion { .. }));
    let funds: String = conn
        .query_row(
            "SELECT amount_to_invest FROM investment_accounts WHERE id=?1",
            [invest],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(funds, "0.00");
}

#[test]
fn open_position_cannot_be_removed_while_holding() {
    let (mut conn, _, _, invest, asset) = setup();
    let position = positions::open_position(&mut conn, invest, asset).unwrap();
    positions::create_investment_transaction(
        &mut conn,
        position.id,
        d("1"),
        TradeSide::Buy,
        d("100"),
        day(2),
    )
    .unwrap();
    let err = positions::delete_position(&mut conn, position.id).unwrap_err();
    assert!(matches!(err, LedgerError::ActiveResourceProtected(_)));
    let err = positions::delete_asset(&mut conn, asset).unwrap_err();
    assert!(matches!(err, LedgerError::ActiveResourceProtected(_)));
}

#[test]
fn deleting_the_active_investment_account_returns_residual_cash() {
    let (mut conn, user, cash, invest, _) = setup();
    // All 1000 sits in the cash leg; deleting the active account hands it back
    // to the active cash account as an ordinary income transaction.
    positions::delete_investment_account(&mut conn, invest, day(5)).unwrap();

    let cash_balance: String = conn
        .query_row("SELECT balance FROM accounts WHERE id=?1", [cash], |r| r.get(0))
        .unwrap();
    assert_eq!(cash_balance, "1000.00");
    let user_balance: String = conn
        .query_row("SELECT balance FROM users WHERE id=?1", [user], |r| r.get(0))
        .unwrap();
    assert_eq!(user_balance, "1000.00");
    let handback: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM transactions WHERE kind='income' AND description LIKE 'Closed investment account%'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(handback, 1);
    let gone: i64 = conn
        .query_row("SELECT COUNT(*) FROM investment_accounts WHERE id=?1", [invest], |r| r.get(0))
        .unwrap();
    assert_eq!(gone, 0);
}

#[test]
fn nonempty_investment_account_cannot_be_deleted() {
    let (mut conn, _, _, invest, asset) = setup();
    let position = positions::open_position(&mut conn, invest, asset).unwrap();
    positions::create_investment_transaction(
        &mut conn,
        position.id,
        d("2"),
        TradeSide::Buy,
        d("100"),
        day(2),
    )
    .unwrap();
    let err = positions::delete_investment_account(&mut conn, invest, day(5)).unwrap_err();
    assert!(matches!(err, LedgerError::ActiveResourceProtected(_)));
}

#[test]
fn price_refresh_revalues_every_holder() {
    let (mut conn, _, _, invest, asset) = setup();
    let position = positions::open_position(&mut conn, invest, asset).unwrap();
    positions::create_investment_transaction(
        &mut conn,
        position.id,
        d("4"),
        TradeSide::Buy,
        d("100"),
        day(2),
    )
    .unwrap();

    // A second user holding the same asset is revalued by the same refresh.
    let other = users::create_user(&mut conn, "u@example.com", "u", "pw").unwrap();
    let other_cash: i64 = conn
        .query_row(
            "SELECT account_id FROM active_accounts WHERE user_id=?1",
            [other.id],
            |r| r.get(0),
        )
        .unwrap();
    let other_invest: i64 = conn
        .query_row(
            "SELECT investment_account_id FROM active_investment_accounts WHERE user_id=?1",
            [other.id],
            |r| r.get(0),
        )
        .unwrap();
    transactions::create_transaction(
        &mut conn,
        other_cash,
        d("500"),
        TransactionKind::Income,
        None,
        day(1),
        "",
    )
    .unwrap();
    transfers::transfer_to_investment(&mut conn, other_cash, other_invest, d("500"), day(1))
        .unwrap();
    let other_position = positions::open_position(&mut conn, other_invest, asset).unwrap();
    positions::create_investment_transaction(
        &mut conn,
        other_position.id,
        d("5"),
        TradeSide::Buy,
        d("100"),
        day(2),
    )
    .unwrap();

    prices::refresh_asset_prices(
        &mut conn,
        [PriceQuote {
            name: "NOK".into(),
            price: d("120"),
        }],
    )
    .unwrap();

    let first: String = conn
        .query_row(
            "SELECT total_value FROM positions WHERE id=?1",
            [position.id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(first, "480.00");
    let second: String = conn
        .query_row(
            "SELECT total_value FROM positions WHERE id=?1",
            [other_position.id],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(second, "600.00");
    let other_balance: String = conn
        .query_row("SELECT balance FROM users WHERE id=?1", [other.id], |r| r.get(0))
        .unwrap();
    assert_eq!(other_balance, "600.00");
}
