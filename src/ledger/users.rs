// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Users, their accounts and categories.
//!
//! Registration provisions the default cash and investment accounts plus
//! both active-account pointers in one transaction.

use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use super::{balance, fetch_account, fetch_investment_account};
use crate::error::{LedgerError, Result};
use crate::models::{Account, Category, InvestmentAccount, User};

const DEFAULT_ACCOUNT_NAME: &str = "Base";

/// Lowercases the domain part, leaving the local part alone.
fn normalize_email(email: &str) -> String {
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

pub fn create_user(
    conn: &mut Connection,
    email: &str,
    username: &str,
    password: &str,
) -> Result<User> {
    if email.trim().is_empty() {
        return Err(LedgerError::InvalidInput(
            "user must have an email address".into(),
        ));
    }
    if username.trim().is_empty() {
        return Err(LedgerError::InvalidInput("user must have a username".into()));
    }
    let email = normalize_email(email.trim());

    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO users(email, username, password) VALUES (?1, ?2, ?3)",
        params![email, username, password],
    )?;
    let user_id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO accounts(user_id, name) VALUES (?1, ?2)",
        params![user_id, DEFAULT_ACCOUNT_NAME],
    )?;
    let account_id = tx.last_insert_rowid();
    tx.execute(
        "INSERT INTO active_accounts(user_id, account_id) VALUES (?1, ?2)",
        params![user_id, account_id],
    )?;

    tx.execute(
        "INSERT INTO investment_accounts(user_id, name) VALUES (?1, ?2)",
        params![user_id, DEFAULT_ACCOUNT_NAME],
    )?;
    let investment_account_id = tx.last_insert_rowid();
    tx.execute(
        "INSERT INTO active_investment_accounts(user_id, investment_account_id)
         VALUES (?1, ?2)",
        params![user_id, investment_account_id],
    )?;
    tx.commit()?;

    Ok(User {
        id: user_id,
        email,
        username: username.to_string(),
        balance: Decimal::ZERO,
    })
}

pub fn create_account(conn: &mut Connection, user_id: i64, name: &str) -> Result<Account> {
    if name.trim().is_empty() {
        return Err(LedgerError::InvalidInput("account needs a name".into()));
    }
    super::fetch_user(conn, user_id)?;
    conn.execute(
        "INSERT INTO accounts(user_id, name) VALUES (?1, ?2)",
        params![user_id, name.trim()],
    )?;
    Ok(Account {
        id: conn.last_insert_rowid(),
        user_id,
        name: name.trim().to_string(),
        balance: Decimal::ZERO,
    })
}

pub fn create_investment_account(
    conn: &mut Connection,
    user_id: i64,
    name: &str,
) -> Result<InvestmentAccount> {
    if name.trim().is_empty() {
        return Err(LedgerError::InvalidInput("account needs a name".into()));
    }
    super::fetch_user(conn, user_id)?;
    conn.execute(
        "INSERT INTO investment_accounts(user_id, name) VALUES (?1, ?2)",
        params![user_id, name.trim()],
    )?;
    Ok(InvestmentAccount {
        id: conn.last_insert_rowid(),
        user_id,
        name: name.trim().to_string(),
        amount_to_invest: Decimal::ZERO,
        total_investment: Decimal::ZERO,
        balance: Decimal::ZERO,
    })
}

/// Points the user's active-account marker at another owned account.
pub fn set_active_account(conn: &mut Connection, user_id: i64, account_id: i64) -> Result<()> {
    let account = fetch_account(conn, account_id)?;
    if account.user_id != user_id {
        return Err(LedgerError::NotFound(format!("account {}", account_id)));
    }
    conn.execute(
        "INSERT INTO active_accounts(user_id, account_id) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET account_id=excluded.account_id",
        params![user_id, account_id],
    )?;
    Ok(())
}

pub fn set_active_investment_account(
    conn: &mut Connection,
    user_id: i64,
    investment_account_id: i64,
) -> Result<()> {
    let account = fetch_investment_account(conn, investment_account_id)?;
    if account.user_id != user_id {
        return Err(LedgerError::NotFound(format!(
            "investment account {}",
            investment_account_id
        )));
    }
    conn.execute(
        "INSERT INTO active_investment_accounts(user_id, investment_account_id)
         VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE
             SET investment_account_id=excluded.investment_account_id",
        params![user_id, investment_account_id],
    )?;
    Ok(())
}

/// Deletes a cash account and its transactions. The active account is
/// protected; everything else reverses its contribution to the user
/// balance on the way out.
pub fn delete_account(conn: &mut Connection, account_id: i64) -> Result<()> {
    let tx = conn.transaction()?;
    let account = fetch_account(&tx, account_id)?;
    let is_active: bool = tx
        .query_row(
            "SELECT 1 FROM active_accounts WHERE account_id=?1",
            params![account_id],
            |_| Ok(true),
        )
        .optional()?
        .unwrap_or(false);
    if is_active {
        return Err(LedgerError::ActiveResourceProtected(format!(
            "account {}",
            account_id
        )));
    }
    tx.execute("DELETE FROM accounts WHERE id=?1", params![account_id])?;
    balance::recompute_user_balance(&tx, account.user_id)?;
    tx.commit()?;
    Ok(())
}

pub fn create_category(conn: &mut Connection, user_id: i64, name: &str) -> Result<Category> {
    if name.trim().is_empty() {
        return Err(LedgerError::InvalidInput("category needs a name".into()));
    }
    super::fetch_user(conn, user_id)?;
    conn.execute(
        "INSERT INTO categories(user_id, name) VALUES (?1, ?2)",
        params![user_id, name.trim()],
    )?;
    Ok(Category {
        id: conn.last_insert_rowid(),
        user_id,
        name: name.trim().to_string(),
    })
}

/// Deletes a category. Transactions keep their rows with the category
/// nulled out; budgets for the category go with it (store-level cascade).
pub fn delete_category(conn: &mut Connection, category_id: i64) -> Result<()> {
    let changed = conn.execute("DELETE FROM categories WHERE id=?1", params![category_id])?;
    if changed == 0 {
        return Err(LedgerError::NotFound(format!("category {}", category_id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn registration_provisions_default_accounts() {
        let mut conn = db::open_in_memory().unwrap();
        let user = create_user(&mut conn, "t@Example.COM", "t", "pw").unwrap();
        assert_eq!(user.email, "t@example.com");

        let accounts: i64 = conn
            .query_row("SELECT COUNT(*) FROM accounts WHERE user_id=?1", [user.id], |r| r.get(0))
            .unwrap();
        assert_eq!(accounts, 1);
        let invest: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM investment_accounts WHERE user_id=?1",
                [user.id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(invest, 1);
        let active: i64 = conn
            .query_row("SELECT COUNT(*) FROM active_accounts WHERE user_id=?1", [user.id], |r| {
                r.get(0)
            })
            .unwrap();
        assert_eq!(active, 1);
        let active_invest: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM active_investment_accounts WHERE user_id=?1",
                [user.id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(active_invest, 1);
    }

    #[test]
    fn missing_email_is_invalid() {
        let mut conn = db::open_in_memory().unwrap();
        let err = create_user(&mut conn, "  ", "t", "pw").unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(users, 0);
    }

    #[test]
    fn active_account_cannot_be_deleted() {
        let mut conn = db::open_in_memory().unwrap();
        let user = create_user(&mut conn, "t@example.com", "t", "pw").unwrap();
        let active: i64 = conn
            .query_row(
                "SELECT account_id FROM active_accounts WHERE user_id=?1",
                [user.id],
                |r| r.get(0),
            )
            .unwrap();
        let err = delete_account(&mut conn, active).unwrap_err();
        assert!(matches!(err, LedgerError::ActiveResourceProtected(_)));
        let kept: i64 = conn
            .query_row("SELECT COUNT(*) FROM accounts WHERE id=?1", [active], |r| r.get(0))
            .unwrap();
        assert_eq!(kept, 1);
    }

    #[test]
    fn switching_active_account_allows_deleting_the_old_one() {
        let mut conn = db::open_in_memory().unwrap();
        let user = create_user(&mut conn, "t@example.com", "t", "pw").unwrap();
        let old: i64 = conn
            .query_row(
                "SELECT account_id FROM active_accounts WHERE user_id=?1",
                [user.id],
                |r| r.get(0),
            )
            .unwrap();
        let new = create_account(&mut conn, user.id, "Savings").unwrap();
        set_active_account(&mut conn, user.id, new.id).unwrap();
        delete_account(&mut conn, old).unwrap();
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM accounts WHERE user_id=?1", [user.id], |r| r.get(0))
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[test]
    fn foreign_account_cannot_become_active() {
        let mut conn = db::open_in_memory().unwrap();
        let owner = create_user(&mut conn, "a@example.com", "a", "pw").unwrap();
        let other = create_user(&mut conn, "b@example.com", "b", "pw").unwrap();
        let owned = create_account(&mut conn, owner.id, "Savings").unwrap();
        let err = set_active_account(&mut conn, other.id, owned.id).unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn category_delete_nulls_transactions_and_drops_budgets() {
        let mut conn = db::open_in_memory().unwrap();
        let user = create_user(&mut conn, "t@example.com", "t", "pw").unwrap();
        let account: i64 = conn
            .query_row(
                "SELECT account_id FROM active_accounts WHERE user_id=?1",
                [user.id],
                |r| r.get(0),
            )
            .unwrap();
        let cat = create_category(&mut conn, user.id, "Dining").unwrap();
        crate::ledger::budgets::set_budget(
            &mut conn,
            user.id,
            cat.id,
            rust_decimal::Decimal::new(5000, 2),
        )
        .unwrap();
        crate::ledger::transactions::create_transaction(
            &mut conn,
            account,
            rust_decimal::Decimal::new(10000, 2),
            crate::models::TransactionKind::Income,
            None,
            chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            "",
        )
        .unwrap();
        let spent = crate::ledger::transactions::create_transaction(
            &mut conn,
            account,
            rust_decimal::Decimal::new(2000, 2),
            crate::models::TransactionKind::Expense,
            Some(cat.id),
            chrono::NaiveDate::from_ymd_opt(2025, 3, 2).unwrap(),
            "",
        )
        .unwrap();

        delete_category(&mut conn, cat.id).unwrap();

        let category_ref: Option<i64> = conn
            .query_row(
                "SELECT category_id FROM transactions WHERE id=?1",
                [spent.id],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(category_ref, None);
        let budgets: i64 = conn
            .query_row("SELECT COUNT(*) FROM budgets", [], |r| r.get(0))
            .unwrap();
        assert_eq!(budgets, 0);
    }
}
