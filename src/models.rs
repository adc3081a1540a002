// Copyright (c) 2025 Pocketledger Contributors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Direction of a cash transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        match s {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            other => Err(LedgerError::InvalidInput(format!(
                "unknown transaction kind '{}'",
                other
            ))),
        }
    }
}

/// Side of an investment transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }

    pub fn parse(s: &str) -> Result<Self, LedgerError> {
        match s {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            other => Err(LedgerError::InvalidInput(format!(
                "unknown trade side '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    /// Derived: sum of owned account balances. Written only by the
    /// propagation engine.
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// Derived: net effect of the account's transactions.
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub description: String,
    pub kind: TransactionKind,
    pub category_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    /// Spending cap.
    pub amount: Decimal,
    /// Derived: running total of expense transactions in the category.
    pub spent: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentAccount {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    /// Uninvested cash available for buys.
    pub amount_to_invest: Decimal,
    /// Derived: sum of held position values.
    pub total_investment: Decimal,
    /// Derived: amount_to_invest + total_investment.
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub name: String,
    /// Current unit price, externally updated. Four decimal places.
    pub value: Decimal,
    pub kind: String,
}

/// A held quantity of an asset within an investment account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: i64,
    pub investment_account_id: i64,
    pub asset_id: i64,
    pub quantity_have: Decimal,
    /// Derived: quantity_have * asset.value.
    pub total_value: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvestmentTransaction {
    pub id: i64,
    pub investment_account_id: i64,
    pub position_id: i64,
    pub quantity: Decimal,
    pub date: NaiveDate,
    /// Unit price at execution. Four decimal places.
    pub initial_value: Decimal,
    pub side: TradeSide,
}
