//! Defines the core data models for transactions and their items.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::{
    Error, UserID,
    category::CategoryId,
    client::ClientId,
    database_id::{TransactionId, TransactionItemId},
    member::MemberId,
    money::Money,
};

/// How a transaction was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    Pix,
    Cash,
    DebitCard,
    CreditCard,
}

impl PaymentMethod {
    /// Every payment method, in the order they are offered in the form.
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Pix,
        PaymentMethod::Cash,
        PaymentMethod::DebitCard,
        PaymentMethod::CreditCard,
    ];

    /// The label shown to users, which is also the stored value.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "PIX",
            PaymentMethod::Cash => "Dinheiro",
            PaymentMethod::DebitCard => "Cartão de débito",
            PaymentMethod::CreditCard => "Cartão de crédito",
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.label() == s)
            .ok_or_else(|| Error::InvalidField {
                field: "payment_method",
                reason: if s.is_empty() {
                    "Payment method is required".to_owned()
                } else {
                    format!("\"{s}\" is not a known payment method")
                },
            })
    }
}

impl Serialize for PaymentMethod {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.label())
    }
}

impl ToSql for PaymentMethod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.label()))
    }
}

impl FromSql for PaymentMethod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: Error| FromSqlError::Other(Box::new(error)))
    }
}

/// One line of a transaction, booked against a category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionItem {
    pub id: TransactionItemId,
    pub category_id: CategoryId,
    pub category_name: String,
    pub item_amount: Money,
    pub item_description: Option<String>,
    pub member_id: Option<MemberId>,
    /// `None` when the item has no member or the member has been deleted.
    pub member_name: Option<String>,
    /// The months a membership fee pays for, e.g. "Jan/2025".
    pub reference_months: Option<String>,
    pub vehicle_type: Option<String>,
}

/// A transaction with its live items and the names of its user and client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// The sum of the item amounts.
    pub total_amount: Money,
    pub transaction_date: Date,
    pub payment_method: PaymentMethod,
    pub description: Option<String>,
    pub user_id: UserID,
    pub user_name: String,
    pub client_id: ClientId,
    pub client_name: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub items: Vec<TransactionItem>,
}

/// A row of the transactions table. Items are not loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub id: TransactionId,
    pub total_amount: Money,
    pub transaction_date: Date,
    pub payment_method: PaymentMethod,
    pub description: Option<String>,
    pub user_name: String,
    pub client_name: String,
}

/// The fields of a transaction item to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransactionItem {
    pub category_id: CategoryId,
    pub item_amount: Money,
    pub item_description: Option<String>,
    pub member_id: Option<MemberId>,
    pub reference_months: Option<String>,
    pub vehicle_type: Option<String>,
}

impl NewTransactionItem {
    /// An item with only the required fields set.
    pub fn new(category_id: CategoryId, item_amount: Money) -> Self {
        Self {
            category_id,
            item_amount,
            item_description: None,
            member_id: None,
            reference_months: None,
            vehicle_type: None,
        }
    }

    /// Set the member the item is for.
    pub fn member_id(mut self, member_id: Option<MemberId>) -> Self {
        self.member_id = member_id;
        self
    }
}

/// The fields of a transaction and its items to be written.
///
/// The total is not part of the input, it is always the sum of the items.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub transaction_date: Date,
    pub payment_method: PaymentMethod,
    pub description: Option<String>,
    pub client_id: ClientId,
    pub items: Vec<NewTransactionItem>,
}

impl NewTransaction {
    /// Check the rules that do not need the database, see [validate_items].
    ///
    /// # Errors
    ///
    /// Returns the first error found by [validate_items].
    pub fn validate(&self) -> Result<(), Error> {
        validate_items(&self.items)
    }

    /// The exact sum of the item amounts.
    pub fn total_amount(&self) -> Money {
        self.items.iter().map(|item| item.item_amount).sum()
    }
}

/// Check that there is at least one item, every item amount is positive and
/// the total fits in a stored amount.
///
/// # Errors
///
/// Returns [Error::NoTransactionItems] if there are no items,
/// [Error::NonPositiveItemAmount] for the first item with an amount of zero or
/// less, or [Error::TotalAmountTooLarge] if the items add up to too much.
pub fn validate_items(items: &[NewTransactionItem]) -> Result<(), Error> {
    if items.is_empty() {
        return Err(Error::NoTransactionItems);
    }

    if let Some((index, item)) = items
        .iter()
        .enumerate()
        .find(|(_, item)| !item.item_amount.is_positive())
    {
        return Err(Error::NonPositiveItemAmount {
            index,
            amount: item.item_amount,
        });
    }

    let total: Money = items.iter().map(|item| item.item_amount).sum();
    if !total.fits_storage() {
        return Err(Error::TotalAmountTooLarge(total));
    }

    Ok(())
}

#[cfg(test)]
mod payment_method_tests {
    use crate::{Error, transaction::PaymentMethod};

    #[test]
    fn parses_labels() {
        for method in PaymentMethod::ALL {
            assert_eq!(method.label().parse::<PaymentMethod>(), Ok(method));
        }
    }

    #[test]
    fn rejects_unknown_method() {
        assert!(matches!(
            "Cheque".parse::<PaymentMethod>(),
            Err(Error::InvalidField {
                field: "payment_method",
                ..
            })
        ));
    }
}
