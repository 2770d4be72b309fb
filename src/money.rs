//! Fixed-point monetary amounts.
//!
//! Amounts are stored in SQLite as decimal strings (e.g. "12.50") rather than
//! `REAL` so that sums are exact.

use std::{fmt::Display, iter::Sum, ops::Add, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::Error;

/// The number of decimal places kept for every amount.
const SCALE: u32 = 2;

/// An amount of money with exactly two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero, displayed as "0.00".
    pub const ZERO: Money = Money(Decimal::from_parts(0, 0, 0, false, SCALE));

    /// Create an amount from a number of cents, e.g. `Money::from_cents(1250)` is 12.50.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, SCALE))
    }

    /// Whether the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Whether the amount fits in a decimal(10, 2) column, which holds at
    /// most eight digits before the point.
    pub fn fits_storage(&self) -> bool {
        self.0.abs() < Decimal::new(100_000_000, 0)
    }

    fn from_decimal(mut value: Decimal) -> Result<Self, Error> {
        let raw = value.to_string();

        if value.normalize().scale() > SCALE {
            return Err(Error::InvalidAmount(raw));
        }

        value.rescale(SCALE);

        let money = Self(value);
        if !money.fits_storage() {
            return Err(Error::InvalidAmount(raw));
        }

        Ok(money)
    }
}

impl FromStr for Money {
    type Err = Error;

    /// Parse an amount such as "12.5" or "7.25".
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if `s` is not a number, has more than two
    /// decimal places, or does not fit in ten digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();

        let value =
            Decimal::from_str(trimmed).map_err(|_| Error::InvalidAmount(trimmed.to_owned()))?;

        Self::from_decimal(value)
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.to_string()))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;

        match Decimal::from_str(text) {
            Ok(mut decimal) => {
                decimal.rescale(SCALE);
                Ok(Money(decimal))
            }
            Err(error) => Err(FromSqlError::Other(Box::new(error))),
        }
    }
}

#[cfg(test)]
mod parse_tests {
    use crate::{Error, money::Money};

    #[test]
    fn parses_two_decimal_places() {
        let money: Money = "12.50".parse().unwrap();

        assert_eq!(money, Money::from_cents(1250));
        assert_eq!(money.to_string(), "12.50");
    }

    #[test]
    fn pads_to_two_decimal_places() {
        let money: Money = "7".parse().unwrap();

        assert_eq!(money.to_string(), "7.00");
    }

    #[test]
    fn rejects_more_than_two_decimal_places() {
        assert_eq!(
            "1.005".parse::<Money>(),
            Err(Error::InvalidAmount("1.005".to_owned()))
        );
    }

    #[test]
    fn rejects_text() {
        assert_eq!(
            "twelve".parse::<Money>(),
            Err(Error::InvalidAmount("twelve".to_owned()))
        );
    }

    #[test]
    fn rejects_amounts_that_do_not_fit_the_column() {
        assert!("100000000.00".parse::<Money>().is_err());
        assert!("99999999.99".parse::<Money>().is_ok());
    }

    #[test]
    fn sum_is_exact() {
        let amounts: Vec<Money> = ["0.10", "0.20", "0.30"]
            .iter()
            .map(|amount| amount.parse().unwrap())
            .collect();

        let total: Money = amounts.iter().sum();

        assert_eq!(total, Money::from_cents(60));
    }
}

#[cfg(test)]
mod sql_tests {
    use rusqlite::Connection;

    use crate::money::Money;

    #[test]
    fn round_trips_through_sqlite_as_text() {
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute("CREATE TABLE amount (value TEXT NOT NULL)", ())
            .unwrap();
        let want = Money::from_cents(1975);

        connection
            .execute("INSERT INTO amount (value) VALUES (?1)", (want,))
            .unwrap();

        let (stored, got): (String, Money) = connection
            .query_row("SELECT value, value FROM amount", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(stored, "19.75");
        assert_eq!(got, want);
    }
}
