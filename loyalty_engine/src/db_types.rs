use std::{fmt::Display, str::FromStr};

use accrual_client::AccrualStatus;
use chrono::{DateTime, Utc};
pub use lp_common::Points;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------     OrderNumber       ---------------------------------------------------------
/// The number a user registers an order under. Order numbers are globally unique.
///
/// Validation of the number (e.g. the Luhn checksum) happens in the front end, before it reaches the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    pub fn new<S: Into<String>>(number: S) -> Self {
        Self(number.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been registered, but the accrual system has not started calculating the reward.
    Registered,
    /// The accrual system is calculating the reward for the order.
    Processing,
    /// The order does not earn a reward. Final.
    Invalid,
    /// The reward has been calculated and credited. Final.
    Processed,
}

impl OrderStatusType {
    /// Orders in a terminal state never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Registered => "REGISTERED",
            Self::Processing => "PROCESSING",
            Self::Invalid => "INVALID",
            Self::Processed => "PROCESSED",
        }
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REGISTERED" => Ok(Self::Registered),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<AccrualStatus> for OrderStatusType {
    fn from(status: AccrualStatus) -> Self {
        match status {
            AccrualStatus::Registered => Self::Registered,
            AccrualStatus::Processing => Self::Processing,
            AccrualStatus::Invalid => Self::Invalid,
            AccrualStatus::Processed => Self::Processed,
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub user_id: i64,
    pub status: OrderStatusType,
    /// The reward for the order. Only meaningful once the order is `PROCESSED`.
    pub accrual: Option<Points>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------     UserAccount       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct UserAccount {
    pub id: i64,
    pub login: String,
    /// Opaque. Produced and checked by the authentication layer.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub balance: Points,
    /// The sum of all withdrawals ever made from this account.
    pub withdrawn: Points,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      Withdrawal       ---------------------------------------------------------
/// A record of points spent by a user. Withdrawals are never modified once written.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    /// The order the points were spent on. It does not have to be a registered order.
    pub order_number: String,
    pub amount: Points,
    pub processed_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trip() {
        for s in ["REGISTERED", "PROCESSING", "INVALID", "PROCESSED"] {
            let status = s.parse::<OrderStatusType>().unwrap();
            assert_eq!(status.to_string(), s);
        }
        assert!("NEW".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatusType::Processed.is_terminal());
        assert!(OrderStatusType::Invalid.is_terminal());
        assert!(!OrderStatusType::Registered.is_terminal());
        assert!(!OrderStatusType::Processing.is_terminal());
        assert_eq!(OrderStatusType::from(AccrualStatus::Processing), OrderStatusType::Processing);
    }

    #[test]
    fn order_number_display() {
        let number = OrderNumber::from("12345678903");
        assert_eq!(number.to_string(), "#12345678903");
        assert_eq!(number.as_str(), "12345678903");
    }
}
