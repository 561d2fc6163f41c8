use std::{fmt::Display, str::FromStr};

use lp_common::Points;
use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// The order status vocabulary used by the accrual system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccrualStatus {
    /// The order is known to the accrual system, but no reward has been calculated yet.
    Registered,
    /// The reward is being calculated.
    Processing,
    /// The order will never earn a reward.
    Invalid,
    /// The reward has been calculated.
    Processed,
}

impl AccrualStatus {
    /// `Invalid` and `Processed` are final. The accrual system will never report a different outcome for the order.
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

impl Display for AccrualStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid accrual status: {0}")]
pub struct StatusConversionError(pub String);

impl FromStr for AccrualStatus {
    type Err = StatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "REGISTERED" => Ok(Self::Registered),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(StatusConversionError(s.to_string())),
        }
    }
}

/// The body of a successful order lookup, e.g. `{"order": "2377225624", "status": "PROCESSED", "accrual": 500}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualResponse {
    pub order: String,
    pub status: AccrualStatus,
    /// Never negative. Bodies with a negative reward are rejected when decoding.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "non_negative_points")]
    pub accrual: Option<Points>,
}

fn non_negative_points<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Points>, D::Error> {
    match Option::<Points>::deserialize(deserializer)? {
        Some(points) if points.is_negative() => Err(D::Error::custom(format!("accrual cannot be negative ({points})"))),
        points => Ok(points),
    }
}

impl AccrualResponse {
    pub fn new(order: &str, status: AccrualStatus) -> Self {
        Self { order: order.to_string(), status, accrual: None }
    }

    pub fn with_accrual(mut self, accrual: Points) -> Self {
        self.accrual = Some(accrual);
        self
    }
}

/// The outcome of a lookup that reached the accrual system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccrualLookup {
    Known(AccrualResponse),
    /// The accrual system has not registered the order (yet).
    NotYetKnown,
}
