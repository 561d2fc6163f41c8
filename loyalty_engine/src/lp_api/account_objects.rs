use lp_common::Points;
use serde::Serialize;

use crate::db_types::UserAccount;

/// A user's current and lifetime-withdrawn points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceSummary {
    pub current: Points,
    pub withdrawn: Points,
}

impl From<&UserAccount> for BalanceSummary {
    fn from(account: &UserAccount) -> Self {
        Self { current: account.balance, withdrawn: account.withdrawn }
    }
}
