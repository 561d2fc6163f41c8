use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::Duration,
};

use accrual_client::{AccrualApiError, AccrualLookup, AccrualResponse, AccrualStatus};
use loyalty_engine::{db_types::OrderNumber, AccrualProvider};
use lp_common::Points;

/// A canned answer from the accrual system.
#[derive(Debug, Clone)]
pub enum Reply {
    Status(AccrualStatus, Option<Points>),
    NotYetKnown,
    Fail,
    RateLimited(Duration),
    /// Answers with a body that cannot be decoded.
    Malformed,
    /// Never answers.
    Hang,
}

impl Reply {
    pub fn processed(points: &str) -> Self {
        Reply::Status(AccrualStatus::Processed, Some(points.parse().expect("Invalid points amount")))
    }

    pub fn processing() -> Self {
        Reply::Status(AccrualStatus::Processing, None)
    }

    pub fn invalid() -> Self {
        Reply::Status(AccrualStatus::Invalid, None)
    }
}

#[derive(Default)]
struct Script {
    replies: HashMap<OrderNumber, VecDeque<Reply>>,
    lookups: HashMap<OrderNumber, usize>,
}

/// An in-memory accrual system. Each order answers with its scripted replies in turn, repeating the last one.
/// Orders without a script are not known to the accrual system.
#[derive(Clone, Default)]
pub struct ScriptedProvider {
    script: Arc<Mutex<Script>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, order_number: &str, replies: Vec<Reply>) {
        let mut script = self.script.lock().unwrap();
        script.replies.insert(OrderNumber::from(order_number), replies.into());
    }

    pub fn lookups(&self, order_number: &str) -> usize {
        let script = self.script.lock().unwrap();
        script.lookups.get(&OrderNumber::from(order_number)).copied().unwrap_or(0)
    }

    fn next_reply(&self, order_number: &OrderNumber) -> Reply {
        let mut script = self.script.lock().unwrap();
        *script.lookups.entry(order_number.clone()).or_default() += 1;
        match script.replies.get_mut(order_number) {
            Some(replies) if replies.len() > 1 => replies.pop_front().unwrap(),
            Some(replies) => replies.front().cloned().unwrap_or(Reply::NotYetKnown),
            None => Reply::NotYetKnown,
        }
    }
}

impl AccrualProvider for ScriptedProvider {
    async fn lookup(&self, order_number: &OrderNumber) -> Result<AccrualLookup, AccrualApiError> {
        match self.next_reply(order_number) {
            Reply::Status(status, accrual) => {
                let mut response = AccrualResponse::new(order_number.as_str(), status);
                response.accrual = accrual;
                Ok(AccrualLookup::Known(response))
            },
            Reply::NotYetKnown => Ok(AccrualLookup::NotYetKnown),
            Reply::Fail => Err(AccrualApiError::QueryError { status: 500, message: "Internal Server Error".into() }),
            Reply::RateLimited(retry_after) => Err(AccrualApiError::RateLimited { retry_after }),
            Reply::Malformed => Err(AccrualApiError::JsonError("accrual cannot be negative (-5.00)".into())),
            Reply::Hang => std::future::pending().await,
        }
    }
}
