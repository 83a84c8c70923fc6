//! Received shipment models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Shipment metadata.
///
/// A batch with a dispatch date but `is_completed == false` is in transit.
/// Completion happens exactly once and is what triggers allocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiveBatch {
    pub receive_number: String,
    pub shop_id: Uuid,
    pub series_name: String,
    pub dispatch_date: Option<NaiveDate>,
    pub estimated_arrival_date: Option<NaiveDate>,
    pub mode_of_transport: Option<String>,
    pub notes: Option<String>,
    pub is_completed: bool,
}

impl ReceiveBatch {
    pub fn is_dispatched(&self) -> bool {
        self.dispatch_date.is_some()
    }

    pub fn is_in_transit(&self) -> bool {
        self.is_dispatched() && !self.is_completed
    }
}

/// Physical quantity of one product/color in a batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiveLine {
    pub receive_number: String,
    /// Order the supplier shipped against, when known
    pub order_number: Option<String>,
    pub product_number: String,
    pub color: String,
    pub quantity: i64,
    pub actual_arrival_date: Option<NaiveDate>,
}

/// Widest numeric suffix a receive number may carry.
pub const MAX_RECEIVE_DIGITS: usize = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReceiveNumberError {
    #[error("Last receive number {0} has no numeric suffix")]
    Unrecognized(String),
    #[error("Receive numbers after {0} are exhausted")]
    Exhausted(String),
}

/// Generate the next receive number ("RCV-0007" -> "RCV-0008").
///
/// The prefix of the previous number is kept. Only a missing previous
/// number starts the sequence at 1.
pub fn next_receive_number(prefix: &str, last: Option<&str>) -> Result<String, ReceiveNumberError> {
    let Some(last) = last else {
        return Ok(format!("{}-{:04}", prefix, 1));
    };

    let (last_prefix, digits) = last
        .rsplit_once('-')
        .filter(|(_, d)| d.len() <= MAX_RECEIVE_DIGITS)
        .ok_or_else(|| ReceiveNumberError::Unrecognized(last.to_string()))?;
    let n = digits
        .parse::<u64>()
        .map_err(|_| ReceiveNumberError::Unrecognized(last.to_string()))?;

    let next = n
        .checked_add(1)
        .map(|n| format!("{:04}", n))
        .filter(|d| d.len() <= MAX_RECEIVE_DIGITS)
        .ok_or_else(|| ReceiveNumberError::Exhausted(last.to_string()))?;

    Ok(format!("{}-{}", last_prefix, next))
}
