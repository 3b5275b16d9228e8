//! Entry states and the values entries carry.

use crate::api::{ApiError, Record, ReportData, User};
use std::sync::Arc;

/// Result of one fetch attempt.
pub type FetchResult = Result<QueryValue, ApiError>;

/// Lifecycle state of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
  /// Created but never fetched
  Idle,
  /// A fetch is in flight
  Loading,
  /// The latest fetch resolved
  Success,
  /// The latest fetch failed
  Error,
}

/// The shapes a cache entry can hold, one per fetchable endpoint family.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
  Records(Vec<Record>),
  Report(ReportData),
  User(User),
}

impl QueryValue {
  pub fn as_records(&self) -> Option<&[Record]> {
    match self {
      QueryValue::Records(records) => Some(records),
      _ => None,
    }
  }

  pub fn as_report(&self) -> Option<&ReportData> {
    match self {
      QueryValue::Report(report) => Some(report),
      _ => None,
    }
  }

  pub fn as_user(&self) -> Option<&User> {
    match self {
      QueryValue::User(user) => Some(user),
      _ => None,
    }
  }
}

/// Point-in-time view of a cache entry. Cheap to clone: the value is
/// shared behind an `Arc`, never copied per subscriber.
#[derive(Debug, Clone)]
pub struct QuerySnapshot {
  pub status: QueryStatus,
  pub value: Option<Arc<QueryValue>>,
  pub error: Option<ApiError>,
  pub subscribers: usize,
}

impl QuerySnapshot {
  /// Empty snapshot for a key with no entry.
  pub(crate) fn idle() -> Self {
    QuerySnapshot {
      status: QueryStatus::Idle,
      value: None,
      error: None,
      subscribers: 0,
    }
  }

  pub fn is_loading(&self) -> bool {
    self.status == QueryStatus::Loading
  }

  pub fn is_error(&self) -> bool {
    self.status == QueryStatus::Error
  }

  /// Loading, but an older value is still on hand to display.
  pub fn is_refreshing(&self) -> bool {
    self.is_loading() && self.value.is_some()
  }

  pub fn records(&self) -> Option<&[Record]> {
    self.value.as_deref().and_then(QueryValue::as_records)
  }

  pub fn report(&self) -> Option<&ReportData> {
    self.value.as_deref().and_then(QueryValue::as_report)
  }

  pub fn user(&self) -> Option<&User> {
    self.value.as_deref().and_then(QueryValue::as_user)
  }

  pub fn error_message(&self) -> Option<String> {
    self.error.as_ref().map(|e| e.to_string())
  }
}
