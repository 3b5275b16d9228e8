//! Remote service client: typed calls against the finance REST API.
//!
//! - `client` wraps reqwest with bearer auth read from the session
//! - `error` is the failure taxonomy callers match on
//! - `types` mirrors the service's wire formats

mod client;
mod error;
mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{
  ApiResponse, Credentials, Record, RecordDraft, RecordFilter, RecordPage, RecordType, ReportData,
  SortField, SortOrder, TokenPayload, TypeFilter, User,
};
