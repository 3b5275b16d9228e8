//! Serde types matching the finance service's wire formats.
//!
//! Field names follow the service's JSON exactly (via serde renames) so
//! the rest of the crate can use Rust naming.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Response envelopes
// ============================================================================

/// Standard single-object envelope: `{ "data": ..., "message": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
  pub data: T,
  pub message: Option<String>,
}

/// List envelope returned by the records endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordPage {
  pub count: u64,
  pub data: Vec<Record>,
}

/// Payload of a successful login or register call.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPayload {
  pub token: String,
}

// ============================================================================
// Domain records
// ============================================================================

/// Whether a record adds to or subtracts from the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum RecordType {
  Income,
  Expense,
}

impl RecordType {
  pub fn label(&self) -> &'static str {
    match self {
      RecordType::Income => "Income",
      RecordType::Expense => "Expense",
    }
  }

  /// Category pick list offered by the reference service for this type.
  pub fn default_categories(&self) -> &'static [&'static str] {
    match self {
      RecordType::Income => &["Salary", "Freelance", "Misc"],
      RecordType::Expense => &[
        "Food",
        "Groceries",
        "Transportation",
        "Entertainment",
        "Clothing",
        "Utilities",
        "Medical",
        "Education",
        "Insurance",
        "Donations",
        "Misc",
      ],
    }
  }
}

/// A single income or expense entry as served by the records endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Record {
  #[serde(rename = "_id")]
  pub id: String,
  #[serde(rename = "userId")]
  pub user_id: String,
  pub amount: f64,
  #[serde(rename = "type")]
  pub record_type: RecordType,
  pub category: String,
  pub description: Option<String>,
  pub date: DateTime<Utc>,
}

/// Payload for creating a record. Updates wrap this in [`RecordUpdate`]
/// because the service expects the id inside the PUT body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDraft {
  pub amount: f64,
  #[serde(rename = "type")]
  pub record_type: RecordType,
  pub category: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub date: DateTime<Utc>,
}

/// PUT body for record updates.
#[derive(Debug, Serialize)]
pub struct RecordUpdate<'a> {
  #[serde(rename = "_id")]
  pub id: &'a str,
  pub amount: f64,
  #[serde(rename = "type")]
  pub record_type: RecordType,
  pub category: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<&'a str>,
  pub date: DateTime<Utc>,
}

impl<'a> RecordUpdate<'a> {
  pub fn new(id: &'a str, draft: &'a RecordDraft) -> Self {
    RecordUpdate {
      id,
      amount: draft.amount,
      record_type: draft.record_type,
      category: &draft.category,
      description: draft.description.as_deref(),
      date: draft.date,
    }
  }
}

// ============================================================================
// Users and auth
// ============================================================================

/// The authenticated user as served by the me endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
  #[serde(rename = "_id")]
  pub id: String,
  pub email: String,
}

/// Login/register request body.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
  pub email: String,
  pub password: String,
}

// ============================================================================
// Report
// ============================================================================

/// Aggregate totals served by the report endpoint (no envelope).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReportData {
  pub balance: f64,
  #[serde(rename = "totalIncome")]
  pub total_income: f64,
  #[serde(rename = "totalExpense")]
  pub total_expense: f64,
  #[serde(rename = "incomeCategories", default)]
  pub income_categories: BTreeMap<String, f64>,
  #[serde(rename = "expenseCategories", default)]
  pub expense_categories: BTreeMap<String, f64>,
}

impl ReportData {
  /// Share of `part` within `total` as a percentage. Defined as 0 when the
  /// total is 0, so an empty account renders empty bars instead of a fake
  /// even split.
  pub fn share_percent(part: f64, total: f64) -> f64 {
    if total <= 0.0 {
      0.0
    } else {
      part / total * 100.0
    }
  }

  /// Expense share of all recorded volume.
  pub fn expense_percent(&self) -> f64 {
    Self::share_percent(self.total_expense, self.total_income + self.total_expense)
  }

  /// Income share of all recorded volume.
  pub fn income_percent(&self) -> f64 {
    Self::share_percent(self.total_income, self.total_income + self.total_expense)
  }
}

// ============================================================================
// Records query parameters
// ============================================================================

/// Server-side type filter for the records list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TypeFilter {
  #[default]
  All,
  Income,
  Expense,
}

impl TypeFilter {
  pub fn label(&self) -> &'static str {
    match self {
      TypeFilter::All => "All",
      TypeFilter::Income => "Income",
      TypeFilter::Expense => "Expense",
    }
  }

  /// Query parameter value. All sends no `type` parameter at all.
  pub fn as_param(&self) -> Option<&'static str> {
    match self {
      TypeFilter::All => None,
      TypeFilter::Income => Some("Income"),
      TypeFilter::Expense => Some("Expense"),
    }
  }

  /// Cycle order used by the filter key in the records view.
  pub fn next(&self) -> TypeFilter {
    match self {
      TypeFilter::All => TypeFilter::Income,
      TypeFilter::Income => TypeFilter::Expense,
      TypeFilter::Expense => TypeFilter::All,
    }
  }
}

/// Column the records endpoint sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortField {
  #[default]
  Date,
  Type,
  Amount,
  Category,
  Description,
}

impl SortField {
  pub fn as_param(&self) -> &'static str {
    match self {
      SortField::Date => "date",
      SortField::Type => "type",
      SortField::Amount => "amount",
      SortField::Category => "category",
      SortField::Description => "description",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      SortField::Date => "Date",
      SortField::Type => "Type",
      SortField::Amount => "Amount",
      SortField::Category => "Category",
      SortField::Description => "Description",
    }
  }
}

/// Sort direction. The default listing is newest-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

impl SortOrder {
  pub fn as_param(&self) -> &'static str {
    match self {
      SortOrder::Asc => "asc",
      SortOrder::Desc => "desc",
    }
  }

  pub fn toggled(&self) -> SortOrder {
    match self {
      SortOrder::Asc => SortOrder::Desc,
      SortOrder::Desc => SortOrder::Asc,
    }
  }
}

/// Full query parameter set accepted by the records list endpoint.
/// Doubles as the cache identity for records queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RecordFilter {
  pub type_filter: TypeFilter,
  pub sort_by: SortField,
  pub order: SortOrder,
}
