use crate::api::RecordType;
use ratatui::prelude::Color;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.len() <= max_len {
    s.to_string()
  } else {
    format!("{}...", &s[..max_len.saturating_sub(3)])
  }
}

/// Format an amount for display: `$12.34`, negatives as `-$12.34`
pub fn format_money(amount: f64) -> String {
  if amount < 0.0 {
    format!("-${:.2}", amount.abs())
  } else {
    format!("${:.2}", amount)
  }
}

/// Display color for a record type, shared by the table and the report
pub fn type_color(record_type: RecordType) -> Color {
  match record_type {
    RecordType::Income => Color::Cyan,
    RecordType::Expense => Color::Magenta,
  }
}
