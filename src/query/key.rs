//! Cache keys. Structural equality is the de-duplication identity: two
//! subscribers asking for the same key share one entry and one fetch.

use crate::api::RecordFilter;

/// Identity of a cacheable read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
  /// The authenticated user (me endpoint)
  CurrentUser,
  /// Aggregate balance/category report
  Report,
  /// Records list under a specific filter and sort
  Records(RecordFilter),
}

impl QueryKey {
  /// Whether this key's data is derived from records, i.e. must be
  /// refreshed after any record mutation.
  pub fn depends_on_records(&self) -> bool {
    matches!(self, QueryKey::Records(_) | QueryKey::Report)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{RecordFilter, SortField, SortOrder, TypeFilter};

  #[test]
  fn test_identical_filters_are_one_key() {
    let a = QueryKey::Records(RecordFilter::default());
    let b = QueryKey::Records(RecordFilter::default());
    assert_eq!(a, b);
  }

  #[test]
  fn test_filter_params_distinguish_keys() {
    let base = RecordFilter::default();
    let a = QueryKey::Records(base);
    let b = QueryKey::Records(RecordFilter {
      order: SortOrder::Asc,
      ..base
    });
    let c = QueryKey::Records(RecordFilter {
      sort_by: SortField::Amount,
      ..base
    });
    let d = QueryKey::Records(RecordFilter {
      type_filter: TypeFilter::Expense,
      ..base
    });

    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_ne!(a, d);
    assert_ne!(b, c);
  }

  #[test]
  fn test_record_mutations_touch_records_and_report() {
    assert!(QueryKey::Records(RecordFilter::default()).depends_on_records());
    assert!(QueryKey::Report.depends_on_records());
    assert!(!QueryKey::CurrentUser.depends_on_records());
  }
}
