//! Record writes and the cache refresh they trigger.
//!
//! Mutations run like cache fetches do: the HTTP call is spawned onto a
//! worker and its result comes back over a channel, applied during the
//! event-loop tick. A successful write invalidates every records listing
//! and the report, so subscribed views refetch rather than patch their
//! cached data in place.

use crate::api::{ApiClient, ApiError, RecordDraft};
use crate::query::{QueryClient, QueryKey};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// A write against the records collection.
#[derive(Debug, Clone)]
pub enum RecordMutation {
  Create(RecordDraft),
  Update { id: String, draft: RecordDraft },
  Delete { id: String },
}

impl RecordMutation {
  pub fn kind(&self) -> MutationKind {
    match self {
      RecordMutation::Create(_) => MutationKind::Create,
      RecordMutation::Update { .. } => MutationKind::Update,
      RecordMutation::Delete { .. } => MutationKind::Delete,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
  Create,
  Update,
  Delete,
}

impl MutationKind {
  fn verb(&self) -> &'static str {
    match self {
      MutationKind::Create => "create",
      MutationKind::Update => "update",
      MutationKind::Delete => "delete",
    }
  }

  fn default_notice(&self) -> &'static str {
    match self {
      MutationKind::Create => "Record created",
      MutationKind::Update => "Record updated",
      MutationKind::Delete => "Record deleted",
    }
  }
}

/// What a settled mutation produced: the service's success message when it
/// sent one, or the error.
#[derive(Debug, Clone)]
pub struct MutationOutcome {
  pub kind: MutationKind,
  pub result: Result<Option<String>, ApiError>,
}

impl MutationOutcome {
  pub fn is_success(&self) -> bool {
    self.result.is_ok()
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.result.as_ref().err()
  }

  /// User-facing notice text for the footer toast.
  pub fn notice(&self) -> String {
    match &self.result {
      Ok(Some(message)) => message.clone(),
      Ok(None) => self.kind.default_notice().to_string(),
      Err(error) => format!("Failed to {} record: {}", self.kind.verb(), error),
    }
  }
}

struct Settled {
  kind: MutationKind,
  result: Result<Option<String>, ApiError>,
}

/// Runs record writes and keeps the query cache honest afterwards.
///
/// Clones share the settlement channel, so views can `submit` while the
/// app drains outcomes with `pump` on its tick.
#[derive(Clone)]
pub struct MutationPipeline {
  api: ApiClient,
  queries: QueryClient,
  settlements_tx: mpsc::UnboundedSender<Settled>,
  settlements_rx: Rc<RefCell<mpsc::UnboundedReceiver<Settled>>>,
}

impl MutationPipeline {
  pub fn new(api: ApiClient, queries: QueryClient) -> Self {
    let (settlements_tx, settlements_rx) = mpsc::unbounded_channel();
    MutationPipeline {
      api,
      queries,
      settlements_tx,
      settlements_rx: Rc::new(RefCell::new(settlements_rx)),
    }
  }

  /// Fire-and-forget: run the mutation on a worker. Invalidation and the
  /// outcome notice happen on a later [`pump`](Self::pump).
  pub fn submit(&self, mutation: RecordMutation) {
    let api = self.api.clone();
    let tx = self.settlements_tx.clone();
    tokio::spawn(async move {
      let settled = execute(&api, mutation).await;
      // Ignore send errors - the pipeline may have been dropped
      let _ = tx.send(settled);
    });
  }

  /// Run one mutation to completion, including invalidation.
  #[allow(dead_code)]
  pub async fn perform(&self, mutation: RecordMutation) -> MutationOutcome {
    let settled = execute(&self.api, mutation).await;
    self.apply(settled)
  }

  /// Apply every settled mutation and report the outcomes. Call once per
  /// event-loop tick.
  pub fn pump(&self) -> Vec<MutationOutcome> {
    let mut outcomes = Vec::new();
    loop {
      let settled = match self.settlements_rx.borrow_mut().try_recv() {
        Ok(settled) => settled,
        Err(_) => break,
      };
      outcomes.push(self.apply(settled));
    }
    outcomes
  }

  fn apply(&self, settled: Settled) -> MutationOutcome {
    match &settled.result {
      Ok(_) => {
        info!(kind = ?settled.kind, "record mutation succeeded, refreshing records and report");
        self.queries.invalidate(QueryKey::depends_on_records);
      }
      Err(error) => {
        warn!(kind = ?settled.kind, %error, "record mutation failed");
      }
    }
    MutationOutcome {
      kind: settled.kind,
      result: settled.result,
    }
  }
}

async fn execute(api: &ApiClient, mutation: RecordMutation) -> Settled {
  match mutation {
    RecordMutation::Create(draft) => Settled {
      kind: MutationKind::Create,
      result: api.create_record(&draft).await.map(|r| r.message),
    },
    RecordMutation::Update { id, draft } => Settled {
      kind: MutationKind::Update,
      result: api.update_record(&id, &draft).await.map(|r| r.message),
    },
    RecordMutation::Delete { id } => Settled {
      kind: MutationKind::Delete,
      result: api.delete_record(&id).await.map(|r| r.message),
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::{RecordFilter, RecordType};
  use crate::query::{QueryStatus, QueryValue};
  use crate::session::Session;
  use chrono::{TimeZone, Utc};
  use std::time::Duration;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn draft() -> RecordDraft {
    RecordDraft {
      amount: 50.0,
      record_type: RecordType::Income,
      category: "Salary".to_string(),
      description: None,
      date: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
    }
  }

  fn record_json(id: &str, amount: f64) -> serde_json::Value {
    serde_json::json!({
      "_id": id,
      "userId": "u1",
      "amount": amount,
      "type": "Income",
      "category": "Salary",
      "description": null,
      "date": "2024-03-01T00:00:00.000Z"
    })
  }

  fn report_json(income: f64, expense: f64) -> serde_json::Value {
    serde_json::json!({
      "balance": income - expense,
      "totalIncome": income,
      "totalExpense": expense,
      "incomeCategories": {},
      "expenseCategories": {}
    })
  }

  async fn test_client(server: &MockServer) -> (ApiClient, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::load(dir.path().join("token.json")).unwrap();
    session.set_token("test-token").unwrap();
    let client = ApiClient::new(&server.uri(), session).unwrap();
    (client, dir)
  }

  fn subscribe_records(
    queries: &QueryClient,
    api: &ApiClient,
  ) -> crate::query::QuerySubscription {
    let api = api.clone();
    queries.subscribe(QueryKey::Records(RecordFilter::default()), move || {
      let api = api.clone();
      async move {
        api
          .fetch_records(&RecordFilter::default())
          .await
          .map(|page| QueryValue::Records(page.data))
      }
    })
  }

  fn subscribe_report(queries: &QueryClient, api: &ApiClient) -> crate::query::QuerySubscription {
    let api = api.clone();
    queries.subscribe(QueryKey::Report, move || {
      let api = api.clone();
      async move { api.fetch_report().await.map(QueryValue::Report) }
    })
  }

  /// Pump the cache until the subscription leaves the loading state.
  async fn settle(queries: &QueryClient, sub: &crate::query::QuerySubscription) {
    for _ in 0..100 {
      queries.pump();
      let status = sub.snapshot().status;
      if status != QueryStatus::Loading && status != QueryStatus::Idle {
        return;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("query never settled");
  }

  #[tokio::test]
  async fn test_create_refreshes_records_and_report() {
    let server = MockServer::start().await;

    // Before the mutation: no records, an empty report
    Mock::given(method("GET"))
      .and(path("/api/v1/records/"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(serde_json::json!({ "count": 0, "data": [] })),
      )
      .up_to_n_times(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/v1/report/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(report_json(0.0, 0.0)))
      .up_to_n_times(1)
      .mount(&server)
      .await;

    // After: the new record exists and totals moved
    Mock::given(method("GET"))
      .and(path("/api/v1/records/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "count": 1,
        "data": [record_json("r1", 50.0)]
      })))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/v1/report/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(report_json(50.0, 0.0)))
      .mount(&server)
      .await;

    Mock::given(method("POST"))
      .and(path("/api/v1/records/"))
      .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
        "data": record_json("r1", 50.0),
        "message": "Record added"
      })))
      .mount(&server)
      .await;

    let (api, _dir) = test_client(&server).await;
    let queries = QueryClient::new();
    let pipeline = MutationPipeline::new(api.clone(), queries.clone());

    let records = subscribe_records(&queries, &api);
    let report = subscribe_report(&queries, &api);
    settle(&queries, &records).await;
    settle(&queries, &report).await;

    assert_eq!(records.snapshot().records().unwrap().len(), 0);
    assert_eq!(report.snapshot().report().map(|r| r.balance), Some(0.0));

    let outcome = pipeline.perform(RecordMutation::Create(draft())).await;
    assert!(outcome.is_success());
    assert_eq!(outcome.notice(), "Record added");

    // Both derived entries are refetching, stale values still on display
    assert!(records.snapshot().is_refreshing());
    assert!(report.snapshot().is_refreshing());

    settle(&queries, &records).await;
    settle(&queries, &report).await;

    let page = records.snapshot();
    let fetched = page.records().unwrap().to_vec();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].id, "r1");
    assert_eq!(report.snapshot().report().map(|r| r.total_income), Some(50.0));
  }

  #[tokio::test]
  async fn test_delete_removes_record_from_next_read() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/api/v1/records/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "count": 1,
        "data": [record_json("r1", 50.0)]
      })))
      .up_to_n_times(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/api/v1/records/"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(serde_json::json!({ "count": 0, "data": [] })),
      )
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path("/api/v1/records/r1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "data": {},
        "message": "Record deleted"
      })))
      .mount(&server)
      .await;

    let (api, _dir) = test_client(&server).await;
    let queries = QueryClient::new();
    let pipeline = MutationPipeline::new(api.clone(), queries.clone());

    let records = subscribe_records(&queries, &api);
    settle(&queries, &records).await;
    assert_eq!(records.snapshot().records().unwrap().len(), 1);

    let outcome = pipeline
      .perform(RecordMutation::Delete {
        id: "r1".to_string(),
      })
      .await;
    assert_eq!(outcome.notice(), "Record deleted");

    settle(&queries, &records).await;
    assert_eq!(records.snapshot().records().unwrap().len(), 0);
  }

  #[tokio::test]
  async fn test_failed_mutation_invalidates_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
      .and(path("/api/v1/records/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "count": 1,
        "data": [record_json("r1", 50.0)]
      })))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("DELETE"))
      .and(path("/api/v1/records/r1"))
      .respond_with(
        ResponseTemplate::new(500).set_body_json(serde_json::json!({ "message": "db down" })),
      )
      .mount(&server)
      .await;

    let (api, _dir) = test_client(&server).await;
    let queries = QueryClient::new();
    let pipeline = MutationPipeline::new(api.clone(), queries.clone());

    let records = subscribe_records(&queries, &api);
    settle(&queries, &records).await;

    let outcome = pipeline
      .perform(RecordMutation::Delete {
        id: "r1".to_string(),
      })
      .await;

    assert!(!outcome.is_success());
    assert_eq!(
      outcome.notice(),
      "Failed to delete record: server error (500): db down"
    );
    // Entry untouched: still Success, not refetching
    let snapshot = records.snapshot();
    assert_eq!(snapshot.status, QueryStatus::Success);
    assert!(!snapshot.is_refreshing());
  }

  #[tokio::test]
  async fn test_submit_settles_through_pump() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
      .and(path("/api/v1/records/"))
      .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
        "data": record_json("r1", 50.0),
        "message": "Record added"
      })))
      .mount(&server)
      .await;

    let (api, _dir) = test_client(&server).await;
    let queries = QueryClient::new();
    let pipeline = MutationPipeline::new(api, queries);

    pipeline.submit(RecordMutation::Create(draft()));

    let mut outcomes = Vec::new();
    for _ in 0..100 {
      outcomes = pipeline.pump();
      if !outcomes.is_empty() {
        break;
      }
      tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].kind, MutationKind::Create);
    assert_eq!(outcomes[0].notice(), "Record added");
  }

  #[test]
  fn test_outcome_notice_texts() {
    let ok_with_message = MutationOutcome {
      kind: MutationKind::Create,
      result: Ok(Some("Record added".to_string())),
    };
    assert_eq!(ok_with_message.notice(), "Record added");

    let ok_plain = MutationOutcome {
      kind: MutationKind::Update,
      result: Ok(None),
    };
    assert_eq!(ok_plain.notice(), "Record updated");

    let failed = MutationOutcome {
      kind: MutationKind::Delete,
      result: Err(ApiError::Network("connection refused".to_string())),
    };
    assert_eq!(
      failed.notice(),
      "Failed to delete record: network error: connection refused"
    );
  }

  #[test]
  fn test_mutation_kind() {
    assert_eq!(RecordMutation::Create(draft()).kind(), MutationKind::Create);
    assert_eq!(
      RecordMutation::Delete {
        id: "r1".to_string()
      }
      .kind(),
      MutationKind::Delete
    );
  }
}
