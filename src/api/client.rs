//! HTTP client for the finance service's REST API.

use super::error::{ApiError, ErrorBody};
use super::types::{
  ApiResponse, Credentials, Record, RecordDraft, RecordFilter, RecordPage, RecordUpdate,
  ReportData, TokenPayload, User,
};
use crate::session::Session;
use color_eyre::{eyre::eyre, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Typed client for the finance service.
///
/// Cheap to clone. The bearer token is read from the [`Session`] at call
/// time rather than captured at construction, so clearing the session is
/// visible to the very next request.
#[derive(Debug, Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
  host: String,
  session: Session,
}

impl ApiClient {
  pub fn new(base_url: &str, session: Session) -> Result<Self> {
    let parsed =
      Url::parse(base_url).map_err(|e| eyre!("Invalid service URL {}: {}", base_url, e))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
      return Err(eyre!("Service URL must be http(s): {}", base_url));
    }

    let host = match (parsed.host_str(), parsed.port()) {
      (Some(host), Some(port)) => format!("{}:{}", host, port),
      (Some(host), None) => host.to_string(),
      (None, _) => return Err(eyre!("Service URL has no host: {}", base_url)),
    };

    let http = reqwest::Client::builder()
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(ApiClient {
      http,
      base_url: base_url.trim_end_matches('/').to_string(),
      host,
      session,
    })
  }

  /// Host (and port) the client talks to, for display in the header.
  pub fn host(&self) -> &str {
    &self.host
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  /// Bearer-authenticated request builder. Fails fast with `Unauthorized`
  /// when no token is present instead of sending a doomed request.
  fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
    let token = self.session.token().ok_or_else(|| ApiError::Unauthorized {
      message: "not logged in".to_string(),
    })?;
    Ok(self.http.request(method, self.url(path)).bearer_auth(token))
  }

  // ==========================================================================
  // Auth endpoints
  // ==========================================================================

  pub async fn login(&self, credentials: &Credentials) -> Result<ApiResponse<TokenPayload>, ApiError> {
    debug!("POST /api/v1/users/login");
    let response = self
      .http
      .post(self.url("/api/v1/users/login"))
      .json(credentials)
      .send()
      .await?;
    decode(response).await
  }

  pub async fn register(
    &self,
    credentials: &Credentials,
  ) -> Result<ApiResponse<TokenPayload>, ApiError> {
    debug!("POST /api/v1/users/register");
    let response = self
      .http
      .post(self.url("/api/v1/users/register"))
      .json(credentials)
      .send()
      .await?;
    decode(response).await
  }

  pub async fn fetch_current_user(&self) -> Result<User, ApiError> {
    debug!("GET /api/v1/users/me");
    let response = self.authed(Method::GET, "/api/v1/users/me")?.send().await?;
    let envelope: ApiResponse<User> = decode(response).await?;
    Ok(envelope.data)
  }

  // ==========================================================================
  // Records
  // ==========================================================================

  pub async fn fetch_records(&self, filter: &RecordFilter) -> Result<RecordPage, ApiError> {
    debug!(?filter, "GET /api/v1/records/");
    let mut request = self.authed(Method::GET, "/api/v1/records/")?.query(&[
      ("sortBy", filter.sort_by.as_param()),
      ("order", filter.order.as_param()),
    ]);
    // All types: the parameter is omitted, not sent empty
    if let Some(type_param) = filter.type_filter.as_param() {
      request = request.query(&[("type", type_param)]);
    }

    let response = request.send().await?;
    decode(response).await
  }

  pub async fn create_record(&self, draft: &RecordDraft) -> Result<ApiResponse<Record>, ApiError> {
    debug!("POST /api/v1/records/");
    let response = self
      .authed(Method::POST, "/api/v1/records/")?
      .json(draft)
      .send()
      .await?;
    decode(response).await
  }

  pub async fn update_record(
    &self,
    id: &str,
    draft: &RecordDraft,
  ) -> Result<ApiResponse<Record>, ApiError> {
    debug!(id, "PUT /api/v1/records/{{id}}");
    let response = self
      .authed(Method::PUT, &format!("/api/v1/records/{}", id))?
      .json(&RecordUpdate::new(id, draft))
      .send()
      .await?;
    decode(response).await
  }

  pub async fn delete_record(&self, id: &str) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    debug!(id, "DELETE /api/v1/records/{{id}}");
    let response = self
      .authed(Method::DELETE, &format!("/api/v1/records/{}", id))?
      .send()
      .await?;
    decode(response).await
  }

  // ==========================================================================
  // Report
  // ==========================================================================

  pub async fn fetch_report(&self) -> Result<ReportData, ApiError> {
    debug!("GET /api/v1/report/");
    let response = self.authed(Method::GET, "/api/v1/report/")?.send().await?;
    decode(response).await
  }
}

/// Parse a response body as `T`, classifying non-success statuses into the
/// [`ApiError`] taxonomy.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
  let status = response.status();
  if status.is_success() {
    return response
      .json::<T>()
      .await
      .map_err(|e| ApiError::Decode(e.to_string()));
  }

  let message = read_error_message(response, status).await;
  Err(ApiError::from_status(status.as_u16(), message))
}

/// The service reports failures as `{ "message": ... }`; fall back to the
/// HTTP reason phrase when the body is something else.
async fn read_error_message(response: Response, status: StatusCode) -> String {
  match response.json::<ErrorBody>().await {
    Ok(ErrorBody {
      message: Some(message),
    }) => message,
    _ => status
      .canonical_reason()
      .unwrap_or("request failed")
      .to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{RecordType, SortField, SortOrder, TypeFilter};
  use chrono::{TimeZone, Utc};
  use wiremock::matchers::{body_json, header, method, path, query_param, query_param_is_missing};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn logged_out_client(server: &MockServer) -> (ApiClient, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::load(dir.path().join("token.json")).unwrap();
    let client = ApiClient::new(&server.uri(), session).unwrap();
    (client, dir)
  }

  fn logged_in_client(server: &MockServer) -> (ApiClient, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::load(dir.path().join("token.json")).unwrap();
    session.set_token("test-token").unwrap();
    let client = ApiClient::new(&server.uri(), session).unwrap();
    (client, dir)
  }

  fn record_json(id: &str, amount: f64) -> serde_json::Value {
    serde_json::json!({
      "_id": id,
      "userId": "u1",
      "amount": amount,
      "type": "Expense",
      "category": "Food",
      "description": "lunch",
      "date": "2024-03-05T00:00:00.000Z"
    })
  }

  #[test]
  fn test_rejects_non_http_urls() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::load(dir.path().join("token.json")).unwrap();
    assert!(ApiClient::new("ftp://example.com", session.clone()).is_err());
    assert!(ApiClient::new("not a url", session).is_err());
  }

  #[tokio::test]
  async fn test_login_posts_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/v1/users/login"))
      .and(body_json(serde_json::json!({
        "email": "kim@example.com",
        "password": "hunter22"
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "data": { "token": "t1" },
        "message": "Login successful"
      })))
      .mount(&server)
      .await;

    let (client, _dir) = logged_out_client(&server);
    let credentials = Credentials {
      email: "kim@example.com".to_string(),
      password: "hunter22".to_string(),
    };
    let envelope = client.login(&credentials).await.unwrap();

    assert_eq!(envelope.data.token, "t1");
    assert_eq!(envelope.message.as_deref(), Some("Login successful"));
  }

  #[tokio::test]
  async fn test_records_sends_bearer_and_sort_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/records/"))
      .and(header("authorization", "Bearer test-token"))
      .and(query_param("sortBy", "date"))
      .and(query_param("order", "desc"))
      .and(query_param_is_missing("type"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "count": 1,
        "data": [record_json("r1", 12.5)]
      })))
      .mount(&server)
      .await;

    let (client, _dir) = logged_in_client(&server);
    let page = client.fetch_records(&RecordFilter::default()).await.unwrap();

    assert_eq!(page.count, 1);
    assert_eq!(page.data[0].id, "r1");
    assert_eq!(page.data[0].amount, 12.5);
  }

  #[tokio::test]
  async fn test_records_sends_type_param_when_filtered() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/records/"))
      .and(query_param("type", "Income"))
      .and(query_param("sortBy", "amount"))
      .and(query_param("order", "asc"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "count": 0,
        "data": []
      })))
      .mount(&server)
      .await;

    let (client, _dir) = logged_in_client(&server);
    let filter = RecordFilter {
      type_filter: TypeFilter::Income,
      sort_by: SortField::Amount,
      order: SortOrder::Asc,
    };
    let page = client.fetch_records(&filter).await.unwrap();
    assert_eq!(page.count, 0);
  }

  #[tokio::test]
  async fn test_missing_token_short_circuits() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/records/"))
      .respond_with(ResponseTemplate::new(200))
      .expect(0)
      .mount(&server)
      .await;

    let (client, _dir) = logged_out_client(&server);
    let err = client.fetch_records(&RecordFilter::default()).await.unwrap_err();

    assert!(err.is_unauthorized());
  }

  #[tokio::test]
  async fn test_401_maps_to_unauthorized_with_service_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/users/me"))
      .respond_with(
        ResponseTemplate::new(401).set_body_json(serde_json::json!({ "message": "jwt expired" })),
      )
      .mount(&server)
      .await;

    let (client, _dir) = logged_in_client(&server);
    let err = client.fetch_current_user().await.unwrap_err();

    assert_eq!(
      err,
      ApiError::Unauthorized {
        message: "jwt expired".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_4xx_maps_to_validation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/v1/records/"))
      .respond_with(
        ResponseTemplate::new(400)
          .set_body_json(serde_json::json!({ "message": "amount is required" })),
      )
      .mount(&server)
      .await;

    let (client, _dir) = logged_in_client(&server);
    let draft = RecordDraft {
      amount: 1.0,
      record_type: RecordType::Expense,
      category: "Food".to_string(),
      description: None,
      date: Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
    };
    let err = client.create_record(&draft).await.unwrap_err();

    assert_eq!(
      err,
      ApiError::Validation {
        status: 400,
        message: "amount is required".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_5xx_maps_to_server_with_fallback_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/report/"))
      .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
      .mount(&server)
      .await;

    let (client, _dir) = logged_in_client(&server);
    let err = client.fetch_report().await.unwrap_err();

    assert_eq!(
      err,
      ApiError::Server {
        status: 500,
        message: "Internal Server Error".to_string()
      }
    );
  }

  #[tokio::test]
  async fn test_malformed_success_body_maps_to_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/report/"))
      .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
      .mount(&server)
      .await;

    let (client, _dir) = logged_in_client(&server);
    let err = client.fetch_report().await.unwrap_err();

    assert!(matches!(err, ApiError::Decode(_)));
  }

  #[tokio::test]
  async fn test_unreachable_service_maps_to_network() {
    // Pooled servers (`MockServer::start`) keep their listener alive after
    // drop; only an exclusive builder-made server actually shuts down.
    let server = MockServer::builder().start().await;
    let (client, _dir) = logged_in_client(&server);
    drop(server);

    let err = client.fetch_report().await.unwrap_err();
    assert!(matches!(err, ApiError::Network(_)));
  }

  #[tokio::test]
  async fn test_update_puts_id_in_body() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
      .and(path("/api/v1/records/r42"))
      .and(body_json(serde_json::json!({
        "_id": "r42",
        "amount": 20.0,
        "type": "Income",
        "category": "Salary",
        "description": "march",
        "date": "2024-03-01T00:00:00Z"
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "data": record_json("r42", 20.0),
        "message": "Record updated"
      })))
      .mount(&server)
      .await;

    let (client, _dir) = logged_in_client(&server);
    let draft = RecordDraft {
      amount: 20.0,
      record_type: RecordType::Income,
      category: "Salary".to_string(),
      description: Some("march".to_string()),
      date: Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
    };
    let envelope = client.update_record("r42", &draft).await.unwrap();

    assert_eq!(envelope.message.as_deref(), Some("Record updated"));
  }

  #[tokio::test]
  async fn test_delete_hits_record_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
      .and(path("/api/v1/records/r42"))
      .and(header("authorization", "Bearer test-token"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "data": {},
        "message": "Record deleted"
      })))
      .mount(&server)
      .await;

    let (client, _dir) = logged_in_client(&server);
    let envelope = client.delete_record("r42").await.unwrap();

    assert_eq!(envelope.message.as_deref(), Some("Record deleted"));
  }

  #[tokio::test]
  async fn test_report_parses_bare_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/report/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "balance": 150.0,
        "totalIncome": 400.0,
        "totalExpense": 250.0,
        "incomeCategories": { "Salary": 400.0 },
        "expenseCategories": { "Food": 250.0 }
      })))
      .mount(&server)
      .await;

    let (client, _dir) = logged_in_client(&server);
    let report = client.fetch_report().await.unwrap();

    assert_eq!(report.balance, 150.0);
    assert_eq!(report.total_income, 400.0);
    assert_eq!(report.income_categories["Salary"], 400.0);
  }

  #[tokio::test]
  async fn test_token_cleared_mid_session_is_seen_by_next_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/api/v1/report/"))
      .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "balance": 0.0,
        "totalIncome": 0.0,
        "totalExpense": 0.0,
        "incomeCategories": {},
        "expenseCategories": {}
      })))
      .expect(1)
      .mount(&server)
      .await;

    let dir = tempfile::tempdir().unwrap();
    let session = Session::load(dir.path().join("token.json")).unwrap();
    session.set_token("test-token").unwrap();
    let client = ApiClient::new(&server.uri(), session.clone()).unwrap();

    client.fetch_report().await.unwrap();
    session.clear().unwrap();

    let err = client.fetch_report().await.unwrap_err();
    assert!(err.is_unauthorized());
  }
}
