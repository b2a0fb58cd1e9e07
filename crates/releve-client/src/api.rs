//! Async HTTP client wrapping the portal JSON API.

use std::time::Duration;

use releve_core::{
  Error, Result,
  grades::StudentResultSet,
  portal::{Credentials, LoginResponse, PortalApi},
  student::{Enrollment, ExamSession, ReclamationWindow, Semester, User},
};
use reqwest::{Client, RequestBuilder, Response, header};

/// The portal's non-standard bearer header.
const AUTH_HEADER: &str = "CreAuthorization";

/// Connection settings for the portal API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  /// HTTPS origin including the `/api` base path.
  pub base_url:        String,
  /// Value sent as `Accept-Language` on every request.
  pub accept_language: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url:        "https://etudiant-pgi.esp.sn:8080/api".to_string(),
      accept_language: "fr-FR,fr;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
    }
  }
}

/// Async HTTP client for the portal JSON API.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based. The bearer
/// token is not stored here; every authenticated call receives it from the
/// session layer.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(|e| Error::Network(e.to_string()))?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.config.base_url.trim_end_matches('/'))
  }

  /// Attach the fixed header set; `token` adds the bearer header.
  fn headers(&self, req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
    let req = req
      .header(header::ACCEPT, "application/json, text/plain, */*")
      .header(header::ACCEPT_LANGUAGE, self.config.accept_language.as_str())
      .header(header::CONTENT_TYPE, "application/json");
    match token {
      Some(token) => req.header(AUTH_HEADER, format!("Bearer {token}")),
      None => req,
    }
  }

  /// GET `path` and decode the JSON body. Non-2xx maps to [`Error::Fetch`];
  /// identity endpoints re-tag that as a rejection at the call site.
  async fn get_json<T: serde::de::DeserializeOwned>(
    &self,
    token: &str,
    path: &str,
  ) -> Result<T> {
    let resp = self
      .headers(self.client.get(self.url(path)), Some(token))
      .send()
      .await
      .map_err(|e| Error::Network(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
      let message = body_excerpt(resp).await;
      tracing::warn!(%status, path, "portal request failed");
      return Err(Error::Fetch { status: status.as_u16(), message });
    }
    resp.json().await.map_err(|e| Error::Decode(e.to_string()))
  }
}

/// First line of an error body, capped, for diagnostics.
async fn body_excerpt(resp: Response) -> String {
  let text = resp.text().await.unwrap_or_default();
  text
    .lines()
    .next()
    .unwrap_or("")
    .trim()
    .chars()
    .take(200)
    .collect()
}

impl PortalApi for ApiClient {
  /// `POST /loginAuth`
  async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
    let resp = self
      .headers(self.client.post(self.url("/loginAuth")), None)
      .json(credentials)
      .send()
      .await
      .map_err(|e| Error::Network(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
      let message = body_excerpt(resp).await;
      tracing::warn!(%status, "login rejected");
      return Err(Error::AuthRejected(if message.is_empty() {
        format!("login refused with status {status}")
      } else {
        message
      }));
    }
    resp.json().await.map_err(|e| Error::Decode(e.to_string()))
  }

  /// `GET /userConnecter`
  async fn current_user(&self, token: &str) -> Result<User> {
    match self.get_json(token, "/userConnecter").await {
      Err(Error::Fetch { status, message }) => Err(Error::AuthRejected(
        format!("identity check refused with status {status}: {message}"),
      )),
      other => other,
    }
  }

  /// `GET /inscriptions/findByGroupeAndAnneeAcademique/{ine}`
  async fn enrollments(&self, token: &str, ine: &str) -> Result<Vec<Enrollment>> {
    self
      .get_json(token, &format!("/inscriptions/findByGroupeAndAnneeAcademique/{ine}"))
      .await
  }

  /// `GET /semestres/getSemestresbyNiveau/{enrollment_id}`
  async fn semesters(
    &self,
    token: &str,
    enrollment_id: i64,
  ) -> Result<Vec<Semester>> {
    self
      .get_json(token, &format!("/semestres/getSemestresbyNiveau/{enrollment_id}"))
      .await
  }

  /// `GET /sessions`
  async fn exam_sessions(&self, token: &str) -> Result<Vec<ExamSession>> {
    self.get_json(token, "/sessions").await
  }

  /// `GET /notes/getNotesByUniteEnseignement/{enrollment}/{semester}/{session}`
  async fn results(
    &self,
    token: &str,
    enrollment_id: i64,
    semester_id: i64,
    session_id: i64,
  ) -> Result<StudentResultSet> {
    self
      .get_json(
        token,
        &format!(
          "/notes/getNotesByUniteEnseignement/{enrollment_id}/{semester_id}/{session_id}"
        ),
      )
      .await
  }

  /// `GET /autorisation-reclamations/{year}/{program}/{terminal}/{session}`
  async fn reclamation_window(
    &self,
    token: &str,
    year_id: i64,
    program_id: i64,
    terminal: bool,
    session_id: i64,
  ) -> Result<ReclamationWindow> {
    self
      .get_json(
        token,
        &format!(
          "/autorisation-reclamations/{year_id}/{program_id}/{terminal}/{session_id}"
        ),
      )
      .await
  }
}
