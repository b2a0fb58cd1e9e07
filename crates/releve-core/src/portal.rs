//! Seam traits between the core and its collaborators.
//!
//! [`PortalApi`] is implemented by the HTTP client crate; [`TokenStore`] by
//! whatever durable storage the host offers. Higher layers depend on these
//! abstractions, not on reqwest or the filesystem, and every authenticated
//! call receives the bearer token explicitly — there is no ambient token
//! state anywhere.

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  grades::StudentResultSet,
  student::{Enrollment, ExamSession, ReclamationWindow, Semester, User},
};

// ─── Login payloads ──────────────────────────────────────────────────────────

/// Body of `POST /loginAuth`.
///
/// `remember_me` is a string in the wire contract, not a bool; the portal
/// expects the empty string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
  pub email:       String,
  pub password:    String,
  #[serde(default)]
  pub remember_me: String,
}

impl Credentials {
  pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      email:       email.into(),
      password:    password.into(),
      remember_me: String::new(),
    }
  }
}

/// Successful login payload: the bearer token plus an identity snapshot
/// (without enrollments).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
  pub token: String,
  pub user:  User,
}

// ─── Collaborator trait ──────────────────────────────────────────────────────

/// The remote academic-records service.
pub trait PortalApi {
  /// `POST /loginAuth`. A non-2xx answer is an authentication rejection.
  async fn login(&self, credentials: &Credentials) -> Result<LoginResponse>;

  /// `GET /userConnecter` — identity of the token holder, without
  /// enrollments.
  async fn current_user(&self, token: &str) -> Result<User>;

  /// `GET /inscriptions/findByGroupeAndAnneeAcademique/{ine}`.
  async fn enrollments(&self, token: &str, ine: &str) -> Result<Vec<Enrollment>>;

  /// `GET /semestres/getSemestresbyNiveau/{enrollment_id}`.
  async fn semesters(
    &self,
    token: &str,
    enrollment_id: i64,
  ) -> Result<Vec<Semester>>;

  /// `GET /sessions`.
  async fn exam_sessions(&self, token: &str) -> Result<Vec<ExamSession>>;

  /// `GET /notes/getNotesByUniteEnseignement/{enrollment}/{semester}/{session}`.
  async fn results(
    &self,
    token: &str,
    enrollment_id: i64,
    semester_id: i64,
    session_id: i64,
  ) -> Result<StudentResultSet>;

  /// `GET /autorisation-reclamations/{year}/{program}/{terminal}/{session}`.
  async fn reclamation_window(
    &self,
    token: &str,
    year_id: i64,
    program_id: i64,
    terminal: bool,
    session_id: i64,
  ) -> Result<ReclamationWindow>;
}

impl<T: PortalApi + ?Sized> PortalApi for &T {
  async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
    (**self).login(credentials).await
  }

  async fn current_user(&self, token: &str) -> Result<User> {
    (**self).current_user(token).await
  }

  async fn enrollments(&self, token: &str, ine: &str) -> Result<Vec<Enrollment>> {
    (**self).enrollments(token, ine).await
  }

  async fn semesters(
    &self,
    token: &str,
    enrollment_id: i64,
  ) -> Result<Vec<Semester>> {
    (**self).semesters(token, enrollment_id).await
  }

  async fn exam_sessions(&self, token: &str) -> Result<Vec<ExamSession>> {
    (**self).exam_sessions(token).await
  }

  async fn results(
    &self,
    token: &str,
    enrollment_id: i64,
    semester_id: i64,
    session_id: i64,
  ) -> Result<StudentResultSet> {
    (**self)
      .results(token, enrollment_id, semester_id, session_id)
      .await
  }

  async fn reclamation_window(
    &self,
    token: &str,
    year_id: i64,
    program_id: i64,
    terminal: bool,
    session_id: i64,
  ) -> Result<ReclamationWindow> {
    (**self)
      .reclamation_window(token, year_id, program_id, terminal, session_id)
      .await
  }
}

// ─── Token persistence ───────────────────────────────────────────────────────

/// Durable storage for the single bearer token.
pub trait TokenStore {
  /// Read the persisted token, if any. Whitespace-only tokens count as
  /// absent.
  fn load(&self) -> Result<Option<String>>;

  /// Persist `token`, replacing any previous value.
  fn save(&self, token: &str) -> Result<()>;

  /// Delete the persisted token; succeeds when none exists.
  fn clear(&self) -> Result<()>;
}

impl<T: TokenStore + ?Sized> TokenStore for &T {
  fn load(&self) -> Result<Option<String>> { (**self).load() }

  fn save(&self, token: &str) -> Result<()> { (**self).save(token) }

  fn clear(&self) -> Result<()> { (**self).clear() }
}
