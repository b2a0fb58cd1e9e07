//! Session, selection, and staleness tests against scripted stubs.

use std::{
  sync::atomic::{AtomicUsize, Ordering},
  time::Duration,
};

use releve_core::{
  Error, Result,
  grades::StudentResultSet,
  portal::{Credentials, LoginResponse, PortalApi, TokenStore},
  student::{
    AcademicYear, Enrollment, ExamSession, Level, Program, ReclamationWindow,
    Semester, User,
  },
};

use crate::{
  selection::{GradeFetchTracker, SelectionCoordinator},
  session::{AuthState, Restore, SessionManager, restore_failure_message},
  token::MemoryTokenStore,
};

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn sample_user() -> User {
  User {
    id:          9,
    email:       "awa.diop@example.sn".into(),
    ine:         "N02411020233".into(),
    first_name:  "Awa".into(),
    last_name:   "Diop".into(),
    telephone:   None,
    activated:   true,
    enrollments: Vec::new(),
  }
}

fn sample_enrollment(id: i64) -> Enrollment {
  Enrollment {
    id,
    state: Some("VALIDE".into()),
    level: Level {
      id:       3,
      code:     Some("L2".into()),
      label:    Some("Licence 2 Informatique".into()),
      terminal: false,
      program:  Program {
        id:         5,
        code:       Some("INF".into()),
        name:       Some("Informatique".into()),
        department: None,
      },
    },
    academic_year: AcademicYear {
      id:     21,
      label:  Some("2024-2025".into()),
      active: true,
    },
  }
}

fn semester(id: i64, label: &str) -> Semester {
  Semester { id, label: label.into(), active: true }
}

fn exam_session(id: i64, label: &str) -> ExamSession {
  ExamSession { id, label: label.into() }
}

// ─── Scripted collaborator ───────────────────────────────────────────────────

/// Each endpoint either succeeds with a canned value or fails with a canned
/// error. Identity fetches are counted so coalescing is observable.
struct StubPortal {
  login:          Result<LoginResponse>,
  user:           Result<User>,
  enrollments:    Result<Vec<Enrollment>>,
  semesters:      Result<Vec<Semester>>,
  sessions:       Result<Vec<ExamSession>>,
  hang_identity:  bool,
  identity_calls: AtomicUsize,
}

impl StubPortal {
  fn ok() -> Self {
    Self {
      login:          Ok(LoginResponse {
        token: "fresh-token".into(),
        user:  sample_user(),
      }),
      user:           Ok(sample_user()),
      enrollments:    Ok(vec![sample_enrollment(77)]),
      semesters:      Ok(vec![
        semester(1, "Semestre 1"),
        semester(2, "Semestre 2"),
      ]),
      sessions:       Ok(vec![
        exam_session(10, "normale"),
        exam_session(11, "rattrapage"),
      ]),
      hang_identity:  false,
      identity_calls: AtomicUsize::new(0),
    }
  }

  fn identity_calls(&self) -> usize {
    self.identity_calls.load(Ordering::SeqCst)
  }
}

impl PortalApi for StubPortal {
  async fn login(&self, _credentials: &Credentials) -> Result<LoginResponse> {
    self.login.clone()
  }

  async fn current_user(&self, _token: &str) -> Result<User> {
    self.identity_calls.fetch_add(1, Ordering::SeqCst);
    if self.hang_identity {
      std::future::pending::<()>().await;
    }
    self.user.clone()
  }

  async fn enrollments(&self, _token: &str, _ine: &str) -> Result<Vec<Enrollment>> {
    self.enrollments.clone()
  }

  async fn semesters(
    &self,
    _token: &str,
    _enrollment_id: i64,
  ) -> Result<Vec<Semester>> {
    self.semesters.clone()
  }

  async fn exam_sessions(&self, _token: &str) -> Result<Vec<ExamSession>> {
    self.sessions.clone()
  }

  async fn results(
    &self,
    _token: &str,
    _enrollment_id: i64,
    _semester_id: i64,
    _session_id: i64,
  ) -> Result<StudentResultSet> {
    Err(Error::Fetch { status: 500, message: "not scripted".into() })
  }

  async fn reclamation_window(
    &self,
    _token: &str,
    _year_id: i64,
    _program_id: i64,
    _terminal: bool,
    _session_id: i64,
  ) -> Result<ReclamationWindow> {
    Err(Error::Fetch { status: 500, message: "not scripted".into() })
  }
}

// ─── Session lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn restore_without_token_makes_no_network_call() {
  let api = StubPortal::ok();
  let store = MemoryTokenStore::new();
  let mut session = SessionManager::new(&api, &store);

  let outcome = session.restore().await.unwrap();

  assert_eq!(outcome, Restore::NoToken);
  assert_eq!(session.state(), AuthState::Unauthenticated);
  assert_eq!(api.identity_calls(), 0);
}

#[tokio::test]
async fn restore_validates_stored_token_and_attaches_enrollments() {
  let api = StubPortal::ok();
  let store = MemoryTokenStore::with_token("stored-token");
  let mut session = SessionManager::new(&api, &store);

  let outcome = session.restore().await.unwrap();

  assert_eq!(outcome, Restore::Authenticated);
  assert!(session.is_authenticated());
  assert_eq!(session.token(), Some("stored-token"));
  let user = session.user().unwrap();
  assert_eq!(user.enrollments.len(), 1);
  assert_eq!(user.enrollments[0].id, 77);
  assert_eq!(session.primary_enrollment().unwrap().id, 77);
}

#[tokio::test]
async fn restore_with_rejected_token_deletes_it() {
  let mut api = StubPortal::ok();
  api.user = Err(Error::AuthRejected("token expired".into()));
  let store = MemoryTokenStore::with_token("stale-token");
  let mut session = SessionManager::new(&api, &store);

  let err = session.restore().await.unwrap_err();

  assert!(err.is_auth_rejected());
  assert_eq!(session.state(), AuthState::Unauthenticated);
  assert_eq!(session.token(), None);
  assert_eq!(store.load().unwrap(), None, "stored token must be deleted");
  // The failure reads as an invalid session, not a connectivity problem.
  assert!(restore_failure_message(&err).contains("Session expirée"));
}

#[tokio::test]
async fn restore_network_failure_is_classified_as_such() {
  let mut api = StubPortal::ok();
  api.user = Err(Error::Network("connection refused".into()));
  let store = MemoryTokenStore::with_token("unverified-token");
  let mut session = SessionManager::new(&api, &store);

  let err = session.restore().await.unwrap_err();

  assert!(err.is_network());
  assert!(restore_failure_message(&err).contains("Impossible de se connecter"));
  assert_eq!(session.state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn overlapping_restore_is_coalesced() {
  let mut api = StubPortal::ok();
  api.hang_identity = true;
  let store = MemoryTokenStore::with_token("stored-token");
  let mut session = SessionManager::new(&api, &store);

  {
    let restore = session.restore();
    tokio::pin!(restore);
    let poll =
      tokio::time::timeout(Duration::from_millis(20), restore.as_mut()).await;
    assert!(poll.is_err(), "identity fetch should still be pending");
  } // first cycle abandoned mid-flight

  assert_eq!(session.state(), AuthState::Checking);
  let second = session.restore().await.unwrap();
  assert_eq!(second, Restore::InFlight);
  assert_eq!(api.identity_calls(), 1, "no second identity fetch may start");
}

#[tokio::test]
async fn rejected_login_persists_nothing() {
  let mut api = StubPortal::ok();
  api.login =
    Err(Error::AuthRejected("Échec de l'authentification.".into()));
  let store = MemoryTokenStore::new();
  let mut session = SessionManager::new(&api, &store);

  let err = session.login("awa@example.sn", "wrong").await.unwrap_err();

  // Surfaced verbatim.
  assert!(
    matches!(&err, Error::AuthRejected(m) if m.as_str() == "Échec de l'authentification.")
  );
  assert_eq!(session.state(), AuthState::Unauthenticated);
  assert!(session.user().is_none());
  assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn successful_login_persists_the_token() {
  let api = StubPortal::ok();
  let store = MemoryTokenStore::new();
  let mut session = SessionManager::new(&api, &store);

  session.login("awa@example.sn", "secret").await.unwrap();

  assert!(session.is_authenticated());
  assert_eq!(session.token(), Some("fresh-token"));
  assert_eq!(store.load().unwrap().as_deref(), Some("fresh-token"));
  assert_eq!(session.user().unwrap().enrollments.len(), 1);
}

#[tokio::test]
async fn enrollment_failure_after_login_drops_credentials() {
  let mut api = StubPortal::ok();
  api.enrollments = Err(Error::Fetch { status: 500, message: "boom".into() });
  let store = MemoryTokenStore::new();
  let mut session = SessionManager::new(&api, &store);

  let err = session.login("awa@example.sn", "secret").await.unwrap_err();

  assert!(matches!(err, Error::Fetch { status: 500, .. }));
  assert_eq!(session.state(), AuthState::Unauthenticated);
  assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn logout_clears_token_and_user() {
  let api = StubPortal::ok();
  let store = MemoryTokenStore::new();
  let mut session = SessionManager::new(&api, &store);
  session.login("awa@example.sn", "secret").await.unwrap();

  session.logout().unwrap();

  assert_eq!(session.state(), AuthState::Unauthenticated);
  assert_eq!(session.token(), None);
  assert!(session.user().is_none());
  assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn missing_enrollments_surface_as_a_business_error() {
  let mut api = StubPortal::ok();
  api.enrollments = Ok(Vec::new());
  let store = MemoryTokenStore::new();
  let mut session = SessionManager::new(&api, &store);
  session.login("awa@example.sn", "secret").await.unwrap();

  assert!(session.is_authenticated());
  assert!(matches!(
    session.primary_enrollment(),
    Err(Error::NoEnrollment)
  ));
}

// ─── Selection coordinator ───────────────────────────────────────────────────

#[tokio::test]
async fn load_joins_both_lists_and_defaults_to_the_first_of_each() {
  let api = StubPortal::ok();

  let selection = SelectionCoordinator::load(&api, "tok", 77).await.unwrap();

  assert_eq!(selection.semester_id(), Some(1));
  assert_eq!(selection.session_id(), Some(10));
  assert_eq!(selection.selection(), Some((1, 10)));
  assert_eq!(selection.semester_label(), Some("Semestre 1"));
  assert_eq!(selection.session_label(), Some("normale"));
}

#[tokio::test]
async fn load_fails_whole_when_either_list_fails() {
  let mut api = StubPortal::ok();
  api.sessions = Err(Error::Fetch { status: 503, message: "down".into() });

  let err = SelectionCoordinator::load(&api, "tok", 77).await.unwrap_err();
  assert!(matches!(err, Error::Fetch { status: 503, .. }));
}

#[test]
fn empty_lists_block_selection_entirely() {
  let selection = SelectionCoordinator::from_lists(Vec::new(), Vec::new());
  assert_eq!(selection.selection(), None);
  assert!(matches!(
    selection.require_selection(),
    Err(Error::MalformedSelection)
  ));

  // One-sided data is still incomplete.
  let selection =
    SelectionCoordinator::from_lists(vec![semester(1, "Semestre 1")], Vec::new());
  assert_eq!(selection.selection(), None);
}

#[test]
fn changing_either_side_reemits_the_pair() {
  let mut selection = SelectionCoordinator::from_lists(
    vec![semester(1, "Semestre 1"), semester(2, "Semestre 2")],
    vec![exam_session(10, "normale"), exam_session(11, "rattrapage")],
  );

  assert_eq!(selection.select_semester(2), Some((2, 10)));
  assert_eq!(selection.select_session(11), Some((2, 11)));

  // Cycling wraps back around.
  assert_eq!(selection.cycle_semester(), Some((1, 11)));
  assert_eq!(selection.cycle_session(), Some((1, 10)));
}

#[test]
fn unknown_selection_ids_are_ignored() {
  let mut selection = SelectionCoordinator::from_lists(
    vec![semester(1, "Semestre 1")],
    vec![exam_session(10, "normale")],
  );

  assert_eq!(selection.select_semester(999), Some((1, 10)));
  assert_eq!(selection.select_session(999), Some((1, 10)));
}

// ─── Grade-fetch staleness ───────────────────────────────────────────────────

#[test]
fn stale_completions_are_rejected() {
  let mut tracker = GradeFetchTracker::new();

  let first = tracker.issue(1, 10);
  let second = tracker.issue(2, 10);

  // The slow first response arrives after the second was issued.
  assert!(!tracker.is_current(first));
  assert!(tracker.is_current(second));
  assert_eq!(second.semester_id, 2);
  assert_eq!(second.session_id, 10);
}

#[test]
fn reissuing_the_same_pair_still_supersedes() {
  let mut tracker = GradeFetchTracker::new();
  let first = tracker.issue(1, 10);
  let retry = tracker.issue(1, 10);

  assert!(!tracker.is_current(first));
  assert!(tracker.is_current(retry));
}
