//! Application state machine and event dispatcher.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use releve_client::{
  ApiClient,
  selection::{GradeFetchTracker, SelectionCoordinator},
  session::{Restore, SessionManager, restore_failure_message},
  token::FileTokenStore,
};
use releve_core::{
  Error, Result, grades::StudentResultSet, portal::PortalApi,
  student::ReclamationWindow,
};

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  /// Login form, or the auth error panel after a failed restore.
  Login,
  /// Selector bar plus the result tables and charts.
  Results,
}

/// Which login form field has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
  Email,
  Password,
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  /// Current screen / keyboard focus.
  pub screen: Screen,

  /// Token lifecycle and identity.
  pub session: SessionManager<ApiClient, FileTokenStore>,

  // Login form.
  pub email:       String,
  pub password:    String,
  pub login_focus: LoginField,

  /// Auth error panel content (failed restore or login); offers retry and
  /// back-to-login actions.
  pub auth_error: Option<String>,

  /// True while restore or login is talking to the server.
  pub auth_busy: bool,

  // Results screen.
  pub selection:       Option<SelectionCoordinator>,
  /// Error that blocked the selector load.
  pub selection_error: Option<String>,
  /// The account has no enrollment; shown as a static message, never
  /// retried.
  pub no_enrollment:   bool,

  pub results:       Option<StudentResultSet>,
  pub results_error: Option<String>,
  pub results_busy:  bool,
  tracker:           GradeFetchTracker,

  /// Reclamation window for the current (year, program, session), if open.
  pub reclamation: Option<ReclamationWindow>,

  /// Cursor within the UE table.
  pub unit_cursor: usize,

  /// One-line status message shown in the status bar.
  pub status_msg: String,
}

impl App {
  pub fn new(client: ApiClient, store: FileTokenStore) -> Self {
    Self {
      screen: Screen::Login,
      session: SessionManager::new(client, store),
      email: String::new(),
      password: String::new(),
      login_focus: LoginField::Email,
      auth_error: None,
      auth_busy: false,
      selection: None,
      selection_error: None,
      no_enrollment: false,
      results: None,
      results_error: None,
      results_busy: false,
      tracker: GradeFetchTracker::new(),
      reclamation: None,
      unit_cursor: 0,
      status_msg: String::new(),
    }
  }

  // ── Session flow ──────────────────────────────────────────────────────────

  /// Validate a persisted session, landing on Results when it succeeds.
  pub async fn restore_session(&mut self) {
    self.auth_busy = true;
    self.auth_error = None;
    let outcome = self.session.restore().await;
    self.auth_busy = false;
    match outcome {
      Ok(Restore::Authenticated) => self.enter_results().await,
      Ok(Restore::NoToken | Restore::InFlight) => {}
      Err(e) => self.auth_error = Some(restore_failure_message(&e)),
    }
  }

  async fn submit_login(&mut self) {
    if self.email.trim().is_empty() || self.password.is_empty() {
      self.status_msg = "Saisissez votre email et votre mot de passe.".into();
      return;
    }
    self.auth_busy = true;
    self.auth_error = None;
    let email = self.email.trim().to_string();
    let password = self.password.clone();
    let outcome = self.session.login(&email, &password).await;
    self.auth_busy = false;
    match outcome {
      Ok(()) => {
        self.password.clear();
        self.enter_results().await;
      }
      Err(e) => self.auth_error = Some(e.to_string()),
    }
  }

  /// Back to the entry screen with a clean slate.
  fn go_to_login(&mut self) {
    if let Err(e) = self.session.logout() {
      self.status_msg = format!("Error: {e}");
    }
    self.screen = Screen::Login;
    self.login_focus = LoginField::Email;
    self.password.clear();
    self.auth_error = None;
    self.selection = None;
    self.selection_error = None;
    self.no_enrollment = false;
    self.results = None;
    self.results_error = None;
    self.reclamation = None;
    self.unit_cursor = 0;
  }

  // ── Results flow ──────────────────────────────────────────────────────────

  /// Enter the results screen: load selectors for the primary enrollment
  /// and fetch the default selection.
  async fn enter_results(&mut self) {
    self.screen = Screen::Results;
    self.selection = None;
    self.selection_error = None;
    self.no_enrollment = false;
    self.results = None;
    self.results_error = None;
    self.reclamation = None;
    self.unit_cursor = 0;
    self.load_selectors().await;
  }

  async fn load_selectors(&mut self) {
    let (token, enrollment_id) = match self.auth_context() {
      Ok(ctx) => ctx,
      Err(Error::NoEnrollment) => {
        self.no_enrollment = true;
        return;
      }
      Err(e) => {
        self.selection_error = Some(e.to_string());
        return;
      }
    };
    self.status_msg = "Chargement des semestres…".into();
    let outcome =
      SelectionCoordinator::load(self.session.api(), &token, enrollment_id).await;
    match outcome {
      Ok(selection) => {
        self.status_msg = String::new();
        self.selection = Some(selection);
        self.fetch_results().await;
        self.fetch_reclamation().await;
      }
      Err(e) => {
        self.status_msg = String::new();
        self.selection_error = Some(e.to_string());
      }
    }
  }

  /// Fetch grades for the current selection, discarding stale completions.
  async fn fetch_results(&mut self) {
    let pair = match self.selection.as_ref().map(|s| s.require_selection()) {
      Some(Ok(pair)) => pair,
      Some(Err(e)) => {
        self.results_error = Some(e.to_string());
        return;
      }
      None => return,
    };
    let (token, enrollment_id) = match self.auth_context() {
      Ok(ctx) => ctx,
      Err(e) => {
        self.results_error = Some(e.to_string());
        return;
      }
    };

    let tag = self.tracker.issue(pair.0, pair.1);
    self.results_busy = true;
    self.results_error = None;
    let outcome = self
      .session
      .api()
      .results(&token, enrollment_id, pair.0, pair.1)
      .await;
    self.results_busy = false;

    // A newer selection may have superseded this fetch while it was in
    // flight; its response must not be displayed.
    if !self.tracker.is_current(tag) {
      return;
    }
    match outcome {
      Ok(results) => {
        self.results = Some(results);
        self.unit_cursor = 0;
      }
      Err(e) => {
        self.results = None;
        self.results_error = Some(e.to_string());
      }
    }
  }

  /// Reclamation window for the active (year, program, session) triple —
  /// informational only, failures are not surfaced.
  async fn fetch_reclamation(&mut self) {
    self.reclamation = None;
    let Some(session_id) = self.selection.as_ref().and_then(|s| s.session_id())
    else {
      return;
    };
    let Some(token) = self.session.token().map(str::to_string) else {
      return;
    };
    let Ok(enrollment) = self.session.primary_enrollment() else {
      return;
    };
    let year_id = enrollment.academic_year.id;
    let program_id = enrollment.level.program.id;
    let terminal = enrollment.level.terminal;

    match self
      .session
      .api()
      .reclamation_window(&token, year_id, program_id, terminal, session_id)
      .await
    {
      Ok(window) => self.reclamation = Some(window),
      Err(e) => tracing::debug!(error = %e, "reclamation window unavailable"),
    }
  }

  /// Token and primary enrollment id, or the error that blocks fetching.
  fn auth_context(&self) -> Result<(String, i64)> {
    let token = self
      .session
      .token()
      .ok_or_else(|| Error::AuthRejected("no active session".into()))?
      .to_string();
    let enrollment_id = self.session.primary_enrollment()?.id;
    Ok((token, enrollment_id))
  }

  /// Units of the displayed result set.
  pub fn unit_count(&self) -> usize {
    self.results.as_ref().map_or(0, |r| r.units.len())
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub async fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
    {
      return Ok(false);
    }

    match self.screen {
      Screen::Login => self.handle_login_key(key).await,
      Screen::Results => self.handle_results_key(key).await,
    }
  }

  async fn handle_login_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    // The auth error panel takes over while it is shown.
    if self.auth_error.is_some() {
      match key.code {
        // Retry the restore cycle.
        KeyCode::Char('r') => self.restore_session().await,
        // Back to the login form.
        KeyCode::Esc | KeyCode::Char('b') => self.go_to_login(),
        KeyCode::Char('q') => return Ok(false),
        _ => {}
      }
      return Ok(true);
    }

    match key.code {
      KeyCode::Esc => return Ok(false),
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
        self.login_focus = match self.login_focus {
          LoginField::Email => LoginField::Password,
          LoginField::Password => LoginField::Email,
        };
      }
      KeyCode::Enter => match self.login_focus {
        LoginField::Email => self.login_focus = LoginField::Password,
        LoginField::Password => self.submit_login().await,
      },
      KeyCode::Backspace => {
        self.active_field_mut().pop();
      }
      KeyCode::Char(c) => self.active_field_mut().push(c),
      _ => {}
    }
    Ok(true)
  }

  async fn handle_results_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
    match key.code {
      // Quit
      KeyCode::Char('q') => return Ok(false),

      // Cycle semester / exam session; each change re-emits the pair and
      // supersedes any in-flight fetch.
      KeyCode::Char('s') => {
        let changed = self
          .selection
          .as_mut()
          .and_then(|s| s.cycle_semester())
          .is_some();
        if changed {
          self.fetch_results().await;
          self.fetch_reclamation().await;
        }
      }
      KeyCode::Char('e') => {
        let changed = self
          .selection
          .as_mut()
          .and_then(|s| s.cycle_session())
          .is_some();
        if changed {
          self.fetch_results().await;
          self.fetch_reclamation().await;
        }
      }

      // Retry whichever load failed. NoEnrollment is a business rule, not
      // retried.
      KeyCode::Char('r') => {
        if self.no_enrollment {
          // Static condition; nothing to retry.
        } else if self.selection.is_none() {
          self.load_selectors().await;
        } else {
          self.fetch_results().await;
        }
      }

      // Logout, back to the entry screen.
      KeyCode::Char('l') => self.go_to_login(),

      // UE table cursor.
      KeyCode::Down | KeyCode::Char('j') => {
        let len = self.unit_count();
        if len > 0 && self.unit_cursor + 1 < len {
          self.unit_cursor += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        if self.unit_cursor > 0 {
          self.unit_cursor -= 1;
        }
      }

      _ => {}
    }
    Ok(true)
  }

  fn active_field_mut(&mut self) -> &mut String {
    match self.login_focus {
      LoginField::Email => &mut self.email,
      LoginField::Password => &mut self.password,
    }
  }
}
