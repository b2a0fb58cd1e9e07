//! Bearer-token session lifecycle.
//!
//! Owns the token and the authentication state derived from it; the token
//! reaches the collaborator only as an explicit argument, never through
//! globals. Invariant: the session is `Authenticated` exactly while it holds
//! a token that has not been proven invalid.

use releve_core::{
  Error, Result,
  portal::{Credentials, PortalApi, TokenStore},
  student::{Enrollment, User},
};

/// Authentication status of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
  Unauthenticated,
  /// A restore cycle is in flight.
  Checking,
  Authenticated,
}

/// Outcome of [`SessionManager::restore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Restore {
  /// A stored token was validated; the session is authenticated.
  Authenticated,
  /// No token was stored; no network call was made.
  NoToken,
  /// Another restore cycle was already running; this call was coalesced.
  InFlight,
}

/// Session state machine over a [`PortalApi`] collaborator and a
/// [`TokenStore`].
pub struct SessionManager<A, S> {
  api:   A,
  store: S,
  token: Option<String>,
  user:  Option<User>,
  state: AuthState,
}

impl<A: PortalApi, S: TokenStore> SessionManager<A, S> {
  pub fn new(api: A, store: S) -> Self {
    Self {
      api,
      store,
      token: None,
      user: None,
      state: AuthState::Unauthenticated,
    }
  }

  pub fn state(&self) -> AuthState { self.state }

  pub fn is_authenticated(&self) -> bool {
    self.state == AuthState::Authenticated
  }

  pub fn user(&self) -> Option<&User> { self.user.as_ref() }

  pub fn token(&self) -> Option<&str> { self.token.as_deref() }

  pub fn api(&self) -> &A { &self.api }

  /// First enrollment, or the business-rule error that blocks selection.
  pub fn primary_enrollment(&self) -> Result<&Enrollment> {
    self
      .user
      .as_ref()
      .and_then(|u| u.enrollments.first())
      .ok_or(Error::NoEnrollment)
  }

  /// Validate a previously persisted token, if any.
  ///
  /// Overlapping calls are coalesced: while one cycle is in flight a second
  /// call returns [`Restore::InFlight`] without touching the network. When
  /// the stored token fails the identity check it is deleted and the session
  /// ends `Unauthenticated`; [`restore_failure_message`] renders the error
  /// for the user.
  pub async fn restore(&mut self) -> Result<Restore> {
    if self.state == AuthState::Checking {
      return Ok(Restore::InFlight);
    }
    let Some(token) = self.store.load()? else {
      self.state = AuthState::Unauthenticated;
      return Ok(Restore::NoToken);
    };

    self.state = AuthState::Checking;
    let outcome = self.fetch_identity(&token).await;
    match outcome {
      Ok(user) => {
        tracing::info!(email = %user.email, "session restored");
        self.token = Some(token);
        self.user = Some(user);
        self.state = AuthState::Authenticated;
        Ok(Restore::Authenticated)
      }
      Err(e) => {
        tracing::warn!(error = %e, "stored token rejected");
        self.drop_credentials();
        Err(e)
      }
    }
  }

  /// Authenticate against the portal and persist the returned token.
  ///
  /// On login failure the session stays unauthenticated, nothing is
  /// persisted, and the collaborator's error is returned verbatim. If the
  /// freshly issued token then fails the enrollment lookup it is treated
  /// like an invalid stored token.
  pub async fn login(&mut self, email: &str, password: &str) -> Result<()> {
    let response = self.api.login(&Credentials::new(email, password)).await?;

    self.store.save(&response.token)?;
    let mut user = response.user;
    let outcome = self.api.enrollments(&response.token, &user.ine).await;
    match outcome {
      Ok(enrollments) => {
        user.enrollments = enrollments;
        tracing::info!(email = %user.email, "logged in");
        self.token = Some(response.token);
        self.user = Some(user);
        self.state = AuthState::Authenticated;
        Ok(())
      }
      Err(e) => {
        tracing::warn!(error = %e, "enrollment lookup failed after login");
        self.drop_credentials();
        Err(e)
      }
    }
  }

  /// Drop the session: the persisted token is deleted and the state returns
  /// to `Unauthenticated`. The caller navigates back to the entry screen.
  pub fn logout(&mut self) -> Result<()> {
    self.store.clear()?;
    self.token = None;
    self.user = None;
    self.state = AuthState::Unauthenticated;
    tracing::info!("logged out");
    Ok(())
  }

  /// Fetch the current user and attach enrollments, keyed by `ine`.
  async fn fetch_identity(&self, token: &str) -> Result<User> {
    let mut user = self.api.current_user(token).await?;
    user.enrollments = self.api.enrollments(token, &user.ine).await?;
    Ok(user)
  }

  /// Clear token and user after a proven-invalid credential.
  fn drop_credentials(&mut self) {
    if let Err(e) = self.store.clear() {
      tracing::warn!(error = %e, "failed to delete stored token");
    }
    self.token = None;
    self.user = None;
    self.state = AuthState::Unauthenticated;
  }
}

/// Human-readable account of a failed restore, split by failure class.
pub fn restore_failure_message(error: &Error) -> String {
  if error.is_network() {
    "Impossible de se connecter au serveur. Vérifiez votre connexion internet ou réessayez plus tard."
      .to_string()
  } else {
    "Session expirée ou invalide. Veuillez vous reconnecter.".to_string()
  }
}
