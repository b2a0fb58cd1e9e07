//! Error taxonomy for the portal client.
//!
//! The upstream service reports failures only through HTTP status codes and
//! free-text bodies. Classification into these variants happens once, at the
//! collaborator boundary; everything above it matches on variants rather than
//! inspecting message text.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
  /// The server could not be reached at all (DNS, connect, timeout).
  #[error("could not reach the server: {0}")]
  Network(String),

  /// Login or the identity check was refused — a non-2xx answer on
  /// `/loginAuth` or `/userConnecter`.
  #[error("authentication rejected: {0}")]
  AuthRejected(String),

  /// A data endpoint answered with a non-2xx status.
  #[error("request failed with status {status}: {message}")]
  Fetch { status: u16, message: String },

  /// The response body did not match the expected shape.
  #[error("malformed response body: {0}")]
  Decode(String),

  /// The account has no enrollment; semester/session selection cannot
  /// proceed.
  #[error("no enrollment found for this account")]
  NoEnrollment,

  /// Selector lists were empty or the (semester, session) pair is
  /// incomplete.
  #[error("semester or session selection is incomplete")]
  MalformedSelection,

  /// The durable token store failed.
  #[error("token storage error: {0}")]
  Storage(String),
}

impl Error {
  /// Transport-level failure, as opposed to a server answer of any kind.
  pub fn is_network(&self) -> bool { matches!(self, Self::Network(_)) }

  /// Rejected credential on login or identity check.
  pub fn is_auth_rejected(&self) -> bool {
    matches!(self, Self::AuthRejected(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
