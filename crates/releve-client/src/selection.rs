//! Semester/session selection and grade-fetch staleness tracking.

use releve_core::{
  Error, Result,
  portal::PortalApi,
  student::{ExamSession, Semester},
};

// ─── Selection coordinator ───────────────────────────────────────────────────

/// Holds the selector lists for one enrollment and the current choice of
/// each side.
///
/// Both lists are fetched concurrently and joined before any default is
/// chosen; the first entry of each list is default-selected. A complete
/// `(semester, session)` pair is re-emitted on every change to either side.
#[derive(Debug, Clone)]
pub struct SelectionCoordinator {
  semesters:   Vec<Semester>,
  sessions:    Vec<ExamSession>,
  semester_id: Option<i64>,
  session_id:  Option<i64>,
}

impl SelectionCoordinator {
  /// Fetch both selector lists for `enrollment_id`.
  ///
  /// A failure on either side fails the whole load; there is no partial
  /// selection state.
  pub async fn load<A: PortalApi>(
    api: &A,
    token: &str,
    enrollment_id: i64,
  ) -> Result<Self> {
    let (semesters, sessions) = tokio::try_join!(
      api.semesters(token, enrollment_id),
      api.exam_sessions(token),
    )?;
    Ok(Self::from_lists(semesters, sessions))
  }

  /// Build a coordinator from already-fetched lists, defaulting to the
  /// first entry of each.
  pub fn from_lists(semesters: Vec<Semester>, sessions: Vec<ExamSession>) -> Self {
    let semester_id = semesters.first().map(|s| s.id);
    let session_id = sessions.first().map(|s| s.id);
    Self { semesters, sessions, semester_id, session_id }
  }

  pub fn semesters(&self) -> &[Semester] { &self.semesters }

  pub fn sessions(&self) -> &[ExamSession] { &self.sessions }

  pub fn semester_id(&self) -> Option<i64> { self.semester_id }

  pub fn session_id(&self) -> Option<i64> { self.session_id }

  /// Label of the selected semester, if any.
  pub fn semester_label(&self) -> Option<&str> {
    let id = self.semester_id?;
    self
      .semesters
      .iter()
      .find(|s| s.id == id)
      .map(|s| s.label.as_str())
  }

  /// Label of the selected exam session, if any.
  pub fn session_label(&self) -> Option<&str> {
    let id = self.session_id?;
    self
      .sessions
      .iter()
      .find(|s| s.id == id)
      .map(|s| s.label.as_str())
  }

  /// The complete pair, if both sides are selected.
  pub fn selection(&self) -> Option<(i64, i64)> {
    Some((self.semester_id?, self.session_id?))
  }

  /// Like [`selection`](Self::selection) but surfacing the incomplete case
  /// as the error that blocks a results fetch.
  pub fn require_selection(&self) -> Result<(i64, i64)> {
    self.selection().ok_or(Error::MalformedSelection)
  }

  /// Select a semester by id. Ids not present in the list are ignored.
  /// Returns the pair if it is complete after the change.
  pub fn select_semester(&mut self, id: i64) -> Option<(i64, i64)> {
    if self.semesters.iter().any(|s| s.id == id) {
      self.semester_id = Some(id);
    }
    self.selection()
  }

  /// Select an exam session by id. Ids not present in the list are ignored.
  pub fn select_session(&mut self, id: i64) -> Option<(i64, i64)> {
    if self.sessions.iter().any(|s| s.id == id) {
      self.session_id = Some(id);
    }
    self.selection()
  }

  /// Advance the semester selection to the next list entry, wrapping.
  pub fn cycle_semester(&mut self) -> Option<(i64, i64)> {
    self.semester_id = next_id(&self.semesters, self.semester_id, |s| s.id);
    self.selection()
  }

  /// Advance the session selection to the next list entry, wrapping.
  pub fn cycle_session(&mut self) -> Option<(i64, i64)> {
    self.session_id = next_id(&self.sessions, self.session_id, |s| s.id);
    self.selection()
  }
}

fn next_id<T>(
  list: &[T],
  current: Option<i64>,
  id_of: impl Fn(&T) -> i64,
) -> Option<i64> {
  if list.is_empty() {
    return None;
  }
  let pos = current.and_then(|id| list.iter().position(|x| id_of(x) == id));
  let next = match pos {
    Some(i) => (i + 1) % list.len(),
    None => 0,
  };
  Some(id_of(&list[next]))
}

// ─── Grade-fetch staleness ───────────────────────────────────────────────────

/// Tag identifying one outbound grade fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeFetchTag {
  seq:             u64,
  pub semester_id: i64,
  pub session_id:  i64,
}

/// Issues tags for grade fetches and rejects completions that no longer
/// match the latest issue.
///
/// A slow response for an old selection must never overwrite a faster one
/// for the current selection; a completion is accepted only while its tag
/// is the most recently issued.
#[derive(Debug, Default)]
pub struct GradeFetchTracker {
  last_issued: u64,
}

impl GradeFetchTracker {
  pub fn new() -> Self { Self::default() }

  /// Tag a fetch for the given selection pair.
  pub fn issue(&mut self, semester_id: i64, session_id: i64) -> GradeFetchTag {
    self.last_issued += 1;
    GradeFetchTag { seq: self.last_issued, semester_id, session_id }
  }

  /// Whether a completion carrying `tag` is still current.
  pub fn is_current(&self, tag: GradeFetchTag) -> bool {
    tag.seq == self.last_issued
  }
}
