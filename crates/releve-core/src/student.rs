//! Identity and reference wire types.
//!
//! Field renames follow the portal's JSON contract (French keys). Everything
//! here is a read-only snapshot decoded fresh per request; nothing is mutated
//! in place.

use serde::{Deserialize, Serialize};

// ─── Account ─────────────────────────────────────────────────────────────────

/// The authenticated account, as returned by `GET /userConnecter`.
///
/// `enrollments` is not part of the identity payload. The session layer
/// attaches it via a second lookup keyed on [`ine`](User::ine) and replaces
/// it wholesale on every identity fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub id:          i64,
  pub email:       String,
  /// Institutional student identifier.
  pub ine:         String,
  #[serde(rename = "prenom")]
  pub first_name:  String,
  #[serde(rename = "nom")]
  pub last_name:   String,
  #[serde(default)]
  pub telephone:   Option<String>,
  #[serde(default)]
  pub activated:   bool,
  #[serde(rename = "inscriptions", default)]
  pub enrollments: Vec<Enrollment>,
}

impl User {
  /// Display name, family name first as the portal prints it.
  pub fn display_name(&self) -> String {
    format!("{} {}", self.last_name, self.first_name)
  }
}

// ─── Enrollment chain ────────────────────────────────────────────────────────

/// A student's registration in a level for an academic year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
  pub id:            i64,
  #[serde(rename = "etat", default)]
  pub state:         Option<String>,
  #[serde(rename = "niveau")]
  pub level:         Level,
  #[serde(rename = "anneeAccademique")]
  pub academic_year: AcademicYear,
}

/// Academic level within a program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
  pub id:       i64,
  #[serde(rename = "codeNiveau", default)]
  pub code:     Option<String>,
  #[serde(rename = "libelle", default)]
  pub label:    Option<String>,
  /// Final year of its program; drives the reclamation-window lookup.
  #[serde(default)]
  pub terminal: bool,
  #[serde(rename = "formation")]
  pub program:  Program,
}

/// Degree program, owned by a department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
  pub id:         i64,
  #[serde(rename = "codeFormation", default)]
  pub code:       Option<String>,
  #[serde(rename = "nomFormation", default)]
  pub name:       Option<String>,
  #[serde(rename = "departement", default)]
  pub department: Option<Department>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Department {
  pub id:    i64,
  #[serde(default)]
  pub code:  Option<String>,
  #[serde(rename = "libelle", default)]
  pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcademicYear {
  pub id:     i64,
  #[serde(rename = "nomAnneeAccademique", default)]
  pub label:  Option<String>,
  #[serde(rename = "actif", default)]
  pub active: bool,
}

// ─── Selector entities ───────────────────────────────────────────────────────

/// Semester selector entry; ids are unique within a fetched list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Semester {
  pub id:     i64,
  #[serde(rename = "nomSemestre")]
  pub label:  String,
  #[serde(rename = "actif", default)]
  pub active: bool,
}

/// Exam session selector entry (e.g. "normale", "rattrapage").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamSession {
  pub id:    i64,
  #[serde(rename = "session")]
  pub label: String,
}

// ─── Reclamation window ──────────────────────────────────────────────────────

/// Period during which grade reclamations are accepted. Fetched per
/// (year, program, session) and surfaced as a notice; never aggregated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReclamationWindow {
  pub id:     i64,
  #[serde(rename = "dateDebut")]
  pub starts: String,
  #[serde(rename = "dateFin")]
  pub ends:   String,
  #[serde(rename = "isActive", default)]
  pub active: bool,
}
