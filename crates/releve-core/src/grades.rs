//! The nested grade tree returned by the results endpoint.
//!
//! Upstream distinguishes "graded with a zero" from "not graded yet" by
//! sending `0` vs `null`. Every score here is therefore an `Option`, and
//! nothing in this crate collapses the two.

use serde::{Deserialize, Serialize};

// ─── Constituent element (EC) ────────────────────────────────────────────────

/// One gradable sub-component of a teaching unit.
///
/// `average` comes from upstream as-is; it is never recomputed from the
/// cc/tp/ds parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstituentElement {
  /// Continuous-assessment score.
  #[serde(default)]
  pub cc:          Option<f64>,
  /// Lab score.
  #[serde(default)]
  pub tp:          Option<f64>,
  /// Written-exam score.
  #[serde(default)]
  pub ds:          Option<f64>,
  #[serde(rename = "moyenne", default)]
  pub average:     Option<f64>,
  #[serde(rename = "intitule", default)]
  pub title:       Option<String>,
  #[serde(default)]
  pub coefficient: f64,
  #[serde(default)]
  pub credit:      f64,
}

// ─── Teaching unit (UE) ──────────────────────────────────────────────────────

/// Historical metadata for a unit; only the display code is consumed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitHistory {
  pub id:    i64,
  #[serde(rename = "newCode", default)]
  pub code:  Option<String>,
  #[serde(rename = "intitules", default)]
  pub title: Option<String>,
}

/// One teaching unit: a credit-weighted gradable unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeachingUnit {
  /// `None` means "not graded yet"; `Some(0.0)` means "graded, failing".
  #[serde(rename = "moyenneUE", default)]
  pub average:  Option<f64>,
  #[serde(default)]
  pub credit:   f64,
  #[serde(rename = "intituleUE", default)]
  pub title:    Option<String>,
  #[serde(rename = "historiqueUniteEnseignement", default)]
  pub history:  Option<UnitHistory>,
  #[serde(rename = "nbAbence", default)]
  pub absences: i64,
  #[serde(rename = "provisoirs", default)]
  pub elements: Vec<ConstituentElement>,
}

impl TeachingUnit {
  /// Display code from the history record, empty when absent.
  pub fn code(&self) -> &str {
    self
      .history
      .as_ref()
      .and_then(|h| h.code.as_deref())
      .unwrap_or("")
  }
}

// ─── Result snapshot ─────────────────────────────────────────────────────────

/// The full result snapshot for one (enrollment, semester, session) triple.
///
/// Immutable; a new snapshot replaces the previous one on every selection
/// change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentResultSet {
  #[serde(rename = "nom")]
  pub last_name:       String,
  #[serde(rename = "prenom")]
  pub first_name:      String,
  #[serde(rename = "nomSemestre")]
  pub semester_label:  String,
  #[serde(rename = "libelle", default)]
  pub level_label:     Option<String>,
  /// Authoritative overall average. Absent or `"0.00"` means "compute the
  /// credit-weighted fallback instead".
  #[serde(rename = "moyenneG", default)]
  pub overall_average: Option<String>,
  #[serde(rename = "session")]
  pub session_label:   String,
  #[serde(rename = "nbAbences", default)]
  pub absences:        i64,
  #[serde(rename = "isrepeche", default)]
  pub rescued:         bool,
  #[serde(rename = "toutues", default)]
  pub units:           Vec<TeachingUnit>,
}

#[cfg(test)]
mod tests {
  use super::*;

  // Trimmed-down capture of a real results payload: French keys, nulls in
  // the score slots, no moyenneG.
  const RESULTS_JSON: &str = r#"{
    "nom": "Diop",
    "prenom": "Awa",
    "nomSemestre": "Semestre 1",
    "libelle": "Licence 2 Informatique",
    "session": "normale",
    "nbAbences": 3,
    "isrepeche": false,
    "toutues": [
      {
        "moyenneUE": 12.5,
        "credit": 6,
        "intituleUE": "UE Mathematiques",
        "nbAbence": 1,
        "historiqueUniteEnseignement": {
          "id": 41,
          "newCode": "UE-MAT-21",
          "intitules": "UE Mathematiques"
        },
        "provisoirs": [
          {
            "cc": 11.0,
            "tp": null,
            "ds": 14.0,
            "moyenne": 12.5,
            "intitule": "EC1 : Analyse",
            "coefficient": 2,
            "credit": 3
          },
          {
            "cc": null,
            "tp": null,
            "ds": null,
            "moyenne": null,
            "intitule": null,
            "coefficient": 1,
            "credit": 3
          }
        ]
      },
      {
        "moyenneUE": null,
        "credit": 4,
        "intituleUE": "UE Projet",
        "provisoirs": []
      }
    ]
  }"#;

  #[test]
  fn decodes_nested_payload() {
    let results: StudentResultSet = serde_json::from_str(RESULTS_JSON).unwrap();

    assert_eq!(results.last_name, "Diop");
    assert_eq!(results.overall_average, None);
    assert_eq!(results.units.len(), 2);

    let maths = &results.units[0];
    assert_eq!(maths.average, Some(12.5));
    assert_eq!(maths.code(), "UE-MAT-21");
    assert_eq!(maths.elements.len(), 2);
    assert_eq!(maths.elements[0].tp, None);
    assert_eq!(maths.elements[0].ds, Some(14.0));
    assert_eq!(maths.elements[1].average, None);

    // Ungraded unit decodes to None, not zero.
    assert_eq!(results.units[1].average, None);
    assert!(results.units[1].elements.is_empty());
  }

  #[test]
  fn zero_average_stays_distinct_from_null() {
    let unit: TeachingUnit =
      serde_json::from_str(r#"{"moyenneUE": 0, "credit": 2}"#).unwrap();
    assert_eq!(unit.average, Some(0.0));

    let unit: TeachingUnit =
      serde_json::from_str(r#"{"moyenneUE": null, "credit": 2}"#).unwrap();
    assert_eq!(unit.average, None);
  }

  #[test]
  fn rejects_wrong_shape() {
    // A string where the unit list belongs must fail fast, not decode to
    // something empty.
    let raw = r#"{
      "nom": "Diop", "prenom": "Awa", "nomSemestre": "S1",
      "session": "normale", "toutues": "oops"
    }"#;
    assert!(serde_json::from_str::<StudentResultSet>(raw).is_err());
  }
}
