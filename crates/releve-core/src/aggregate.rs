//! Pure aggregation over a result snapshot.
//!
//! Single-pass computations over small in-memory collections; no function
//! mutates its input or holds hidden state, so calling anything here twice
//! on the same snapshot yields identical output.

use crate::grades::{StudentResultSet, TeachingUnit};

/// Passing threshold on the 0–20 scale, inclusive.
pub const PASS_MARK: f64 = 10.0;
/// Maximum mark; chart axes are pinned to it.
pub const MAX_MARK: f64 = 20.0;

// ─── Summary scalars ─────────────────────────────────────────────────────────

/// Overall average for the snapshot, as a 2-decimal string.
///
/// The authoritative `moyenneG` wins whenever it parses to a strictly
/// positive number — `"0.00"` therefore falls through. Otherwise the
/// credit-weighted mean over graded units is computed; `"0.00"` when no
/// graded unit carries credit.
pub fn overall_average(results: &StudentResultSet) -> String {
  if let Some(authoritative) = results.overall_average.as_deref()
    && authoritative.trim().parse::<f64>().is_ok_and(|v| v > 0.0)
  {
    return authoritative.to_string();
  }
  weighted_average(&results.units)
}

fn weighted_average(units: &[TeachingUnit]) -> String {
  let mut weighted = 0.0;
  let mut credits = 0.0;
  for unit in units {
    if let Some(average) = unit.average {
      weighted += average * unit.credit;
      credits += unit.credit;
    }
  }
  if credits > 0.0 {
    format!("{:.2}", weighted / credits)
  } else {
    "0.00".to_string()
  }
}

/// Credits for units passed outright — `average >= 10`, inclusive. Ungraded
/// units earn nothing.
pub fn credits_earned(units: &[TeachingUnit]) -> f64 {
  units
    .iter()
    .filter(|u| u.average.is_some_and(|a| a >= PASS_MARK))
    .map(|u| u.credit)
    .sum()
}

/// Credits over all units, pass or fail.
pub fn credits_possible(units: &[TeachingUnit]) -> f64 {
  units.iter().map(|u| u.credit).sum()
}

/// Whether a formatted overall average meets the pass mark.
pub fn passed(overall: &str) -> bool {
  overall.trim().parse::<f64>().is_ok_and(|v| v >= PASS_MARK)
}

// ─── Chart projections ───────────────────────────────────────────────────────

/// One radar point per unit, graded or not.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarPoint {
  pub label: String,
  pub value: f64,
  pub max:   f64,
}

/// Radar series over the full unit list. Ungraded units chart at zero; the
/// tables keep the graded/ungraded distinction visible.
pub fn radar_series(units: &[TeachingUnit]) -> Vec<RadarPoint> {
  units
    .iter()
    .map(|unit| RadarPoint {
      label: unit_label(unit),
      value: unit.average.unwrap_or(0.0),
      max:   MAX_MARK,
    })
    .collect()
}

/// Earned vs not-yet-earned credits, for a two-slice split.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CreditSplit {
  pub earned:    f64,
  pub remaining: f64,
}

pub fn credit_split(units: &[TeachingUnit]) -> CreditSplit {
  let earned = credits_earned(units);
  CreditSplit { earned, remaining: credits_possible(units) - earned }
}

/// A constituent element ranked by its upstream average.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedElement {
  pub label:   String,
  pub cc:      f64,
  pub tp:      f64,
  pub ds:      f64,
  pub average: f64,
}

/// Top `limit` elements across all units, best average first. Elements
/// missing an average or a title are skipped.
pub fn top_elements(units: &[TeachingUnit], limit: usize) -> Vec<RankedElement> {
  let mut ranked: Vec<RankedElement> = units
    .iter()
    .flat_map(|unit| unit.elements.iter())
    .filter_map(|ec| {
      let average = ec.average?;
      let title = ec.title.as_deref()?;
      Some(RankedElement {
        label: element_label(title),
        cc: ec.cc.unwrap_or(0.0),
        tp: ec.tp.unwrap_or(0.0),
        ds: ec.ds.unwrap_or(0.0),
        average,
      })
    })
    .collect();
  ranked.sort_by(|a, b| b.average.total_cmp(&a.average));
  ranked.truncate(limit);
  ranked
}

/// One bar per unit with a strictly positive average.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitBar {
  pub label:   String,
  pub code:    String,
  pub average: f64,
  pub credit:  f64,
}

pub fn bar_series(units: &[TeachingUnit]) -> Vec<UnitBar> {
  units
    .iter()
    .filter(|u| u.average.is_some_and(|a| a > 0.0))
    .map(|unit| UnitBar {
      label:   unit_label(unit),
      code:    unit.code().to_string(),
      average: unit.average.unwrap_or(0.0),
      credit:  unit.credit,
    })
    .collect()
}

// ─── Labels ──────────────────────────────────────────────────────────────────

/// Unit display label: title truncated to 15 chars, `"UE"` when absent.
fn unit_label(unit: &TeachingUnit) -> String {
  match unit.title.as_deref() {
    Some(title) => title.chars().take(15).collect(),
    None => "UE".to_string(),
  }
}

/// Element display label: the part after the first `:`, trimmed, capped at
/// 20 chars with an ellipsis.
pub fn element_label(title: &str) -> String {
  let name = title
    .split_once(':')
    .map(|(_, rest)| rest.trim())
    .filter(|rest| !rest.is_empty())
    .unwrap_or(title);
  if name.chars().count() > 20 {
    let mut short: String = name.chars().take(20).collect();
    short.push('…');
    short
  } else {
    name.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grades::{ConstituentElement, UnitHistory};

  fn unit(average: Option<f64>, credit: f64) -> TeachingUnit {
    TeachingUnit {
      average,
      credit,
      title: Some(format!("Unit {credit}")),
      history: None,
      absences: 0,
      elements: Vec::new(),
    }
  }

  fn snapshot(moyenne_g: Option<&str>, units: Vec<TeachingUnit>) -> StudentResultSet {
    StudentResultSet {
      last_name: "Diop".into(),
      first_name: "Awa".into(),
      semester_label: "Semestre 1".into(),
      level_label: None,
      overall_average: moyenne_g.map(String::from),
      session_label: "normale".into(),
      absences: 0,
      rescued: false,
      units,
    }
  }

  fn element(average: Option<f64>, title: Option<&str>) -> ConstituentElement {
    ConstituentElement {
      cc: Some(10.0),
      tp: None,
      ds: Some(12.0),
      average,
      title: title.map(String::from),
      coefficient: 1.0,
      credit: 0.0,
    }
  }

  // ── Overall average ───────────────────────────────────────────────────────

  #[test]
  fn authoritative_average_wins_over_fallback() {
    let results = snapshot(
      Some("12.50"),
      vec![unit(Some(8.0), 10.0)], // fallback would be 8.00
    );
    assert_eq!(overall_average(&results), "12.50");
  }

  #[test]
  fn zero_authoritative_average_triggers_fallback() {
    let results = snapshot(
      Some("0.00"),
      vec![unit(Some(14.0), 6.0), unit(Some(8.0), 4.0)],
    );
    // (14*6 + 8*4) / 10 = 11.60
    assert_eq!(overall_average(&results), "11.60");
    assert_eq!(credits_earned(&results.units), 6.0);
    assert_eq!(credits_possible(&results.units), 10.0);
  }

  #[test]
  fn missing_authoritative_average_triggers_fallback() {
    let results = snapshot(None, vec![unit(Some(10.0), 5.0)]);
    assert_eq!(overall_average(&results), "10.00");
  }

  #[test]
  fn unparseable_authoritative_average_triggers_fallback() {
    let results = snapshot(Some("N/A"), vec![unit(Some(11.0), 3.0)]);
    assert_eq!(overall_average(&results), "11.00");
  }

  #[test]
  fn empty_unit_list_yields_zero_everything() {
    let results = snapshot(None, Vec::new());
    assert_eq!(overall_average(&results), "0.00");
    assert_eq!(credits_earned(&results.units), 0.0);
    assert_eq!(credits_possible(&results.units), 0.0);
  }

  #[test]
  fn all_units_ungraded_yields_zero_average() {
    let results = snapshot(None, vec![unit(None, 6.0), unit(None, 4.0)]);
    assert_eq!(overall_average(&results), "0.00");
  }

  #[test]
  fn graded_zero_counts_toward_the_denominator() {
    // A graded zero drags the mean down; an ungraded unit does not.
    let graded = snapshot(None, vec![unit(Some(0.0), 4.0), unit(Some(16.0), 4.0)]);
    assert_eq!(overall_average(&graded), "8.00");

    let ungraded = snapshot(None, vec![unit(None, 4.0), unit(Some(16.0), 4.0)]);
    assert_eq!(overall_average(&ungraded), "16.00");
  }

  // ── Credits ───────────────────────────────────────────────────────────────

  #[test]
  fn earned_never_exceeds_possible() {
    let lists = [
      vec![],
      vec![unit(Some(10.0), 6.0)],
      vec![unit(Some(9.99), 6.0), unit(Some(17.0), 4.0)],
      vec![unit(None, 3.0), unit(Some(0.0), 3.0), unit(Some(20.0), 0.0)],
    ];
    for units in &lists {
      assert!(credits_earned(units) <= credits_possible(units));
    }
  }

  #[test]
  fn pass_boundary_is_inclusive() {
    assert_eq!(credits_earned(&[unit(Some(10.0), 5.0)]), 5.0);
    assert_eq!(credits_earned(&[unit(Some(9.99), 5.0)]), 0.0);
    assert!(passed("10.00"));
    assert!(!passed("9.99"));
    assert!(!passed("garbage"));
  }

  #[test]
  fn ungraded_units_earn_nothing() {
    assert_eq!(credits_earned(&[unit(None, 8.0)]), 0.0);
    assert_eq!(credits_possible(&[unit(None, 8.0)]), 8.0);
  }

  #[test]
  fn zero_credit_unit_counts_in_neither_sum_but_still_displays() {
    let units = vec![unit(Some(15.0), 0.0), unit(Some(12.0), 5.0)];
    assert_eq!(credits_earned(&units), 5.0);
    assert_eq!(credits_possible(&units), 5.0);
    // Still present in the display projections.
    assert_eq!(radar_series(&units).len(), 2);
  }

  #[test]
  fn aggregation_is_idempotent() {
    let results = snapshot(None, vec![unit(Some(13.0), 6.0), unit(None, 4.0)]);
    assert_eq!(overall_average(&results), overall_average(&results));
    assert_eq!(radar_series(&results.units), radar_series(&results.units));
    assert_eq!(bar_series(&results.units), bar_series(&results.units));
  }

  // ── Projections ───────────────────────────────────────────────────────────

  #[test]
  fn radar_labels_truncate_and_fall_back() {
    let mut long = unit(Some(12.0), 3.0);
    long.title = Some("Analyse Numérique et Optimisation".into());
    let mut untitled = unit(None, 2.0);
    untitled.title = None;

    let series = radar_series(&[long, untitled]);
    assert_eq!(series[0].label.chars().count(), 15);
    assert_eq!(series[0].max, 20.0);
    assert_eq!(series[1].label, "UE");
    assert_eq!(series[1].value, 0.0);
  }

  #[test]
  fn credit_split_slices_add_up() {
    let units = vec![unit(Some(12.0), 6.0), unit(Some(7.0), 4.0)];
    let split = credit_split(&units);
    assert_eq!(split.earned, 6.0);
    assert_eq!(split.remaining, 4.0);
  }

  #[test]
  fn top_elements_filters_sorts_and_caps() {
    let mut holder = unit(Some(12.0), 6.0);
    holder.elements = vec![
      element(Some(9.0), Some("EC1 : Algebre")),
      element(Some(15.0), Some("EC2 : Analyse")),
      element(None, Some("EC3 : Pas encore note")),
      element(Some(18.0), None),
      element(Some(11.0), Some("EC4 : Probabilites")),
      element(Some(13.0), Some("EC5 : Statistiques")),
      element(Some(10.0), Some("EC6 : Geometrie")),
      element(Some(12.0), Some("EC7 : Logique")),
    ];

    let top = top_elements(&[holder], 5);
    assert_eq!(top.len(), 5);
    assert_eq!(top[0].label, "Analyse");
    assert_eq!(top[0].average, 15.0);
    // Missing scores chart as zero.
    assert_eq!(top[0].tp, 0.0);
    // Descending order, nulls and untitled entries gone.
    assert!(top.windows(2).all(|w| w[0].average >= w[1].average));
    assert!(top.iter().all(|e| e.average >= 10.0));
  }

  #[test]
  fn element_labels_normalise() {
    assert_eq!(element_label("EC1 : Analyse"), "Analyse");
    assert_eq!(element_label("Analyse"), "Analyse");
    assert_eq!(element_label("EC1 :"), "EC1 :");
    let long = element_label("EC : Traitement Numérique du Signal");
    assert_eq!(long.chars().count(), 21); // 20 + ellipsis
    assert!(long.ends_with('…'));
  }

  #[test]
  fn bar_series_skips_zero_and_ungraded_units() {
    let mut coded = unit(Some(14.0), 6.0);
    coded.history = Some(UnitHistory {
      id:    7,
      code:  Some("UE-INF-12".into()),
      title: None,
    });
    let units = vec![coded, unit(Some(0.0), 4.0), unit(None, 2.0)];

    let bars = bar_series(&units);
    assert_eq!(bars.len(), 1);
    assert_eq!(bars[0].code, "UE-INF-12");
    assert_eq!(bars[0].average, 14.0);
    assert_eq!(bars[0].credit, 6.0);
  }
}
