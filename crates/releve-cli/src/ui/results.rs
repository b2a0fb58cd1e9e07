//! Results screen — selectors, summary, tables, and charts.

use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{
    Bar, BarChart, BarGroup, Block, Borders, Cell, Gauge, List, ListItem,
    Paragraph, Row, Sparkline, Table, TableState, Wrap,
  },
};
use releve_client::selection::SelectionCoordinator;
use releve_core::{
  aggregate::{self, PASS_MARK},
  grades::{StudentResultSet, TeachingUnit},
  student::ReclamationWindow,
};

use crate::app::App;
use crate::ui::centered_rect;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  if app.no_enrollment {
    draw_message(f, area, "Aucune inscription trouvée pour cet utilisateur", Color::Yellow);
    return;
  }
  if let Some(message) = &app.selection_error {
    draw_retryable_error(f, area, message);
    return;
  }
  let Some(selection) = &app.selection else {
    draw_message(f, area, "Chargement des semestres…", Color::DarkGray);
    return;
  };

  let has_notice = app.reclamation.as_ref().is_some_and(|w| w.active);
  let constraints = if has_notice {
    vec![
      Constraint::Length(3),
      Constraint::Min(0),
      Constraint::Length(1),
    ]
  } else {
    vec![Constraint::Length(3), Constraint::Min(0)]
  };
  let rows = Layout::vertical(constraints).split(area);

  draw_selectors(f, rows[0], selection);

  let body = rows[1];
  if app.results_busy {
    draw_message(f, body, "Chargement des résultats…", Color::DarkGray);
  } else if let Some(message) = &app.results_error {
    draw_retryable_error(f, body, message);
  } else if let Some(results) = &app.results {
    draw_results(f, body, app, results);
  } else {
    draw_message(
      f,
      body,
      "Sélectionnez un semestre et une session pour afficher vos résultats",
      Color::DarkGray,
    );
  }

  if has_notice
    && let Some(window) = &app.reclamation
  {
    draw_notice(f, rows[2], window);
  }
}

// ─── Selector bar ─────────────────────────────────────────────────────────────

fn draw_selectors(f: &mut Frame, area: Rect, selection: &SelectionCoordinator) {
  let block = Block::default()
    .title(" Sélection ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);

  let bold = Style::default().add_modifier(Modifier::BOLD);
  let dim = Style::default().fg(Color::DarkGray);
  let line = Line::from(vec![
    Span::styled(" Semestre ⟨s⟩ ", dim),
    Span::styled(selection.semester_label().unwrap_or("—").to_string(), bold),
    Span::styled("    Session ⟨e⟩ ", dim),
    Span::styled(selection.session_label().unwrap_or("—").to_string(), bold),
  ]);
  f.render_widget(Paragraph::new(line), inner);
}

// ─── Results body ─────────────────────────────────────────────────────────────

fn draw_results(f: &mut Frame, area: Rect, app: &App, results: &StudentResultSet) {
  let rows = Layout::vertical([
    Constraint::Length(3), // summary tiles
    Constraint::Length(3), // pass/fail banner
    Constraint::Min(8),    // table + charts
    Constraint::Length(8), // EC detail
  ])
  .split(area);

  let overall = aggregate::overall_average(results);
  let earned = aggregate::credits_earned(&results.units);
  let possible = aggregate::credits_possible(&results.units);

  draw_tiles(f, rows[0], results, &overall, earned, possible);
  draw_banner(f, rows[1], results, &overall, earned, possible);

  let cols = Layout::horizontal([
    Constraint::Percentage(55),
    Constraint::Percentage(45),
  ])
  .split(rows[2]);
  draw_unit_table(f, cols[0], app, results);

  let chart_rows = Layout::vertical([
    Constraint::Min(7),    // averages per unit
    Constraint::Length(3), // credit gauge
    Constraint::Length(7), // top elements
  ])
  .split(cols[1]);
  draw_average_chart(f, chart_rows[0], &results.units);
  draw_credit_gauge(f, chart_rows[1], &results.units);
  draw_top_elements(f, chart_rows[2], &results.units);

  draw_element_detail(f, rows[3], app, results);
}

fn draw_tiles(
  f: &mut Frame,
  area: Rect,
  results: &StudentResultSet,
  overall: &str,
  earned: f64,
  possible: f64,
) {
  let tiles = Layout::horizontal([
    Constraint::Percentage(25),
    Constraint::Percentage(25),
    Constraint::Percentage(25),
    Constraint::Percentage(25),
  ])
  .split(area);

  let passing = aggregate::passed(overall);
  let average_style = Style::default()
    .fg(if passing { Color::Green } else { Color::Red })
    .add_modifier(Modifier::BOLD);
  draw_tile(f, tiles[0], " Moyenne générale ", overall.to_string(), average_style);

  draw_tile(
    f,
    tiles[1],
    " Crédits obtenus ",
    format!("{earned:.0} / {possible:.0}"),
    Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
  );
  draw_tile(
    f,
    tiles[2],
    " Absences ",
    results.absences.to_string(),
    Style::default().add_modifier(Modifier::BOLD),
  );

  // Per-unit profile; ungraded units chart at zero.
  let radar = aggregate::radar_series(&results.units);
  let profile: Vec<u64> = radar.iter().map(|p| p.value.round() as u64).collect();
  let block = Block::default()
    .title(" Profil par UE ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(tiles[3]);
  f.render_widget(block, tiles[3]);
  f.render_widget(
    Sparkline::default()
      .data(&profile)
      .max(aggregate::MAX_MARK as u64)
      .style(Style::default().fg(Color::Cyan)),
    inner,
  );
}

fn draw_tile(f: &mut Frame, area: Rect, title: &str, value: String, style: Style) {
  let block = Block::default()
    .title(title)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(Paragraph::new(Span::styled(format!(" {value}"), style)), inner);
}

fn draw_banner(
  f: &mut Frame,
  area: Rect,
  results: &StudentResultSet,
  overall: &str,
  earned: f64,
  possible: f64,
) {
  let passing = aggregate::passed(overall);
  let (color, mut text) = if passing {
    (
      Color::Green,
      format!(
        "Semestre validé — moyenne générale {overall}, {earned:.0} crédits validés sur {possible:.0}."
      ),
    )
  } else {
    (
      Color::Yellow,
      format!(
        "Semestre en cours de validation — moyenne {overall}. Une moyenne d'au moins 10/20 est nécessaire."
      ),
    )
  };
  if results.rescued {
    text.push_str(" (repêchage)");
  }

  let block = Block::default()
    .borders(Borders::ALL)
    .border_style(Style::default().fg(color));
  let inner = block.inner(area);
  f.render_widget(block, area);
  f.render_widget(
    Paragraph::new(Span::styled(format!(" {text}"), Style::default().fg(color)))
      .wrap(Wrap { trim: true }),
    inner,
  );
}

// ─── Unit table ───────────────────────────────────────────────────────────────

fn draw_unit_table(f: &mut Frame, area: Rect, app: &App, results: &StudentResultSet) {
  let header = Row::new(vec!["Code", "Unité d'enseignement", "Moyenne", "Crédits", "État"])
    .style(Style::default().add_modifier(Modifier::BOLD));

  let rows: Vec<Row> = results
    .units
    .iter()
    .map(|unit| {
      let (state, state_color) = unit_state(unit);
      Row::new(vec![
        Cell::from(unit.code().to_string()),
        Cell::from(unit.title.as_deref().unwrap_or("—").to_string()),
        Cell::from(Span::styled(fmt_score(unit.average), score_style(unit.average))),
        Cell::from(format!("{:.1}", unit.credit)),
        Cell::from(Span::styled(state, Style::default().fg(state_color))),
      ])
    })
    .collect();

  let table = Table::new(
    rows,
    [
      Constraint::Length(10),
      Constraint::Min(20),
      Constraint::Length(8),
      Constraint::Length(8),
      Constraint::Length(12),
    ],
  )
  .header(header)
  .block(
    Block::default()
      .title(format!(" Unités d'enseignement ({}) ", results.units.len()))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray)),
  )
  .row_highlight_style(
    Style::default()
      .bg(Color::Blue)
      .fg(Color::White)
      .add_modifier(Modifier::BOLD),
  );

  let mut state = TableState::default();
  state.select(if results.units.is_empty() {
    None
  } else {
    Some(app.unit_cursor)
  });
  f.render_stateful_widget(table, area, &mut state);
}

fn unit_state(unit: &TeachingUnit) -> (&'static str, Color) {
  match unit.average {
    Some(a) if a >= PASS_MARK => ("Validée", Color::Green),
    Some(_) => ("Non validée", Color::Red),
    None => ("En attente", Color::DarkGray),
  }
}

// ─── Charts ───────────────────────────────────────────────────────────────────

fn draw_average_chart(f: &mut Frame, area: Rect, units: &[TeachingUnit]) {
  let series = aggregate::bar_series(units);
  let bars: Vec<Bar> = series
    .iter()
    .map(|bar| {
      let label = if bar.code.is_empty() { &bar.label } else { &bar.code };
      let color = if bar.average >= PASS_MARK { Color::Green } else { Color::Red };
      Bar::default()
        .value(bar.average.round() as u64)
        .text_value(format!("{:.1}", bar.average))
        .label(Line::from(label.clone()))
        .style(Style::default().fg(color))
    })
    .collect();

  let chart = BarChart::default()
    .block(
      Block::default()
        .title(" Moyennes par UE ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray)),
    )
    .data(BarGroup::default().bars(&bars))
    .bar_width(8)
    .bar_gap(1)
    .max(aggregate::MAX_MARK as u64);
  f.render_widget(chart, area);
}

fn draw_credit_gauge(f: &mut Frame, area: Rect, units: &[TeachingUnit]) {
  let split = aggregate::credit_split(units);
  let possible = split.earned + split.remaining;
  let ratio = if possible > 0.0 {
    (split.earned / possible).clamp(0.0, 1.0)
  } else {
    0.0
  };

  let gauge = Gauge::default()
    .block(
      Block::default()
        .title(" Répartition des crédits ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray)),
    )
    .gauge_style(Style::default().fg(Color::Green).bg(Color::Red))
    .ratio(ratio)
    .label(format!("{:.0} / {:.0}", split.earned, possible));
  f.render_widget(gauge, area);
}

fn draw_top_elements(f: &mut Frame, area: Rect, units: &[TeachingUnit]) {
  let top = aggregate::top_elements(units, 5);
  let items: Vec<ListItem> = top
    .iter()
    .enumerate()
    .map(|(i, ec)| {
      let color = if ec.average >= PASS_MARK { Color::Green } else { Color::Red };
      ListItem::new(Line::from(vec![
        Span::styled(
          format!(" {:>5.2}  ", ec.average),
          Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("{}. {}", i + 1, ec.label)),
      ]))
    })
    .collect();

  let list = List::new(items).block(
    Block::default()
      .title(" Top 5 ECs ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray)),
  );
  f.render_widget(list, area);
}

// ─── Element detail ───────────────────────────────────────────────────────────

fn draw_element_detail(
  f: &mut Frame,
  area: Rect,
  app: &App,
  results: &StudentResultSet,
) {
  let Some(unit) = results.units.get(app.unit_cursor) else {
    return;
  };

  let title = format!(
    " Éléments constitutifs — {} ",
    unit.title.as_deref().unwrap_or("UE")
  );
  let header = Row::new(vec!["Matière", "CC", "TP", "DS", "Moyenne"])
    .style(Style::default().add_modifier(Modifier::BOLD));

  let rows: Vec<Row> = unit
    .elements
    .iter()
    .map(|ec| {
      let label = ec
        .title
        .as_deref()
        .map(aggregate::element_label)
        .unwrap_or_else(|| "N/A".to_string());
      Row::new(vec![
        Cell::from(label),
        Cell::from(fmt_score(ec.cc)),
        Cell::from(fmt_score(ec.tp)),
        Cell::from(fmt_score(ec.ds)),
        Cell::from(Span::styled(fmt_score(ec.average), score_style(ec.average))),
      ])
    })
    .collect();

  let table = Table::new(
    rows,
    [
      Constraint::Min(24),
      Constraint::Length(7),
      Constraint::Length(7),
      Constraint::Length(7),
      Constraint::Length(8),
    ],
  )
  .header(header)
  .block(
    Block::default()
      .title(title)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::DarkGray)),
  );
  f.render_widget(table, area);
}

// ─── Shared bits ──────────────────────────────────────────────────────────────

fn fmt_score(score: Option<f64>) -> String {
  match score {
    Some(value) => format!("{value:.2}"),
    None => "-".to_string(),
  }
}

fn score_style(score: Option<f64>) -> Style {
  match score {
    Some(value) if value >= PASS_MARK => Style::default().fg(Color::Green),
    Some(_) => Style::default().fg(Color::Red),
    None => Style::default().fg(Color::DarkGray),
  }
}

fn draw_message(f: &mut Frame, area: Rect, message: &str, color: Color) {
  let panel = centered_rect(area, (message.chars().count() as u16 + 6).min(area.width), 3);
  f.render_widget(
    Paragraph::new(Span::styled(message.to_string(), Style::default().fg(color)))
      .alignment(Alignment::Center)
      .wrap(Wrap { trim: true }),
    panel,
  );
}

fn draw_retryable_error(f: &mut Frame, area: Rect, message: &str) {
  let panel = centered_rect(area, 60, 6);
  let block = Block::default()
    .title(" Erreur ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Red));
  let inner = block.inner(panel);
  f.render_widget(block, panel);
  f.render_widget(
    Paragraph::new(vec![
      Line::from(Span::styled(message.to_string(), Style::default().fg(Color::Red))),
      Line::default(),
      Line::from(Span::styled(
        "[r] réessayer",
        Style::default().fg(Color::DarkGray),
      )),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true }),
    inner,
  );
}

fn draw_notice(f: &mut Frame, area: Rect, window: &ReclamationWindow) {
  let text = format!(
    " Réclamations ouvertes du {} au {} ",
    window.starts, window.ends
  );
  f.render_widget(
    Paragraph::new(Span::styled(
      text,
      Style::default().fg(Color::Black).bg(Color::Yellow),
    )),
    area,
  );
}
