//! Login screen — entry form, restore spinner, and the auth error panel.

use ratatui::{
  Frame,
  layout::{Alignment, Rect},
  style::{Color, Modifier, Style},
  text::{Line, Span},
  widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, LoginField};
use crate::ui::centered_rect;

pub fn draw(f: &mut Frame, area: Rect, app: &App) {
  let panel = centered_rect(area, 56, 13);

  if app.auth_busy {
    draw_busy(f, panel);
    return;
  }
  if let Some(message) = &app.auth_error {
    draw_error(f, panel, message);
    return;
  }
  draw_form(f, panel, app);
}

fn draw_busy(f: &mut Frame, panel: Rect) {
  let block = Block::default()
    .title(" Portail des Résultats Académiques ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(panel);
  f.render_widget(block, panel);

  let body = Paragraph::new(vec![
    Line::default(),
    Line::from("Vérification de l'authentification…"),
    Line::default(),
    Line::from(Span::styled(
      "Connexion au serveur en cours",
      Style::default().fg(Color::DarkGray),
    )),
  ])
  .alignment(Alignment::Center);
  f.render_widget(body, inner);
}

fn draw_error(f: &mut Frame, panel: Rect, message: &str) {
  let block = Block::default()
    .title(" Erreur de connexion ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Red));
  let inner = block.inner(panel);
  f.render_widget(block, panel);

  let body = Paragraph::new(vec![
    Line::default(),
    Line::from(Span::styled(
      message.to_string(),
      Style::default().fg(Color::Red),
    )),
    Line::default(),
    Line::from(Span::styled(
      "[r] réessayer    [b] retour à la connexion",
      Style::default().fg(Color::DarkGray),
    )),
  ])
  .alignment(Alignment::Center)
  .wrap(Wrap { trim: true });
  f.render_widget(body, inner);
}

fn draw_form(f: &mut Frame, panel: Rect, app: &App) {
  let block = Block::default()
    .title(" Portail des Résultats Académiques ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::DarkGray));
  let inner = block.inner(panel);
  f.render_widget(block, panel);

  let masked: String = "•".repeat(app.password.chars().count());
  let lines = vec![
    Line::default(),
    field_label("Email", app.login_focus == LoginField::Email),
    field_value(&app.email, app.login_focus == LoginField::Email),
    Line::default(),
    field_label("Mot de passe", app.login_focus == LoginField::Password),
    field_value(&masked, app.login_focus == LoginField::Password),
    Line::default(),
    Line::from(Span::styled(
      " Entrée pour vous connecter",
      Style::default().fg(Color::DarkGray),
    )),
  ];
  f.render_widget(Paragraph::new(lines), inner);
}

fn field_label(label: &str, focused: bool) -> Line<'static> {
  let style = if focused {
    Style::default()
      .fg(Color::Cyan)
      .add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(Color::Gray)
  };
  Line::from(Span::styled(format!(" {label}"), style))
}

fn field_value(value: &str, focused: bool) -> Line<'static> {
  let cursor = if focused { "▌" } else { "" };
  let style = if focused {
    Style::default().fg(Color::Yellow)
  } else {
    Style::default()
  };
  Line::from(Span::styled(format!("  {value}{cursor}"), style))
}
