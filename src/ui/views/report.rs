use crate::api::{ApiClient, ReportData};
use crate::query::{QueryClient, QueryKey, QueryStatus, QuerySubscription, QueryValue};
use crate::ui::renderfns::{format_money, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use std::collections::BTreeMap;

/// Balance, the income/expense split, and per-category breakdowns.
pub struct ReportView {
  queries: QueryClient,
  subscription: QuerySubscription,
}

impl ReportView {
  pub fn new(api: ApiClient, queries: QueryClient) -> Self {
    let subscription = queries.subscribe(QueryKey::Report, move || {
      let api = api.clone();
      async move { api.fetch_report().await.map(QueryValue::Report) }
    });
    ReportView {
      queries,
      subscription,
    }
  }
}

impl View for ReportView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('r') => {
        self.queries.invalidate_key(&QueryKey::Report);
        ViewAction::None
      }
      KeyCode::Char('q') | KeyCode::Esc | KeyCode::Tab => ViewAction::Pop,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let snapshot = self.subscription.snapshot();
    let title = match snapshot.status {
      QueryStatus::Loading if snapshot.value.is_none() => " Report (loading...) ".to_string(),
      QueryStatus::Loading => " Report (refreshing...) ".to_string(),
      QueryStatus::Error => format!(
        " Report (error: {}) ",
        snapshot.error_message().unwrap_or_default()
      ),
      _ => " Report ".to_string(),
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(report) = snapshot.report() else {
      let paragraph = if snapshot.is_loading() {
        Paragraph::new("Loading report...").style(Style::default().fg(Color::DarkGray))
      } else {
        Paragraph::new("Failed to load report. Press 'r' to retry.")
          .style(Style::default().fg(Color::Red))
      };
      frame.render_widget(paragraph, inner);
      return;
    };

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Balance
        Constraint::Length(1), // Totals
        Constraint::Length(3), // Split gauge
        Constraint::Min(3),    // Category columns
      ])
      .split(inner);

    let balance_style = if report.balance < 0.0 {
      Style::default().fg(Color::Red).bold()
    } else {
      Style::default().fg(Color::Green).bold()
    };
    let balance = Line::from(vec![
      Span::styled(" Balance: ", Style::default().fg(Color::DarkGray)),
      Span::styled(format_money(report.balance), balance_style),
    ]);
    frame.render_widget(Paragraph::new(balance), chunks[0]);

    let totals = Line::from(vec![
      Span::styled(" Income: ", Style::default().fg(Color::DarkGray)),
      Span::styled(
        format_money(report.total_income),
        Style::default().fg(Color::Cyan),
      ),
      Span::styled("   Expense: ", Style::default().fg(Color::DarkGray)),
      Span::styled(
        format_money(report.total_expense),
        Style::default().fg(Color::Magenta),
      ),
    ]);
    frame.render_widget(Paragraph::new(totals), chunks[1]);

    let expense_share = report.expense_percent();
    let gauge = Gauge::default()
      .block(
        Block::default()
          .title(" Expense vs income ")
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::DarkGray)),
      )
      .gauge_style(Style::default().fg(Color::Magenta).bg(Color::Cyan))
      .ratio((expense_share / 100.0).clamp(0.0, 1.0))
      .label(format!(
        "Expense {:.0}%  │  Income {:.0}%",
        expense_share,
        report.income_percent()
      ));
    frame.render_widget(gauge, chunks[2]);

    let columns = Layout::default()
      .direction(Direction::Horizontal)
      .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
      .split(chunks[3]);

    draw_breakdown(
      frame,
      columns[0],
      "Expense",
      report.total_expense,
      &report.expense_categories,
      Color::Magenta,
    );
    draw_breakdown(
      frame,
      columns[1],
      "Income",
      report.total_income,
      &report.income_categories,
      Color::Cyan,
    );
  }

  fn breadcrumb_label(&self) -> String {
    "Report".to_string()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("r", "refresh").with_priority(10),
      ShortcutInfo::new("Tab", "records").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(30),
    ]
  }
}

fn draw_breakdown(
  frame: &mut Frame,
  area: Rect,
  label: &str,
  total: f64,
  categories: &BTreeMap<String, f64>,
  color: Color,
) {
  let block = Block::default()
    .title(format!(" {} ({}) ", label, format_money(total)))
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(color));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  if categories.is_empty() {
    frame.render_widget(
      Paragraph::new("No entries yet.").style(Style::default().fg(Color::DarkGray)),
      inner,
    );
    return;
  }

  let bar_width = (inner.width.saturating_sub(2) as usize).clamp(1, 32);
  let mut lines = Vec::new();
  for (category, amount) in categories {
    let percent = ReportData::share_percent(*amount, total);
    let (filled, rest) = bar_segments(percent, bar_width);
    lines.push(Line::from(vec![
      Span::raw(format!("{:<14}", truncate(category, 14))),
      Span::styled(
        format!("{:>10}", format_money(*amount)),
        Style::default().fg(Color::White),
      ),
      Span::styled(format!(" {:>4.0}%", percent), Style::default().fg(Color::DarkGray)),
    ]));
    lines.push(Line::from(vec![
      Span::styled("█".repeat(filled), Style::default().fg(color)),
      Span::styled("░".repeat(rest), Style::default().fg(Color::DarkGray)),
    ]));
  }
  frame.render_widget(Paragraph::new(lines), inner);
}

/// Split a bar of `width` cells into filled and unfilled runs. A zero
/// total gives an empty bar, never a fake even split.
fn bar_segments(percent: f64, width: usize) -> (usize, usize) {
  let filled = ((percent / 100.0) * width as f64).round() as usize;
  let filled = filled.min(width);
  (filled, width - filled)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_bar_segments_span_the_width() {
    assert_eq!(bar_segments(0.0, 20), (0, 20));
    assert_eq!(bar_segments(100.0, 20), (20, 0));
    assert_eq!(bar_segments(50.0, 20), (10, 10));
  }

  #[test]
  fn test_bar_segments_round_to_cells() {
    assert_eq!(bar_segments(33.0, 10), (3, 7));
    assert_eq!(bar_segments(66.7, 10), (7, 3));
  }

  #[test]
  fn test_bar_segments_clamp_overshoot() {
    assert_eq!(bar_segments(150.0, 10), (10, 0));
  }
}
