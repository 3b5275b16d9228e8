use crate::ui::components::{Toast, ToastLevel};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar with view breadcrumb and the most recent toast
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[String], toast: Option<&Toast>) {
  let toast_width = toast.map(|t| t.text.chars().count() as u16 + 2).unwrap_or(0);
  let chunks = Layout::default()
    .direction(Direction::Horizontal)
    .constraints([Constraint::Min(0), Constraint::Length(toast_width)])
    .split(area);

  let mut spans = Vec::new();

  spans.push(Span::raw(" "));

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      // Current view - highlighted
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.clone(), style));
  }

  let line = Line::from(spans);
  let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, chunks[0]);

  if let Some(toast) = toast {
    let color = match toast.level {
      ToastLevel::Success => Color::Green,
      ToastLevel::Error => Color::Red,
    };
    let paragraph = Paragraph::new(format!("{} ", toast.text))
      .style(Style::default().fg(color).bg(Color::Black))
      .alignment(Alignment::Right);
    frame.render_widget(paragraph, chunks[1]);
  }
}
