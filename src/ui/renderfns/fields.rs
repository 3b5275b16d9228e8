//! Field renderers shared by the auth and record forms.

use crate::ui::components::TextInput;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Draw a one-line text input in a bordered block. The focused field gets
/// a yellow border and a trailing cursor mark.
pub fn draw_text_field(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  input: &TextInput,
  focused: bool,
) {
  let inner = draw_field_block(frame, area, title, focused);

  let mut spans = vec![Span::raw(input.display_value())];
  if focused {
    spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
  }
  frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

/// Draw a select value in a bordered block, with cycle arrows when focused
pub fn draw_select_field(frame: &mut Frame, area: Rect, title: &str, value: &str, focused: bool) {
  let inner = draw_field_block(frame, area, title, focused);

  let line = if focused {
    Line::from(vec![
      Span::styled("◂ ", Style::default().fg(Color::Yellow)),
      Span::raw(value.to_string()),
      Span::styled(" ▸", Style::default().fg(Color::Yellow)),
    ])
  } else {
    Line::from(value.to_string())
  };
  frame.render_widget(Paragraph::new(line), inner);
}

fn draw_field_block(frame: &mut Frame, area: Rect, title: &str, focused: bool) -> Rect {
  let border = if focused {
    Color::Yellow
  } else {
    Color::DarkGray
  };
  let block = Block::default()
    .title(title.to_string())
    .borders(Borders::ALL)
    .border_style(Style::default().fg(border));
  let inner = block.inner(area);
  frame.render_widget(block, area);
  inner
}
