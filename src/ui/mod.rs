pub mod components;
pub mod renderfns;
pub mod view;
pub mod views;

use ratatui::prelude::Rect;
use ratatui::widgets::TableState;

/// Clamp the table selection to the current row count. Rows can appear or
/// vanish between frames when a refetch settles, so this runs every render.
pub fn ensure_valid_selection(state: &mut TableState, len: usize) {
  match state.selected() {
    Some(_) if len == 0 => state.select(None),
    Some(selected) if selected >= len => state.select(Some(len - 1)),
    None if len > 0 => state.select(Some(0)),
    _ => {}
  }
}

/// Centered sub-rect of `area`, clamped to fit inside it.
pub fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
  let width = width.min(area.width);
  let height = height.min(area.height);
  let x = area.x + area.width.saturating_sub(width) / 2;
  let y = area.y + area.height.saturating_sub(height) / 2;
  Rect::new(x, y, width, height)
}
