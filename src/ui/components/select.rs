use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};

/// Events emitted by a select that the parent may react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectEvent {
  /// The selected option changed
  Changed,
}

/// A small option cycler: Left and Right step through a fixed list
#[derive(Debug, Clone, Default)]
pub struct Select {
  options: Vec<String>,
  selected: usize,
}

impl Select {
  pub fn new(options: Vec<String>) -> Self {
    Select {
      options,
      selected: 0,
    }
  }

  /// Select with `value` preselected. A value missing from the options is
  /// appended, so editing never discards data the service already accepted.
  pub fn with_selected(options: Vec<String>, value: &str) -> Self {
    let mut select = Select::new(options);
    match select.options.iter().position(|option| option == value) {
      Some(idx) => select.selected = idx,
      None => {
        select.options.push(value.to_string());
        select.selected = select.options.len() - 1;
      }
    }
    select
  }

  /// The currently selected option
  pub fn value(&self) -> &str {
    self
      .options
      .get(self.selected)
      .map(String::as_str)
      .unwrap_or("")
  }

  /// Handle a key event, returning the result
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<SelectEvent> {
    if self.options.is_empty() {
      return KeyResult::NotHandled;
    }
    match key.code {
      KeyCode::Left => {
        self.selected = self
          .selected
          .checked_sub(1)
          .unwrap_or(self.options.len() - 1);
        KeyResult::Event(SelectEvent::Changed)
      }
      KeyCode::Right => {
        self.selected = (self.selected + 1) % self.options.len();
        KeyResult::Event(SelectEvent::Changed)
      }
      _ => KeyResult::NotHandled,
    }
  }
}
