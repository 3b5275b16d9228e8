use crate::api::{Record, RecordDraft, RecordType};
use crate::config::CategoriesConfig;
use crate::mutation::{MutationPipeline, RecordMutation};
use crate::ui::centered_rect;
use crate::ui::components::{Select, TextInput};
use crate::ui::renderfns::{draw_select_field, draw_text_field};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use chrono::{DateTime, NaiveDate, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

enum FormMode {
  Create,
  Edit { id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Type,
  Amount,
  Category,
  Date,
  Description,
}

impl Field {
  fn next(self) -> Field {
    match self {
      Field::Type => Field::Amount,
      Field::Amount => Field::Category,
      Field::Category => Field::Date,
      Field::Date => Field::Description,
      Field::Description => Field::Type,
    }
  }

  fn prev(self) -> Field {
    match self {
      Field::Type => Field::Description,
      Field::Amount => Field::Type,
      Field::Category => Field::Amount,
      Field::Date => Field::Category,
      Field::Description => Field::Date,
    }
  }
}

/// Create or edit a record. Enter validates and submits the mutation, then
/// pops back to the table; the outcome toast arrives via the app's pump.
pub struct RecordFormView {
  mutations: MutationPipeline,
  categories: CategoriesConfig,
  mode: FormMode,
  record_type: RecordType,
  amount: TextInput,
  category: Select,
  date: TextInput,
  description: TextInput,
  focus: Field,
  error: Option<String>,
}

impl RecordFormView {
  pub fn create(mutations: MutationPipeline, categories: CategoriesConfig) -> Self {
    let record_type = RecordType::Expense;
    let category = Select::new(categories.for_type(record_type).to_vec());
    RecordFormView {
      mutations,
      categories,
      mode: FormMode::Create,
      record_type,
      amount: TextInput::new(),
      category,
      date: TextInput::with_value(&Utc::now().format("%Y-%m-%d").to_string()),
      description: TextInput::new(),
      focus: Field::Type,
      error: None,
    }
  }

  pub fn edit(mutations: MutationPipeline, categories: CategoriesConfig, record: &Record) -> Self {
    let category = Select::with_selected(
      categories.for_type(record.record_type).to_vec(),
      &record.category,
    );
    RecordFormView {
      mutations,
      categories,
      mode: FormMode::Edit {
        id: record.id.clone(),
      },
      record_type: record.record_type,
      amount: TextInput::with_value(&format!("{:.2}", record.amount)),
      category,
      date: TextInput::with_value(&record.date.format("%Y-%m-%d").to_string()),
      description: TextInput::with_value(record.description.as_deref().unwrap_or("")),
      focus: Field::Type,
      error: None,
    }
  }

  /// Flipping the type swaps the category offerings, selection included
  fn toggle_type(&mut self) {
    self.record_type = match self.record_type {
      RecordType::Income => RecordType::Expense,
      RecordType::Expense => RecordType::Income,
    };
    self.category = Select::new(self.categories.for_type(self.record_type).to_vec());
  }

  fn submit(&mut self) -> ViewAction {
    match self.validate() {
      Ok(draft) => {
        match &self.mode {
          FormMode::Create => self.mutations.submit(RecordMutation::Create(draft)),
          FormMode::Edit { id } => self.mutations.submit(RecordMutation::Update {
            id: id.clone(),
            draft,
          }),
        }
        ViewAction::Pop
      }
      Err(message) => {
        self.error = Some(message);
        ViewAction::None
      }
    }
  }

  fn validate(&self) -> Result<RecordDraft, String> {
    let amount = parse_amount(self.amount.value())?;
    let date = parse_date(self.date.value())?;
    let category = self.category.value();
    if category.is_empty() {
      return Err("Category is required".to_string());
    }
    let description = match self.description.value().trim() {
      "" => None,
      text => Some(text.to_string()),
    };
    Ok(RecordDraft {
      amount,
      record_type: self.record_type,
      category: category.to_string(),
      description,
      date,
    })
  }
}

fn parse_amount(raw: &str) -> Result<f64, String> {
  let amount: f64 = raw
    .trim()
    .parse()
    .map_err(|_| "Amount must be a number".to_string())?;
  if !amount.is_finite() || amount < 0.0 {
    return Err("Amount must be zero or more".to_string());
  }
  Ok(amount)
}

fn parse_date(raw: &str) -> Result<DateTime<Utc>, String> {
  NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
    .ok()
    .and_then(|date| date.and_hms_opt(0, 0, 0))
    .map(|datetime| datetime.and_utc())
    .ok_or_else(|| "Date must be YYYY-MM-DD".to_string())
}

impl View for RecordFormView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Esc => return ViewAction::Pop,
      KeyCode::Enter => return self.submit(),
      KeyCode::Tab | KeyCode::Down => {
        self.focus = self.focus.next();
        return ViewAction::None;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus = self.focus.prev();
        return ViewAction::None;
      }
      _ => {}
    }

    match self.focus {
      Field::Type => {
        if matches!(key.code, KeyCode::Left | KeyCode::Right) {
          self.toggle_type();
        }
      }
      Field::Amount => {
        self.amount.handle_key(key);
      }
      Field::Category => {
        self.category.handle_key(key);
      }
      Field::Date => {
        self.date.handle_key(key);
      }
      Field::Description => {
        self.description.handle_key(key);
      }
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = match self.mode {
      FormMode::Create => " Add Record ",
      FormMode::Edit { .. } => " Edit Record ",
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let form = centered_rect(inner, 46, 17);
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(3), // Type
        Constraint::Length(3), // Amount
        Constraint::Length(3), // Category
        Constraint::Length(3), // Date
        Constraint::Length(3), // Description
        Constraint::Length(1), // Error
        Constraint::Length(1), // Hint
      ])
      .split(form);

    draw_select_field(
      frame,
      chunks[0],
      " Type ",
      self.record_type.label(),
      self.focus == Field::Type,
    );
    draw_text_field(
      frame,
      chunks[1],
      " Amount ",
      &self.amount,
      self.focus == Field::Amount,
    );
    draw_select_field(
      frame,
      chunks[2],
      " Category ",
      self.category.value(),
      self.focus == Field::Category,
    );
    draw_text_field(
      frame,
      chunks[3],
      " Date (YYYY-MM-DD) ",
      &self.date,
      self.focus == Field::Date,
    );
    draw_text_field(
      frame,
      chunks[4],
      " Description ",
      &self.description,
      self.focus == Field::Description,
    );

    if let Some(error) = &self.error {
      frame.render_widget(
        Paragraph::new(error.as_str())
          .style(Style::default().fg(Color::Red))
          .alignment(Alignment::Center),
        chunks[5],
      );
    }

    frame.render_widget(
      Paragraph::new("Enter: save   Esc: cancel")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center),
      chunks[6],
    );
  }

  fn breadcrumb_label(&self) -> String {
    match self.mode {
      FormMode::Create => "Add Record".to_string(),
      FormMode::Edit { .. } => "Edit Record".to_string(),
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("Tab", "next field").with_priority(10),
      ShortcutInfo::new("←/→", "choose").with_priority(20),
      ShortcutInfo::new("Enter", "save").with_priority(30),
      ShortcutInfo::new("Esc", "cancel").with_priority(40),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_amount_accepts_decimals() {
    assert_eq!(parse_amount("50"), Ok(50.0));
    assert_eq!(parse_amount(" 12.34 "), Ok(12.34));
    assert_eq!(parse_amount("0"), Ok(0.0));
  }

  #[test]
  fn test_parse_amount_rejects_garbage() {
    assert!(parse_amount("").is_err());
    assert!(parse_amount("abc").is_err());
    assert!(parse_amount("12,34").is_err());
    assert_eq!(
      parse_amount("-5"),
      Err("Amount must be zero or more".to_string())
    );
    assert!(parse_amount("inf").is_err());
  }

  #[test]
  fn test_parse_date_midnight_utc() {
    let parsed = parse_date("2026-03-15").unwrap();
    assert_eq!(parsed.to_rfc3339(), "2026-03-15T00:00:00+00:00");
  }

  #[test]
  fn test_parse_date_rejects_other_shapes() {
    assert!(parse_date("15-03-2026").is_err());
    assert!(parse_date("2026-13-40").is_err());
    assert!(parse_date("yesterday").is_err());
  }
}
