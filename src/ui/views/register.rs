use crate::api::{ApiClient, ApiError, ApiResponse, Credentials, TokenPayload};
use crate::query::{QueryClient, QueryKey};
use crate::session::Session;
use crate::ui::centered_rect;
use crate::ui::components::{TextInput, ToastSender};
use crate::ui::renderfns::draw_text_field;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use once_cell::sync::Lazy;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use regex::Regex;
use tokio::sync::mpsc;
use tracing::info;

static EMAIL_RE: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").unwrap());

type AuthSettlement = Result<ApiResponse<TokenPayload>, ApiError>;

/// Account creation form. A successful registration signs the user in
/// directly, same as a login.
pub struct RegisterView {
  api: ApiClient,
  session: Session,
  queries: QueryClient,
  toasts: ToastSender,
  email: TextInput,
  password: TextInput,
  confirm: TextInput,
  focus: usize,
  error: Option<String>,
  pending: bool,
  settlements_tx: mpsc::UnboundedSender<AuthSettlement>,
  settlements_rx: mpsc::UnboundedReceiver<AuthSettlement>,
}

impl RegisterView {
  pub fn new(api: ApiClient, session: Session, queries: QueryClient, toasts: ToastSender) -> Self {
    let (settlements_tx, settlements_rx) = mpsc::unbounded_channel();
    RegisterView {
      api,
      session,
      queries,
      toasts,
      email: TextInput::new(),
      password: TextInput::masked(),
      confirm: TextInput::masked(),
      focus: 0,
      error: None,
      pending: false,
      settlements_tx,
      settlements_rx,
    }
  }

  fn submit(&mut self) {
    if self.pending {
      return;
    }
    let email = self.email.value().trim().to_string();
    let password = self.password.value().to_string();
    if let Err(message) = validate(&email, &password, self.confirm.value()) {
      self.error = Some(message);
      return;
    }

    self.error = None;
    self.pending = true;
    let api = self.api.clone();
    let tx = self.settlements_tx.clone();
    tokio::spawn(async move {
      let result = api.register(&Credentials { email, password }).await;
      let _ = tx.send(result);
    });
  }

  fn focused_input(&mut self) -> &mut TextInput {
    match self.focus {
      0 => &mut self.email,
      1 => &mut self.password,
      _ => &mut self.confirm,
    }
  }
}

/// Field checks the service would reject anyway, reported before the
/// request goes out.
fn validate(email: &str, password: &str, confirm: &str) -> Result<(), String> {
  if !EMAIL_RE.is_match(email) {
    return Err("Invalid email".to_string());
  }
  if password.len() < 8 {
    return Err("Password must be at least 8 characters long".to_string());
  }
  if password != confirm {
    return Err("Passwords do not match".to_string());
  }
  Ok(())
}

impl View for RegisterView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Esc => ViewAction::Pop,
      KeyCode::Enter => {
        self.submit();
        ViewAction::None
      }
      KeyCode::Tab | KeyCode::Down => {
        self.focus = (self.focus + 1) % 3;
        ViewAction::None
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus = (self.focus + 2) % 3;
        ViewAction::None
      }
      _ => {
        self.focused_input().handle_key(key);
        ViewAction::None
      }
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let title = if self.pending {
      " Register (creating account...) "
    } else {
      " Register "
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let form = centered_rect(inner, 44, 12);
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(3), // Email
        Constraint::Length(3), // Password
        Constraint::Length(3), // Confirm
        Constraint::Length(1), // Error
        Constraint::Length(1),
        Constraint::Length(1), // Hint
      ])
      .split(form);

    let active = !self.pending;
    draw_text_field(frame, chunks[0], " Email ", &self.email, active && self.focus == 0);
    draw_text_field(
      frame,
      chunks[1],
      " Password ",
      &self.password,
      active && self.focus == 1,
    );
    draw_text_field(
      frame,
      chunks[2],
      " Confirm password ",
      &self.confirm,
      active && self.focus == 2,
    );

    if let Some(error) = &self.error {
      frame.render_widget(
        Paragraph::new(error.as_str())
          .style(Style::default().fg(Color::Red))
          .alignment(Alignment::Center),
        chunks[3],
      );
    }

    frame.render_widget(
      Paragraph::new("Enter: create account   Esc: back to login")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center),
      chunks[5],
    );
  }

  fn breadcrumb_label(&self) -> String {
    "Register".to_string()
  }

  fn tick(&mut self) {
    while let Ok(result) = self.settlements_rx.try_recv() {
      self.pending = false;
      match result {
        Ok(envelope) => {
          info!("registration accepted");
          if let Err(e) = self.session.set_token(&envelope.data.token) {
            self.error = Some(format!("Failed to store session: {}", e));
            continue;
          }
          self.queries.invalidate_key(&QueryKey::CurrentUser);
          self.toasts.success(
            envelope
              .message
              .unwrap_or_else(|| "Account created".to_string()),
          );
        }
        Err(error) => {
          self.error = Some(format!("Failed to register: {}", error.message()));
        }
      }
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("Enter", "create account").with_priority(10),
      ShortcutInfo::new("Tab", "next field").with_priority(20),
      ShortcutInfo::new("Esc", "back").with_priority(30),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_accepts_plain_and_dotted_emails() {
    assert!(validate("me@example.com", "longenough", "longenough").is_ok());
    assert!(validate("first.last@mail.co.uk", "longenough", "longenough").is_ok());
    assert!(validate("a-b@x-y.io", "longenough", "longenough").is_ok());
  }

  #[test]
  fn test_rejects_malformed_emails() {
    for email in ["", "plain", "@example.com", "me@", "me@.com", "me @x.com"] {
      assert_eq!(
        validate(email, "longenough", "longenough"),
        Err("Invalid email".to_string()),
        "{email:?} should be rejected"
      );
    }
  }

  #[test]
  fn test_rejects_short_password() {
    assert_eq!(
      validate("me@example.com", "seven77", "seven77"),
      Err("Password must be at least 8 characters long".to_string())
    );
  }

  #[test]
  fn test_rejects_mismatched_confirmation() {
    assert_eq!(
      validate("me@example.com", "longenough", "different"),
      Err("Passwords do not match".to_string())
    );
  }
}
