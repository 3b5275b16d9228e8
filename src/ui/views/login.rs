use crate::api::{ApiClient, ApiError, ApiResponse, Credentials, TokenPayload};
use crate::query::{QueryClient, QueryKey};
use crate::session::Session;
use crate::ui::centered_rect;
use crate::ui::components::{TextInput, ToastSender};
use crate::ui::renderfns::draw_text_field;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::RegisterView;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use tokio::sync::mpsc;
use tracing::info;

type AuthSettlement = Result<ApiResponse<TokenPayload>, ApiError>;

/// Email and password form, the root view while signed out.
///
/// The sign-in call runs on a worker task and settles over a channel; the
/// app notices the stored token on its tick and mounts the records stack.
pub struct LoginView {
  api: ApiClient,
  session: Session,
  queries: QueryClient,
  toasts: ToastSender,
  email: TextInput,
  password: TextInput,
  focus: usize,
  error: Option<String>,
  pending: bool,
  settlements_tx: mpsc::UnboundedSender<AuthSettlement>,
  settlements_rx: mpsc::UnboundedReceiver<AuthSettlement>,
}

impl LoginView {
  pub fn new(api: ApiClient, session: Session, queries: QueryClient, toasts: ToastSender) -> Self {
    let (settlements_tx, settlements_rx) = mpsc::unbounded_channel();
    LoginView {
      api,
      session,
      queries,
      toasts,
      email: TextInput::new(),
      password: TextInput::masked(),
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
    if email.is_empty() || password.is_empty() {
      self.error = Some("Email and password are required".to_string());
      return;
    }

    self.error = None;
    self.pending = true;
    let api = self.api.clone();
    let tx = self.settlements_tx.clone();
    tokio::spawn(async move {
      let result = api.login(&Credentials { email, password }).await;
      let _ = tx.send(result);
    });
  }

  fn focused_input(&mut self) -> &mut TextInput {
    if self.focus == 0 {
      &mut self.email
    } else {
      &mut self.password
    }
  }
}

impl View for LoginView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if key.code == KeyCode::Char('n') && key.modifiers.contains(KeyModifiers::CONTROL) {
      return ViewAction::Push(Box::new(RegisterView::new(
        self.api.clone(),
        self.session.clone(),
        self.queries.clone(),
        self.toasts.clone(),
      )));
    }

    match key.code {
      KeyCode::Enter => {
        self.submit();
        ViewAction::None
      }
      // Two fields, so forward and backward both toggle
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
        self.focus = (self.focus + 1) % 2;
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
      " Login (signing in...) "
    } else {
      " Login "
    };
    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let form = centered_rect(inner, 44, 9);
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(3), // Email
        Constraint::Length(3), // Password
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

    if let Some(error) = &self.error {
      frame.render_widget(
        Paragraph::new(error.as_str())
          .style(Style::default().fg(Color::Red))
          .alignment(Alignment::Center),
        chunks[2],
      );
    }

    frame.render_widget(
      Paragraph::new("Enter: sign in   Ctrl-N: create an account")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center),
      chunks[4],
    );
  }

  fn breadcrumb_label(&self) -> String {
    "Login".to_string()
  }

  fn tick(&mut self) {
    while let Ok(result) = self.settlements_rx.try_recv() {
      self.pending = false;
      match result {
        Ok(envelope) => {
          info!("login accepted");
          if let Err(e) = self.session.set_token(&envelope.data.token) {
            self.error = Some(format!("Failed to store session: {}", e));
            continue;
          }
          self.queries.invalidate_key(&QueryKey::CurrentUser);
          self
            .toasts
            .success(envelope.message.unwrap_or_else(|| "Logged in".to_string()));
        }
        Err(error) => {
          self.error = Some(format!("Failed to login: {}", error.message()));
        }
      }
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("Enter", "sign in").with_priority(10),
      ShortcutInfo::new("Tab", "next field").with_priority(20),
      ShortcutInfo::new("C-n", "register").with_priority(30),
    ]
  }
}
