use crate::api::ApiClient;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::mutation::MutationPipeline;
use crate::query::{QueryClient, QueryKey, QuerySubscription, QueryValue};
use crate::session::Session;
use crate::ui::components::{ToastSender, Toasts};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{LoginView, RecordsView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::{info, warn};

/// Main application state
///
/// The app owns the shared services (session, api, query cache, mutation
/// pipeline, toasts) and a navigation stack of views. Which stack is
/// mounted follows the session: a stored token mounts the records stack,
/// no token mounts the login stack.
pub struct App {
  config: Config,
  session: Session,
  api: ApiClient,
  queries: QueryClient,
  mutations: MutationPipeline,
  toasts: Toasts,
  toast_tx: ToastSender,

  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,

  /// Held while the records stack is mounted so the header can show who
  /// is signed in
  current_user: Option<QuerySubscription>,

  /// Which stack view_stack currently holds
  stack_is_authenticated: bool,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, session: Session) -> Result<Self> {
    let api = ApiClient::new(&config.api.base_url, session.clone())?;
    let queries = QueryClient::new();
    let mutations = MutationPipeline::new(api.clone(), queries.clone());
    let toasts = Toasts::new();
    let toast_tx = toasts.sender();

    let mut app = App {
      config,
      session,
      api,
      queries,
      mutations,
      toasts,
      toast_tx,
      view_stack: Vec::new(),
      current_user: None,
      stack_is_authenticated: false,
      should_quit: false,
    };
    app.mount_stack(app.session.is_authenticated());
    Ok(app)
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.tick(),
    }
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    let Some(view) = self.view_stack.last_mut() else {
      return;
    };
    match view.handle_key(key) {
      ViewAction::None => {}
      ViewAction::Push(next) => self.view_stack.push(next),
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::Logout => self.logout(),
    }
  }

  /// Per-tick housekeeping: apply settled fetches and mutations, toast
  /// mutation outcomes, watch for a rejected session, expire toasts, let
  /// the active view drain its channels, and keep the mounted stack in
  /// step with the session.
  fn tick(&mut self) {
    let notifications = self.queries.pump();
    let mut session_rejected = notifications.iter().any(|notification| {
      self
        .queries
        .snapshot(&notification.key)
        .and_then(|snapshot| snapshot.error)
        .is_some_and(|error| error.is_unauthorized())
    });

    for outcome in self.mutations.pump() {
      if outcome.error().is_some_and(|error| error.is_unauthorized()) {
        session_rejected = true;
      }
      if outcome.is_success() {
        self.toast_tx.success(outcome.notice());
      } else {
        self.toast_tx.error(outcome.notice());
      }
    }

    if session_rejected && self.session.is_authenticated() {
      self.expire_session();
    }

    self.toasts.tick();
    if let Some(view) = self.view_stack.last_mut() {
      view.tick();
    }
    self.reconcile_stack();
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Main content
        Constraint::Length(1), // Footer
      ])
      .split(frame.area());

    let title = self
      .config
      .title
      .clone()
      .unwrap_or_else(|| self.api.host().to_string());
    let email = self
      .current_user
      .as_ref()
      .and_then(|sub| sub.snapshot().user().map(|user| user.email.clone()));
    let shortcuts = self
      .view_stack
      .last()
      .map(|view| view.shortcuts())
      .unwrap_or_default();
    draw_header(frame, chunks[0], &title, email.as_deref(), &shortcuts);

    let breadcrumb: Vec<String> = self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect();
    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, chunks[1]);
    }
    draw_footer(frame, chunks[2], &breadcrumb, self.toasts.latest());
  }

  /// Replace the navigation stack to match the session state
  fn mount_stack(&mut self, authenticated: bool) {
    self.stack_is_authenticated = authenticated;
    if authenticated {
      info!("mounting records stack");
      self.current_user = Some(self.subscribe_current_user());
      self.view_stack = vec![Box::new(RecordsView::new(
        self.api.clone(),
        self.queries.clone(),
        self.mutations.clone(),
        self.config.categories.clone(),
      ))];
    } else {
      info!("mounting login stack");
      self.current_user = None;
      self.view_stack = vec![Box::new(LoginView::new(
        self.api.clone(),
        self.session.clone(),
        self.queries.clone(),
        self.toast_tx.clone(),
      ))];
    }
  }

  fn subscribe_current_user(&self) -> QuerySubscription {
    let api = self.api.clone();
    self.queries.subscribe(QueryKey::CurrentUser, move || {
      let api = api.clone();
      async move { api.fetch_current_user().await.map(QueryValue::User) }
    })
  }

  fn reconcile_stack(&mut self) {
    let authenticated = self.session.is_authenticated();
    if authenticated != self.stack_is_authenticated {
      self.mount_stack(authenticated);
    }
  }

  /// Swapping the stack first drops every view subscription, so the
  /// invalidation that follows evicts all cached entries outright instead
  /// of refetching them without a token.
  fn logout(&mut self) {
    info!("logging out");
    if let Err(e) = self.session.clear() {
      warn!("failed to clear session: {e}");
      self.toast_tx.error(format!("Failed to log out: {}", e));
      return;
    }
    self.reconcile_stack();
    self.queries.invalidate_all();
    self.toast_tx.success("Successfully logged out!");
  }

  fn expire_session(&mut self) {
    warn!("session rejected by the service, returning to login");
    if let Err(e) = self.session.clear() {
      warn!("failed to clear session: {e}");
    }
    self.reconcile_stack();
    self.queries.invalidate_all();
    self.toast_tx.error("Session expired. Please log in again.");
  }
}
