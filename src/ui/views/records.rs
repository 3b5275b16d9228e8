use crate::api::{ApiClient, Record, RecordFilter, SortField, SortOrder, TypeFilter};
use crate::config::CategoriesConfig;
use crate::mutation::{MutationPipeline, RecordMutation};
use crate::query::{
  QueryClient, QueryKey, QuerySnapshot, QueryStatus, QuerySubscription, QueryValue,
};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{truncate, type_color};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{RecordFormView, ReportView};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

const COLUMNS: [SortField; 5] = [
  SortField::Date,
  SortField::Type,
  SortField::Amount,
  SortField::Category,
  SortField::Description,
];

/// Sortable, filterable table of records, the root view while signed in.
pub struct RecordsView {
  api: ApiClient,
  queries: QueryClient,
  mutations: MutationPipeline,
  categories: CategoriesConfig,
  filter: RecordFilter,
  subscription: QuerySubscription,
  table_state: TableState,
}

impl RecordsView {
  pub fn new(
    api: ApiClient,
    queries: QueryClient,
    mutations: MutationPipeline,
    categories: CategoriesConfig,
  ) -> Self {
    let filter = RecordFilter::default();
    let subscription = subscribe(&queries, &api, filter);
    RecordsView {
      api,
      queries,
      mutations,
      categories,
      filter,
      subscription,
      table_state: TableState::default(),
    }
  }

  /// Swap the subscription to the current filter. The old entry stays
  /// cached under retention, so flipping back shortly after is instant.
  fn resubscribe(&mut self) {
    self.subscription = subscribe(&self.queries, &self.api, self.filter);
  }

  fn set_sort(&mut self, field: SortField) {
    if self.filter.sort_by == field {
      self.filter.order = self.filter.order.toggled();
    } else {
      self.filter.sort_by = field;
      self.filter.order = SortOrder::Asc;
    }
    self.resubscribe();
  }

  fn cycle_type_filter(&mut self) {
    self.filter.type_filter = self.filter.type_filter.next();
    self.resubscribe();
  }

  fn selected_record(&self) -> Option<Record> {
    let snapshot = self.subscription.snapshot();
    let records = snapshot.records()?;
    let selected = self.table_state.selected()?;
    records.get(selected).cloned()
  }

  fn title(&self, snapshot: &QuerySnapshot) -> String {
    let scope = match self.filter.type_filter {
      TypeFilter::All => "Records".to_string(),
      filtered => format!("Records [{}]", filtered.label()),
    };
    match snapshot.status {
      QueryStatus::Loading if snapshot.value.is_none() => format!(" {} (loading...) ", scope),
      QueryStatus::Loading => format!(" {} (refreshing...) ", scope),
      QueryStatus::Error => format!(
        " {} (error: {}) ",
        scope,
        snapshot.error_message().unwrap_or_default()
      ),
      _ => format!(
        " {} ({}) ",
        scope,
        snapshot.records().map(|records| records.len()).unwrap_or(0)
      ),
    }
  }

  /// Column header with a direction arrow on the active sort field
  fn column_header(&self, field: SortField) -> String {
    if self.filter.sort_by == field {
      let arrow = match self.filter.order {
        SortOrder::Asc => '▲',
        SortOrder::Desc => '▼',
      };
      format!("{} {}", field.label(), arrow)
    } else {
      field.label().to_string()
    }
  }
}

fn subscribe(queries: &QueryClient, api: &ApiClient, filter: RecordFilter) -> QuerySubscription {
  let api = api.clone();
  queries.subscribe(QueryKey::Records(filter), move || {
    let api = api.clone();
    async move {
      api
        .fetch_records(&filter)
        .await
        .map(|page| QueryValue::Records(page.data))
    }
  })
}

impl View for RecordsView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.table_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.table_state.select_previous(),
      KeyCode::Char('f') => self.cycle_type_filter(),
      KeyCode::Char('D') => self.set_sort(SortField::Date),
      KeyCode::Char('T') => self.set_sort(SortField::Type),
      KeyCode::Char('A') => self.set_sort(SortField::Amount),
      KeyCode::Char('C') => self.set_sort(SortField::Category),
      KeyCode::Char('E') => self.set_sort(SortField::Description),
      KeyCode::Char('r') => self.queries.invalidate_key(self.subscription.key()),
      KeyCode::Char('a') => {
        return ViewAction::Push(Box::new(RecordFormView::create(
          self.mutations.clone(),
          self.categories.clone(),
        )));
      }
      KeyCode::Char('e') => {
        if let Some(record) = self.selected_record() {
          return ViewAction::Push(Box::new(RecordFormView::edit(
            self.mutations.clone(),
            self.categories.clone(),
            &record,
          )));
        }
      }
      KeyCode::Char('d') => {
        if let Some(record) = self.selected_record() {
          self.mutations.submit(RecordMutation::Delete { id: record.id });
        }
      }
      KeyCode::Tab => {
        return ViewAction::Push(Box::new(ReportView::new(
          self.api.clone(),
          self.queries.clone(),
        )));
      }
      KeyCode::Char('L') => return ViewAction::Logout,
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let snapshot = self.subscription.snapshot();
    let records = snapshot.records().unwrap_or(&[]);
    ensure_valid_selection(&mut self.table_state, records.len());

    let block = Block::default()
      .title(self.title(&snapshot))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if records.is_empty() {
      let content = if snapshot.is_loading() {
        "Loading records..."
      } else if snapshot.is_error() {
        "Failed to load records. Press 'r' to retry."
      } else {
        "No records yet. Press 'a' to add one."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let header = Row::new(
      COLUMNS
        .into_iter()
        .map(|field| Cell::from(self.column_header(field)))
        .collect::<Vec<_>>(),
    )
    .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = records
      .iter()
      .map(|record| {
        Row::new(vec![
          Cell::from(record.date.format("%d-%m-%Y").to_string()),
          Cell::from(Span::styled(
            record.record_type.label(),
            Style::default().fg(type_color(record.record_type)),
          )),
          Cell::from(format!("{:>10.2}", record.amount)),
          Cell::from(truncate(&record.category, 16)),
          Cell::from(record.description.clone().unwrap_or_default()),
        ])
      })
      .collect();

    let widths = [
      Constraint::Length(12),
      Constraint::Length(9),
      Constraint::Length(12),
      Constraint::Length(16),
      Constraint::Min(12),
    ];

    let table = Table::new(rows, widths)
      .header(header)
      .block(block)
      .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
      .highlight_symbol("> ");

    frame.render_stateful_widget(table, area, &mut self.table_state);
  }

  fn breadcrumb_label(&self) -> String {
    "Records".to_string()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("a", "add").with_priority(10),
      ShortcutInfo::new("e", "edit").with_priority(20),
      ShortcutInfo::new("d", "delete").with_priority(30),
      ShortcutInfo::new("f", "type filter").with_priority(40),
      ShortcutInfo::new("D/T/A/C/E", "sort").with_priority(50),
      ShortcutInfo::new("Tab", "report").with_priority(60),
      ShortcutInfo::new("r", "refresh").with_priority(70),
      ShortcutInfo::new("L", "logout").with_priority(80),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}
