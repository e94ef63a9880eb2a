use chrono::{
  DateTime,
  NaiveDate,
  Utc
};
use tracing::debug;

use crate::datastore::TaskStore;
use crate::datetime::{
  Zone,
  local_today
};
use crate::filter::{
  PriorityFilter,
  SortMode,
  StatusFilter,
  View,
  ViewQuery
};
use crate::kv::KeyValueStore;
use crate::task::Task;
use crate::theme::Theme;
use crate::validate::{
  TaskForm,
  ValidationErrors
};

/// Application state: the task store plus the current view
/// settings. Presentation code calls one intent method per user
/// action and then redraws from [`App::view`].
#[derive(Debug)]
pub struct App<S: KeyValueStore> {
  store: TaskStore<S>,
  query: ViewQuery,
  zone:  Zone
}

impl<S: KeyValueStore> App<S> {
  pub fn new(kv: S, zone: Zone) -> Self {
    Self {
      store: TaskStore::open(kv),
      query: ViewQuery::default(),
      zone
    }
  }

  pub fn task(
    &self,
    id: u64
  ) -> Option<&Task> {
    self.store.get(id)
  }

  pub fn today(
    &self,
    now: DateTime<Utc>
  ) -> NaiveDate {
    local_today(now, &self.zone)
  }

  pub fn add(
    &mut self,
    form: &TaskForm,
    now: DateTime<Utc>
  ) -> Result<Task, ValidationErrors> {
    let today = self.today(now);
    self.store.add(form, today, now)
  }

  pub fn remove(
    &mut self,
    id: u64
  ) -> bool {
    self.store.remove(id)
  }

  pub fn toggle(
    &mut self,
    id: u64
  ) -> Option<bool> {
    self.store.toggle_completed(id)
  }

  pub fn clear_completed(
    &mut self
  ) -> usize {
    self.store.clear_completed()
  }

  pub fn set_status_filter(
    &mut self,
    status: StatusFilter
  ) {
    debug!(%status, "status filter changed");
    self.query.status = status;
  }

  pub fn set_priority_filter(
    &mut self,
    priority: PriorityFilter
  ) {
    debug!(%priority, "priority filter changed");
    self.query.priority = priority;
  }

  pub fn set_sort(
    &mut self,
    sort: SortMode
  ) {
    debug!(%sort, "sort mode changed");
    self.query.sort = sort;
  }

  pub fn theme(&self) -> Theme {
    self.store.theme()
  }

  pub fn set_theme(
    &mut self,
    theme: &Theme
  ) {
    self.store.set_theme(theme);
  }

  pub fn view(&self) -> View<'_> {
    View::build(
      self.store.tasks(),
      &self.query
    )
  }

  pub fn last_write_error(
    &self
  ) -> Option<&str> {
    self.store.last_write_error()
  }
}
