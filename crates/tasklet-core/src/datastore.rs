use std::collections::BTreeSet;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::kv::{KeyValueStore, THEME_KEY, TODOS_KEY};
use crate::task::Task;
use crate::theme::Theme;
use crate::validate::{TaskForm, ValidationErrors, validate};

/// Issues ids that look like millisecond timestamps but never repeat,
/// even when several tasks are created within the same millisecond.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn seeded(last: u64) -> Self {
        Self { last }
    }

    /// `None` once the id space above the last issued id is used up.
    pub fn next_id(&mut self, now: DateTime<Utc>) -> Option<u64> {
        let stamp = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let id = stamp.max(self.last.checked_add(1)?);
        self.last = id;
        Some(id)
    }
}

/// Ordered task collection mirrored into a key-value store after every change.
#[derive(Debug)]
pub struct TaskStore<S: KeyValueStore> {
    kv: S,
    tasks: Vec<Task>,
    ids: IdGenerator,
    last_write_error: Option<String>,
}

impl<S: KeyValueStore> TaskStore<S> {
    #[tracing::instrument(skip(kv))]
    pub fn open(kv: S) -> Self {
        let mut store = Self {
            kv,
            tasks: Vec::new(),
            ids: IdGenerator::default(),
            last_write_error: None,
        };
        store.tasks = store.load_all();
        let max_id = store.tasks.iter().map(|t| t.id).max().unwrap_or(0);
        store.ids = IdGenerator::seeded(max_id);
        info!(count = store.tasks.len(), "restored tasks");
        store
    }

    /// Reads the stored collection. Missing, unreadable, or malformed data
    /// all yield an empty list.
    #[tracing::instrument(skip(self))]
    pub fn load_all(&self) -> Vec<Task> {
        let raw = match self.kv.get(TODOS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("no stored tasks");
                return Vec::new();
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed reading stored tasks; starting empty");
                return Vec::new();
            }
        };

        if raw.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => {
                debug!(count = tasks.len(), "loaded tasks");
                tasks
            }
            Err(err) => {
                warn!(error = %err, "stored tasks are corrupt; starting empty");
                Vec::new()
            }
        }
    }

    /// Writes the whole collection, replacing whatever was stored before.
    #[tracing::instrument(skip(self), fields(count = self.tasks.len()))]
    pub fn persist(&mut self) -> anyhow::Result<()> {
        let serialized =
            serde_json::to_string(&self.tasks).context("failed to serialize tasks")?;
        self.kv
            .set(TODOS_KEY, &serialized)
            .context("failed to save tasks")?;
        Ok(())
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Message from the most recent failed write, cleared by the next
    /// successful one.
    pub fn last_write_error(&self) -> Option<&str> {
        self.last_write_error.as_deref()
    }

    pub fn kv(&self) -> &S {
        &self.kv
    }

    #[tracing::instrument(skip(self, form, now))]
    pub fn add(
        &mut self,
        form: &TaskForm,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Task, ValidationErrors> {
        let valid = validate(form, today)?;
        let id = match self.ids.next_id(now) {
            Some(id) => id,
            None => {
                let id = self.lowest_free_id();
                warn!(id, "id space exhausted; reusing lowest free id");
                id
            }
        };
        let task = Task::new(id, valid.text, valid.due, valid.priority, now);

        self.tasks.push(task.clone());
        self.persist_or_warn();
        info!(id, due = %task.due, priority = %task.priority, "task added");
        Ok(task)
    }

    /// Returns whether a task was removed. Unknown ids are not an error.
    #[tracing::instrument(skip(self))]
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let removed = self.tasks.len() != before;
        self.persist_or_warn();
        debug!(removed, "remove");
        removed
    }

    /// Flips `completed` and returns the new value, or `None` for an
    /// unknown id.
    #[tracing::instrument(skip(self))]
    pub fn toggle_completed(&mut self, id: u64) -> Option<bool> {
        let state = self.tasks.iter_mut().find(|t| t.id == id).map(|task| {
            task.completed = !task.completed;
            task.completed
        });
        self.persist_or_warn();
        debug!(?state, "toggle");
        state
    }

    #[tracing::instrument(skip(self))]
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| !t.completed);
        let cleared = before - self.tasks.len();
        self.persist_or_warn();
        info!(cleared, "cleared completed tasks");
        cleared
    }

    #[tracing::instrument(skip(self))]
    pub fn theme(&self) -> Theme {
        match self.kv.get(THEME_KEY) {
            Ok(raw) => Theme::from_stored(raw.as_deref()),
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed reading theme; using default");
                Theme::default()
            }
        }
    }

    #[tracing::instrument(skip(self, theme), fields(theme = %theme))]
    pub fn set_theme(&mut self, theme: &Theme) {
        match self.kv.set(THEME_KEY, theme.name()) {
            Ok(()) => self.last_write_error = None,
            Err(err) => self.record_write_error(err),
        }
    }

    fn lowest_free_id(&self) -> u64 {
        let taken: BTreeSet<u64> = self.tasks.iter().map(|t| t.id).collect();
        (1..=u64::MAX)
            .find(|id| !taken.contains(id))
            .unwrap_or_default()
    }

    fn persist_or_warn(&mut self) {
        match self.persist() {
            Ok(()) => self.last_write_error = None,
            Err(err) => self.record_write_error(err),
        }
    }

    fn record_write_error(&mut self, err: anyhow::Error) {
        let message = format!("{err:#}");
        warn!(error = %message, "write failed; in-memory state kept");
        self.last_write_error = Some(message);
    }
}
