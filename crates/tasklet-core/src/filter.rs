use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::trace;

use crate::task::{
  Priority,
  Task
};

#[derive(
  Debug, Clone, PartialEq, Eq, Error,
)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownOption {
  pub kind:  &'static str,
  pub value: String
}

impl UnknownOption {
  pub fn new(
    kind: &'static str,
    value: &str
  ) -> Self {
    Self {
      kind,
      value: value.to_string()
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub enum StatusFilter {
  #[default]
  All,
  Active,
  Completed
}

impl StatusFilter {
  pub fn matches(
    self,
    task: &Task
  ) -> bool {
    match self {
      | StatusFilter::All => true,
      | StatusFilter::Active => {
        !task.completed
      }
      | StatusFilter::Completed => {
        task.completed
      }
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      | StatusFilter::All => "all",
      | StatusFilter::Active => "active",
      | StatusFilter::Completed => {
        "completed"
      }
    }
  }
}

impl FromStr for StatusFilter {
  type Err = UnknownOption;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "all" => Ok(StatusFilter::All),
      | "active" => {
        Ok(StatusFilter::Active)
      }
      | "completed" | "done" => {
        Ok(StatusFilter::Completed)
      }
      | _ => {
        Err(UnknownOption::new(
          "status filter",
          s
        ))
      }
    }
  }
}

impl fmt::Display for StatusFilter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub enum PriorityFilter {
  #[default]
  All,
  Only(Priority)
}

impl PriorityFilter {
  pub fn matches(
    self,
    task: &Task
  ) -> bool {
    match self {
      | PriorityFilter::All => true,
      | PriorityFilter::Only(wanted) => {
        task.priority == wanted
      }
    }
  }
}

impl FromStr for PriorityFilter {
  type Err = UnknownOption;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    if s.trim().eq_ignore_ascii_case("all")
    {
      return Ok(PriorityFilter::All);
    }
    s.parse::<Priority>()
      .map(PriorityFilter::Only)
      .map_err(|_| {
        UnknownOption::new(
          "priority filter",
          s
        )
      })
  }
}

impl fmt::Display for PriorityFilter {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    match self {
      | PriorityFilter::All => {
        f.write_str("all")
      }
      | PriorityFilter::Only(p) => {
        fmt::Display::fmt(p, f)
      }
    }
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub enum SortMode {
  #[default]
  DateAsc,
  DateDesc,
  Priority,
  Name
}

impl SortMode {
  pub fn as_str(self) -> &'static str {
    match self {
      | SortMode::DateAsc => "date-asc",
      | SortMode::DateDesc => "date-desc",
      | SortMode::Priority => "priority",
      | SortMode::Name => "name"
    }
  }

  /// Stable in-place sort; equal keys keep their relative order.
  pub fn apply(
    self,
    tasks: &mut [&Task]
  ) {
    match self {
      | SortMode::DateAsc => {
        tasks.sort_by_key(|t| t.due)
      }
      | SortMode::DateDesc => {
        tasks.sort_by(|a, b| {
          b.due.cmp(&a.due)
        })
      }
      | SortMode::Priority => {
        tasks.sort_by_key(|t| {
          t.priority.rank()
        })
      }
      | SortMode::Name => {
        tasks.sort_by_cached_key(|t| {
          t.text.to_lowercase()
        })
      }
    }
  }
}

impl FromStr for SortMode {
  type Err = UnknownOption;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "date-asc" | "date" => {
        Ok(SortMode::DateAsc)
      }
      | "date-desc" => {
        Ok(SortMode::DateDesc)
      }
      | "priority" => {
        Ok(SortMode::Priority)
      }
      | "name" => Ok(SortMode::Name),
      | _ => {
        Err(UnknownOption::new(
          "sort mode",
          s
        ))
      }
    }
  }
}

impl fmt::Display for SortMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
)]
pub struct ViewQuery {
  pub status:   StatusFilter,
  pub priority: PriorityFilter,
  pub sort:     SortMode
}

/// Status filter, then priority filter, then sort. The input
/// slice is left untouched.
#[tracing::instrument(skip(tasks), fields(total = tasks.len()))]
pub fn process<'a>(
  tasks: &'a [Task],
  query: &ViewQuery
) -> Vec<&'a Task> {
  let mut out: Vec<&Task> = tasks
    .iter()
    .filter(|t| query.status.matches(t))
    .filter(|t| {
      query.priority.matches(t)
    })
    .collect();
  query.sort.apply(&mut out);
  trace!(shown = out.len(), "processed task view");
  out
}

/// Totals over the whole collection, independent of any filter.
#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq,
)]
pub struct TaskCounts {
  pub active:    usize,
  pub completed: usize
}

impl TaskCounts {
  pub fn tally(tasks: &[Task]) -> Self {
    let completed = tasks
      .iter()
      .filter(|t| t.completed)
      .count();
    Self {
      active: tasks.len() - completed,
      completed
    }
  }
}

/// What the presentation layer draws after every change.
#[derive(Debug, Clone)]
pub struct View<'a> {
  pub tasks:  Vec<&'a Task>,
  pub counts: TaskCounts
}

impl<'a> View<'a> {
  pub fn build(
    tasks: &'a [Task],
    query: &ViewQuery
  ) -> Self {
    Self {
      tasks:  process(tasks, query),
      counts: TaskCounts::tally(tasks)
    }
  }

  pub fn shown(&self) -> usize {
    self.tasks.len()
  }

  pub fn is_empty(&self) -> bool {
    self.tasks.is_empty()
  }

  pub fn summary(&self) -> String {
    let shown = self.shown();
    format!(
      "{shown} {} shown | {} active | {} \
       completed",
      if shown == 1 { "task" } else { "tasks" },
      self.counts.active,
      self.counts.completed
    )
  }
}
