use std::fmt;

use chrono::NaiveDate;
use thiserror::Error;

use crate::datetime::parse_due_date;
use crate::task::Priority;

pub const MIN_TEXT_LEN: usize = 3;

/// Raw, unvalidated input for a new task.
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
  pub text:     String,
  pub date:     String,
  pub priority: Option<Priority>
}

impl TaskForm {
  pub fn new(
    text: impl Into<String>,
    date: impl Into<String>
  ) -> Self {
    Self {
      text:     text.into(),
      date:     date.into(),
      priority: None
    }
  }

  #[must_use]
  pub fn with_priority(
    mut self,
    priority: Priority
  ) -> Self {
    self.priority = Some(priority);
    self
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum Field {
  Text,
  Date
}

#[derive(
  Debug, Clone, PartialEq, Eq, Error,
)]
pub enum ValidationError {
  #[error(
    "Please enter a task description"
  )]
  EmptyText,
  #[error(
    "Task description must be at least \
     3 characters"
  )]
  TooShort { len: usize },
  #[error("Please select a due date")]
  MissingDate,
  #[error("Unrecognized due date: {0}")]
  InvalidDate(String),
  #[error(
    "Due date cannot be in the past"
  )]
  PastDate { due: NaiveDate }
}

impl ValidationError {
  pub fn field(&self) -> Field {
    match self {
      | ValidationError::EmptyText
      | ValidationError::TooShort {
        ..
      } => Field::Text,
      | ValidationError::MissingDate
      | ValidationError::InvalidDate(_)
      | ValidationError::PastDate {
        ..
      } => Field::Date
    }
  }
}

/// Every failure found in one form; both fields are checked
/// even when the first one fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
  errors: Vec<ValidationError>
}

impl ValidationErrors {
  pub fn errors(
    &self
  ) -> &[ValidationError] {
    &self.errors
  }

  pub fn for_field(
    &self,
    field: Field
  ) -> Option<&ValidationError> {
    self
      .errors
      .iter()
      .find(|err| err.field() == field)
  }

  pub fn contains(
    &self,
    wanted: &ValidationError
  ) -> bool {
    self.errors.contains(wanted)
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    let messages: Vec<String> = self
      .errors
      .iter()
      .map(ToString::to_string)
      .collect();
    f.write_str(&messages.join("; "))
  }
}

impl std::error::Error
  for ValidationErrors
{
}

/// Form input that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidTask {
  pub text:     String,
  pub due:      NaiveDate,
  pub priority: Priority
}

#[tracing::instrument(skip(form), fields(text_len = form.text.len()))]
pub fn validate(
  form: &TaskForm,
  today: NaiveDate
) -> Result<ValidTask, ValidationErrors> {
  let mut errors = Vec::new();

  let text = form.text.trim();
  let len = text.chars().count();
  if len == 0 {
    errors.push(
      ValidationError::EmptyText
    );
  } else if len < MIN_TEXT_LEN {
    errors.push(
      ValidationError::TooShort { len }
    );
  }

  let raw_date = form.date.trim();
  let due = if raw_date.is_empty() {
    errors.push(
      ValidationError::MissingDate
    );
    None
  } else {
    match parse_due_date(raw_date, today)
    {
      | Some(due) if due < today => {
        errors.push(
          ValidationError::PastDate {
            due
          }
        );
        None
      }
      | Some(due) => Some(due),
      | None => {
        errors.push(
          ValidationError::InvalidDate(
            raw_date.to_string()
          )
        );
        None
      }
    }
  };

  match due {
    | Some(due) if errors.is_empty() => {
      Ok(ValidTask {
        text: text.to_string(),
        due,
        priority: form
          .priority
          .unwrap_or_default()
      })
    }
    | _ => {
      tracing::debug!(?errors, "task form rejected");
      Err(ValidationErrors {
        errors
      })
    }
  }
}
