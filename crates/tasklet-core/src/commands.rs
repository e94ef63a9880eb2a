use std::io::{
  self,
  IsTerminal
};

use anyhow::{
  Context,
  anyhow,
  bail
};
use chrono::{
  DateTime,
  Utc
};
use dialoguer::{
  Confirm,
  theme::ColorfulTheme
};
use tracing::{
  debug,
  info,
  instrument,
  warn
};

use crate::app::App;
use crate::cli::{
  Command,
  ListArgs
};
use crate::kv::KeyValueStore;
use crate::render::Renderer;
use crate::theme::Theme;
use crate::validate::TaskForm;

#[instrument(skip(app, renderer, now))]
pub fn dispatch<S: KeyValueStore>(
  app: &mut App<S>,
  renderer: &Renderer,
  command: Command,
  now: DateTime<Utc>
) -> anyhow::Result<()> {
  match command {
    | Command::Add {
      text,
      due,
      priority
    } => {
      let mut form =
        TaskForm::new(text.join(" "), due);
      form.priority = priority;
      cmd_add(app, renderer, &form, now)?
    }
    | Command::List(args) => {
      cmd_list(app, renderer, args, now)?
    }
    | Command::Toggle {
      id
    } => cmd_toggle(app, id),
    | Command::Delete {
      id,
      yes
    } => cmd_delete(app, id, yes)?,
    | Command::ClearCompleted => {
      let cleared = app.clear_completed();
      println!(
        "Cleared {cleared} completed {}.",
        if cleared == 1 {
          "task"
        } else {
          "tasks"
        }
      );
    }
    | Command::Theme {
      name
    } => cmd_theme(app, name),
  }

  report_write_error(app);
  Ok(())
}

fn cmd_add<S: KeyValueStore>(
  app: &mut App<S>,
  renderer: &Renderer,
  form: &TaskForm,
  now: DateTime<Utc>
) -> anyhow::Result<()> {
  info!("command add");
  match app.add(form, now) {
    | Ok(task) => {
      println!("Created task {}.", task.id);
      Ok(())
    }
    | Err(errors) => {
      renderer.write_validation_errors(
        io::stderr().lock(),
        &errors
      )?;
      Err(anyhow!("task was not added"))
    }
  }
}

fn cmd_list<S: KeyValueStore>(
  app: &mut App<S>,
  renderer: &Renderer,
  args: ListArgs,
  now: DateTime<Utc>
) -> anyhow::Result<()> {
  info!("command list");
  if let Some(status) = args.status {
    app.set_status_filter(status);
  }
  if let Some(priority) = args.priority {
    app.set_priority_filter(priority);
  }
  if let Some(sort) = args.sort {
    app.set_sort(sort);
  }

  let today = app.today(now);
  renderer.print_view(&app.view(), today)
}

fn cmd_toggle<S: KeyValueStore>(
  app: &mut App<S>,
  id: u64
) {
  info!(id, "command toggle");
  match app.toggle(id) {
    | Some(true) => {
      println!("Completed task {id}.")
    }
    | Some(false) => {
      println!("Reopened task {id}.")
    }
    | None => {
      println!("No task with id {id}.")
    }
  }
}

fn cmd_delete<S: KeyValueStore>(
  app: &mut App<S>,
  id: u64,
  yes: bool
) -> anyhow::Result<()> {
  info!(id, yes, "command delete");
  let Some(text) =
    app.task(id).map(|t| t.text.clone())
  else {
    app.remove(id);
    println!("No task with id {id}.");
    return Ok(());
  };

  let prompt = format!(
    "Are you sure you want to delete \
     this task? ({})",
    text
  );
  let confirmed = confirm_delete(
    yes,
    io::stdin().is_terminal(),
    || {
      Confirm::with_theme(
        &ColorfulTheme::default()
      )
      .with_prompt(prompt)
      .default(false)
      .interact()
      .context("failed to read confirmation")
    }
  )?;

  if !confirmed {
    debug!(id, "delete declined");
    println!("Kept task {id}.");
    return Ok(());
  }

  app.remove(id);
  println!("Deleted task {id}.");
  Ok(())
}

/// `--yes` skips the question. Without a terminal to ask on, deletion
/// is refused rather than assumed.
fn confirm_delete<F>(
  yes: bool,
  interactive: bool,
  ask: F
) -> anyhow::Result<bool>
where
  F: FnOnce() -> anyhow::Result<bool>
{
  if yes {
    return Ok(true);
  }
  if !interactive {
    bail!(
      "refusing to delete without \
       confirmation; pass --yes"
    );
  }
  ask()
}

fn cmd_theme<S: KeyValueStore>(
  app: &mut App<S>,
  name: Option<String>
) {
  match name {
    | Some(name) => {
      let theme = Theme::new(name.trim());
      app.set_theme(&theme);
      println!("Theme set to {theme}.");
    }
    | None => {
      println!("{}", app.theme());
    }
  }
}

fn report_write_error<S: KeyValueStore>(
  app: &App<S>
) {
  if let Some(message) =
    app.last_write_error()
  {
    warn!(error = %message, "changes were not saved");
    eprintln!(
      "warning: changes could not be \
       saved: {message}"
    );
  }
}

#[cfg(test)]
mod tests {
  use std::cell::Cell;

  use super::confirm_delete;

  #[test]
  fn yes_flag_skips_the_question() {
    let asked = Cell::new(false);
    let confirmed =
      confirm_delete(true, false, || {
        asked.set(true);
        Ok(false)
      })
      .expect("confirmed");
    assert!(confirmed);
    assert!(!asked.get());
  }

  #[test]
  fn terminal_answer_decides() {
    assert!(
      confirm_delete(false, true, || Ok(true))
        .expect("answered")
    );
    assert!(
      !confirm_delete(false, true, || {
        Ok(false)
      })
      .expect("answered")
    );
  }

  #[test]
  fn no_terminal_and_no_yes_refuses() {
    let err =
      confirm_delete(false, false, || Ok(true))
        .expect_err("must refuse");
    assert!(
      err.to_string().contains("--yes")
    );
  }
}
