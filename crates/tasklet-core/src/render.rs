use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::datetime::format_due_date;
use crate::filter::View;
use crate::task::Task;
use crate::theme::Theme;
use crate::validate::{Field, ValidationErrors};

const EMPTY_STATE: &str = "No tasks to show.";

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    accent: Option<&'static str>,
}

impl Renderer {
    pub fn new(cfg: &Config, theme: &Theme) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => io::stdout().is_terminal(),
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self {
            color,
            accent: theme.accent_code(),
        })
    }

    pub fn plain() -> Self {
        Self {
            color: false,
            accent: None,
        }
    }

    #[tracing::instrument(skip(self, out, view))]
    pub fn write_view<W: Write>(
        &self,
        mut out: W,
        view: &View<'_>,
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        if view.is_empty() {
            writeln!(out, "{}", self.paint(EMPTY_STATE, "2"))?;
        } else {
            let headers = vec![
                String::new(),
                "ID".to_string(),
                "Priority".to_string(),
                "Due".to_string(),
                "Task".to_string(),
            ];
            let rows = view.tasks.iter().map(|task| self.row(task, today)).collect();
            write_table(&mut out, headers, rows)?;
        }

        writeln!(out)?;
        writeln!(out, "{}", self.accented(&view.summary()))?;
        Ok(())
    }

    pub fn print_view(&self, view: &View<'_>, today: NaiveDate) -> anyhow::Result<()> {
        self.write_view(io::stdout().lock(), view, today)
    }

    pub fn write_validation_errors<W: Write>(
        &self,
        mut out: W,
        errors: &ValidationErrors,
    ) -> anyhow::Result<()> {
        for (field, label) in [(Field::Text, "task"), (Field::Date, "due")] {
            if let Some(err) = errors.for_field(field) {
                writeln!(out, "{label:>4}: {}", self.paint(&err.to_string(), "31"))?;
            }
        }
        Ok(())
    }

    fn row(&self, task: &Task, today: NaiveDate) -> Vec<String> {
        let check = if task.completed { "[x]" } else { "[ ]" };
        let priority = format!("{} {}", task.priority.marker(), task.priority.label());

        let due = format_due_date(task.due);
        let due = if task.is_overdue(today) {
            self.paint(&due, "31")
        } else {
            due
        };

        let text = if task.completed {
            self.paint(&task.text, "9")
        } else {
            task.text.clone()
        };

        vec![
            check.to_string(),
            self.paint(&task.id.to_string(), "33"),
            priority,
            due,
            text,
        ]
    }

    fn accented(&self, text: &str) -> String {
        match self.accent {
            Some(code) => self.paint(text, code),
            None => text.to_string(),
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (header, width) in headers.iter().zip(&widths) {
        write!(writer, "{header:width$} ", width = *width)?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (cell, width) in row.iter().zip(&widths) {
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = width.saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
