use chrono::{
  DateTime,
  Datelike,
  Days,
  Local,
  NaiveDate,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use tracing::{
  trace,
  warn
};

/// Time zone used to decide which calendar day "today" is.
#[derive(Debug, Clone, Copy, Default)]
pub enum Zone {
  #[default]
  Local,
  Named(Tz)
}

impl Zone {
  pub fn from_config(
    raw: Option<&str>
  ) -> Self {
    let Some(raw) = raw else {
      return Zone::Local;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty()
      || trimmed
        .eq_ignore_ascii_case("local")
    {
      return Zone::Local;
    }

    match parse_timezone(trimmed) {
      | Some(tz) => Zone::Named(tz),
      | None => Zone::Local
    }
  }
}

fn parse_timezone(
  raw: &str
) -> Option<Tz> {
  match raw.parse::<Tz>() {
    | Ok(tz) => Some(tz),
    | Err(error) => {
      warn!(
        timezone = raw,
        %error,
        "invalid timezone; using \
         system local time"
      );
      None
    }
  }
}

/// Calendar date of `now` in `zone`; time of day is dropped.
#[must_use]
pub fn local_today(
  now: DateTime<Utc>,
  zone: &Zone
) -> NaiveDate {
  match zone {
    | Zone::Local => {
      now
        .with_timezone(&Local)
        .date_naive()
    }
    | Zone::Named(tz) => {
      now.with_timezone(tz).date_naive()
    }
  }
}

/// Renders a due date the way the task list shows it, e.g.
/// `Oct 19, 2026`.
#[must_use]
pub fn format_due_date(
  date: NaiveDate
) -> String {
  date.format("%b %-d, %Y").to_string()
}

/// Parses a due date typed by the user.
///
/// Accepts ISO dates (`2026-10-19`), `today`, `tomorrow`,
/// `yesterday`, offsets such as `+3d` or `+2w`, and weekday
/// names, which resolve to the next such day after `today`.
pub fn parse_due_date(
  raw: &str,
  today: NaiveDate
) -> Option<NaiveDate> {
  let text =
    raw.trim().to_ascii_lowercase();
  if text.is_empty() {
    return None;
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      &text, "%Y-%m-%d"
    )
  {
    return Some(date);
  }

  let parsed = match text.as_str() {
    | "today" => Some(today),
    | "tomorrow" => {
      today.checked_add_days(Days::new(1))
    }
    | "yesterday" => {
      today.checked_sub_days(Days::new(1))
    }
    | _ => {
      parse_offset(&text, today).or_else(
        || {
          parse_weekday_name(&text).and_then(
            |weekday| {
              next_weekday_date(
                today, weekday
              )
            }
          )
        }
      )
    }
  };

  trace!(input = %raw, ?parsed, "parsed due date expression");
  parsed
}

fn parse_offset(
  text: &str,
  today: NaiveDate
) -> Option<NaiveDate> {
  let rest = text.strip_prefix('+')?;
  let (digits, per_unit) =
    if let Some(d) =
      rest.strip_suffix('d')
    {
      (d, 1)
    } else if let Some(w) =
      rest.strip_suffix('w')
    {
      (w, 7)
    } else {
      return None;
    };
  let count = digits.parse::<u64>().ok()?;
  today.checked_add_days(Days::new(
    count.checked_mul(per_unit)?
  ))
}

fn parse_weekday_name(
  text: &str
) -> Option<Weekday> {
  let weekday = match text {
    | "mon" | "monday" => Weekday::Mon,
    | "tue" | "tues" | "tuesday" => {
      Weekday::Tue
    }
    | "wed" | "wednesday" => Weekday::Wed,
    | "thu" | "thur" | "thurs"
    | "thursday" => Weekday::Thu,
    | "fri" | "friday" => Weekday::Fri,
    | "sat" | "saturday" => Weekday::Sat,
    | "sun" | "sunday" => Weekday::Sun,
    | _ => return None
  };
  Some(weekday)
}

fn next_weekday_date(
  today: NaiveDate,
  target: Weekday
) -> Option<NaiveDate> {
  let current = today
    .weekday()
    .num_days_from_monday();
  let wanted =
    target.num_days_from_monday();
  let mut delta =
    (7 + wanted - current) % 7;
  if delta == 0 {
    delta = 7;
  }
  today.checked_add_days(Days::new(
    u64::from(delta)
  ))
}
