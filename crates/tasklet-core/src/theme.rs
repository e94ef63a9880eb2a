use std::fmt;

pub const DEFAULT_THEME: &str = "purple";

/// Active colour theme. The set of names is open; unknown names
/// are stored as given and simply render without an accent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Theme(String);

impl Theme {
  pub fn new(
    name: impl Into<String>
  ) -> Self {
    Self(name.into())
  }

  /// Restores a stored value; blank or absent means the default.
  pub fn from_stored(
    raw: Option<&str>
  ) -> Self {
    match raw.map(str::trim) {
      | Some(name) if !name.is_empty() => {
        Self(name.to_string())
      }
      | _ => Self::default()
    }
  }

  pub fn name(&self) -> &str {
    &self.0
  }

  /// ANSI SGR code for the theme accent, if the theme is known.
  pub fn accent_code(
    &self
  ) -> Option<&'static str> {
    let code = match self
      .0
      .to_ascii_lowercase()
      .as_str()
    {
      | "purple" => "35",
      | "blue" => "34",
      | "green" => "32",
      | "orange" => "38;5;208",
      | "pink" => "38;5;205",
      | "dark" => "90",
      | _ => return None
    };
    Some(code)
  }
}

impl Default for Theme {
  fn default() -> Self {
    Self(DEFAULT_THEME.to_string())
  }
}

impl fmt::Display for Theme {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    f.write_str(&self.0)
  }
}
