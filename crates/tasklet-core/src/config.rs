use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use tracing::{
  debug,
  info,
  trace,
  warn
};

const CONFIG_ENV_VAR: &str =
  "TASKLET_CONFIG";
const CONFIG_FILE_NAME: &str =
  "config.toml";
const APP_DIR_NAME: &str = "tasklet";

#[derive(Debug, Clone)]
pub struct Config {
  map: HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    map.insert(
      "color".to_string(),
      "on".to_string()
    );
    map.insert(
      "default.sort".to_string(),
      "date-asc".to_string()
    );
    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    config_override
  ))]
  pub fn load(
    config_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    match resolve_config_path(
      config_override
    )? {
      | Some(path) => {
        info!(config = %path.display(), "loading config");
        cfg.load_file(&path)?;
      }
      | None => {
        debug!(
          "no config file found; using \
           defaults"
        );
      }
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> Option<bool> {
    self
      .map
      .get(key)
      .map(|v| parse_bool(v))
  }

  #[tracing::instrument(skip(self))]
  fn load_file(
    &mut self,
    path: &Path
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;
    self.load_str(&text).with_context(
      || {
        format!(
          "invalid config file {}",
          path.display()
        )
      }
    )?;
    self.loaded_files.push(path);
    Ok(())
  }

  /// Merges a TOML document. Nested tables become dotted keys, so
  /// `[data] location = "x"` sets `data.location`.
  pub fn load_str(
    &mut self,
    text: &str
  ) -> anyhow::Result<()> {
    let table: toml::Table =
      toml::from_str(text)?;
    flatten_into(
      &mut self.map,
      "",
      &table
    )
  }
}

fn flatten_into(
  map: &mut HashMap<String, String>,
  prefix: &str,
  table: &toml::Table
) -> anyhow::Result<()> {
  for (k, v) in table {
    let key = if prefix.is_empty() {
      k.clone()
    } else {
      format!("{prefix}.{k}")
    };

    let value = match v {
      | toml::Value::Table(inner) => {
        flatten_into(map, &key, inner)?;
        continue;
      }
      | toml::Value::String(s) => {
        s.clone()
      }
      | toml::Value::Integer(i) => {
        i.to_string()
      }
      | toml::Value::Float(f) => {
        f.to_string()
      }
      | toml::Value::Boolean(b) => {
        if *b {
          "on".to_string()
        } else {
          "off".to_string()
        }
      }
      | other => {
        return Err(anyhow!(
          "unsupported value for {key}: \
           {other}"
        ));
      }
    };

    trace!(key = %key, value = %value, "loaded config key");
    map.insert(key, value);
  }
  Ok(())
}

#[tracing::instrument(skip(
  cfg,
  override_dir
))]
pub fn resolve_data_dir(
  cfg: &Config,
  override_dir: Option<&Path>
) -> anyhow::Result<PathBuf> {
  let dir = if let Some(path) =
    override_dir
  {
    path.to_path_buf()
  } else if let Some(cfg_value) =
    cfg.get("data.location")
  {
    expand_tilde(Path::new(&cfg_value))
  } else {
    default_data_dir()?
  };

  if !dir.exists() {
    info!(dir = %dir.display(), "creating data directory");
    fs::create_dir_all(&dir)
      .with_context(|| {
        format!(
          "failed to create {}",
          dir.display()
        )
      })?;
  }

  Ok(dir)
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_config_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(raw) =
    std::env::var(CONFIG_ENV_VAR)
  {
    let trimmed = raw.trim();
    if trimmed.is_empty()
      || trimmed == "/dev/null"
    {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      trimmed
    )));
  }

  let Some(base) = dirs::config_dir()
  else {
    warn!(
      "cannot determine config \
       directory; using defaults"
    );
    return Ok(None);
  };
  let candidate = base
    .join(APP_DIR_NAME)
    .join(CONFIG_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn default_data_dir()
-> anyhow::Result<PathBuf> {
  let base = dirs::data_dir()
    .ok_or_else(|| {
      anyhow!(
        "cannot determine data \
         directory"
      )
    })?;
  Ok(base.join(APP_DIR_NAME))
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> bool {
  matches!(
    s.trim()
      .to_ascii_lowercase()
      .as_str(),
    "1" | "y" | "yes" | "on" | "true"
  )
}

#[cfg(test)]
mod tests {
  use std::fs;

  use tempfile::tempdir;

  use super::{
    Config,
    resolve_data_dir
  };

  #[test]
  fn toml_tables_flatten_to_dotted_keys()
  {
    let mut cfg = Config::default();
    cfg
      .load_str(
        "color = false\ntimezone = \
         \"Europe/Berlin\"\n[data]\nlocation \
         = \"/tmp/tasklet\"\n[default]\nsort \
         = \"name\"\n"
      )
      .expect("valid toml");

    assert_eq!(
      cfg.get_bool("color"),
      Some(false)
    );
    assert_eq!(
      cfg.get("timezone").as_deref(),
      Some("Europe/Berlin")
    );
    assert_eq!(
      cfg.get("data.location").as_deref(),
      Some("/tmp/tasklet")
    );
    assert_eq!(
      cfg.get("default.sort").as_deref(),
      Some("name")
    );
  }

  #[test]
  fn overrides_win_over_file_values() {
    let mut cfg = Config::default();
    cfg
      .load_str("color = \"on\"\n")
      .expect("valid toml");
    cfg.apply_overrides(vec![(
      "rc.color".to_string(),
      "off".to_string()
    )]);
    assert_eq!(
      cfg.get_bool("color"),
      Some(false)
    );
  }

  #[test]
  fn arrays_are_rejected() {
    let mut cfg = Config::default();
    assert!(
      cfg
        .load_str("themes = [\"a\"]\n")
        .is_err()
    );
  }

  #[test]
  fn load_reads_explicit_file_and_data_dir()
  {
    let temp = tempdir().expect("tempdir");
    let data = temp.path().join("store");
    let path =
      temp.path().join("tasklet.toml");
    fs::write(
      &path,
      format!(
        "[data]\nlocation = {:?}\n",
        data.display().to_string()
      )
    )
    .expect("write config");

    let cfg = Config::load(Some(&path))
      .expect("load config");
    assert_eq!(cfg.loaded_files, vec![
      path.clone()
    ]);
    let resolved =
      resolve_data_dir(&cfg, None)
        .expect("resolve data dir");
    assert_eq!(resolved, data);
    assert!(data.is_dir());
  }
}
