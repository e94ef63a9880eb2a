pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datastore;
pub mod datetime;
pub mod filter;
pub mod kv;
pub mod render;
pub mod task;
pub mod theme;
pub mod validate;

use std::ffi::OsString;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting tasklet"
  );

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let kv = kv::FileStore::open(
    &data_dir
  )
  .with_context(|| {
    format!(
      "failed to open storage at {}",
      data_dir.display()
    )
  })?;

  let zone = datetime::Zone::from_config(
    cfg.get("timezone").as_deref()
  );
  let mut app = app::App::new(kv, zone);

  if let Some(raw) =
    cfg.get("default.sort")
  {
    let sort = raw
      .parse::<filter::SortMode>()
      .context(
        "invalid default.sort setting"
      )?;
    app.set_sort(sort);
  }

  let renderer = render::Renderer::new(
    &cfg,
    &app.theme()
  )?;

  let command = cli.command.unwrap_or(
    cli::Command::List(
      cli::ListArgs::default()
    )
  );
  debug!(?command, "dispatching");

  commands::dispatch(
    &mut app,
    &renderer,
    command,
    Utc::now()
  )?;

  info!("done");
  Ok(())
}
