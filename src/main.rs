//! Pagewright - render page templates into a static site, with a
//! watch-and-serve dev loop.

mod asset;
mod cli;
mod compiler;
mod config;
mod core;
mod logger;
mod page;
mod pipeline;
mod utils;
mod watch;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, build::build_site, dev::DevOptions, dev::DevSupervisor};
use config::SiteConfig;
use logger::Logger;
use pipeline::RebuildPipeline;
use utils::plural::plural_count;

fn main() -> Result<()> {
    // Install before anything blocks: a signal during the cold build must
    // still terminate the process
    let (shutdown_handle, shutdown_signal) = core::shutdown_channel();
    core::install_signal_handler(shutdown_handle)?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let logger = Logger::stdout(cli.verbose);
    let config = SiteConfig::load(&cli, &logger)?;
    let paths = config.paths();
    debug!(logger; "config"; "root={} output={} dev={}", config.root.display(), paths.output.display(), cli.dev);

    std::fs::create_dir_all(&paths.output)
        .with_context(|| format!("failed to create output directory `{}`", paths.output.display()))?;

    let routes = config.route_table()?;
    if routes.is_empty() {
        log!(logger; "warning"; "no [routes] configured, only static files will be copied");
    } else {
        debug!(logger; "config"; "{}", plural_count(routes.len(), "route"));
    }
    let pipeline = Arc::new(RebuildPipeline::new(paths.clone(), routes, logger.clone()));

    if !cli.dev {
        return build_site(pipeline.as_ref(), &logger).map(|_| ());
    }

    let supervisor = DevSupervisor::new(logger);
    supervisor.run(
        pipeline,
        config.watch_targets(),
        &paths.output,
        &DevOptions::from(&config.serve),
        shutdown_signal,
    )
}
