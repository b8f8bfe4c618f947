// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! cliconform binary entry point.

use std::time::Duration;

use clap::Parser;

use cliconform::capture::CaptureLog;
use cliconform::cli::Cli;
use cliconform::locate::ToolLocator;
use cliconform::logging::init_tracing;
use cliconform::output::{print_error, print_warning, render_listing, render_report};
use cliconform::runner::Runner;
use cliconform::scenario::{ScenarioRegistry, Suite};

/// No scenario failed
const EXIT_OK: i32 = 0;
/// At least one scenario failed
const EXIT_FAILED: i32 = 1;
/// The suite could not be loaded or run
const EXIT_INVALID: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.verbose) {
        print_warning(format_args!("logging disabled: {}", e));
    }
    std::process::exit(run(cli).await);
}

async fn run(cli: Cli) -> i32 {
    let suite = match Suite::load(&cli.suite) {
        Ok(suite) => suite,
        Err(e) => {
            print_error(format_args!("{}: {}", cli.suite.display(), e));
            return EXIT_INVALID;
        }
    };

    let layout = suite.layout(cli.work_dir.as_deref());
    let mut registry = match ScenarioRegistry::build(&suite, &layout) {
        Ok(registry) => registry,
        Err(e) => {
            print_error(format_args!("{}: {}", cli.suite.display(), e));
            return EXIT_INVALID;
        }
    };
    if let Some(ref pattern) = cli.filter {
        registry = registry.filtered(pattern);
        if registry.is_empty() {
            print_warning(format_args!("no scenario matches '{}'", pattern));
        }
    }

    if cli.list {
        print!("{}", render_listing(&registry));
        return EXIT_OK;
    }

    let mut settings = match suite.settings(&layout) {
        Ok(settings) => settings,
        Err(e) => {
            print_error(format_args!("{}: {}", cli.suite.display(), e));
            return EXIT_INVALID;
        }
    };
    if let Some(ms) = cli.timeout_ms {
        settings.default_timeout = Duration::from_millis(ms);
    }

    // Directories from the command line come before the suite's own
    let mut search = suite.search_config(&layout);
    let suite_dirs = std::mem::take(&mut search.search_dirs);
    search.search_dirs = cli.search_paths.iter().cloned().chain(suite_dirs).collect();

    let mut runner = Runner::new(registry, settings, ToolLocator::new(search));
    if let Some(ref path) = cli.capture {
        match CaptureLog::with_file(path) {
            Ok(log) => runner = runner.with_capture(log),
            Err(e) => {
                print_error(format_args!("cannot open capture file {}: {}", path.display(), e));
                return EXIT_INVALID;
            }
        }
    }

    let report = runner.run().await;
    match render_report(&report, cli.format) {
        Ok(rendered) => print!("{}", rendered),
        Err(e) => {
            print_error(format_args!("cannot render report: {}", e));
            return EXIT_INVALID;
        }
    }

    if report.has_failures() {
        EXIT_FAILED
    } else {
        EXIT_OK
    }
}
