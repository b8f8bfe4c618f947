// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conformance harness for external command-line tools.
//!
//! A suite file declares scenarios: ordered steps that run prebuilt
//! executables against fixed input data and check exit status, stderr and
//! stdout. Each scenario ends in exactly one [`verdict::Verdict`]: a missing
//! tool or capability skips, a mismatch fails, and neither stops the rest of
//! the suite.
//!
//! ```no_run
//! # async fn demo() -> Result<(), cliconform::scenario::SuiteError> {
//! use cliconform::locate::ToolLocator;
//! use cliconform::runner::Runner;
//! use cliconform::scenario::{ScenarioRegistry, Suite};
//!
//! let suite = Suite::load("demos/ogrlineref.toml".as_ref())?;
//! let layout = suite.layout(None);
//! let registry = ScenarioRegistry::build(&suite, &layout)?;
//! let locator = ToolLocator::new(suite.search_config(&layout));
//! let report = Runner::new(registry, suite.settings(&layout)?, locator).run().await;
//! println!("{}", report.to_text());
//! # Ok(())
//! # }
//! ```

pub mod artifact;
pub mod assertions;
pub mod capability;
/// Re-exported capture types from cliconform-capture crate.
pub mod capture {
    pub use cliconform_capture::{CaptureLog, CapturedInvocation, CapturedOutcome, InvocationRecord};
}
#[doc(hidden)]
pub mod cli;
pub mod config;
pub mod env;
pub mod locate;
#[doc(hidden)]
pub mod logging;
pub mod normalize;
#[doc(hidden)]
pub mod output;
pub mod process;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod verdict;

#[cfg(all(test, unix))]
mod test_support;
