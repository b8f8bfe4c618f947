// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Invocation capture and recording for conformance runs.
//!
//! Every external tool invocation made by the harness is recorded here so a
//! failing run can be replayed by hand or inspected after the fact.

mod duration_ms;
mod invocation;
mod log;

pub use invocation::{CapturedInvocation, CapturedOutcome, InvocationRecord};
pub use log::CaptureLog;
