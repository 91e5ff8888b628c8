//! Action dispatch: one detached unit of host work per call.
//!
//! This layer does exactly three things: start the action, stamp the
//! predicted completion time, and translate a refused handle into a typed
//! error. Retry policy lives with the governor; there is none here.

use std::error::Error;
use std::fmt;

use crate::env::{ActionKind, Environment, Pid};

/// One outstanding unit of dispatched work.
#[derive(Clone, Debug)]
pub struct LaunchedJob {
    pub kind: ActionKind,
    /// Node the action runs against.
    pub target: String,
    /// Node whose RAM carries the job.
    pub host: String,
    pub threads: usize,
    pub pid: Pid,
    /// Predicted completion; the host may run slightly past this.
    pub ends_at_ms: u64,
}

/// The host refused to start a job.
///
/// A refused handle means access, script, or RAM misconfiguration the ledger
/// failed to predict. It is not transient and the governor treats it as fatal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchError {
    pub kind: ActionKind,
    pub host: String,
    pub target: String,
    pub threads: usize,
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host {} refused {} x{} against {}",
            self.host,
            self.kind.name(),
            self.threads,
            self.target
        )
    }
}

impl Error for DispatchError {}

/// Starts `threads` units of `kind` on `host` against `target`.
///
/// # Panics
/// Panics if `threads` is zero; sizing is the caller's job.
pub fn launch<E: Environment + ?Sized>(
    env: &mut E,
    kind: ActionKind,
    host: &str,
    threads: usize,
    target: &str,
) -> Result<LaunchedJob, DispatchError> {
    assert!(0 < threads, "dispatch requires at least one thread");

    let pid = env.exec(kind, host, threads, target);
    if !pid.is_valid() {
        return Err(DispatchError {
            kind,
            host: host.to_owned(),
            target: target.to_owned(),
            threads,
        });
    }

    let ends_at_ms = env.now_ms() + env.action_time_ms(target, kind);
    Ok(LaunchedJob {
        kind,
        target: target.to_owned(),
        host: host.to_owned(),
        threads,
        pid,
        ends_at_ms,
    })
}
