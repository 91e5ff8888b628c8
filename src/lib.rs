//! Network governing for a host-scheduled hacking environment.
//!
//! ## Scope
//! This crate decides which host action to issue next: it discovers the
//! machine graph, ranks targets by corrected yield, converts the shared RAM
//! pool into integer credits, and greedily schedules weaken/hack/grow jobs
//! across targets while tracking asynchronous completions.
//!
//! ## Key invariants
//! - Every decision re-samples host capacity through the credit ledger; no
//!   reservation outlives a single scheduling pass.
//! - In-flight work is tracked purely as predicted-completion bookkeeping;
//!   the governor is one cooperative loop with a single suspension point.
//! - A refused dispatch handle halts the run; empty candidate pools never do.
//!
//! ## Governing flow
//! 1) Discover the network breadth-first and probe eligible targets.
//! 2) Derive the integer credit basis from the three action costs.
//! 3) Dispatch while credits and demand remain.
//! 4) Block on the soonest predicted completion, poll it out, refresh the
//!    touched target, repeat.
//!
//! ## Notable entry points
//! - [`governor::WeakenSweep`] / [`governor::HgwFarm`]: the two cycles.
//! - [`env::Environment`]: the host API surface; implement it to bind a real
//!   host, or use [`sim::SimNet`] for a deterministic one.
//! - [`rooting::sweep`] / [`topology::discover`]: network preparation.

pub mod demo;
pub mod dispatch;
pub mod env;
pub mod governor;
pub mod ledger;
pub mod metrics;
pub mod rooting;
pub mod sim;
pub mod target;
pub mod topology;

pub use dispatch::{DispatchError, LaunchedJob};
pub use env::{ActionKind, Environment, NodeStats, Pid};
pub use governor::{GovernorConfig, GovernorError, HgwFarm, HgwReport, WeakenReport, WeakenSweep};
pub use ledger::{fractional_gcd, CreditBasis, CreditLedger};
pub use metrics::GovernorMetrics;
pub use rooting::{RootOutcome, RootReport, RootStatus};
pub use target::{Posture, Target};
pub use topology::NodeRecord;
