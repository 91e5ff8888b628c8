//! Deterministic simulation of the host network.
//!
//! Purpose:
//! - Provide a stable RNG, simulated time source, and an in-memory network
//!   implementing [`crate::env::Environment`].
//! - Keep replay inputs small and deterministic by avoiding OS time and
//!   scheduling: the clock only moves through explicit sleeps, and job
//!   settlement order is a pure function of the scenario.
//!
//! Invariants:
//! - `SimClock` is monotonic and advances only through explicit calls.
//! - `SimRng` is deterministic and remaps a zero seed to a non-zero state.
//! - The same [`SimNetSpec`] and seed always produce the same trace.

pub mod clock;
pub mod net;
pub mod rng;
pub mod spec;

pub use clock::SimClock;
pub use net::{DispatchRecord, SimNet, SimNode};
pub use rng::SimRng;
pub use spec::{SimNetSpec, SimNodeSpec, SimPhysics};
