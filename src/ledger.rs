//! Credit ledger over the shared RAM pool.
//!
//! # Purpose
//!
//! The three actions have heterogeneous fractional RAM costs (for example
//! 1.75 / 1.6 / 1.75 GB per thread). Comparing them against a shared capacity
//! pool in floating point invites drift, so the ledger normalizes all three to
//! integer credits: the basis is the fractional greatest common divisor of the
//! costs, and each action's weight is its cost divided by that basis.
//!
//! # Correctness Invariants
//!
//! - The basis divides every cost exactly (within floating rounding).
//! - Weights are the minimal integer ratio reproducing the cost proportions.
//! - Free capacity is sampled fresh on every query; the ledger holds no
//!   reservation state. Zero or negative usable capacity yields zero threads.
//!
//! The ledger is advisory: the host is the sole owner of true capacity, and a
//! dispatch may still be refused. That refusal is surfaced by the dispatch
//! layer, not here.

use crate::env::{ActionKind, Environment};

/// Largest power of ten tried when scaling a cost to an integer.
///
/// Costs are host-reported GB values with at most a few decimal places; nine
/// digits is far beyond anything observed and bounds the scale loop.
const MAX_POW10: u32 = 9;

/// Tolerance for deciding a scaled cost has reached an integer.
const INT_EPS: f64 = 1e-6;

/// Integer GCD, Euclid.
fn gcd_u64(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd_u64(b, a % b)
    }
}

/// Smallest power of ten that makes `x` integral, saturating at [`MAX_POW10`].
fn pow10_to_integer(x: f64) -> u32 {
    let mut scaled = x;
    for power in 0..=MAX_POW10 {
        if (scaled - scaled.round()).abs() <= INT_EPS {
            return power;
        }
        scaled *= 10.0;
    }
    MAX_POW10
}

/// Greatest common divisor of two positive fractional numbers.
///
/// Both operands are scaled by the same power of ten until integral, reduced
/// with integer GCD, and the result is scaled back down.
pub fn fractional_gcd(a: f64, b: f64) -> f64 {
    debug_assert!(a > 0.0 && b > 0.0);
    let power = pow10_to_integer(a).max(pow10_to_integer(b));
    let scale = 10f64.powi(power as i32);
    let factor = gcd_u64((a * scale).round() as u64, (b * scale).round() as u64);
    factor as f64 / scale
}

/// Integer credit basis for the three action costs.
///
/// Construction is the only place floating math happens; afterwards all
/// comparisons are integer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CreditBasis {
    unit_gb: f64,
    weights: [u32; 3],
}

impl CreditBasis {
    /// Derives the basis from raw per-thread costs (weaken, hack, grow).
    ///
    /// # Panics
    /// Panics if any cost is non-positive or non-finite.
    pub fn from_costs(weaken_gb: f64, hack_gb: f64, grow_gb: f64) -> Self {
        for cost in [weaken_gb, hack_gb, grow_gb] {
            assert!(
                cost.is_finite() && cost > 0.0,
                "action cost must be positive and finite, got {cost}"
            );
        }

        let unit_gb = fractional_gcd(fractional_gcd(weaken_gb, hack_gb), grow_gb);
        let weight = |cost: f64| (cost / unit_gb).round() as u32;

        Self {
            unit_gb,
            weights: [weight(weaken_gb), weight(hack_gb), weight(grow_gb)],
        }
    }

    /// Derives the basis from the costs the environment reports.
    pub fn from_env<E: Environment + ?Sized>(env: &E) -> Self {
        Self::from_costs(
            env.action_cost_gb(ActionKind::Weaken),
            env.action_cost_gb(ActionKind::Hack),
            env.action_cost_gb(ActionKind::Grow),
        )
    }

    /// Size of one credit, in GB.
    #[inline]
    pub fn unit_gb(&self) -> f64 {
        self.unit_gb
    }

    /// Credits consumed by one thread of `kind`.
    #[inline]
    pub fn weight(&self, kind: ActionKind) -> u32 {
        self.weights[kind.index()]
    }
}

/// Point-in-time view of how many threads the shared pool can carry.
///
/// Holds the host to sample, the reservation fraction withheld from every
/// sample, and the credit basis. All capacity reads go back to the
/// environment, so two calls in a row may disagree; that is the intended
/// discipline.
#[derive(Clone, Debug)]
pub struct CreditLedger {
    host: String,
    reservation: f64,
    basis: CreditBasis,
}

impl CreditLedger {
    /// # Panics
    /// Panics if `reservation` is outside `[0, 1)`.
    pub fn new(host: impl Into<String>, reservation: f64, basis: CreditBasis) -> Self {
        assert!(
            (0.0..1.0).contains(&reservation),
            "reservation must be in [0, 1), got {reservation}"
        );
        Self {
            host: host.into(),
            reservation,
            basis,
        }
    }

    #[inline]
    pub fn basis(&self) -> &CreditBasis {
        &self.basis
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Raw credits derivable from the host's free RAM right now, after the
    /// reservation is withheld.
    pub fn raw_credits<E: Environment + ?Sized>(&self, env: &E) -> u64 {
        let usable = env.free_ram_gb(&self.host) * (1.0 - self.reservation);
        if usable <= 0.0 {
            return 0;
        }
        (usable / self.basis.unit_gb()).floor() as u64
    }

    /// How many threads of `kind` could start right now.
    ///
    /// Zero means "do not allocate"; callers must not round up.
    pub fn available_threads<E: Environment + ?Sized>(&self, env: &E, kind: ActionKind) -> usize {
        (self.raw_credits(env) / u64::from(self.basis.weight(kind))) as usize
    }
}
