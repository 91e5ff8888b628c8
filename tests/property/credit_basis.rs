//! Properties of the fractional GCD and the integer credit basis.

use autohack_rs::env::ActionKind;
use autohack_rs::ledger::{fractional_gcd, CreditBasis};
use proptest::prelude::*;

/// Tolerance for "rebuilds the original cost" checks.
const EPS: f64 = 1e-9;

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Host-reported costs have at most two decimal places; generate exactly
/// that domain.
fn cost() -> impl Strategy<Value = f64> {
    (1u32..=800).prop_map(|hundredths| f64::from(hundredths) / 100.0)
}

proptest! {
    #[test]
    fn fractional_gcd_divides_both_operands((a, b) in (cost(), cost())) {
        let g = fractional_gcd(a, b);
        prop_assert!(0.0 < g && g <= a.min(b) + EPS);

        for x in [a, b] {
            let ratio = x / g;
            prop_assert!(
                (ratio - ratio.round()).abs() < EPS,
                "{g} must divide {x}, ratio {ratio}"
            );
        }
    }

    #[test]
    fn fractional_gcd_is_commutative((a, b) in (cost(), cost())) {
        prop_assert!((fractional_gcd(a, b) - fractional_gcd(b, a)).abs() < EPS);
    }

    #[test]
    fn basis_rebuilds_every_cost((w, h, g) in (cost(), cost(), cost())) {
        let basis = CreditBasis::from_costs(w, h, g);

        for (kind, cost) in ActionKind::ALL.into_iter().zip([w, h, g]) {
            let weight = basis.weight(kind);
            prop_assert!(1 <= weight);
            let rebuilt = basis.unit_gb() * f64::from(weight);
            prop_assert!(
                (rebuilt - cost).abs() < EPS,
                "weight {weight} x unit {} must rebuild {cost}",
                basis.unit_gb()
            );
        }
    }

    #[test]
    fn weights_are_a_minimal_ratio((w, h, g) in (cost(), cost(), cost())) {
        let basis = CreditBasis::from_costs(w, h, g);
        let [a, b, c] = ActionKind::ALL.map(|k| u64::from(basis.weight(k)));
        prop_assert_eq!(
            gcd(gcd(a, b), c),
            1,
            "weights ({}, {}, {}) must be coprime as a set",
            a,
            b,
            c
        );
    }

    #[test]
    fn weights_preserve_cost_proportions((w, h, g) in (cost(), cost(), cost())) {
        let basis = CreditBasis::from_costs(w, h, g);
        let ww = f64::from(basis.weight(ActionKind::Weaken));
        let hw = f64::from(basis.weight(ActionKind::Hack));
        prop_assert!((w / h - ww / hw).abs() < 1e-6);
    }
}
