//! Money arithmetic for the reconciliation protocol
//!
//! All calculations run on `Decimal` internally and convert back to
//! `f64` for storage/serialization, rounded to 2 decimal places.

use rust_decimal::prelude::*;
use shared::models::OrderStatus;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        // Amounts are bounded at the validation boundary; 2dp decimals
        // in that range are always representable
        .expect("Decimal rounded to 2dp is always representable as f64")
}

/// The reconciliation rule: recompute balance and status from
/// total/deposit.
///
/// `balance == max(0, total - deposit)`; `"completado"` iff the balance
/// reaches exactly zero, `"pendiente"` otherwise. Cancellation is not
/// derived here — it is a manual transition handled by the callers.
pub fn settle(total: f64, deposit: f64) -> (f64, OrderStatus) {
    let balance = (to_decimal(total) - to_decimal(deposit)).max(Decimal::ZERO);
    let status = if balance.is_zero() {
        OrderStatus::Completado
    } else {
        OrderStatus::Pendiente
    };
    (to_f64(balance), status)
}

/// Normalize a wire amount to the storage precision (2 decimal places)
pub fn round(value: f64) -> f64 {
    to_f64(to_decimal(value))
}

/// Decimal-exact a + b
pub fn add(a: f64, b: f64) -> f64 {
    to_f64(to_decimal(a) + to_decimal(b))
}

/// Decimal-exact sum
pub fn sum(values: &[f64]) -> f64 {
    to_f64(values.iter().map(|v| to_decimal(*v)).sum::<Decimal>())
}

/// Decimal-exact a < b
pub fn lt(a: f64, b: f64) -> bool {
    to_decimal(a) < to_decimal(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_beats_f64_accumulation() {
        // 0.1 + 0.2 != 0.3 in f64, but the Decimal path lands exactly
        assert_ne!(0.1_f64 + 0.2_f64, 0.3);
        assert_eq!(add(0.1, 0.2), 0.3);

        let cents = vec![0.01_f64; 1000];
        assert_eq!(sum(&cents), 10.0);
    }

    #[test]
    fn test_settle_rules() {
        let (balance, status) = settle(500.0, 0.0);
        assert_eq!(balance, 500.0);
        assert_eq!(status, OrderStatus::Pendiente);

        let (balance, status) = settle(500.0, 500.0);
        assert_eq!(balance, 0.0);
        assert_eq!(status, OrderStatus::Completado);

        // Clamped at zero, never negative
        let (balance, status) = settle(100.0, 150.0);
        assert_eq!(balance, 0.0);
        assert_eq!(status, OrderStatus::Completado);
    }

    #[test]
    fn test_settle_fractional_cents() {
        let (balance, status) = settle(100.0, 99.99);
        assert_eq!(balance, 0.01);
        assert_eq!(status, OrderStatus::Pendiente);
    }
}
