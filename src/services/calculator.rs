//! Quota and expiry recalculation.
//!
//! `new_limit = limit * coefficient ± traffic_delta` (GiB converted to bytes) and
//! `new_expire = expire + day_delta days`. The sign only ever applies to the traffic
//! term: decreasing traffic still adds the day delta. Results are not clamped; the
//! panel decides whether to accept them.

use crate::units::{SECONDS_PER_DAY, gib_to_bytes};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    #[error("Invalid calculation type '{0}'. Use '+' or '-'")]
    InvalidCalculationType(String),

    #[error("Coefficient must be a finite number >= 0, got {0}")]
    InvalidCoefficient(f64),

    #[error("Traffic delta must be a finite number, got {0}")]
    InvalidTrafficDelta(f64),

    #[error("Day delta {0} is out of range")]
    DayDeltaOutOfRange(i64),

    #[error("Expiry {expire} shifted by {day_delta} days is out of range")]
    ExpireOutOfRange { expire: i64, day_delta: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

impl FromStr for Sign {
    type Err = CalculationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Self::Plus),
            "-" => Ok(Self::Minus),
            other => Err(CalculationError::InvalidCalculationType(other.to_string())),
        }
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Plus => "+",
            Self::Minus => "-",
        })
    }
}

/// Recalculated quota and expiry for one user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adjusted {
    /// New quota in bytes, unrounded.
    pub data_limit: f64,
    /// New expiry as a Unix timestamp in seconds.
    pub expire: i64,
}

impl Adjusted {
    /// The quota as whole bytes, which is what the panel stores.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn data_limit_bytes(&self) -> i64 {
        self.data_limit.round() as i64
    }
}

/// Parameters of one quota/expiry batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustmentSpec {
    pub sign: Sign,
    /// Traffic delta in GiB.
    pub traffic_delta: f64,
    pub day_delta: i64,
    pub coefficient: f64,
}

impl Default for AdjustmentSpec {
    fn default() -> Self {
        Self {
            sign: Sign::Plus,
            traffic_delta: 0.0,
            day_delta: 0,
            coefficient: 1.0,
        }
    }
}

impl AdjustmentSpec {
    pub fn new(
        sign: Sign,
        traffic_delta: f64,
        day_delta: i64,
        coefficient: f64,
    ) -> Result<Self, CalculationError> {
        if !coefficient.is_finite() || coefficient < 0.0 {
            return Err(CalculationError::InvalidCoefficient(coefficient));
        }
        if !traffic_delta.is_finite() {
            return Err(CalculationError::InvalidTrafficDelta(traffic_delta));
        }
        if day_delta.checked_mul(SECONDS_PER_DAY).is_none() {
            return Err(CalculationError::DayDeltaOutOfRange(day_delta));
        }

        Ok(Self {
            sign,
            traffic_delta,
            day_delta,
            coefficient,
        })
    }

    pub fn apply(&self, data_limit: i64, expire: i64) -> Result<Adjusted, CalculationError> {
        adjust(
            self.sign,
            data_limit,
            expire,
            self.traffic_delta,
            self.day_delta,
            self.coefficient,
        )
    }
}

/// Fails when the shifted expiry does not fit in an `i64` timestamp.
#[allow(clippy::cast_precision_loss)]
pub fn adjust(
    sign: Sign,
    data_limit: i64,
    expire: i64,
    traffic_delta: f64,
    day_delta: i64,
    coefficient: f64,
) -> Result<Adjusted, CalculationError> {
    let expire = day_delta
        .checked_mul(SECONDS_PER_DAY)
        .and_then(|shift| expire.checked_add(shift))
        .ok_or(CalculationError::ExpireOutOfRange { expire, day_delta })?;

    let scaled = data_limit as f64 * coefficient;
    let delta = gib_to_bytes(traffic_delta);

    let data_limit = match sign {
        Sign::Plus => scaled + delta,
        Sign::Minus => scaled - delta,
    };

    Ok(Adjusted { data_limit, expire })
}

/// [`adjust`] for a sign that has not been parsed yet.
pub fn adjust_str(
    sign: &str,
    data_limit: i64,
    expire: i64,
    traffic_delta: f64,
    day_delta: i64,
    coefficient: f64,
) -> Result<Adjusted, CalculationError> {
    adjust(
        sign.parse()?,
        data_limit,
        expire,
        traffic_delta,
        day_delta,
        coefficient,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::BYTES_PER_GIB;

    const GIB: f64 = 1_073_741_824.0;

    #[test]
    fn test_plus_adds_traffic_and_days() {
        let out = adjust(Sign::Plus, 10 * BYTES_PER_GIB, 1_000, 5.0, 2, 1.0).unwrap();
        assert_eq!(out.data_limit_bytes(), 15 * BYTES_PER_GIB);
        assert_eq!(out.expire, 1_000 + 2 * 86_400);
    }

    #[test]
    fn test_minus_subtracts_traffic_but_still_adds_days() {
        let out = adjust(Sign::Minus, 10 * BYTES_PER_GIB, 1_000, 3.0, 4, 1.0).unwrap();
        assert_eq!(out.data_limit_bytes(), 7 * BYTES_PER_GIB);
        assert_eq!(out.expire, 1_000 + 4 * 86_400);
    }

    #[test]
    fn test_coefficient_scales_before_delta() {
        for (sign, delta, coefficient) in [
            (Sign::Plus, 0.0, 1.1),
            (Sign::Minus, 2.5, 2.0),
            (Sign::Plus, 1.0, 0.0),
        ] {
            let limit = 8 * BYTES_PER_GIB;
            let expected = match sign {
                Sign::Plus => 8.0 * GIB * coefficient + delta * GIB,
                Sign::Minus => 8.0 * GIB * coefficient - delta * GIB,
            };
            let out = adjust(sign, limit, 0, delta, 0, coefficient).unwrap();
            assert!((out.data_limit - expected).abs() < 1e-3, "{sign} {delta} {coefficient}");
            assert_eq!(out.expire, 0);
        }
    }

    #[test]
    fn test_no_clamping_below_zero() {
        let out = adjust(Sign::Minus, BYTES_PER_GIB, 0, 3.0, -1, 1.0).unwrap();
        assert_eq!(out.data_limit_bytes(), -2 * BYTES_PER_GIB);
        assert_eq!(out.expire, -86_400);
    }

    #[test]
    fn test_invalid_sign_is_rejected() {
        for sign in ["*", "", "plus", "++", "increase", "decrease"] {
            let err = adjust_str(sign, 1, 1, 1.0, 1, 1.0).unwrap_err();
            assert_eq!(err, CalculationError::InvalidCalculationType(sign.to_string()));
        }
        assert!(adjust_str("-", 1, 1, 0.0, 0, 1.0).is_ok());
    }

    #[test]
    fn test_spec_validation() {
        assert!(AdjustmentSpec::new(Sign::Plus, 1.0, 0, -0.5).is_err());
        assert!(AdjustmentSpec::new(Sign::Plus, f64::NAN, 0, 1.0).is_err());

        let spec = AdjustmentSpec::new(Sign::Plus, 1.0, 3, 1.0).unwrap();
        let out = spec.apply(BYTES_PER_GIB, 0).unwrap();
        assert_eq!(out.data_limit_bytes(), 2 * BYTES_PER_GIB);
        assert_eq!(out.expire, 3 * 86_400);
    }

    #[test]
    fn test_huge_day_delta_is_rejected() {
        assert_eq!(
            AdjustmentSpec::new(Sign::Plus, 0.0, 200_000_000_000_000, 1.0).unwrap_err(),
            CalculationError::DayDeltaOutOfRange(200_000_000_000_000)
        );
        assert!(adjust(Sign::Plus, 1, 0, 0.0, i64::MIN, 1.0).is_err());
    }

    #[test]
    fn test_expiry_overflow_is_an_error() {
        let spec = AdjustmentSpec::new(Sign::Plus, 0.0, 1, 1.0).unwrap();
        assert_eq!(
            spec.apply(1, i64::MAX - 10).unwrap_err(),
            CalculationError::ExpireOutOfRange {
                expire: i64::MAX - 10,
                day_delta: 1
            }
        );
        assert_eq!(spec.apply(1, 1_700_000_000).unwrap().expire, 1_700_086_400);
    }
}
