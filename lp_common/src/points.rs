use std::{
    fmt::Display,
    iter::Sum,
    ops::Add,
    str::FromStr,
};

use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of stored units per loyalty point. Amounts carry two decimal places.
pub const POINTS_SCALE: i64 = 100;

//--------------------------------------       Points        ---------------------------------------------------------
/// A loyalty points amount, stored as an integer number of hundredths.
///
/// On the wire (the accrual provider, JSON APIs) amounts are plain decimal numbers, e.g. `729.98`. They are rounded
/// to the nearest hundredth when converted.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd)]
#[sqlx(transparent)]
pub struct Points(i64);

op!(binary Points, Add, add);
op!(binary Points, Sub, sub);
op!(inplace Points, AddAssign, add_assign);
op!(inplace Points, SubAssign, sub_assign);
op!(unary Points, Neg, neg);

impl Sum for Points {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented as loyalty points: {0}")]
pub struct PointsConversionError(String);

impl From<i64> for Points {
    /// Interprets the value as hundredths of a point.
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl Points {
    pub const fn from_hundredths(value: i64) -> Self {
        Self(value)
    }

    pub fn from_whole(points: i64) -> Self {
        Self(points * POINTS_SCALE)
    }

    pub fn hundredths(&self) -> i64 {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(&self) -> f64 {
        self.0 as f64 / POINTS_SCALE as f64
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn try_from_f64(value: f64) -> Result<Self, PointsConversionError> {
        if !value.is_finite() {
            return Err(PointsConversionError(format!("{value} is not a finite number")));
        }
        let scaled = (value * POINTS_SCALE as f64).round();
        if scaled.abs() >= i64::MAX as f64 {
            return Err(PointsConversionError(format!("{value} is too large")));
        }
        Ok(Self(scaled as i64))
    }
}

impl Display for Points {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = POINTS_SCALE.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / scale, abs % scale)
    }
}

impl FromStr for Points {
    type Err = PointsConversionError;

    /// Parses a decimal string with at most two fractional digits, e.g. `"13.4"`, `"7"` or `"-0.05"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || PointsConversionError(format!("'{s}' is not a valid points amount"));
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (whole, fraction) = match digits.split_once('.') {
            Some((w, f)) => (w, f),
            None => (digits, ""),
        };
        if whole.is_empty() || fraction.len() > 2 {
            return Err(err());
        }
        if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let whole = whole.parse::<i64>().map_err(|_| err())?;
        let fraction = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| err())? * 10,
            _ => fraction.parse::<i64>().map_err(|_| err())?,
        };
        let value = whole.checked_mul(POINTS_SCALE).and_then(|v| v.checked_add(fraction)).ok_or_else(err)?;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl Serialize for Points {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Points {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Points::try_from_f64(value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_and_display() {
        let p = "13.4".parse::<Points>().unwrap();
        assert_eq!(p.hundredths(), 1340);
        assert_eq!(p.to_string(), "13.40");
        assert_eq!("7".parse::<Points>().unwrap(), Points::from_whole(7));
        assert_eq!("-0.05".parse::<Points>().unwrap().to_string(), "-0.05");
        assert_eq!("1751.00".parse::<Points>().unwrap(), Points::from_whole(1751));
        assert!("1.234".parse::<Points>().is_err());
        assert!(".5".parse::<Points>().is_err());
        assert!("12a".parse::<Points>().is_err());
        assert!("".parse::<Points>().is_err());
    }

    #[test]
    fn arithmetic_is_exact() {
        let balance = "13.4".parse::<Points>().unwrap();
        let withdrawn = "11.2".parse::<Points>().unwrap();
        let amount = Points::from_whole(7);
        assert_eq!(balance - amount, "6.4".parse().unwrap());
        assert_eq!(withdrawn + amount, "18.2".parse().unwrap());
        let mut total = Points::default();
        total += amount;
        total -= Points::from_hundredths(50);
        assert_eq!(total.to_string(), "6.50");
        let sum: Points = [amount, amount, Points::from_hundredths(1)].into_iter().sum();
        assert_eq!(sum.hundredths(), 1401);
    }

    #[test]
    fn json_round_trip_uses_decimal_numbers() {
        let p: Points = serde_json::from_str("729.98").unwrap();
        assert_eq!(p.hundredths(), 72998);
        let p: Points = serde_json::from_str("500").unwrap();
        assert_eq!(p, Points::from_whole(500));
        assert_eq!(serde_json::to_string(&Points::from_hundredths(1250)).unwrap(), "12.5");
    }

    #[test]
    fn float_conversion_rounds_to_hundredths() {
        assert_eq!(Points::try_from_f64(0.1 + 0.2).unwrap().hundredths(), 30);
        assert_eq!(Points::try_from_f64(12.346).unwrap().hundredths(), 1235);
        assert!(Points::try_from_f64(f64::NAN).is_err());
        assert!(Points::try_from_f64(f64::INFINITY).is_err());
    }
}
