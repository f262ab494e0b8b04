//! Nullable per-period arithmetic.
//!
//! Every derived metric is computed through [`Series`], so the null rules live
//! in one place: a cell is `None` when any operand is `None`, when a divisor is
//! zero, or when the result would not be a finite number.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Divides two optional cells, yielding `None` for null operands, a zero
/// denominator or a non-finite quotient.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => finite(n / d),
        _ => None,
    }
}

fn finite(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Series(Vec<Option<f64>>);

impl Series {
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self(values.into_iter().map(|v| v.and_then(finite)).collect())
    }

    /// A series of `len` null cells.
    pub fn nulls(len: usize) -> Self {
        Self(vec![None; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<f64> {
        self.0.get(position).copied().flatten()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Option<f64>> {
        self.0
    }

    pub fn is_all_null(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    /// Multiplies every non-null cell by `factor`.
    pub fn scale(&self, factor: f64) -> Self {
        Self(self.0.iter().map(|v| v.and_then(|x| finite(x * factor))).collect())
    }

    /// Year-over-year percentage change, ordered by `index`.
    ///
    /// `index` holds the period index label of each cell. Cells are visited in
    /// ascending label order and the change is written back at the original
    /// position, so the result stays aligned with `self`. The earliest period
    /// is always null, and a series shorter than two periods is entirely null.
    pub fn yoy_growth(&self, index: &[usize]) -> Self {
        let mut growth = Self::nulls(self.len());
        if self.len() < 2 {
            return growth;
        }

        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by_key(|&pos| index.get(pos).copied().unwrap_or(pos));

        for pair in order.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            let change = match (self.get(curr), self.get(prev)) {
                (Some(c), Some(p)) => ratio(Some(c - p), Some(p)).map(|g| g * 100.0),
                _ => None,
            };
            growth.0[curr] = change.and_then(finite);
        }

        growth
    }

    fn zip_with(&self, other: &Self, op: impl Fn(f64, f64) -> Option<f64>) -> Self {
        let len = self.len().max(other.len());
        Self(
            (0..len)
                .map(|i| match (self.get(i), other.get(i)) {
                    (Some(a), Some(b)) => op(a, b).and_then(finite),
                    _ => None,
                })
                .collect(),
        )
    }
}

impl From<Vec<Option<f64>>> for Series {
    fn from(values: Vec<Option<f64>>) -> Self {
        Self::new(values)
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values.into_iter().map(Some).collect())
    }
}

impl Add for &Series {
    type Output = Series;

    fn add(self, rhs: Self) -> Series {
        self.zip_with(rhs, |a, b| Some(a + b))
    }
}

impl Sub for &Series {
    type Output = Series;

    fn sub(self, rhs: Self) -> Series {
        self.zip_with(rhs, |a, b| Some(a - b))
    }
}

impl Mul for &Series {
    type Output = Series;

    fn mul(self, rhs: Self) -> Series {
        self.zip_with(rhs, |a, b| Some(a * b))
    }
}

impl Div for &Series {
    type Output = Series;

    fn div(self, rhs: Self) -> Series {
        self.zip_with(rhs, |a, b| ratio(Some(a), Some(b)))
    }
}

impl Mul<f64> for &Series {
    type Output = Series;

    fn mul(self, rhs: f64) -> Series {
        self.scale(rhs)
    }
}

impl Neg for &Series {
    type Output = Series;

    fn neg(self) -> Series {
        self.scale(-1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_null_and_zero() {
        assert_eq!(ratio(Some(10.0), Some(4.0)), Some(2.5));
        assert_eq!(ratio(Some(10.0), Some(0.0)), None);
        assert_eq!(ratio(None, Some(2.0)), None);
        assert_eq!(ratio(Some(1.0), None), None);
        assert_eq!(ratio(Some(f64::MAX), Some(f64::MIN_POSITIVE)), None);
    }

    #[test]
    fn test_division_never_produces_non_finite() {
        let num = Series::from(vec![Some(1.0), Some(0.0), None, Some(5.0)]);
        let den = Series::from(vec![Some(0.0), Some(0.0), Some(1.0), Some(2.0)]);
        let result = &num / &den;
        assert_eq!(result.values(), &[None, None, None, Some(2.5)]);
    }

    #[test]
    fn test_new_drops_nan_and_infinity() {
        let series = Series::from(vec![f64::NAN, f64::INFINITY, 3.0]);
        assert_eq!(series.values(), &[None, None, Some(3.0)]);
    }

    #[test]
    fn test_addition_propagates_per_period_null() {
        let operating = Series::from(vec![Some(50.0), Some(60.0)]);
        let capex = Series::from(vec![None, Some(-10.0)]);
        let fcf = &operating + &capex;
        assert_eq!(fcf.values(), &[None, Some(50.0)]);
    }

    #[test]
    fn test_mismatched_lengths_pad_with_null() {
        let a = Series::from(vec![1.0, 2.0, 3.0]);
        let b = Series::from(vec![1.0]);
        assert_eq!((&a - &b).values(), &[Some(0.0), None, None]);
    }

    #[test]
    fn test_negation_and_scale() {
        let dividends = Series::from(vec![Some(-20.0), None]);
        assert_eq!((-&dividends).values(), &[Some(20.0), None]);
        assert_eq!((&dividends * 100.0).values(), &[Some(-2000.0), None]);
    }

    #[test]
    fn test_yoy_growth() {
        let revenue = Series::from(vec![10.0, 12.0, 15.0]);
        let growth = revenue.yoy_growth(&[0, 1, 2]);
        assert_eq!(growth.get(0), None);
        assert!((growth.get(1).unwrap() - 20.0).abs() < 1e-9);
        assert!((growth.get(2).unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_yoy_growth_follows_index_order() {
        // Stored newest first; index labels say which period comes first.
        let eps = Series::from(vec![15.0, 12.0, 10.0]);
        let growth = eps.yoy_growth(&[2, 1, 0]);
        assert_eq!(growth.get(2), None);
        assert!((growth.get(1).unwrap() - 20.0).abs() < 1e-9);
        assert!((growth.get(0).unwrap() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_yoy_growth_short_and_gapped() {
        assert!(Series::from(vec![5.0]).yoy_growth(&[0]).is_all_null());
        assert!(Series::default().yoy_growth(&[]).is_empty());

        let gapped = Series::from(vec![Some(10.0), None, Some(12.0), Some(0.0), Some(3.0)]);
        let growth = gapped.yoy_growth(&[0, 1, 2, 3, 4]);
        assert_eq!(growth.values()[..4], [None, None, None, Some(-100.0)]);
        assert_eq!(growth.get(4), None);
    }
}
