//! Timestamped price history.

use chrono::{DateTime, Utc};

use crate::domain::error::SignalError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub time: DateTime<Utc>,
    pub price: f64,
}

impl PricePoint {
    pub fn new(time: DateTime<Utc>, price: f64) -> Self {
        Self { time, price }
    }
}

/// Append-only, time-ordered price history.
///
/// Points sharing a timestamp are kept in append order. Callers take a bounded
/// suffix with [`PriceSeries::tail`] for indicator work.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from already-ordered points, rejecting the first bad one.
    pub fn from_points(points: Vec<PricePoint>) -> Result<Self, SignalError> {
        let mut series = Self {
            points: Vec::with_capacity(points.len()),
        };
        for point in points {
            series.push(point)?;
        }
        Ok(series)
    }

    /// Append a point. The series is left untouched when the point is rejected.
    pub fn push(&mut self, point: PricePoint) -> Result<(), SignalError> {
        if !point.price.is_finite() || point.price <= 0.0 {
            return Err(SignalError::unavailable(format!(
                "price must be positive and finite, got {}",
                point.price
            )));
        }
        if let Some(last) = self.points.last() {
            if point.time < last.time {
                return Err(SignalError::unavailable(format!(
                    "price at {} is older than last point at {}",
                    point.time, last.time
                )));
            }
        }
        self.points.push(point);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    /// The last `n` points (or all of them when fewer exist).
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }

    /// Prices of `points`, in order.
    pub fn closes(points: &[PricePoint]) -> Vec<f64> {
        points.iter().map(|p| p.price).collect()
    }
}
