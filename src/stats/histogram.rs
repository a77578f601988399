//! Fixed-bucket-width histogram over a single integer column.

use std::fmt;

/// Comparison operator in a selection predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOp {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEq,
    LessThan,
    LessThanOrEq,
}

/// Histogram of the values seen in one integer field, split into a
/// fixed number of equal-width buckets over `[min, max]`.
///
/// Uses constant space and constant time per value; values are
/// counted into buckets, never stored. Values outside `[min, max]`
/// are ignored.
pub struct IntHistogram {
    buckets: Vec<u64>,
    min: i64,
    max: i64,
    width: f64,
    count: u64,
}

impl IntHistogram {
    /// Create a histogram with `buckets` equal-width buckets covering
    /// the inclusive value range `[min, max]`.
    ///
    /// # Panics
    /// Panics if `buckets` is 0 or `min > max`.
    pub fn new(buckets: usize, min: i64, max: i64) -> Self {
        assert!(buckets > 0, "need at least one bucket");
        assert!(min <= max, "empty value range");

        // Width in f64 from the start: `max - min + 1` overflows i64
        // for ranges like [i64::MIN, i64::MAX].
        IntHistogram {
            buckets: vec![0; buckets],
            min,
            max,
            width: (max as f64 - min as f64 + 1.0) / buckets as f64,
            count: 0,
        }
    }

    fn bucket_of(&self, v: i64) -> usize {
        // Ranges past 2^53 lose precision in f64 and can round the
        // quotient up to exactly `buckets.len()` for v == max; clamp
        // to the last bucket.
        let idx = ((v as f64 - self.min as f64) / self.width) as usize;
        idx.min(self.buckets.len() - 1)
    }

    /// Count a value into the histogram. Out-of-range values are
    /// ignored.
    pub fn add_value(&mut self, v: i64) {
        if v >= self.min && v <= self.max {
            let idx = self.bucket_of(v);
            self.buckets[idx] += 1;
            self.count += 1;
        }
    }

    /// Number of values counted.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Estimate the fraction of counted values satisfying
    /// `value op v`, in `[0, 1]`.
    ///
    /// Equality assumes values spread evenly within a bucket
    /// (`height / width / count` for buckets wider than one value);
    /// greater-than sums the buckets right of `v` plus the remainder
    /// of `v`'s own bucket. The other four operators are composed from
    /// those two.
    pub fn estimate_selectivity(&self, op: PredicateOp, v: i64) -> f64 {
        match op {
            PredicateOp::Equals => self.selectivity_equals(v),
            PredicateOp::NotEquals => 1.0 - self.selectivity_equals(v),
            PredicateOp::GreaterThan => self.selectivity_greater_than(v),
            PredicateOp::GreaterThanOrEq => {
                self.selectivity_equals(v) + self.selectivity_greater_than(v)
            }
            PredicateOp::LessThan => {
                1.0 - self.selectivity_equals(v) - self.selectivity_greater_than(v)
            }
            PredicateOp::LessThanOrEq => 1.0 - self.selectivity_greater_than(v),
        }
    }

    fn selectivity_equals(&self, v: i64) -> f64 {
        if self.count == 0 || v < self.min || v > self.max {
            return 0.0;
        }
        let height = self.buckets[self.bucket_of(v)] as f64;
        if self.width > 1.0 {
            height / self.width / self.count as f64
        } else {
            height / self.count as f64
        }
    }

    fn selectivity_greater_than(&self, v: i64) -> f64 {
        if self.count == 0 || v > self.max {
            return 0.0;
        }
        if v < self.min {
            return 1.0;
        }

        let idx = self.bucket_of(v);
        let height = self.buckets[idx] as f64;

        // Whole buckets to the right of v's bucket.
        let mut total: f64 = self.buckets[idx + 1..].iter().map(|&b| b as f64).sum();

        // Plus the part of v's own bucket strictly greater than v.
        if self.width > 1.0 {
            let bucket_left = idx as f64 * self.width + self.min as f64;
            let covered = (v as f64) - bucket_left + 1.0;
            total += height - covered * (height / self.width);
        }
        total / self.count as f64
    }
}

impl fmt::Display for IntHistogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IntHistogram(buckets={}, min={}, max={}, count={})",
            self.buckets.len(),
            self.min,
            self.max,
            self.count
        )
    }
}
