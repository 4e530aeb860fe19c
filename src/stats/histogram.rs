use thiserror::Error;

use super::export::{Bucket, HistogramData};

/// Upper edges of the histogram buckets, in scaled units (`(value - offset) / resolution`).
///
/// Bucket `0` holds everything at or below the offset, bucket `i` holds
/// `(EDGES[i - 1], EDGES[i]]` and one extra overflow bucket past the last edge
/// holds everything larger. The table is fixed: memory does not grow with the
/// number of samples, at the cost of percentiles being interpolated inside a
/// bucket instead of exact. With the default 0.1 ms resolution the buckets are
/// 0.1 ms wide up to 1.1 ms and end at 100 s, past which samples are clamped into
/// the overflow bucket.
const EDGES: [u32; 62] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, // 1 wide
    12, 14, 16, 18, 20, // 2 wide
    25, 30, 35, 40, 45, 50, // 5 wide
    60, 70, 80, 90, 100, // 10 wide
    120, 140, 160, 180, 200, //
    250, 300, 350, 400, 450, 500, //
    600, 700, 800, 900, 1000, //
    2000, 3000, 4000, 5000, 7500, 10000, //
    20000, 30000, 40000, 50000, 75000, 100000, //
    200000, 300000, 400000, 500000, 750000, 1000000, //
];

const NUM_BUCKETS: usize = EDGES.len() + 1;

#[derive(Debug, Error, PartialEq)]
pub enum HistogramError {
    #[error("histogram resolution must be a positive number, got {0}")]
    InvalidResolution(f64),
    #[error("histogram offset must be a finite number, got {0}")]
    InvalidOffset(f64),
}

/// Running count, extremes and moments of every recorded value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Counter {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub sum_of_squares: f64,
}

impl Counter {
    pub fn record_n(&mut self, value: f64, n: u64) {
        if n == 0 {
            return;
        }
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        let weight = n as f64;
        self.count += n;
        self.sum += value * weight;
        self.sum_of_squares += value * value * weight;
    }

    pub fn avg(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.sum / self.count as f64
    }

    /// Population standard deviation. Rounding can push the variance slightly
    /// below zero for near-constant samples, which is clamped.
    pub fn std_dev(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        let avg = self.sum / n;
        (self.sum_of_squares / n - avg * avg).max(0.0).sqrt()
    }
}

/// Streaming latency histogram over a fixed bucket table.
///
/// `record` is constant time and never fails. Percentile queries go through
/// [`Histogram::export`] and read cumulative bucket counts, so they must only
/// be issued once recording for the run is over.
#[derive(Debug, Clone)]
pub struct Histogram {
    counter: Counter,
    offset: f64,
    resolution: f64,
    buckets: [u64; NUM_BUCKETS],
}

impl Histogram {
    /// `offset` is the value mapped onto the first edge, `resolution` the width
    /// of one scaled unit (0.1 gives 0.1 wide buckets at the fine end).
    pub fn new(offset: f64, resolution: f64) -> Result<Self, HistogramError> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(HistogramError::InvalidResolution(resolution));
        }
        if !offset.is_finite() {
            return Err(HistogramError::InvalidOffset(offset));
        }
        Ok(Self {
            counter: Counter::default(),
            offset,
            resolution,
            buckets: [0; NUM_BUCKETS],
        })
    }

    pub fn record(&mut self, value: f64) {
        self.record_n(value, 1);
    }

    pub fn record_n(&mut self, value: f64, n: u64) {
        self.counter.record_n(value, n);
        let idx = self.bucket_index(value);
        self.buckets[idx] += n;
    }

    pub fn count(&self) -> u64 {
        self.counter.count
    }

    pub fn counter(&self) -> &Counter {
        &self.counter
    }

    /// Interpolated value below which `p` percent of the samples fall.
    /// Returns `0.0` when nothing has been recorded.
    pub fn percentile(&self, p: f64) -> f64 {
        self.export().calc_percentile(p)
    }

    /// Snapshot of the counter and every non-empty bucket, with bucket bounds
    /// in value units and cumulative percentages.
    pub fn export(&self) -> HistogramData {
        let counter = &self.counter;
        let mut data = Vec::new();
        let mut cumulative = 0u64;
        for (idx, &count) in self.buckets.iter().enumerate() {
            if count == 0 {
                continue;
            }
            cumulative += count;
            // Edge buckets are open ended; the observed extremes bound them,
            // which also keeps p0 == min and p100 == max exact.
            let start = match idx {
                0 => counter.min,
                _ => self.edge_value(idx - 1).max(counter.min),
            };
            let end = match idx {
                i if i == EDGES.len() => counter.max,
                _ => self.edge_value(idx).min(counter.max),
            };
            data.push(Bucket {
                start,
                end,
                percent: 100.0 * cumulative as f64 / counter.count as f64,
                count,
            });
        }

        HistogramData {
            count: counter.count,
            min: counter.min,
            max: counter.max,
            sum: counter.sum,
            avg: counter.avg(),
            std_dev: counter.std_dev(),
            data,
            percentiles: Vec::new(),
        }
    }

    fn edge_value(&self, idx: usize) -> f64 {
        self.offset + self.resolution * f64::from(EDGES[idx])
    }

    // Out of range samples are clamped: anything at or below the offset lands in
    // the first bucket, anything past the last edge in the overflow bucket.
    // The lookup walks a fixed 62 entry table, so it stays O(1) per sample.
    fn bucket_index(&self, value: f64) -> usize {
        let scaled = (value - self.offset) / self.resolution;
        if scaled.is_nan() || scaled <= 0.0 {
            return 0;
        }
        EDGES.partition_point(|&edge| f64::from(edge) < scaled)
    }
}
