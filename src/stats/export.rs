use std::io::{self, Write};

use serde::Serialize;

/// One non-empty histogram bucket, bounds in value units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub start: f64,
    pub end: f64,
    /// Cumulative percentage of samples up to and including this bucket.
    pub percent: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percentile {
    pub percentile: f64,
    pub value: f64,
}

/// Read-only snapshot of a [`super::Histogram`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramData {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub sum: f64,
    pub avg: f64,
    pub std_dev: f64,
    pub data: Vec<Bucket>,
    pub percentiles: Vec<Percentile>,
}

impl HistogramData {
    /// Linear interpolation over the cumulative bucket percentages.
    /// An empty snapshot yields `0.0`.
    pub fn calc_percentile(&self, percentile: f64) -> f64 {
        let Some(first) = self.data.first() else {
            return 0.0;
        };
        if percentile >= 100.0 {
            return self.max;
        }
        if percentile <= 0.0 {
            return self.min;
        }
        if percentile <= first.percent {
            return first.start + (first.end - first.start) * percentile / first.percent;
        }
        for pair in self.data.windows(2) {
            let (prev, cur) = (&pair[0], &pair[1]);
            if percentile <= cur.percent {
                let fraction = (percentile - prev.percent) / (cur.percent - prev.percent);
                return cur.start + (cur.end - cur.start) * fraction;
            }
        }
        self.max
    }

    pub fn calc_percentiles(&mut self, percentiles: &[f64]) -> &mut Self {
        self.percentiles = percentiles
            .iter()
            .map(|&p| Percentile {
                percentile: p,
                value: self.calc_percentile(p),
            })
            .collect();
        self
    }

    pub fn print(&self, out: &mut impl Write, title: &str) -> io::Result<()> {
        writeln!(
            out,
            "# {} : count {} avg {} +/- {:.4} min {} max {} sum {}",
            title,
            self.count,
            fmt_value(self.avg),
            self.std_dev,
            fmt_value(self.min),
            fmt_value(self.max),
            fmt_value(self.sum),
        )?;
        writeln!(out, "# range, mid point, percentile, count")?;
        for (i, bucket) in self.data.iter().enumerate() {
            // Only the first bucket includes its start.
            let sep = if i == 0 { ">=" } else { ">" };
            writeln!(
                out,
                "{} {} <= {} , {} , {:.2}, {}",
                sep,
                fmt_value(bucket.start),
                fmt_value(bucket.end),
                fmt_value((bucket.start + bucket.end) / 2.0),
                bucket.percent,
                bucket.count,
            )?;
        }
        for p in &self.percentiles {
            writeln!(out, "# target {}% {}", p.percentile, fmt_value(p.value))?;
        }
        Ok(())
    }
}

fn fmt_value(v: f64) -> String {
    let s = format!("{:.4}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" => "0".to_string(),
        _ => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::stats::Histogram;

    use super::*;

    #[test]
    fn formats_values_without_trailing_zeros() {
        assert_eq!(fmt_value(1.5), "1.5");
        assert_eq!(fmt_value(10.0), "10");
        assert_eq!(fmt_value(0.12345), "0.1235");
        assert_eq!(fmt_value(-0.00001), "0");
    }

    #[test]
    fn empty_snapshot_prints_header_only() {
        let mut data = Histogram::new(0.0, 0.1).unwrap().export();
        data.calc_percentiles(&[50.0, 90.0]);
        assert_eq!(data.percentiles[0].value, 0.0);

        let mut out = Vec::new();
        data.print(&mut out, "response time (in ms)").unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("# response time (in ms) : count 0 avg 0 +/- 0.0000 min 0 max 0 sum 0"));
        assert!(text.contains("# target 50% 0\n"));
        assert!(text.contains("# target 90% 0\n"));
        assert!(!text.contains(">="));
    }

    #[test]
    fn prints_buckets_and_targets() {
        let mut h = Histogram::new(0.0, 1.0).unwrap();
        h.record(10.0);
        h.record(10.5);
        h.record(11.0);
        h.record(11.0);
        let mut data = h.export();
        data.calc_percentiles(&[50.0, 99.0]);

        let mut out = Vec::new();
        data.print(&mut out, "latency").unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# latency : count 4 avg 10.625 +/- 0.4146 min 10 max 11 sum 42.5");
        assert_eq!(lines[2], ">= 10 <= 10 , 10 , 25.00, 1");
        assert_eq!(lines[3], "> 10 <= 11 , 10.5 , 100.00, 3");
        assert_eq!(lines[4], "# target 50% 10.3333");
        assert_eq!(lines[5], "# target 99% 10.9867");
    }

    #[test]
    fn calc_percentiles_keeps_requested_order() {
        let mut h = Histogram::new(0.0, 0.1).unwrap();
        for v in 1..=100 {
            h.record(f64::from(v) * 0.1);
        }
        let mut data = h.export();
        data.calc_percentiles(&[99.0, 50.0, 90.0]);
        let asked: Vec<f64> = data.percentiles.iter().map(|p| p.percentile).collect();
        assert_eq!(asked, vec![99.0, 50.0, 90.0]);
        assert!(data.percentiles[1].value <= data.percentiles[2].value);
        assert!(data.percentiles[2].value <= data.percentiles[0].value);
    }

    #[test]
    fn snapshot_serializes_to_yaml() {
        let mut h = Histogram::new(0.0, 1.0).unwrap();
        h.record(10.0);
        h.record(11.0);
        let mut data = h.export();
        data.calc_percentiles(&[50.0]);

        let yaml = serde_yaml::to_string(&data).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(value["count"].as_u64(), Some(2));
        assert_eq!(value["min"].as_f64(), Some(10.0));
        assert_eq!(value["max"].as_f64(), Some(11.0));
        assert_eq!(value["data"].as_sequence().map(|s| s.len()), Some(2));
        assert_eq!(value["data"][1]["percent"].as_f64(), Some(100.0));
        assert_eq!(value["data"][1]["count"].as_u64(), Some(1));
        assert_eq!(value["percentiles"][0]["percentile"].as_f64(), Some(50.0));
        assert_eq!(value["percentiles"][0]["value"].as_f64(), Some(10.0));
    }
}
