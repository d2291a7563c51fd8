//! Equal-width histogram of score values.

use ordered_float::OrderedFloat;

use crate::error::{DatasetError, DatasetResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `scores` into `bins` equal-width bins over `[min, max]`.
    ///
    /// The maximum lands in the last bin. With no scores, every bin is empty
    /// and the range is `[0, 0]`.
    pub fn from_scores<I>(scores: I, bins: usize) -> DatasetResult<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        if bins == 0 {
            return Err(DatasetError::InvalidArgument(
                "histogram needs at least one bin".to_string(),
            ));
        }

        let values: Vec<f64> = scores.into_iter().filter(|v| v.is_finite()).collect();
        let min = values.iter().copied().map(OrderedFloat).min().map_or(0.0, |v| v.0);
        let max = values.iter().copied().map(OrderedFloat).max().map_or(0.0, |v| v.0);

        let mut counts = vec![0; bins];
        let width = (max - min) / bins as f64;
        for value in values {
            let bin = if width > 0.0 {
                (((value - min) / width) as usize).min(bins - 1)
            } else {
                0
            };
            counts[bin] += 1;
        }
        Ok(Self { min, max, counts })
    }

    /// Lower and upper edge of bin `index`.
    pub fn bin_range(&self, index: usize) -> (f64, f64) {
        let width = (self.max - self.min) / self.counts.len() as f64;
        (
            self.min + width * index as f64,
            self.min + width * (index + 1) as f64,
        )
    }

    /// Text rendering, one bar per bin scaled to `width` characters.
    pub fn render(&self, width: usize) -> String {
        let peak = self.counts.iter().copied().max().unwrap_or(0).max(1);
        let mut out = String::new();
        for (index, &count) in self.counts.iter().enumerate() {
            let (low, high) = self.bin_range(index);
            let bar = "#".repeat(count * width / peak);
            out.push_str(&format!("[{low:.3}, {high:.3}) {count:>8} {bar}\n"));
        }
        out
    }
}
