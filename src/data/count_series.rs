use crate::channel::Channel;

use ndarray::{Array1, Array2, ArrayView1, Axis, Zip};
use serde::{Deserialize, Serialize};

/// Binned photon counts of a burst
///
/// Bins are given by their left and right edges, counts are stored as a `(bins, 4)` array with a
/// column per [Channel]. The series is read-only input of the likelihood.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountSeries {
    bin_left: Array1<f64>,
    bin_right: Array1<f64>,
    counts: Array2<f64>,
}

impl CountSeries {
    /// Construct `CountSeries` from bin edges and counts
    ///
    /// All bins must have positive width, `counts` must have a row per bin and a column per
    /// channel.
    pub fn new(
        bin_left: impl Into<Array1<f64>>,
        bin_right: impl Into<Array1<f64>>,
        counts: impl Into<Array2<f64>>,
    ) -> Self {
        let bin_left = bin_left.into();
        let bin_right = bin_right.into();
        let counts = counts.into();

        assert_eq!(
            bin_left.len(),
            bin_right.len(),
            "bin_left and bin_right should have the same size"
        );
        assert_eq!(
            counts.shape(),
            &[bin_left.len(), Channel::ALL.len()],
            "counts should have a row per bin and a column per channel"
        );
        assert!(
            Zip::from(&bin_left)
                .and(&bin_right)
                .all(|&left, &right| left < right),
            "bins should have positive width"
        );

        Self {
            bin_left,
            bin_right,
            counts,
        }
    }

    /// Number of bins
    pub fn len(&self) -> usize {
        self.bin_left.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bin_left.is_empty()
    }

    pub fn bin_left(&self) -> ArrayView1<'_, f64> {
        self.bin_left.view()
    }

    pub fn bin_right(&self) -> ArrayView1<'_, f64> {
        self.bin_right.view()
    }

    pub fn bin_widths(&self) -> Array1<f64> {
        &self.bin_right - &self.bin_left
    }

    pub fn counts(&self, channel: Channel) -> ArrayView1<'_, f64> {
        self.counts.column(channel.index())
    }

    /// Counts summed over all channels
    pub fn total_counts(&self) -> Array1<f64> {
        self.counts.sum_axis(Axis(1))
    }

    /// Count rate, counts per unit time
    pub fn rates(&self, channel: Channel) -> Array1<f64> {
        &self.counts(channel) / &self.bin_widths()
    }
}
