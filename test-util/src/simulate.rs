use light_curve_pulse::ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::Rng;
use rand_distr::{Distribution, Poisson};

/// Poisson draw for every bin of a rate, zero rate gives zero counts
pub fn simulate_counts<R: Rng + ?Sized>(rate: ArrayView1<f64>, rng: &mut R) -> Array1<f64> {
    rate.mapv(|lambda| {
        if lambda > 0.0 {
            Poisson::new(lambda)
                .expect("rate must be finite")
                .sample(rng)
        } else {
            0.0
        }
    })
}

/// Simulate counts of four channels
///
/// `rate` gives the expected counts of a zero-based channel index at the given times, it is
/// evaluated at left bin edges.
pub fn simulate_burst<R, F>(
    bin_left: ArrayView1<f64>,
    rng: &mut R,
    rate: F,
) -> Array2<f64>
where
    R: Rng + ?Sized,
    F: Fn(usize, ArrayView1<f64>) -> Array1<f64>,
{
    let mut counts = Array2::zeros((bin_left.len(), 4));
    for (channel, mut column) in counts.axis_iter_mut(Axis(1)).enumerate() {
        let rate = rate(channel, bin_left);
        column.assign(&simulate_counts(rate.view(), rng));
    }
    counts
}
