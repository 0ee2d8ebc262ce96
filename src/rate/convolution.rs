use lazy_static::lazy_static;
use ndarray::{Array1, ArrayView1, ArrayViewMut1, Zip};
use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::cell::RefCell;
use std::sync::Arc;
use thread_local::ThreadLocal;

/// Inputs this long or longer on both sides are convolved through FFT, shorter ones by direct sum
pub const FFT_MIN_LEN: usize = 64;

lazy_static! {
    static ref FFT_CONVOLUTION: ThreadLocal<RefCell<Option<FftConvolution>>> = ThreadLocal::new();
}

/// Linear convolution trimmed to the length of the first input
///
/// The full convolution of arrays of lengths `n` and `m` has `n + m - 1` points, the output keeps
/// `n` of them centred the same way as `scipy.signal.convolve(a, v, mode="same")` does.
pub fn convolve_same(a: ArrayView1<f64>, v: ArrayView1<f64>) -> Array1<f64> {
    let mut out = Array1::zeros(a.len());
    add_convolve_same(a, v, 1.0, out.view_mut());
    out
}

/// Add `factor` times [convolve_same] of `a` and `v` to `out`
pub fn add_convolve_same(
    a: ArrayView1<f64>,
    v: ArrayView1<f64>,
    factor: f64,
    out: ArrayViewMut1<f64>,
) {
    assert_eq!(
        out.len(),
        a.len(),
        "out should have the same size as the first input"
    );
    if a.is_empty() || v.is_empty() {
        return;
    }
    if a.len().min(v.len()) < FFT_MIN_LEN {
        add_direct(a, v, factor, out);
    } else {
        let len = (a.len() + v.len() - 1).next_power_of_two();
        let mut fft = FFT_CONVOLUTION.get_or(|| RefCell::new(None)).borrow_mut();
        if fft.as_ref().is_some_and(|fft| fft.len != len) {
            *fft = None;
        }
        fft.get_or_insert_with(|| FftConvolution::new(len))
            .add_into(a, v, factor, out);
    }
}

fn add_direct(a: ArrayView1<f64>, v: ArrayView1<f64>, factor: f64, out: ArrayViewMut1<f64>) {
    let n = a.len();
    let m = v.len();
    let offset = (m - 1) / 2;
    for (k, y) in out.into_iter().enumerate() {
        let j = k + offset;
        let i_min = j.saturating_sub(m - 1);
        let i_max = j.min(n - 1);
        *y += factor * (i_min..=i_max).map(|i| a[i] * v[j - i]).sum::<f64>();
    }
}

/// Plans and buffers of a zero-padded circular convolution of length `len`
struct FftConvolution {
    len: usize,
    r2c: Arc<dyn RealToComplex<f64>>,
    c2r: Arc<dyn ComplexToReal<f64>>,
    a: Vec<f64>,
    v: Vec<f64>,
    spectrum_a: Vec<Complex<f64>>,
    spectrum_v: Vec<Complex<f64>>,
    r2c_scratch: Vec<Complex<f64>>,
    c2r_scratch: Vec<Complex<f64>>,
}

impl FftConvolution {
    fn new(len: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(len);
        let c2r = planner.plan_fft_inverse(len);
        Self {
            len,
            a: r2c.make_input_vec(),
            v: r2c.make_input_vec(),
            spectrum_a: r2c.make_output_vec(),
            spectrum_v: r2c.make_output_vec(),
            r2c_scratch: r2c.make_scratch_vec(),
            c2r_scratch: c2r.make_scratch_vec(),
            r2c,
            c2r,
        }
    }

    fn add_into(
        &mut self,
        a: ArrayView1<f64>,
        v: ArrayView1<f64>,
        factor: f64,
        out: ArrayViewMut1<f64>,
    ) {
        debug_assert!(a.len() + v.len() - 1 <= self.len);

        load_padded(&mut self.a, a);
        load_padded(&mut self.v, v);
        self.r2c
            .process_with_scratch(&mut self.a, &mut self.spectrum_a, &mut self.r2c_scratch)
            .expect("buffers are made by the plan");
        self.r2c
            .process_with_scratch(&mut self.v, &mut self.spectrum_v, &mut self.r2c_scratch)
            .expect("buffers are made by the plan");

        for (x, y) in self.spectrum_a.iter_mut().zip(&self.spectrum_v) {
            *x *= *y;
        }
        // Even-length inverse transform requires real first and last bins
        self.spectrum_a[0].im = 0.0;
        if let Some(last) = self.spectrum_a.last_mut() {
            last.im = 0.0;
        }

        self.c2r
            .process_with_scratch(&mut self.spectrum_a, &mut self.a, &mut self.c2r_scratch)
            .expect("buffers are made by the plan");

        let offset = (v.len() - 1) / 2;
        let norm = factor / self.len as f64;
        Zip::from(out)
            .and(ArrayView1::from(&self.a[offset..offset + a.len()]))
            .for_each(|y, &c| *y += norm * c);
    }
}

fn load_padded(buffer: &mut [f64], values: ArrayView1<f64>) {
    let (head, tail) = buffer.split_at_mut(values.len());
    for (x, &value) in head.iter_mut().zip(values) {
        *x = value;
    }
    tail.fill(0.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::prelude::*;

    fn direct(a: ArrayView1<f64>, v: ArrayView1<f64>) -> Array1<f64> {
        let mut out = Array1::zeros(a.len());
        add_direct(a, v, 1.0, out.view_mut());
        out
    }

    #[test]
    fn same_length_odd() {
        // scipy.signal.convolve([1, 2, 3], [0, 1, 0.5], "same")
        let actual = convolve_same(array![1.0, 2.0, 3.0].view(), array![0.0, 1.0, 0.5].view());
        assert_eq!(actual, array![1.0, 2.5, 4.0]);
    }

    #[test]
    fn same_length_even() {
        // scipy.signal.convolve([1, 2, 3, 4], [1, 1, 1, 1], "same")
        let actual = convolve_same(
            array![1.0, 2.0, 3.0, 4.0].view(),
            array![1.0, 1.0, 1.0, 1.0].view(),
        );
        assert_eq!(actual, array![3.0, 6.0, 10.0, 9.0]);
    }

    #[test]
    fn delta_kernel_is_identity() {
        let a = array![0.5, 1.5, -2.0, 4.0, 3.0];
        let actual = convolve_same(a.view(), array![0.0, 0.0, 1.0, 0.0, 0.0].view());
        assert_eq!(actual, a);
    }

    #[test]
    fn empty() {
        let empty = Array1::<f64>::zeros(0);
        assert_eq!(convolve_same(empty.view(), empty.view()).len(), 0);
    }

    #[test]
    fn fft_matches_direct_sum() {
        let mut rng = StdRng::seed_from_u64(0);
        for (n, m) in [(64, 64), (100, 300), (517, 64), (1000, 1000)] {
            let a: Array1<f64> = (0..n).map(|_| rng.random::<f64>()).collect();
            let v: Array1<f64> = (0..m).map(|_| rng.random::<f64>() - 0.5).collect();
            let actual = convolve_same(a.view(), v.view());
            let desired = direct(a.view(), v.view());
            assert_eq!(actual.len(), n);
            assert_abs_diff_eq!(
                actual.as_slice().unwrap(),
                desired.as_slice().unwrap(),
                epsilon = 1e-10
            );
        }
    }

    #[test]
    fn fft_delta_kernel_is_identity() {
        let a = Array1::linspace(-3.0, 5.0, 128);
        let mut delta = Array1::zeros(129);
        delta[64] = 1.0;
        let actual = convolve_same(a.view(), delta.view());
        assert_abs_diff_eq!(
            actual.as_slice().unwrap(),
            a.as_slice().unwrap(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn fft_accumulates_with_factor() {
        let a = Array1::linspace(0.0, 1.0, 200);
        let v = Array1::from_elem(80, 0.25);
        let mut out = Array1::from_elem(200, 1.0);
        add_convolve_same(a.view(), v.view(), -2.0, out.view_mut());
        let desired = direct(a.view(), v.view()) * -2.0 + 1.0;
        assert_abs_diff_eq!(
            out.as_slice().unwrap(),
            desired.as_slice().unwrap(),
            epsilon = 1e-10
        );
    }
}
