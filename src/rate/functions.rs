//! Pulse and residual rate functions
//!
//! Scalar functions take a single time and the shape parameters; array functions map them over a
//! time array. All of them are safe at the domain boundaries: denominators get a tiny positive
//! addend, exponent arguments are clamped to [MAX_EXP] and FRED-family pulses return a positive
//! floor instead of zero before their start time.

use crate::rate::convolution::add_convolve_same;

use lazy_static::lazy_static;
use ndarray::{Array1, ArrayView1, ArrayViewMut1};
use std::cell::RefCell;
use thread_local::ThreadLocal;

/// Smallest positive normal double, used as a floor and as a denominator guard
pub const MIN_FLOAT: f64 = f64::MIN_POSITIVE;

/// Exponent arguments are clamped to this value, slightly below the logarithm of the largest
/// finite double
pub const MAX_EXP: f64 = 709.78;

#[inline]
fn clamped_exp(x: f64) -> f64 {
    f64::exp(x.min(MAX_EXP))
}

/// Gaussian pulse
///
/// $$
/// S(t) = A \exp\left[-\frac{(t - \Delta)^2}{2\sigma^2}\right]
/// $$
#[inline]
pub fn gaussian(t: f64, start: f64, scale: f64, sigma: f64) -> f64 {
    scale * f64::exp(-(t - start).powi(2) / (2.0 * sigma.powi(2) + MIN_FLOAT))
}

/// Amplitude-normalised fast-rise exponential-decay pulse, its peak value is `scale`
///
/// $$
/// S(t) = A \exp\left[-\xi\left(\frac{t - \Delta}{\tau} + \frac{\tau}{t - \Delta}\right) + 2\xi\right]
/// $$
#[inline]
pub fn fred(t: f64, start: f64, scale: f64, tau: f64, xi: f64) -> f64 {
    let dt = t - start;
    if dt <= 0.0 {
        return MIN_FLOAT;
    }
    let exponent = -xi * (tau / (dt + MIN_FLOAT) + dt / (tau + MIN_FLOAT) - 2.0);
    scale * clamped_exp(exponent)
}

/// Fast-rise exponential-decay pulse without amplitude normalisation
#[inline]
pub fn fred_unnormalized(t: f64, start: f64, scale: f64, tau: f64, xi: f64) -> f64 {
    let dt = t - start;
    if dt <= 0.0 {
        return MIN_FLOAT;
    }
    scale * clamped_exp(-xi * (tau / (dt + MIN_FLOAT) + dt / (tau + MIN_FLOAT)))
}

/// Exponent shift normalising the FREDx peak
///
/// It is the minimum over $t$ of $(\xi\tau/(t-\Delta))^\gamma + (\xi(t-\Delta)/\tau)^\nu$, so
/// adding it to the exponent puts the pulse peak exactly at `scale`.
#[inline]
pub fn fredx_norm(xi: f64, gamma: f64, nu: f64) -> f64 {
    let sum = gamma + nu;
    let ratio = gamma / nu;
    xi.powf(2.0 * gamma * nu / sum) * (ratio.powf(nu / sum) + ratio.powf(-gamma / sum))
}

#[inline]
fn fredx_exponent(dt: f64, tau: f64, xi: f64, gamma: f64, nu: f64) -> f64 {
    let rise = xi * (tau / dt);
    let decay = xi * (dt / tau);
    -rise.powf(gamma) - decay.powf(nu)
}

/// Amplitude-normalised FRED pulse with independent rise and decay exponents
///
/// $$
/// S(t) = A \exp\left[-\left(\frac{\xi\tau}{t - \Delta}\right)^\gamma
///     - \left(\frac{\xi(t - \Delta)}{\tau}\right)^\nu + N(\xi, \gamma, \nu)\right]
/// $$
#[inline]
pub fn fredx(t: f64, start: f64, scale: f64, tau: f64, xi: f64, gamma: f64, nu: f64) -> f64 {
    let dt = t - start;
    if dt <= 0.0 {
        return MIN_FLOAT * scale;
    }
    let exponent = fredx_exponent(dt, tau, xi, gamma, nu) + fredx_norm(xi, gamma, nu);
    scale * clamped_exp(exponent)
}

/// FREDx pulse without amplitude normalisation
#[inline]
pub fn fredx_unnormalized(
    t: f64,
    start: f64,
    scale: f64,
    tau: f64,
    xi: f64,
    gamma: f64,
    nu: f64,
) -> f64 {
    let dt = t - start;
    if dt <= 0.0 {
        return MIN_FLOAT * scale;
    }
    scale * clamped_exp(fredx_exponent(dt, tau, xi, gamma, nu))
}

/// Sine-Gaussian residual, not rate-normalised and may be negative
///
/// $$
/// r(t) = A \exp\left[-\left(\frac{t - \Delta}{\lambda}\right)^2\right] \cos(\omega t + \varphi)
/// $$
#[inline]
pub fn sine_gaussian(
    t: f64,
    res_begin: f64,
    sg_a: f64,
    sg_lambda: f64,
    sg_omega: f64,
    sg_phi: f64,
) -> f64 {
    sg_a * f64::exp(-((t - res_begin) / sg_lambda).powi(2)) * f64::cos(sg_omega * t + sg_phi)
}

/// Bessel-J0 ringing residual
///
/// Equals `bes_a` inside the window `res_begin ± bes_delta / 2`, rings with frequency
/// `bes_omega` before it and `bes_s * bes_omega` after it.
#[inline]
pub fn modified_bessel(
    t: f64,
    bes_a: f64,
    bes_omega: f64,
    bes_s: f64,
    res_begin: f64,
    bes_delta: f64,
) -> f64 {
    let half_window = 0.5 * bes_delta;
    let b = if t > res_begin + half_window {
        libm::j0(bes_s * bes_omega * (t - res_begin - half_window))
    } else if t < res_begin - half_window {
        libm::j0(bes_omega * (res_begin - t - half_window))
    } else {
        1.0
    };
    bes_a * b
}

/// One-sided exponential decay used as the convolution kernel
#[inline]
pub fn exp_decay(t: f64, tau: f64, start: f64) -> f64 {
    let dt = t - start;
    if dt <= 0.0 {
        MIN_FLOAT
    } else {
        f64::exp(-dt / (tau + MIN_FLOAT))
    }
}

pub fn gaussian_pulse(times: ArrayView1<f64>, start: f64, scale: f64, sigma: f64) -> Array1<f64> {
    times.mapv(|t| gaussian(t, start, scale, sigma))
}

pub fn fred_pulse(
    times: ArrayView1<f64>,
    start: f64,
    scale: f64,
    tau: f64,
    xi: f64,
) -> Array1<f64> {
    times.mapv(|t| fred(t, start, scale, tau, xi))
}

pub fn fred_pulse_unnormalized(
    times: ArrayView1<f64>,
    start: f64,
    scale: f64,
    tau: f64,
    xi: f64,
) -> Array1<f64> {
    times.mapv(|t| fred_unnormalized(t, start, scale, tau, xi))
}

pub fn fredx_pulse(
    times: ArrayView1<f64>,
    start: f64,
    scale: f64,
    tau: f64,
    xi: f64,
    gamma: f64,
    nu: f64,
) -> Array1<f64> {
    times.mapv(|t| fredx(t, start, scale, tau, xi, gamma, nu))
}

pub fn fredx_pulse_unnormalized(
    times: ArrayView1<f64>,
    start: f64,
    scale: f64,
    tau: f64,
    xi: f64,
    gamma: f64,
    nu: f64,
) -> Array1<f64> {
    times.mapv(|t| fredx_unnormalized(t, start, scale, tau, xi, gamma, nu))
}

pub fn sine_gaussian_residual(
    times: ArrayView1<f64>,
    res_begin: f64,
    sg_a: f64,
    sg_lambda: f64,
    sg_omega: f64,
    sg_phi: f64,
) -> Array1<f64> {
    times.mapv(|t| sine_gaussian(t, res_begin, sg_a, sg_lambda, sg_omega, sg_phi))
}

pub fn modified_bessel_residual(
    times: ArrayView1<f64>,
    bes_a: f64,
    bes_omega: f64,
    bes_s: f64,
    res_begin: f64,
    bes_delta: f64,
) -> Array1<f64> {
    times.mapv(|t| modified_bessel(t, bes_a, bes_omega, bes_s, res_begin, bes_delta))
}

lazy_static! {
    // Gaussian kernel and decay samples of the convolution pulse
    static ref CONVOLUTION_INPUTS: ThreadLocal<RefCell<(Vec<f64>, Vec<f64>)>> = ThreadLocal::new();
}

/// Gaussian convolved with an exponential decay
///
/// A zero-centred unit Gaussian of width `sigma` (centred on the mean time, so the "same"-mode
/// convolution keeps it in place) is convolved with the decay kernel starting at `start`. The
/// output has the length of `times`.
pub fn convolution_gaussian(
    times: ArrayView1<f64>,
    start: f64,
    scale: f64,
    sigma: f64,
    tau: f64,
) -> Array1<f64> {
    let mut conv = Array1::zeros(times.len());
    add_convolution_gaussian(times, start, scale, sigma, tau, 1.0, conv.view_mut());
    conv
}

/// Add `factor` times [convolution_gaussian] to `out` reusing per-thread buffers
pub fn add_convolution_gaussian(
    times: ArrayView1<f64>,
    start: f64,
    scale: f64,
    sigma: f64,
    tau: f64,
    factor: f64,
    out: ArrayViewMut1<f64>,
) {
    let center = times.mean().unwrap_or(0.0);
    let mut inputs = CONVOLUTION_INPUTS.get_or(Default::default).borrow_mut();
    let (kernel, decay) = &mut *inputs;
    kernel.clear();
    kernel.extend(times.iter().map(|&t| gaussian(t, center, 1.0, sigma)));
    decay.clear();
    decay.extend(times.iter().map(|&t| exp_decay(t, tau, start)));
    add_convolve_same(
        ArrayView1::from(&kernel[..]),
        ArrayView1::from(&decay[..]),
        factor * scale,
        out,
    );
}
