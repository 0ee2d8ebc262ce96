mod convolution;
pub use convolution::{FFT_MIN_LEN, add_convolve_same, convolve_same};

mod functions;
pub use functions::*;
