use light_curve_pulse::ndarray::{Array1, Array2};

// We cannot return `CountSeries`, because it would cause cyclic crate dependencies
/// Left bin edges, right bin edges, counts with a column per channel
pub type CountArrays = (Array1<f64>, Array1<f64>, Array2<f64>);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    CsvError(#[from] csv::Error),
}
