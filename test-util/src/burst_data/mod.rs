use lazy_static::lazy_static;
use std::collections::HashMap;

pub use csv_parser::series_from_reader;
pub use types::{CountArrays, Error};

mod csv_parser;
mod record;
mod types;

// Relative to the current file
const SIMULATED_FRED_CSV: &str = include_str!("../../../test-data/simulated_fred_burst.csv");

const CHANNEL_SUFFIXES: [&str; 4] = ["a", "b", "c", "d"];

/// Parameters of the single-FRED model the embedded burst was simulated from
///
/// Rate is evaluated at left bin edges, counts are Poisson draws.
pub const SIMULATED_FRED_PARAMETERS: [(&str, [f64; 4]); 5] = [
    ("background", [10.0, 15.0, 12.0, 6.0]),
    ("start_1", [0.5; 4]),
    ("scale_1", [120.0, 200.0, 150.0, 60.0]),
    ("tau_1", [1.0; 4]),
    ("xi_1", [1.0; 4]),
];

lazy_static! {
    /// 128 bins of 64 ms, four channels
    pub static ref SIMULATED_FRED_BURST: CountArrays =
        series_from_reader(SIMULATED_FRED_CSV.as_bytes()).unwrap();
}

/// Parameter assignment of [SIMULATED_FRED_PARAMETERS] for a zero-based channel index
pub fn simulated_fred_parameters(channel: usize) -> HashMap<String, f64> {
    SIMULATED_FRED_PARAMETERS
        .iter()
        .map(|(field, values)| {
            (
                format!("{field}_{}", CHANNEL_SUFFIXES[channel]),
                values[channel],
            )
        })
        .collect()
}
