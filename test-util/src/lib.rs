pub use burst_data::{
    CountArrays, Error, SIMULATED_FRED_BURST, SIMULATED_FRED_PARAMETERS, series_from_reader,
    simulated_fred_parameters,
};
pub use simulate::{simulate_burst, simulate_counts};

mod burst_data;
mod simulate;
