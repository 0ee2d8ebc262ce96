use crate::burst_data::record::CountRecord;
use crate::burst_data::{CountArrays, Error};

use itertools::{Itertools, process_results};
use light_curve_pulse::ndarray::Array2;
use std::io::Read;

/// Parse `bin_left,bin_right,counts_a,counts_b,counts_c,counts_d` CSV
pub fn series_from_reader<R>(reader: R) -> Result<CountArrays, Error>
where
    R: Read,
{
    let mut csv_reader = csv::ReaderBuilder::new().from_reader(reader);
    let iter = csv_reader
        .deserialize()
        .map(|record: Result<CountRecord, _>| -> Result<_, csv::Error> {
            let record = record?;
            Ok((record.bin_left, record.bin_right, record.counts()))
        });
    let (left, right, counts): (Vec<_>, Vec<_>, Vec<_>) =
        process_results(iter, |iter| iter.multiunzip())?;
    Ok((left.into(), right.into(), Array2::from(counts)))
}
