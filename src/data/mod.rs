mod count_series;
pub use count_series::CountSeries;
