use ndarray::{CowArray, Ix1};
use std::collections::HashMap;

pub type CowArray1<'a, T> = CowArray<'a, T, Ix1>;

/// Parameter assignment, a value for every parameter key
pub type ParameterMap = HashMap<String, f64>;
