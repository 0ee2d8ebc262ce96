mod field;
pub use field::{Field, FieldScope};

mod generator;
pub use generator::{parameter_key_strings, parameter_keys};

mod parameter_key;
pub use parameter_key::ParameterKey;
