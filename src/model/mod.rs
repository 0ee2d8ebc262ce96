mod component;
pub use component::{Component, PulseType, ResidualType};

mod descriptor;
pub use descriptor::{ComponentIndices, LENS_LETTER, ModelDescriptor};
