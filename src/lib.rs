#![doc = include_str!("../README.md")]


mod channel;
pub use channel::Channel;

mod data;
pub use data::CountSeries;

mod error;
pub use error::{LikelihoodError, ModelKeyError, ParameterKeyError, PriorError, SamplerError};

mod keys;
pub use keys::{Field, FieldScope, ParameterKey, parameter_key_strings, parameter_keys};

mod likelihood;
pub use likelihood::{JointLikelihood, LikelihoodTrait, PoissonLikelihood, PosteriorPredictive};

mod model;
pub use model::{Component, ComponentIndices, LENS_LETTER, ModelDescriptor, PulseType, ResidualType};

pub mod prior;
pub use prior::{LnPrior1D, PriorBounds, PriorSet};

pub mod rate;

mod sampler;
pub use sampler::{McmcResult, McmcSampler, Posterior};

mod sorted_array;

mod types;
pub use types::ParameterMap;

pub use ndarray;
