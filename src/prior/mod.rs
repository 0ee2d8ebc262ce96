mod bounds;
pub use bounds::PriorBounds;

mod ln_prior_1d;
pub use ln_prior_1d::{LnPrior1D, LnPrior1DTrait, LogUniformLnPrior1D, UniformLnPrior1D};

mod prior_set;
pub use prior_set::{
    CONSTRAINT_PREFIX, OrderingChain, PriorEntry, PriorSet, is_constraint_key,
};
