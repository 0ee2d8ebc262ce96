mod mcmc;
pub use mcmc::{McmcResult, McmcSampler, Posterior};
