use crate::error::LikelihoodError;
use crate::types::ParameterMap;

mod joint;
pub use joint::JointLikelihood;

mod poisson;
pub use poisson::PoissonLikelihood;

mod predictive;
pub use predictive::PosteriorPredictive;

/// Log-likelihood of a parameter assignment, the surface a sampler needs
pub trait LikelihoodTrait: Sync {
    fn log_likelihood_of(&self, params: &ParameterMap) -> Result<f64, LikelihoodError>;

    /// Every parameter key the evaluation reads
    fn required_keys(&self) -> Vec<String>;
}
