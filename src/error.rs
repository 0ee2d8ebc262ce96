/// Error returned when a model key string or explicit pulse lists do not describe a valid model
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ModelKeyError {
    #[error("residual '{residual}' at position {position} has no preceding pulse to attach to")]
    OrphanResidual { position: usize, residual: char },

    #[error("unknown character '{character}' at position {position} of the model key")]
    UnknownCharacter { position: usize, character: char },

    #[error("pulse {pulse} already owns a residual")]
    DuplicateResidual { pulse: usize },

    #[error("pulse {pulse} has more than one pulse type")]
    DuplicatePulse { pulse: usize },

    #[error("pulse indices must be 1..={expected} without gaps, found {found:?}")]
    NonContiguousPulses { expected: usize, found: Vec<usize> },

    #[error("residual is attached to pulse {pulse}, but the model has only {max_pulse} pulses")]
    ResidualWithoutPulse { pulse: usize, max_pulse: usize },
}

/// Error returned when a string cannot be mapped to a known parameter key
///
/// In normal operation it never happens: generated keys are always known. Seeing this error means
/// that a key was built by hand or the key naming has drifted.
#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum ParameterKeyError {
    #[error("unknown parameter field in key '{0}'")]
    UnknownField(String),

    #[error("unknown channel suffix in key '{0}'")]
    UnknownChannel(String),

    #[error("malformed parameter key '{0}'")]
    Malformed(String),

    #[error("channel index {0} is out of range 0..=3")]
    ChannelIndex(usize),
}

/// Error returned from [crate::PoissonLikelihood] evaluation
#[derive(Debug, thiserror::Error, PartialEq, Clone)]
pub enum LikelihoodError {
    #[error("parameter '{0}' is missing from the assignment")]
    MissingParameter(String),

    #[error("Poisson rate function returns a negative value {value} at bin {index}")]
    NegativeRate { index: usize, value: f64 },

    #[error("Poisson rate function returns a non-finite value at bin {index}")]
    NonFiniteRate { index: usize },

    #[error("time array length {times} differs from the counts array length {counts}")]
    LengthMismatch { times: usize, counts: usize },

    #[error("joint likelihood needs at least one channel")]
    NoChannels,

    #[error("posterior predictive needs at least one sample")]
    EmptyPosterior,
}

/// Error returned from [crate::PriorSet] operations
#[derive(Debug, thiserror::Error, PartialEq, Clone)]
pub enum PriorError {
    #[error(transparent)]
    Key(#[from] ParameterKeyError),

    #[error("no prior is defined for key '{0}'")]
    UnknownPrior(String),

    #[error("parameter '{0}' is missing from the assignment")]
    MissingParameter(String),

    #[error("invalid prior bounds for '{field}': [{lo}, {hi}]")]
    InvalidBounds { field: String, lo: f64, hi: f64 },

    #[error("no prior draw satisfied the ordering constraints after {attempts} attempts")]
    RejectionLimit { attempts: usize },
}

/// Error returned from [crate::McmcSampler]
#[derive(Debug, thiserror::Error, PartialEq, Clone)]
pub enum SamplerError {
    #[error(transparent)]
    Prior(#[from] PriorError),

    #[error("emcee sampler failed: {0}")]
    Emcee(String),

    #[error("sampler produced no finite posterior value")]
    NoFiniteSample,
}
