use crate::channel::Channel;
use crate::error::PriorError;
use crate::keys::{Field, FieldScope, ParameterKey, parameter_keys};
use crate::model::ModelDescriptor;
use crate::prior::bounds::PriorBounds;
use crate::prior::ln_prior_1d::{LnPrior1D, LnPrior1DTrait};
use crate::types::ParameterMap;

use itertools::Itertools;
use rand::RngCore;

/// Leading part of every derived constraint key, no parameter field starts with it
pub const CONSTRAINT_PREFIX: &str = "constraint_";

/// Log a warning when a single draw needs more attempts than this
const WARN_ATTEMPTS: usize = 1000;

/// Whether a key names a derived ordering constraint rather than a model parameter
pub fn is_constraint_key(key: &str) -> bool {
    key.starts_with(CONSTRAINT_PREFIX)
}

#[derive(Clone, Debug, PartialEq)]
pub struct PriorEntry {
    pub key: ParameterKey,
    pub name: String,
    pub prior: LnPrior1D,
}

/// Parameters required to be non-decreasing with a bounded step
///
/// Consecutive members `a` and `b` give a derived constraint parameter `b - a` which must be in
/// `[0, max_separation]`.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderingChain {
    /// Positions in the [PriorSet] entries
    members: Vec<usize>,
    /// One per consecutive pair of members
    constraint_keys: Vec<String>,
    max_separation: f64,
}

impl OrderingChain {
    pub fn constraint_keys(&self) -> &[String] {
        &self.constraint_keys
    }

    pub fn max_separation(&self) -> f64 {
        self.max_separation
    }

    #[inline]
    fn allows(&self, difference: f64) -> bool {
        (0.0..=self.max_separation).contains(&difference)
    }

    fn is_satisfied_by(&self, values: &[f64]) -> bool {
        self.members
            .iter()
            .tuple_windows()
            .all(|(&a, &b)| self.allows(values[b] - values[a]))
    }

    /// Members are i.i.d. so sorting a joint draw gives a draw from the ordered distribution
    fn is_exchangeable(&self, entries: &[PriorEntry]) -> bool {
        self.members.iter().map(|&i| &entries[i].prior).all_equal()
    }

    fn sort(&self, values: &mut [f64]) {
        let sorted: Vec<f64> = self
            .members
            .iter()
            .map(|&i| values[i])
            .sorted_unstable_by(f64::total_cmp)
            .collect();
        for (&i, x) in self.members.iter().zip(sorted) {
            values[i] = x;
        }
    }
}

/// Prior distributions of every parameter of a model, plus ordering constraints
///
/// Ordering constraints break the degeneracy of pulse relabeling: pulse start times must not
/// decrease with the pulse index, and residual begin times must not decrease along the sorted
/// list of residual owners. Constraints are derived parameters, see
/// [PriorSet::constrained_parameters].
#[derive(Clone, Debug, PartialEq)]
pub struct PriorSet {
    entries: Vec<PriorEntry>,
    chains: Vec<OrderingChain>,
    max_attempts: usize,
}

impl PriorSet {
    /// Priors for a single channel
    pub fn build(
        model: &ModelDescriptor,
        channel: Channel,
        bounds: &PriorBounds,
    ) -> Result<Self, PriorError> {
        Self::build_multi(model, &[channel], bounds)
    }

    /// Priors for a joint fit of several channels
    ///
    /// Every channel gets its own parameters and ordering constraints. Lens parameters are shared
    /// by all channels and appear once.
    pub fn build_multi(
        model: &ModelDescriptor,
        channels: &[Channel],
        bounds: &PriorBounds,
    ) -> Result<Self, PriorError> {
        bounds.validate()?;

        let mut entries: Vec<PriorEntry> = vec![];
        for (i, &channel) in channels.iter().enumerate() {
            entries.extend(
                parameter_keys(model, channel)
                    .into_iter()
                    .filter(|key| i == 0 || key.field.scope() != FieldScope::Global)
                    .map(|key| PriorEntry {
                        key,
                        name: key.to_string(),
                        prior: bounds.prior(key.field),
                    }),
            );
        }

        let position = |key: ParameterKey| {
            entries
                .iter()
                .position(|entry| entry.key == key)
                .ok_or_else(|| PriorError::UnknownPrior(key.to_string()))
        };
        let mut chains = vec![];
        for &channel in channels {
            let starts = (1..=model.max_pulse())
                .map(|i| position(ParameterKey::pulse(Field::Start, i, channel)))
                .collect::<Result<Vec<_>, _>>()?;
            if starts.len() > 1 {
                chains.push(OrderingChain {
                    members: starts,
                    constraint_keys: (2..=model.max_pulse())
                        .map(|i| format!("{CONSTRAINT_PREFIX}{i}_{channel}"))
                        .collect(),
                    max_separation: bounds.pulse_window(),
                });
            }

            let owners = model.residual_chain();
            if owners.len() > 1 {
                chains.push(OrderingChain {
                    members: owners
                        .iter()
                        .map(|&i| position(ParameterKey::pulse(Field::ResBegin, i, channel)))
                        .collect::<Result<Vec<_>, _>>()?,
                    constraint_keys: owners[1..]
                        .iter()
                        .map(|i| format!("{CONSTRAINT_PREFIX}{i}_{channel}_res"))
                        .collect(),
                    max_separation: bounds.pulse_window(),
                });
            }
        }

        log::debug!(
            "built {} priors and {} ordering chains for model {} in channels {:?}",
            entries.len(),
            chains.len(),
            model.display_name(),
            channels
        );
        Ok(Self {
            entries,
            chains,
            max_attempts: Self::default_max_attempts(),
        })
    }

    #[inline]
    pub fn default_max_attempts() -> usize {
        100_000
    }

    /// Maximum number of rejected joint draws in [PriorSet::sample]
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        assert!(max_attempts > 0, "at least one attempt is required");
        self.max_attempts = max_attempts;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PriorEntry] {
        &self.entries
    }

    pub fn chains(&self) -> &[OrderingChain] {
        &self.chains
    }

    /// Parameter keys in the canonical order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Derived constraint keys
    pub fn constraint_keys(&self) -> impl Iterator<Item = &str> {
        self.chains
            .iter()
            .flat_map(|chain| chain.constraint_keys.iter().map(String::as_str))
    }

    pub fn get(&self, key: &str) -> Option<&LnPrior1D> {
        self.entries
            .iter()
            .find(|entry| entry.name == key)
            .map(|entry| &entry.prior)
    }

    /// Replace the distribution of an existing parameter
    pub fn overwrite(&mut self, key: &str, prior: LnPrior1D) -> Result<(), PriorError> {
        let key: ParameterKey = key.parse()?;
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.key == key)
            .ok_or_else(|| PriorError::UnknownPrior(key.to_string()))?;
        log::debug!("overwriting prior of {}: {:?}", entry.name, prior);
        entry.prior = prior;
        Ok(())
    }

    fn values(&self, params: &ParameterMap) -> Result<Vec<f64>, PriorError> {
        self.entries
            .iter()
            .map(|entry| {
                params
                    .get(&entry.name)
                    .copied()
                    .ok_or_else(|| PriorError::MissingParameter(entry.name.clone()))
            })
            .collect()
    }

    fn satisfies_chains(&self, values: &[f64]) -> bool {
        self.chains.iter().all(|c| c.is_satisfied_by(values))
    }

    /// Log-prior of values given in the [PriorSet::keys] order
    pub fn ln_prior_values(&self, values: &[f64]) -> f64 {
        assert_eq!(
            values.len(),
            self.entries.len(),
            "values must have the same length as priors"
        );
        if !self.satisfies_chains(values) {
            return f64::NEG_INFINITY;
        }
        self.entries
            .iter()
            .zip(values)
            .map(|(entry, &x)| entry.prior.ln_prior_1d(x))
            .sum()
    }

    /// Sum of parameter log-priors, negative infinity if any ordering constraint is violated
    pub fn ln_prior(&self, params: &ParameterMap) -> Result<f64, PriorError> {
        Ok(self.ln_prior_values(&self.values(params)?))
    }

    pub fn constraints_satisfied(&self, params: &ParameterMap) -> Result<bool, PriorError> {
        let values = self.values(params)?;
        Ok(self.satisfies_chains(&values))
    }

    /// Draw values in the [PriorSet::keys] order
    pub fn sample_values(&self, rng: &mut dyn RngCore) -> Result<Vec<f64>, PriorError> {
        let exchangeable: Vec<bool> = self
            .chains
            .iter()
            .map(|chain| chain.is_exchangeable(&self.entries))
            .collect();
        for attempt in 1..=self.max_attempts {
            let mut values: Vec<f64> = self
                .entries
                .iter()
                .map(|entry| entry.prior.sample(rng))
                .collect();
            for (chain, &exchangeable) in self.chains.iter().zip(&exchangeable) {
                if exchangeable {
                    chain.sort(&mut values);
                }
            }
            if self.satisfies_chains(&values) {
                if attempt > WARN_ATTEMPTS {
                    log::warn!(
                        "prior draw satisfied ordering constraints after {attempt} attempts"
                    );
                }
                return Ok(values);
            }
        }
        Err(PriorError::RejectionLimit {
            attempts: self.max_attempts,
        })
    }

    /// Draw a parameter assignment satisfying the ordering constraints
    pub fn sample(&self, rng: &mut dyn RngCore) -> Result<ParameterMap, PriorError> {
        let values = self.sample_values(rng)?;
        Ok(self.keys().map(String::from).zip(values).collect())
    }

    pub fn sample_n(
        &self,
        rng: &mut dyn RngCore,
        n: usize,
    ) -> Result<Vec<ParameterMap>, PriorError> {
        (0..n).map(|_| self.sample(rng)).collect()
    }

    /// Assignment extended with derived constraint parameters
    ///
    /// Adds `constraint_<i>_<channel>` equal to `start_<i>` minus `start_<i-1>` and
    /// `constraint_<j>_<channel>_res` equal to `res_begin_<j>` minus `res_begin` of the previous
    /// residual owner.
    pub fn constrained_parameters(
        &self,
        params: &ParameterMap,
    ) -> Result<ParameterMap, PriorError> {
        let values = self.values(params)?;
        let mut constrained = params.clone();
        for chain in &self.chains {
            for ((&a, &b), key) in chain
                .members
                .iter()
                .tuple_windows()
                .zip(&chain.constraint_keys)
            {
                constrained.insert(key.clone(), values[b] - values[a]);
            }
        }
        Ok(constrained)
    }

    /// Assignment without derived constraint parameters
    pub fn strip_constraints(params: &ParameterMap) -> ParameterMap {
        params
            .iter()
            .filter(|(key, _)| !is_constraint_key(key))
            .map(|(key, &value)| (key.clone(), value))
            .collect()
    }
}
