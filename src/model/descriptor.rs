use crate::error::ModelKeyError;
use crate::model::component::{Component, PulseType, ResidualType};

use itertools::Itertools;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Letter flagging a gravitationally lensed model, may appear anywhere in the key string
pub const LENS_LETTER: char = 'L';

/// One-based pulse indices of every pulse and residual type
///
/// Pulse lists hold the indices of the pulses of that type; residual lists hold the indices of the
/// pulses owning a residual of that type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ComponentIndices {
    pub gaussian: Vec<usize>,
    pub fred: Vec<usize>,
    pub fredx: Vec<usize>,
    pub convolution: Vec<usize>,
    pub sine_gaussian: Vec<usize>,
    pub bessel: Vec<usize>,
}

impl ComponentIndices {
    pub fn get(&self, component: Component) -> &[usize] {
        match component {
            Component::Pulse(PulseType::Gaussian) => &self.gaussian,
            Component::Pulse(PulseType::Fred) => &self.fred,
            Component::Pulse(PulseType::FredX) => &self.fredx,
            Component::Pulse(PulseType::Convolution) => &self.convolution,
            Component::Residual(ResidualType::SineGaussian) => &self.sine_gaussian,
            Component::Residual(ResidualType::Bessel) => &self.bessel,
        }
    }

    fn get_mut(&mut self, component: Component) -> &mut Vec<usize> {
        match component {
            Component::Pulse(PulseType::Gaussian) => &mut self.gaussian,
            Component::Pulse(PulseType::Fred) => &mut self.fred,
            Component::Pulse(PulseType::FredX) => &mut self.fredx,
            Component::Pulse(PulseType::Convolution) => &mut self.convolution,
            Component::Residual(ResidualType::SineGaussian) => &mut self.sine_gaussian,
            Component::Residual(ResidualType::Bessel) => &mut self.bessel,
        }
    }

    /// Builder-style setter
    pub fn with(mut self, component: impl Into<Component>, indices: Vec<usize>) -> Self {
        *self.get_mut(component.into()) = indices;
        self
    }
}

/// Structured pulse-model description
///
/// The pulse type lists partition `1..=N` and each pulse owns at most one residual. Descriptors
/// are immutable once created, use [ModelDescriptor::decode] for key strings like `"FFsXL"` or
/// [ModelDescriptor::encode] for explicit index lists.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "ModelDescriptorSerde", try_from = "ModelDescriptorSerde")]
pub struct ModelDescriptor {
    lens: bool,
    name: Option<String>,
    indices: ComponentIndices,
}

impl ModelDescriptor {
    /// Decode a compact key string
    ///
    /// Upper-case letters are pulses numbered from one in the order of appearance: `G` Gaussian,
    /// `F` FRED, `X` FREDx, `C` convolution. Lower-case letters are residuals attached to the most
    /// recent pulse: `s` sine-Gaussian, `b` Bessel. `L` anywhere marks a lensed model.
    pub fn decode(key: &str) -> Result<Self, ModelKeyError> {
        let lens = key.contains(LENS_LETTER);
        let mut indices = ComponentIndices::default();
        let mut current_pulse: Option<usize> = None;
        let mut has_residual: Vec<bool> = vec![];

        for (position, c) in key.chars().enumerate() {
            if c == LENS_LETTER {
                continue;
            }
            if let Some(pulse_type) = PulseType::from_letter(c) {
                let pulse = current_pulse.map_or(1, |i| i + 1);
                indices.get_mut(pulse_type.into()).push(pulse);
                has_residual.push(false);
                current_pulse = Some(pulse);
            } else if let Some(residual_type) = ResidualType::from_letter(c) {
                let pulse = current_pulse.ok_or(ModelKeyError::OrphanResidual {
                    position,
                    residual: c,
                })?;
                if has_residual[pulse - 1] {
                    return Err(ModelKeyError::DuplicateResidual { pulse });
                }
                has_residual[pulse - 1] = true;
                indices.get_mut(residual_type.into()).push(pulse);
            } else {
                return Err(ModelKeyError::UnknownCharacter {
                    position,
                    character: c,
                });
            }
        }

        let model = Self {
            lens,
            name: None,
            indices,
        };
        log::debug!(
            "decoded model key {key:?}: {} pulses, residual chain {:?}, lens={lens}",
            model.max_pulse(),
            model.residual_chain()
        );
        Ok(model)
    }

    /// Decode a key string and attach a custom display name
    pub fn decode_with_name(key: &str, name: impl Into<String>) -> Result<Self, ModelKeyError> {
        Ok(Self::decode(key)?.with_name(name))
    }

    /// Assemble a descriptor from explicit index lists
    ///
    /// Lists are sorted, then validated: pulse indices must form `1..=N` with every pulse having a
    /// single type, residual owners must be existing pulses, each owning one residual at most.
    pub fn encode(lens: bool, mut indices: ComponentIndices) -> Result<Self, ModelKeyError> {
        for component in Component::ALL {
            indices.get_mut(component).sort_unstable();
        }

        let pulses: Vec<usize> = PulseType::ALL
            .iter()
            .flat_map(|&p| indices.get(p.into()).iter().copied())
            .sorted_unstable()
            .collect();
        if let Some((&pulse, _)) = pulses.iter().tuple_windows().find(|(a, b)| a == b) {
            return Err(ModelKeyError::DuplicatePulse { pulse });
        }
        if pulses.iter().enumerate().any(|(i, &pulse)| pulse != i + 1) {
            return Err(ModelKeyError::NonContiguousPulses {
                expected: pulses.len(),
                found: pulses,
            });
        }

        let max_pulse = pulses.len();
        let owners: Vec<usize> = ResidualType::ALL
            .iter()
            .flat_map(|&r| indices.get(r.into()).iter().copied())
            .sorted_unstable()
            .collect();
        if let Some(&pulse) = owners.iter().find(|&&i| i == 0 || i > max_pulse) {
            return Err(ModelKeyError::ResidualWithoutPulse { pulse, max_pulse });
        }
        if let Some((&pulse, _)) = owners.iter().tuple_windows().find(|(a, b)| a == b) {
            return Err(ModelKeyError::DuplicateResidual { pulse });
        }

        Ok(Self {
            lens,
            name: None,
            indices,
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn lens(&self) -> bool {
        self.lens
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Custom name if any, canonical key string otherwise
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.key_string())
    }

    pub fn component_indices(&self) -> &ComponentIndices {
        &self.indices
    }

    /// Indices of the pulses having this component
    #[inline]
    pub fn indices(&self, component: impl Into<Component>) -> &[usize] {
        self.indices.get(component.into())
    }

    /// Every (component, pulse index) pair in the canonical component order
    pub fn components(&self) -> impl Iterator<Item = (Component, usize)> + '_ {
        Component::ALL
            .into_iter()
            .flat_map(move |c| self.indices(c).iter().map(move |&i| (c, i)))
    }

    /// Largest pulse index, zero for a model without pulses
    pub fn max_pulse(&self) -> usize {
        PulseType::ALL
            .iter()
            .filter_map(|&p| self.indices(p).iter().max().copied())
            .max()
            .unwrap_or(0)
    }

    /// Sorted unique indices of the pulses owning a residual
    ///
    /// Residual ordering constraints chain consecutive entries of this list, not consecutive pulse
    /// indices.
    pub fn residual_chain(&self) -> Vec<usize> {
        ResidualType::ALL
            .iter()
            .flat_map(|&r| self.indices(r).iter().copied())
            .sorted_unstable()
            .dedup()
            .collect()
    }

    pub fn pulse_type(&self, pulse: usize) -> Option<PulseType> {
        PulseType::ALL
            .into_iter()
            .find(|&p| self.indices(p).contains(&pulse))
    }

    pub fn residual_type(&self, pulse: usize) -> Option<ResidualType> {
        ResidualType::ALL
            .into_iter()
            .find(|&r| self.indices(r).contains(&pulse))
    }

    /// Canonical key string, decoding it gives back the same descriptor
    pub fn key_string(&self) -> String {
        let mut key: String = (1..=self.max_pulse())
            .flat_map(|i| {
                let pulse = self.pulse_type(i).map(PulseType::letter);
                let residual = self.residual_type(i).map(ResidualType::letter);
                pulse.into_iter().chain(residual)
            })
            .collect();
        if self.lens {
            key.push(LENS_LETTER);
        }
        key
    }
}

impl fmt::Display for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl std::str::FromStr for ModelDescriptor {
    type Err = ModelKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl JsonSchema for ModelDescriptor {
    fn is_referenceable() -> bool {
        false
    }

    fn schema_name() -> String {
        ModelDescriptorSerde::schema_name()
    }

    fn json_schema(r#gen: &mut schemars::r#gen::SchemaGenerator) -> schemars::schema::Schema {
        ModelDescriptorSerde::json_schema(r#gen)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename = "ModelDescriptor")]
struct ModelDescriptorSerde {
    #[serde(default)]
    lens: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(flatten)]
    indices: ComponentIndices,
}

impl From<ModelDescriptor> for ModelDescriptorSerde {
    fn from(value: ModelDescriptor) -> Self {
        Self {
            lens: value.lens,
            name: value.name,
            indices: value.indices,
        }
    }
}

impl TryFrom<ModelDescriptorSerde> for ModelDescriptor {
    type Error = ModelKeyError;

    fn try_from(value: ModelDescriptorSerde) -> Result<Self, Self::Error> {
        let model = Self::encode(value.lens, value.indices)?;
        Ok(match value.name {
            Some(name) => model.with_name(name),
            None => model,
        })
    }
}
