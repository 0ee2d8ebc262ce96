use lazy_static::lazy_static;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Where a field lives in the key namespace
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldScope {
    /// Shared by all channels and pulses: `time_delay`
    Global,
    /// One per channel: `background_a`
    Channel,
    /// One per pulse and channel: `start_1_a`
    Pulse,
}

/// Parameter field name, the leading part of every parameter key
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[non_exhaustive]
pub enum Field {
    TimeDelay,
    MagnificationRatio,
    Background,
    Start,
    Scale,
    Sigma,
    Tau,
    Xi,
    Gamma,
    Nu,
    SgA,
    ResBegin,
    SgLambda,
    SgOmega,
    SgPhi,
    BesA,
    BesOmega,
    BesS,
    BesDelta,
}

lazy_static! {
    static ref FIELD_BY_NAME: HashMap<&'static str, Field> =
        Field::ALL.iter().map(|&field| (field.name(), field)).collect();
}

impl Field {
    pub const ALL: [Field; 19] = [
        Field::TimeDelay,
        Field::MagnificationRatio,
        Field::Background,
        Field::Start,
        Field::Scale,
        Field::Sigma,
        Field::Tau,
        Field::Xi,
        Field::Gamma,
        Field::Nu,
        Field::SgA,
        Field::ResBegin,
        Field::SgLambda,
        Field::SgOmega,
        Field::SgPhi,
        Field::BesA,
        Field::BesOmega,
        Field::BesS,
        Field::BesDelta,
    ];

    /// Lens fields, shared by every pulse and channel
    pub const LENS: [Field; 2] = [Field::TimeDelay, Field::MagnificationRatio];

    pub fn name(self) -> &'static str {
        match self {
            Field::TimeDelay => "time_delay",
            Field::MagnificationRatio => "magnification_ratio",
            Field::Background => "background",
            Field::Start => "start",
            Field::Scale => "scale",
            Field::Sigma => "sigma",
            Field::Tau => "tau",
            Field::Xi => "xi",
            Field::Gamma => "gamma",
            Field::Nu => "nu",
            Field::SgA => "sg_A",
            Field::ResBegin => "res_begin",
            Field::SgLambda => "sg_lambda",
            Field::SgOmega => "sg_omega",
            Field::SgPhi => "sg_phi",
            Field::BesA => "bes_A",
            Field::BesOmega => "bes_Omega",
            Field::BesS => "bes_s",
            Field::BesDelta => "bes_Delta",
        }
    }

    /// Exact reverse lookup of [Field::name]
    pub fn from_name(name: &str) -> Option<Self> {
        FIELD_BY_NAME.get(name).copied()
    }

    pub fn scope(self) -> FieldScope {
        match self {
            Field::TimeDelay | Field::MagnificationRatio => FieldScope::Global,
            Field::Background => FieldScope::Channel,
            _ => FieldScope::Pulse,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
