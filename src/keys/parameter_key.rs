use crate::channel::Channel;
use crate::error::ParameterKeyError;
use crate::keys::field::{Field, FieldScope};

use std::fmt;
use std::str::FromStr;

/// Typed parameter key
///
/// String form is `<field>` for global lens fields, `<field>_<channel>` for the background and
/// `<field>_<pulse>_<channel>` for pulse and residual fields, e.g. `sg_lambda_2_a`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterKey {
    pub field: Field,
    pub pulse: Option<usize>,
    pub channel: Option<Channel>,
}

impl ParameterKey {
    pub fn global(field: Field) -> Self {
        debug_assert_eq!(field.scope(), FieldScope::Global);
        Self {
            field,
            pulse: None,
            channel: None,
        }
    }

    pub fn background(channel: Channel) -> Self {
        Self {
            field: Field::Background,
            pulse: None,
            channel: Some(channel),
        }
    }

    pub fn pulse(field: Field, pulse: usize, channel: Channel) -> Self {
        debug_assert_eq!(field.scope(), FieldScope::Pulse);
        Self {
            field,
            pulse: Some(pulse),
            channel: Some(channel),
        }
    }

    fn is_consistent(&self) -> bool {
        match self.field.scope() {
            FieldScope::Global => self.pulse.is_none() && self.channel.is_none(),
            FieldScope::Channel => self.pulse.is_none() && self.channel.is_some(),
            FieldScope::Pulse => self.pulse.is_some() && self.channel.is_some(),
        }
    }
}

impl fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.field)?;
        if let Some(pulse) = self.pulse {
            write!(f, "_{pulse}")?;
        }
        if let Some(channel) = self.channel {
            write!(f, "_{channel}")?;
        }
        Ok(())
    }
}

impl FromStr for ParameterKey {
    type Err = ParameterKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(field) = Field::from_name(s) {
            let key = Self {
                field,
                pulse: None,
                channel: None,
            };
            return if key.is_consistent() {
                Ok(key)
            } else {
                Err(ParameterKeyError::Malformed(s.into()))
            };
        }

        let (rest, suffix) = s
            .rsplit_once('_')
            .ok_or_else(|| ParameterKeyError::UnknownField(s.into()))?;
        let channel = Channel::from_suffix(suffix)
            .ok_or_else(|| ParameterKeyError::UnknownChannel(s.into()))?;

        let (field_name, pulse) = match rest.rsplit_once('_') {
            Some((field_name, index)) if index.bytes().all(|b| b.is_ascii_digit()) => {
                let pulse: usize = index
                    .parse()
                    .map_err(|_| ParameterKeyError::Malformed(s.into()))?;
                (field_name, Some(pulse))
            }
            _ => (rest, None),
        };
        let field = Field::from_name(field_name)
            .ok_or_else(|| ParameterKeyError::UnknownField(s.into()))?;

        let key = Self {
            field,
            pulse,
            channel: Some(channel),
        };
        if key.is_consistent() && pulse != Some(0) {
            Ok(key)
        } else {
            Err(ParameterKeyError::Malformed(s.into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(
            ParameterKey::global(Field::TimeDelay).to_string(),
            "time_delay"
        );
        assert_eq!(
            ParameterKey::background(Channel::C).to_string(),
            "background_c"
        );
        assert_eq!(
            ParameterKey::pulse(Field::SgLambda, 12, Channel::B).to_string(),
            "sg_lambda_12_b"
        );
    }

    #[test]
    fn parse_known_keys() {
        for s in [
            "time_delay",
            "magnification_ratio",
            "background_d",
            "start_1_a",
            "bes_s_3_b",
            "bes_Delta_10_c",
            "sg_phi_2_a",
            "res_begin_4_d",
        ] {
            let key: ParameterKey = s.parse().unwrap();
            assert_eq!(key.to_string(), s);
        }
    }

    #[test]
    fn parse_rejects_unknown() {
        assert_eq!(
            "banana".parse::<ParameterKey>(),
            Err(ParameterKeyError::UnknownField("banana".into()))
        );
        assert_eq!(
            "phi_1_a".parse::<ParameterKey>(),
            Err(ParameterKeyError::UnknownField("phi_1_a".into()))
        );
        assert_eq!(
            "start_1_e".parse::<ParameterKey>(),
            Err(ParameterKeyError::UnknownChannel("start_1_e".into()))
        );
        assert_eq!(
            "start_a".parse::<ParameterKey>(),
            Err(ParameterKeyError::Malformed("start_a".into()))
        );
        assert_eq!(
            "background_1_a".parse::<ParameterKey>(),
            Err(ParameterKeyError::Malformed("background_1_a".into()))
        );
        assert_eq!(
            "time_delay_a".parse::<ParameterKey>(),
            Err(ParameterKeyError::Malformed("time_delay_a".into()))
        );
        assert_eq!(
            "start_0_a".parse::<ParameterKey>(),
            Err(ParameterKeyError::Malformed("start_0_a".into()))
        );
    }
}
