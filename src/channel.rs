use crate::error::ParameterKeyError;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Detector energy band
///
/// Counts in each of the four bands are recorded independently. Every channel-specific parameter
/// key ends with the channel letter suffix, so keys of different channels never collide.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub enum Channel {
    A,
    B,
    C,
    D,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::A, Channel::B, Channel::C, Channel::D];

    /// Channel from its zero-based index
    pub fn from_index(index: usize) -> Result<Self, ParameterKeyError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or(ParameterKeyError::ChannelIndex(index))
    }

    /// Channel from its single-letter key suffix
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "a" => Some(Channel::A),
            "b" => Some(Channel::B),
            "c" => Some(Channel::C),
            "d" => Some(Channel::D),
            _ => None,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn suffix(self) -> &'static str {
        match self {
            Channel::A => "a",
            Channel::B => "b",
            Channel::C => "c",
            Channel::D => "d",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl TryFrom<usize> for Channel {
    type Error = ParameterKeyError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::from_index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_suffix_agree() {
        for (i, channel) in Channel::ALL.iter().enumerate() {
            assert_eq!(channel.index(), i);
            assert_eq!(Channel::from_index(i).unwrap(), *channel);
            assert_eq!(Channel::from_suffix(channel.suffix()), Some(*channel));
        }
    }

    #[test]
    fn out_of_range_index() {
        assert_eq!(
            Channel::from_index(4),
            Err(ParameterKeyError::ChannelIndex(4))
        );
        assert_eq!(Channel::from_suffix("e"), None);
    }
}
