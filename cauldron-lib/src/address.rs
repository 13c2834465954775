use std::{fmt, str::FromStr};

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::{LendingError, LendingResult};

/// Identifies accounts, tokens and markets. The all-zero address is null.
#[derive(
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    BorshSerialize,
    BorshDeserialize,
)]
pub struct Address([u8; 32]);

impl Address {
    pub const NULL: Address = Address([0; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    /// Builds an address from a short human label, zero padded.
    /// Labels longer than 32 bytes are truncated.
    pub fn from_label(label: &str) -> Self {
        let mut bytes = [0u8; 32];
        let len = label.len().min(32);
        bytes[..len].copy_from_slice(&label.as_bytes()[..len]);
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The label this address was built from, if it looks like one.
    pub fn label(&self) -> Option<&str> {
        let label_len = self.0.iter().position(|b| *b == 0).unwrap_or(32);
        let (label, rest) = self.0.split_at(label_len);
        match std::str::from_utf8(label) {
            Ok(label) if !label.is_empty() && rest.iter().all(|b| *b == 0) => Some(label),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    #[track_caller]
    pub fn require_non_null(&self) -> LendingResult<&Self> {
        if self.is_null() {
            return Err(LendingError::InvalidAddress.into());
        }
        Ok(self)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label() {
            Some(label) => write!(f, "Address({label})"),
            None => write!(f, "Address({})", hex::encode(&self.0[..8])),
        }
    }
}

impl FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Address(bytes))
    }
}

#[cfg(feature = "client")]
mod serde {
    use super::*;

    impl ::serde::Serialize for Address {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: ::serde::Serializer,
        {
            serializer.serialize_str(&self.to_string())
        }
    }

    /// Accepts a 32 byte hex string or a short label.
    impl<'a> ::serde::de::Deserialize<'a> for Address {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: ::serde::Deserializer<'a>,
        {
            let s: String = ::serde::de::Deserialize::deserialize(deserializer)?;
            if let Ok(address) = s.parse() {
                return Ok(address);
            }
            if s.len() > 32 {
                return Err(::serde::de::Error::custom(format!(
                    "invalid address {s:?}: neither hex nor a label of at most 32 bytes"
                )));
            }
            Ok(Address::from_label(&s))
        }
    }
}
