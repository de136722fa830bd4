//! Seed type shared by every generator.

use serde::{Deserialize, Serialize};

/// Seed substituted for the empty string so generation is always available.
pub const FALLBACK_SEED: &str = "ebb-and-bloom";

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Golden-ratio multiplier used to spread derived seeds.
const DERIVE_MIX: u64 = 0x9e37_79b9_7f4a_7c15;

/// An immutable seed for a pseudo-random stream.
///
/// Text seeds are hashed with 64-bit FNV-1a; numeric seeds are used as-is.
/// Equal seeds always map to the same 64-bit value on every platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seed {
    Number(u64),
    Text(String),
}

impl Seed {
    /// Returns the 64-bit value fed to the generator.
    pub fn value(&self) -> u64 {
        match self {
            Seed::Number(n) => *n,
            Seed::Text(s) if s.is_empty() => fnv1a_64(FALLBACK_SEED.as_bytes()),
            Seed::Text(s) => fnv1a_64(s.as_bytes()),
        }
    }

    /// Derives an independent labelled child seed.
    ///
    /// Text seeds append `-{label}` (so `"world"` → `"world-accretion"`),
    /// numeric seeds mix the label hash into the value.
    pub fn derive(&self, label: &str) -> Seed {
        match self {
            Seed::Number(n) => {
                let mixed = n.wrapping_mul(DERIVE_MIX) ^ fnv1a_64(label.as_bytes());
                Seed::Number(mixed)
            }
            Seed::Text(s) => {
                let base = if s.is_empty() { FALLBACK_SEED } else { s.as_str() };
                Seed::Text(format!("{}-{}", base, label))
            }
        }
    }

    /// Derives the `index`-th child seed (`"{seed}-{index}"`).
    pub fn nth(&self, index: u64) -> Seed {
        self.derive(&index.to_string())
    }
}

impl Default for Seed {
    fn default() -> Self {
        Seed::Text(FALLBACK_SEED.to_string())
    }
}

impl From<&str> for Seed {
    fn from(s: &str) -> Self {
        Seed::Text(s.to_string())
    }
}

impl From<String> for Seed {
    fn from(s: String) -> Self {
        Seed::Text(s)
    }
}

impl From<&String> for Seed {
    fn from(s: &String) -> Self {
        Seed::Text(s.clone())
    }
}

impl From<u64> for Seed {
    fn from(n: u64) -> Self {
        Seed::Number(n)
    }
}

impl From<&Seed> for Seed {
    fn from(seed: &Seed) -> Self {
        seed.clone()
    }
}

impl std::fmt::Display for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Seed::Number(n) => write!(f, "{}", n),
            Seed::Text(s) => write!(f, "{}", s),
        }
    }
}

/// 64-bit FNV-1a hash.
pub fn fnv1a_64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ b as u64).wrapping_mul(FNV_PRIME)
    })
}
