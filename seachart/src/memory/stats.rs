//! Tier-1 memory accounting.

use std::fmt;
use std::str::FromStr;

/// Encoding payloads are held in when handed to consumers.
///
/// The cache stores raw bytes, but some hosts keep tiles in a text transport
/// encoding whose size overhead has to be included in the memory estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadEncoding {
    #[default]
    Raw,
    /// Standard padded base64 (4 output bytes per 3 input bytes).
    Base64,
}

impl PayloadEncoding {
    /// Size of a payload of `len` raw bytes under this encoding.
    pub fn encoded_len(&self, len: usize) -> u64 {
        let len = len as u64;
        match self {
            Self::Raw => len,
            Self::Base64 => len.div_ceil(3) * 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Base64 => "base64",
        }
    }
}

impl fmt::Display for PayloadEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayloadEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "base64" => Ok(Self::Base64),
            other => Err(format!("unknown payload encoding '{}' (expected raw or base64)", other)),
        }
    }
}

/// Snapshot of the Tier-1 table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryCacheStats {
    pub chart_count: usize,
    pub tile_count: usize,
    /// Sum of raw payload sizes.
    pub payload_bytes: u64,
    /// Payload sizes under the configured [`PayloadEncoding`].
    pub estimated_memory_bytes: u64,
}

impl MemoryCacheStats {
    pub fn estimated_memory_mb(&self) -> f64 {
        self.estimated_memory_bytes as f64 / (1024.0 * 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_len() {
        assert_eq!(PayloadEncoding::Raw.encoded_len(10), 10);
        assert_eq!(PayloadEncoding::Base64.encoded_len(0), 0);
        assert_eq!(PayloadEncoding::Base64.encoded_len(1), 4);
        assert_eq!(PayloadEncoding::Base64.encoded_len(3), 4);
        assert_eq!(PayloadEncoding::Base64.encoded_len(4), 8);
        assert_eq!(PayloadEncoding::Base64.encoded_len(300), 400);
    }

    #[test]
    fn test_parse() {
        assert_eq!("raw".parse::<PayloadEncoding>(), Ok(PayloadEncoding::Raw));
        assert_eq!(" Base64 ".parse::<PayloadEncoding>(), Ok(PayloadEncoding::Base64));
        assert!("gzip".parse::<PayloadEncoding>().is_err());
    }

    #[test]
    fn test_estimated_memory_mb() {
        let stats = MemoryCacheStats {
            estimated_memory_bytes: 3 * 1024 * 1024,
            ..Default::default()
        };
        assert_eq!(stats.estimated_memory_mb(), 3.0);
    }
}
