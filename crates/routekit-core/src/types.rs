//! Core type definitions for routekit

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::errors::Error;

/// Length of an on-chain address in bytes
pub const ADDRESS_LEN: usize = 32;

fn parse_address(s: &str) -> Result<[u8; ADDRESS_LEN], Error> {
    let bytes = hex::decode(s).map_err(|e| Error::Serialization(format!("{}: {}", s, e)))?;
    bytes.try_into().map_err(|b: Vec<u8>| {
        Error::Serialization(format!(
            "expected {} address bytes, got {}",
            ADDRESS_LEN,
            b.len()
        ))
    })
}

/// Fungible token address (32 bytes, hex-encoded on the wire)
///
/// Assets are totally ordered by their raw bytes. Pools rely on that order to
/// keep `asset0 < asset1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Asset(pub [u8; ADDRESS_LEN]);

impl Asset {
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// First four bytes as hex, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for Asset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s).map(Self)
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Pool account address (32 bytes, hex-encoded on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolId(pub [u8; ADDRESS_LEN]);

impl PoolId {
    pub const fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl FromStr for PoolId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_address(s).map(Self)
    }
}

impl Serialize for PoolId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PoolId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Rational percentage: `numerator / denominator` of one whole.
///
/// `Percentage::new(10, 100)` is 10%. Values above one whole are allowed;
/// callers that narrow an amount reject them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPercentage")]
pub struct Percentage {
    numerator: u64,
    denominator: u64,
}

#[derive(Deserialize)]
struct RawPercentage {
    numerator: u64,
    denominator: u64,
}

impl TryFrom<RawPercentage> for Percentage {
    type Error = Error;

    fn try_from(raw: RawPercentage) -> Result<Self, Self::Error> {
        Percentage::new(raw.numerator, raw.denominator)
    }
}

impl Percentage {
    pub fn new(numerator: u64, denominator: u64) -> Result<Self, Error> {
        if denominator == 0 {
            return Err(Error::InvalidPercentage {
                numerator,
                denominator,
            });
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Basis points (1 bps = 0.01%)
    pub fn from_bps(bps: u64) -> Self {
        Self {
            numerator: bps,
            denominator: 10_000,
        }
    }

    pub const fn zero() -> Self {
        Self {
            numerator: 0,
            denominator: 1,
        }
    }

    pub fn numerator(&self) -> u64 {
        self.numerator
    }

    pub fn denominator(&self) -> u64 {
        self.denominator
    }

    pub fn is_zero(&self) -> bool {
        self.numerator == 0
    }

    /// True when the percentage is above 100%
    pub fn exceeds_whole(&self) -> bool {
        self.numerator > self.denominator
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Unix timestamp in seconds
pub type UnixTime = u64;

/// Constants
pub mod constants {
    /// Denominator shared by every fee and tax rate (1_000_000 = 100%)
    pub const FEE_RATE_DENOMINATOR: u64 = 1_000_000;

    /// Standard pool trade fee (0.3%)
    pub const DEFAULT_TRADE_FEE_RATE: u64 = 3_000;

    /// Hop bound used when a query does not set one
    pub const DEFAULT_MAX_HOPS: usize = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_hex_round_trip() {
        let asset = Asset::from_bytes([0xab; 32]);
        let s = asset.to_string();
        assert_eq!(s.len(), 64);
        assert_eq!(s.parse::<Asset>().unwrap(), asset);
        assert_eq!(asset.short(), "abababab");
    }

    #[test]
    fn test_asset_rejects_wrong_length() {
        assert!("abcd".parse::<Asset>().is_err());
        assert!("zz".repeat(32).parse::<Asset>().is_err());
    }

    #[test]
    fn test_asset_ordering_is_bytewise() {
        let mut low = [0u8; 32];
        let mut high = [0u8; 32];
        low[31] = 1;
        high[0] = 1;
        assert!(Asset(low) < Asset(high));
    }

    #[test]
    fn test_asset_serde_as_string() {
        let asset = Asset::from_bytes([1; 32]);
        let json = serde_json::to_string(&asset).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let parsed: Asset = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, asset);
    }

    #[test]
    fn test_percentage_rejects_zero_denominator() {
        assert!(Percentage::new(1, 0).is_err());
        let err = serde_json::from_str::<Percentage>(r#"{"numerator":1,"denominator":0}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_percentage_helpers() {
        let p = Percentage::from_bps(50);
        assert_eq!(p.numerator(), 50);
        assert_eq!(p.denominator(), 10_000);
        assert!(!p.exceeds_whole());
        assert!(Percentage::zero().is_zero());
        assert!(Percentage::new(3, 2).unwrap().exceeds_whole());
        assert_eq!(Percentage::new(10, 100).unwrap().to_string(), "10/100");
    }
}
