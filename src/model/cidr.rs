use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A parsed IPv4 or IPv6 CIDR block.
///
/// Stored as the base address plus prefix length; the original provider
/// string is kept verbatim for display so `0.0.0.0/0` round-trips exactly
/// as the provider returned it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cidr {
    addr: IpAddr,
    prefix_len: u8,
    raw: String,
}

/// Full-range IPv4 sentinel.
pub const OPEN_V4: &str = "0.0.0.0/0";
/// Full-range IPv6 sentinel.
pub const OPEN_V6: &str = "::/0";

impl Cidr {
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Whether this block denotes "open to the internet".
    ///
    /// The literal full-range sentinels always match. With
    /// `match_zero_prefix` any block with prefix length 0 counts too
    /// (e.g. `1.2.3.4/0`, which providers treat as the full range).
    pub fn is_unrestricted(&self, match_zero_prefix: bool) -> bool {
        if self.raw == OPEN_V4 || self.raw == OPEN_V6 {
            return true;
        }
        match_zero_prefix && self.prefix_len == 0
    }
}

impl FromStr for Cidr {
    type Err = CidrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_part, len_part) = s
            .split_once('/')
            .ok_or_else(|| CidrParseError::missing_prefix(s))?;
        let addr: IpAddr = addr_part
            .parse()
            .map_err(|_| CidrParseError::bad_address(s))?;
        let prefix_len: u8 = len_part
            .parse()
            .map_err(|_| CidrParseError::bad_prefix(s))?;
        let max = match addr {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        if prefix_len > max {
            return Err(CidrParseError::bad_prefix(s));
        }
        Ok(Self {
            addr,
            prefix_len,
            raw: s.to_string(),
        })
    }
}

impl std::fmt::Display for Cidr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl TryFrom<String> for Cidr {
    type Error = CidrParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Cidr> for String {
    fn from(c: Cidr) -> String {
        c.raw
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid CIDR '{input}': {kind}")]
pub struct CidrParseError {
    input: String,
    kind: &'static str,
}

impl CidrParseError {
    fn missing_prefix(input: &str) -> Self {
        Self {
            input: input.into(),
            kind: "missing '/prefix' suffix",
        }
    }

    fn bad_address(input: &str) -> Self {
        Self {
            input: input.into(),
            kind: "address is not valid IPv4/IPv6",
        }
    }

    fn bad_prefix(input: &str) -> Self {
        Self {
            input: input.into(),
            kind: "prefix length out of range",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ipv4_sentinel() {
        let c: Cidr = OPEN_V4.parse().unwrap();
        assert_eq!(c.prefix_len(), 0);
        assert!(c.is_unrestricted(false));
    }

    #[test]
    fn parses_ipv6_sentinel() {
        let c: Cidr = OPEN_V6.parse().unwrap();
        assert!(c.is_unrestricted(false));
    }

    #[test]
    fn office_range_is_restricted() {
        let c: Cidr = "203.0.113.0/24".parse().unwrap();
        assert!(!c.is_unrestricted(false));
        assert!(!c.is_unrestricted(true));
    }

    #[test]
    fn zero_prefix_matches_only_with_extension() {
        let c: Cidr = "10.0.0.0/0".parse().unwrap();
        assert!(!c.is_unrestricted(false));
        assert!(c.is_unrestricted(true));
    }

    #[test]
    fn rejects_garbage() {
        assert!("0.0.0.0".parse::<Cidr>().is_err());
        assert!("not-a-cidr/8".parse::<Cidr>().is_err());
        assert!("10.0.0.0/33".parse::<Cidr>().is_err());
        assert!("::/129".parse::<Cidr>().is_err());
    }

    #[test]
    fn display_preserves_provider_string() {
        let c: Cidr = "198.51.100.0/24".parse().unwrap();
        assert_eq!(c.to_string(), "198.51.100.0/24");
    }
}
