pub mod cidr;
pub mod normalize;
pub mod raw;

use serde::{Deserialize, Serialize};

pub use cidr::Cidr;

/// IP protocol of an inbound rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    /// Provider wildcard (`-1`): all protocols.
    All,
}

impl Protocol {
    /// Parse the provider's protocol string. EC2 uses `-1` for "all".
    pub fn from_provider(s: &str) -> Option<Self> {
        match s {
            "tcp" => Some(Self::Tcp),
            "udp" => Some(Self::Udp),
            "icmp" | "icmpv6" => Some(Self::Icmp),
            "-1" | "all" => Some(Self::All),
            _ => None,
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
            Self::Icmp => write!(f, "icmp"),
            Self::All => write!(f, "all"),
        }
    }
}

/// Port coverage of an inbound rule.
///
/// ICMP and all-traffic rules carry no ports at all; that is `All`, a
/// sentinel distinct from any numeric port so port checks never misfire
/// on non-TCP rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortSpan {
    All,
    Range { from: u16, to: u16 },
}

impl PortSpan {
    /// Build a numeric span. Returns `None` when the bounds are inverted.
    pub fn range(from: u16, to: u16) -> Option<Self> {
        (from <= to).then_some(Self::Range { from, to })
    }

    pub fn single(port: u16) -> Self {
        Self::Range { from: port, to: port }
    }

    pub fn contains(&self, port: u16) -> bool {
        match self {
            Self::All => true,
            Self::Range { from, to } => (*from..=*to).contains(&port),
        }
    }
}

impl std::fmt::Display for PortSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Range { from, to } if from == to => write!(f, "{from}"),
            Self::Range { from, to } => write!(f, "{from}-{to}"),
        }
    }
}

impl Serialize for PortSpan {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PortSpan {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "all" {
            return Ok(Self::All);
        }
        let parse = |v: &str| v.parse::<u16>().map_err(serde::de::Error::custom);
        let span = match s.split_once('-') {
            Some((from, to)) => Self::range(parse(from)?, parse(to)?)
                .ok_or_else(|| serde::de::Error::custom("inverted port range"))?,
            None => Self::single(parse(&s)?),
        };
        Ok(span)
    }
}

/// One normalized inbound permission entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundRule {
    pub protocol: Protocol,
    pub ports: PortSpan,
    /// Deduplicated, first-seen order preserved.
    pub source_cidrs: Vec<Cidr>,
}

/// A security group and its normalized inbound rules.
///
/// Identifiers are immutable once fetched; rule order is the provider's
/// returned order, preserved for deterministic output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    pub vpc_id: String,
    pub inbound_rules: Vec<InboundRule>,
}
