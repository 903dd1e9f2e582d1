//! Normalization of raw provider records into the audit model.
//!
//! Malformed input is recoverable at rule granularity: a permission entry
//! with an unknown protocol or inverted port range is skipped and logged,
//! and an unparseable CIDR drops only that CIDR. Auditing stays robust
//! against partial garbage in the inventory.

use crate::error::{AuditError, Result};
use crate::model::{Cidr, InboundRule, PortSpan, Protocol, SecurityGroup};
use crate::model::raw::{RawPermission, RawSecurityGroup};

/// Normalize one security group. Never fails; bad entries are dropped
/// with a warning.
pub fn normalize_group(raw: &RawSecurityGroup) -> SecurityGroup {
    let mut inbound_rules = Vec::with_capacity(raw.ip_permissions.len());
    for perm in &raw.ip_permissions {
        match normalize_permission(perm, &raw.group_id) {
            Ok(rule) => inbound_rules.push(rule),
            Err(e) => {
                tracing::warn!(group = %raw.group_id, error = %e, "skipping malformed rule");
            }
        }
    }
    SecurityGroup {
        id: raw.group_id.clone(),
        name: raw.group_name.clone(),
        vpc_id: raw.vpc_id.clone(),
        inbound_rules,
    }
}

/// Normalize one permission entry.
///
/// Missing ports (ICMP, all-traffic) become [`PortSpan::All`]; so do the
/// provider's `-1` port markers on non-TCP/UDP protocols.
pub fn normalize_permission(perm: &RawPermission, group: &str) -> Result<InboundRule> {
    let protocol = Protocol::from_provider(&perm.ip_protocol).ok_or_else(|| {
        AuditError::MalformedRule {
            group: group.to_string(),
            message: format!("unknown protocol '{}'", perm.ip_protocol),
        }
    })?;

    let ports = normalize_ports(protocol, perm.from_port, perm.to_port, group)?;

    let mut source_cidrs: Vec<Cidr> = Vec::new();
    for s in perm.cidr_strings() {
        match s.parse::<Cidr>() {
            Ok(cidr) => {
                if !source_cidrs.contains(&cidr) {
                    source_cidrs.push(cidr);
                }
            }
            Err(e) => {
                tracing::warn!(group = %group, error = %e, "skipping unparseable CIDR");
            }
        }
    }

    Ok(InboundRule {
        protocol,
        ports,
        source_cidrs,
    })
}

fn normalize_ports(
    protocol: Protocol,
    from: Option<i64>,
    to: Option<i64>,
    group: &str,
) -> Result<PortSpan> {
    // ICMP entries carry type/code in the port fields and all-traffic
    // entries use -1; neither denotes TCP/UDP ports.
    if matches!(protocol, Protocol::Icmp | Protocol::All) {
        return Ok(PortSpan::All);
    }
    match (from, to) {
        (None, None) => Ok(PortSpan::All),
        (Some(f), Some(t)) => {
            let (f, t) = (to_port(f, group)?, to_port(t, group)?);
            PortSpan::range(f, t).ok_or_else(|| AuditError::MalformedRule {
                group: group.to_string(),
                message: format!("inverted port range {f}-{t}"),
            })
        }
        _ => Err(AuditError::MalformedRule {
            group: group.to_string(),
            message: "only one of FromPort/ToPort present".into(),
        }),
    }
}

fn to_port(v: i64, group: &str) -> Result<u16> {
    u16::try_from(v).map_err(|_| AuditError::MalformedRule {
        group: group.to_string(),
        message: format!("port {v} out of range"),
    })
}
