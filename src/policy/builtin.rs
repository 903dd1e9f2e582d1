//! Built-in exposure checks, evaluated in registration order.

use crate::policy::finding::{CheckMetadata, Finding, Severity};
use crate::policy::{ExposureCheck, PolicySet, RuleContext};

pub fn all_checks() -> Vec<Box<dyn ExposureCheck>> {
    vec![Box::new(RiskyPortCheck), Box::new(OpenExposureCheck)]
}

/// EXPOSE-001: a risky port is reachable from an unrestricted source.
///
/// Intersects the rule's whole port span with the risky set, so a rule
/// opening 20-25 is still flagged for port 22. Emits one Fail per rule
/// per CIDR; the reason enumerates every matched risky port.
pub struct RiskyPortCheck;

impl ExposureCheck for RiskyPortCheck {
    fn metadata(&self) -> CheckMetadata {
        CheckMetadata {
            id: "EXPOSE-001".into(),
            name: "Risky port open to internet".into(),
            description: "Remote-admin or database port reachable from an unrestricted CIDR"
                .into(),
            severity: Severity::Fail,
        }
    }

    fn check(&self, ctx: &RuleContext<'_>, policies: &PolicySet) -> Option<Finding> {
        if !ctx.cidr.is_unrestricted(policies.match_zero_prefix) {
            return None;
        }
        let matched: Vec<u16> = policies
            .risky_ports
            .iter()
            .copied()
            .filter(|p| ctx.rule.ports.contains(*p))
            .collect();
        if matched.is_empty() {
            return None;
        }
        let ports = matched
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Some(Finding {
            group_id: ctx.group_id.to_string(),
            group_name: ctx.group_name.to_string(),
            port: ctx.rule.ports,
            cidr: ctx.cidr.clone(),
            severity: Severity::Fail,
            reason: format!(
                "risky port(s) {ports} open to the internet via {}",
                ctx.cidr
            ),
        })
    }
}

/// EXPOSE-002: any port open to an unrestricted source.
///
/// Catch-all behind the risky-port check; only fires when no risky port
/// matched, so each (rule, CIDR) pair yields at most one finding.
pub struct OpenExposureCheck;

impl ExposureCheck for OpenExposureCheck {
    fn metadata(&self) -> CheckMetadata {
        CheckMetadata {
            id: "EXPOSE-002".into(),
            name: "Open to internet".into(),
            description: "Inbound rule reachable from an unrestricted CIDR".into(),
            severity: Severity::Warn,
        }
    }

    fn check(&self, ctx: &RuleContext<'_>, policies: &PolicySet) -> Option<Finding> {
        if !policies.warn_on_open || !ctx.cidr.is_unrestricted(policies.match_zero_prefix) {
            return None;
        }
        Some(Finding {
            group_id: ctx.group_id.to_string(),
            group_name: ctx.group_name.to_string(),
            port: ctx.rule.ports,
            cidr: ctx.cidr.clone(),
            severity: Severity::Warn,
            reason: format!(
                "open to the internet on port(s) {} via {}",
                ctx.rule.ports, ctx.cidr
            ),
        })
    }
}
