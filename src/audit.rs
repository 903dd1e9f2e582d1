//! Audit orchestrator: collection → normalization → evaluation →
//! aggregation.

use serde::{Deserialize, Serialize};

use crate::collector::{CollectionFailure, Collector};
use crate::error::{AuditError, Result};
use crate::model::normalize::normalize_group;
use crate::policy::{Evaluator, Finding, PolicySet, Severity};

/// Aggregate result of one audit run. Read-only once built; the core
/// never persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub total_groups: usize,
    /// Groups with at least one rule open to the internet. Boolean per
    /// group: many open rules still count once.
    pub groups_with_open_rule: usize,
    /// Number of Fail findings.
    pub critical_findings_count: usize,
    /// True when a deeper inventory page failed and the report covers
    /// only the groups retrieved before the failure.
    pub incomplete: bool,
    /// Collection order, then rule order, then CIDR order.
    pub findings: Vec<Finding>,
}

impl AuditReport {
    /// Whether any Fail finding exists (drives the audit exit code).
    pub fn has_failures(&self) -> bool {
        self.critical_findings_count > 0
    }
}

/// Run a full audit pass over the collector's inventory.
///
/// A total collection failure aborts with no report. A partial failure
/// audits the retrieved prefix and flags the report incomplete.
/// Deterministic: the same inventory yields an identical report.
pub fn run(collector: &dyn Collector, policies: &PolicySet) -> Result<AuditReport> {
    let (raw_groups, incomplete) = match collector.security_groups() {
        Ok(groups) => (groups, false),
        Err(CollectionFailure::Total(cause)) => return Err(AuditError::Collection(cause)),
        Err(CollectionFailure::Partial { collected, cause }) => {
            tracing::warn!(
                collected = collected.len(),
                cause = %cause,
                "inventory incomplete, auditing retrieved groups"
            );
            (collected, true)
        }
    };

    let evaluator = Evaluator::new(policies.clone());
    let mut report = AuditReport {
        total_groups: raw_groups.len(),
        groups_with_open_rule: 0,
        critical_findings_count: 0,
        incomplete,
        findings: Vec::new(),
    };

    for raw in &raw_groups {
        let group = normalize_group(raw);
        let has_open_rule = group.inbound_rules.iter().any(|rule| {
            rule.source_cidrs
                .iter()
                .any(|c| c.is_unrestricted(policies.match_zero_prefix))
        });
        if has_open_rule {
            report.groups_with_open_rule += 1;
        }

        let findings = evaluator.evaluate_group(&group);
        report.critical_findings_count += findings
            .iter()
            .filter(|f| f.severity == Severity::Fail)
            .count();
        report.findings.extend(findings);
    }

    Ok(report)
}
