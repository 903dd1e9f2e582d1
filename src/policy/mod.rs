pub mod builtin;
pub mod finding;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::model::{Cidr, InboundRule, SecurityGroup};

pub use finding::{CheckMetadata, Finding, Severity};

/// Exposure policy configuration, loadable from `.sgaudit.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySet {
    /// Ports that should never be open to the internet.
    #[serde(default = "default_risky_ports")]
    pub risky_ports: BTreeSet<u16>,
    /// Treat any CIDR with prefix length 0 as unrestricted, not only the
    /// literal `0.0.0.0/0` / `::/0` sentinels.
    #[serde(default)]
    pub match_zero_prefix: bool,
    /// Emit Warn findings for non-risky ports open to the internet.
    #[serde(default = "default_true")]
    pub warn_on_open: bool,
}

/// SSH, RDP, MySQL, PostgreSQL, MSSQL, MongoDB.
fn default_risky_ports() -> BTreeSet<u16> {
    [22, 3389, 3306, 5432, 1433, 27017].into()
}

fn default_true() -> bool {
    true
}

impl Default for PolicySet {
    fn default() -> Self {
        Self {
            risky_ports: default_risky_ports(),
            match_zero_prefix: false,
            warn_on_open: true,
        }
    }
}

/// Evaluation context for one (rule, CIDR) pair.
pub struct RuleContext<'a> {
    pub group_id: &'a str,
    pub group_name: &'a str,
    pub rule: &'a InboundRule,
    pub cidr: &'a Cidr,
}

/// An exposure check inspects one (rule, CIDR) pair and may produce a
/// finding.
pub trait ExposureCheck: Send + Sync {
    /// Metadata about this check (id, name, severity).
    fn metadata(&self) -> CheckMetadata;

    /// Run the check. Returning `Some` stops evaluation for this pair.
    fn check(&self, ctx: &RuleContext<'_>, policies: &PolicySet) -> Option<Finding>;
}

/// Runs the registered checks against normalized rules.
///
/// Checks run in registration order and the first match wins per
/// (rule, CIDR) pair, so a rule never produces both a Fail and a Warn
/// for the same source.
pub struct Evaluator {
    checks: Vec<Box<dyn ExposureCheck>>,
    policies: PolicySet,
}

impl Evaluator {
    /// Create an evaluator with the built-in checks registered.
    pub fn new(policies: PolicySet) -> Self {
        Self {
            checks: builtin::all_checks(),
            policies,
        }
    }

    pub fn policies(&self) -> &PolicySet {
        &self.policies
    }

    /// Evaluate one rule: at most one finding per source CIDR.
    pub fn evaluate_rule(&self, group: &SecurityGroup, rule: &InboundRule) -> Vec<Finding> {
        let mut findings = Vec::new();
        for cidr in &rule.source_cidrs {
            let ctx = RuleContext {
                group_id: &group.id,
                group_name: &group.name,
                rule,
                cidr,
            };
            if let Some(finding) = self
                .checks
                .iter()
                .find_map(|c| c.check(&ctx, &self.policies))
            {
                findings.push(finding);
            }
        }
        findings
    }

    /// Evaluate every inbound rule of a group, in rule order.
    pub fn evaluate_group(&self, group: &SecurityGroup) -> Vec<Finding> {
        group
            .inbound_rules
            .iter()
            .flat_map(|rule| self.evaluate_rule(group, rule))
            .collect()
    }

    /// List metadata for all registered checks.
    pub fn list_checks(&self) -> Vec<CheckMetadata> {
        self.checks.iter().map(|c| c.metadata()).collect()
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(PolicySet::default())
    }
}
