//! sgaudit — policy-driven network-exposure auditor for cloud security
//! groups.
//!
//! Collects an account's security groups through a pluggable
//! [`collector::Collector`], normalizes each inbound rule, and evaluates
//! it against a configurable exposure policy: risky ports (SSH, RDP,
//! databases) open to the internet are Fail findings, anything else open
//! to the internet is a Warn.
//!
//! # Quick Start
//!
//! ```no_run
//! use sgaudit::collector::PagedCollector;
//! use sgaudit::aws::AwsCliInventory;
//! use sgaudit::{audit, AuditOptions};
//!
//! let collector = PagedCollector::new(AwsCliInventory::default());
//! let report = audit(&collector, &AuditOptions::default()).unwrap();
//! println!("critical findings: {}", report.critical_findings_count);
//! ```

pub mod audit;
pub mod aws;
pub mod collector;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod policy;
pub mod provision;

use std::path::{Path, PathBuf};

use collector::Collector;
use config::Config;
use error::Result;
use output::OutputFormat;

pub use audit::AuditReport;

/// Options for an audit invocation.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Path to policy config (defaults to `.sgaudit.toml` in the working
    /// directory).
    pub policy_path: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            policy_path: None,
            format: OutputFormat::Text,
        }
    }
}

/// Run a complete audit: load policy, collect inventory, evaluate.
pub fn audit(collector: &dyn Collector, options: &AuditOptions) -> Result<AuditReport> {
    let policy_path = options
        .policy_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(".sgaudit.toml"));
    let config = Config::load(&policy_path)?;
    audit::run(collector, &config.policy)
}

/// Load policy config from an explicit path, failing if it is missing.
pub fn load_policy_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(error::AuditError::Config(format!(
            "policy file not found: {}",
            path.display()
        )));
    }
    Config::load(path)
}

/// Render an audit report in the specified format.
pub fn render_report(report: &AuditReport, format: OutputFormat) -> Result<String> {
    output::render(report, format)
}


#[cfg(test)]
mod properties {
    use super::*;
    use crate::model::{Cidr, InboundRule, PortSpan, Protocol};
    use crate::policy::{Evaluator, Severity};
    use proptest::prelude::*;

    fn restricted_cidr() -> impl Strategy<Value = Cidr> {
        (any::<[u8; 4]>(), 1u8..=32).prop_map(|(octets, len)| {
            format!(
                "{}.{}.{}.{}/{}",
                octets[0], octets[1], octets[2], octets[3], len
            )
            .parse()
            .unwrap()
        })
    }

    fn group_of(rule: InboundRule) -> crate::model::SecurityGroup {
        crate::model::SecurityGroup {
            id: "sg-prop".into(),
            name: "prop".into(),
            vpc_id: "vpc-prop".into(),
            inbound_rules: vec![rule],
        }
    }

    proptest! {
        #[test]
        fn restricted_sources_never_flagged(
            cidrs in proptest::collection::vec(restricted_cidr(), 0..4),
            port in any::<u16>(),
        ) {
            let eval = Evaluator::default();
            let rule = InboundRule {
                protocol: Protocol::Tcp,
                ports: PortSpan::single(port),
                source_cidrs: cidrs,
            };
            prop_assert!(eval.evaluate_group(&group_of(rule)).is_empty());
        }

        #[test]
        fn open_risky_port_is_exactly_one_fail(port in proptest::sample::select(
            vec![22u16, 3389, 3306, 5432, 1433, 27017],
        )) {
            let eval = Evaluator::default();
            let rule = InboundRule {
                protocol: Protocol::Tcp,
                ports: PortSpan::single(port),
                source_cidrs: vec!["0.0.0.0/0".parse().unwrap()],
            };
            let findings = eval.evaluate_group(&group_of(rule));
            prop_assert_eq!(findings.len(), 1);
            prop_assert_eq!(findings[0].severity, Severity::Fail);
        }

        #[test]
        fn open_non_risky_port_is_exactly_one_warn(port in any::<u16>()) {
            let policies = crate::policy::PolicySet::default();
            prop_assume!(!policies.risky_ports.contains(&port));
            let eval = Evaluator::new(policies);
            let rule = InboundRule {
                protocol: Protocol::Tcp,
                ports: PortSpan::single(port),
                source_cidrs: vec!["0.0.0.0/0".parse().unwrap()],
            };
            let findings = eval.evaluate_group(&group_of(rule));
            prop_assert_eq!(findings.len(), 1);
            prop_assert_eq!(findings[0].severity, Severity::Warn);
        }

        #[test]
        fn counters_bounded_for_any_span(
            from in any::<u16>(),
            to in any::<u16>(),
        ) {
            prop_assume!(from <= to);
            let collector = crate::collector::StaticCollector::new(vec![
                crate::model::raw::RawSecurityGroup {
                    group_id: "sg-1".into(),
                    group_name: "prop".into(),
                    vpc_id: "vpc-1".into(),
                    ip_permissions: vec![crate::model::raw::RawPermission {
                        ip_protocol: "tcp".into(),
                        from_port: Some(from as i64),
                        to_port: Some(to as i64),
                        ip_ranges: vec![crate::model::raw::RawIpRange {
                            cidr_ip: "0.0.0.0/0".into(),
                        }],
                        ipv6_ranges: vec![],
                    }],
                },
            ]);
            let report = crate::audit::run(&collector, &Default::default()).unwrap();
            prop_assert!(report.groups_with_open_rule <= report.total_groups);
            prop_assert!(report.critical_findings_count <= report.findings.len());
        }
    }
}
