use crate::audit::AuditReport;
use crate::policy::Severity;

/// Render a report as plain text, findings grouped per security group.
pub fn render(report: &AuditReport) -> String {
    let mut output = String::new();

    let mut last_group: Option<&str> = None;
    for finding in &report.findings {
        if last_group != Some(finding.group_id.as_str()) {
            output.push_str(&format!(
                "\n{} ({})\n",
                finding.group_name, finding.group_id
            ));
            last_group = Some(&finding.group_id);
        }
        let tag = match finding.severity {
            Severity::Fail => "[FAIL]",
            Severity::Warn => "[WARN]",
        };
        output.push_str(&format!("    {} {}\n", tag, finding.reason));
    }

    if report.findings.is_empty() {
        output.push_str("\nNo exposed rules found.\n");
    }

    output.push_str(&format!("\n{}\n", "=".repeat(40)));
    output.push_str(&format!("Total security groups: {}\n", report.total_groups));
    output.push_str(&format!(
        "Groups with open rules: {}\n",
        report.groups_with_open_rule
    ));
    output.push_str(&format!(
        "Critical findings (risky ports): {}\n",
        report.critical_findings_count
    ));
    if report.incomplete {
        output.push_str("NOTE: inventory collection was incomplete; counts cover only the groups retrieved.\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PortSpan;
    use crate::policy::Finding;

    fn report_with(findings: Vec<Finding>) -> AuditReport {
        let critical = findings
            .iter()
            .filter(|f| f.severity == Severity::Fail)
            .count();
        AuditReport {
            total_groups: 2,
            groups_with_open_rule: 1,
            critical_findings_count: critical,
            incomplete: false,
            findings,
        }
    }

    fn finding(severity: Severity) -> Finding {
        Finding {
            group_id: "sg-1".into(),
            group_name: "web".into(),
            port: PortSpan::single(22),
            cidr: "0.0.0.0/0".parse().unwrap(),
            severity,
            reason: "risky port(s) 22 open to the internet via 0.0.0.0/0".into(),
        }
    }

    #[test]
    fn fail_finding_tagged() {
        let rendered = render(&report_with(vec![finding(Severity::Fail)]));
        assert!(rendered.contains("[FAIL]"));
        assert!(rendered.contains("web (sg-1)"));
        assert!(rendered.contains("Critical findings (risky ports): 1"));
    }

    #[test]
    fn clean_report_says_so() {
        let rendered = render(&report_with(vec![]));
        assert!(rendered.contains("No exposed rules found."));
        assert!(rendered.contains("Total security groups: 2"));
    }

    #[test]
    fn incomplete_report_carries_note() {
        let mut report = report_with(vec![]);
        report.incomplete = true;
        assert!(render(&report).contains("incomplete"));
    }
}
