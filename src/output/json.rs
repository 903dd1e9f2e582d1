use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::audit::AuditReport;
use crate::error::Result;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    report: &'a AuditReport,
}

/// Render a report as pretty-printed JSON with a run timestamp.
pub fn render(report: &AuditReport) -> Result<String> {
    let wrapped = JsonReport {
        generated_at: Utc::now(),
        report,
    };
    let json = serde_json::to_string_pretty(&wrapped)?;
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_fields_are_camel_case() {
        let report = AuditReport {
            total_groups: 3,
            groups_with_open_rule: 1,
            critical_findings_count: 0,
            incomplete: false,
            findings: vec![],
        };
        let rendered = render(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(value["totalGroups"], 3);
        assert_eq!(value["groupsWithOpenRule"], 1);
        assert_eq!(value["criticalFindingsCount"], 0);
        assert!(value["generatedAt"].is_string());
        assert!(value["findings"].as_array().unwrap().is_empty());
    }
}
