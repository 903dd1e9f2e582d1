//! Raw provider records, mirroring the EC2 `DescribeSecurityGroups`
//! response shape. These deserialize straight from the provider JSON and
//! are normalized into [`crate::model::SecurityGroup`] before evaluation.

use serde::{Deserialize, Serialize};

/// Top-level `DescribeSecurityGroups` page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescribeSecurityGroupsPage {
    #[serde(rename = "SecurityGroups", default)]
    pub security_groups: Vec<RawSecurityGroup>,
    #[serde(rename = "NextToken", default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSecurityGroup {
    #[serde(rename = "GroupId")]
    pub group_id: String,
    #[serde(rename = "GroupName")]
    pub group_name: String,
    #[serde(rename = "VpcId", default)]
    pub vpc_id: String,
    #[serde(rename = "IpPermissions", default)]
    pub ip_permissions: Vec<RawPermission>,
}

/// One inbound permission entry as the provider returns it. ICMP and
/// all-traffic entries omit `FromPort`/`ToPort` entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPermission {
    #[serde(rename = "IpProtocol")]
    pub ip_protocol: String,
    #[serde(rename = "FromPort", default, skip_serializing_if = "Option::is_none")]
    pub from_port: Option<i64>,
    #[serde(rename = "ToPort", default, skip_serializing_if = "Option::is_none")]
    pub to_port: Option<i64>,
    #[serde(rename = "IpRanges", default)]
    pub ip_ranges: Vec<RawIpRange>,
    #[serde(rename = "Ipv6Ranges", default)]
    pub ipv6_ranges: Vec<RawIpv6Range>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIpRange {
    #[serde(rename = "CidrIp")]
    pub cidr_ip: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIpv6Range {
    #[serde(rename = "CidrIpv6")]
    pub cidr_ipv6: String,
}

impl RawPermission {
    /// All CIDR strings of this entry, IPv4 then IPv6, provider order.
    pub fn cidr_strings(&self) -> impl Iterator<Item = &str> {
        self.ip_ranges
            .iter()
            .map(|r| r.cidr_ip.as_str())
            .chain(self.ipv6_ranges.iter().map(|r| r.cidr_ipv6.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_provider_shape() {
        let json = r#"{
            "SecurityGroups": [{
                "GroupId": "sg-0abc",
                "GroupName": "web",
                "VpcId": "vpc-123",
                "IpPermissions": [{
                    "IpProtocol": "tcp",
                    "FromPort": 443,
                    "ToPort": 443,
                    "IpRanges": [{"CidrIp": "0.0.0.0/0"}],
                    "Ipv6Ranges": [{"CidrIpv6": "::/0"}]
                }]
            }],
            "NextToken": "abc123"
        }"#;
        let page: DescribeSecurityGroupsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.security_groups.len(), 1);
        assert_eq!(page.next_token.as_deref(), Some("abc123"));
        let sg = &page.security_groups[0];
        assert_eq!(sg.group_id, "sg-0abc");
        let cidrs: Vec<&str> = sg.ip_permissions[0].cidr_strings().collect();
        assert_eq!(cidrs, vec!["0.0.0.0/0", "::/0"]);
    }

    #[test]
    fn icmp_entry_has_no_ports() {
        let json = r#"{"IpProtocol": "icmp", "IpRanges": [{"CidrIp": "10.0.0.0/8"}]}"#;
        let perm: RawPermission = serde_json::from_str(json).unwrap();
        assert_eq!(perm.from_port, None);
        assert_eq!(perm.to_port, None);
    }
}
