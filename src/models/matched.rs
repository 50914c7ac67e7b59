use crate::models::{AsPath, ElemKind, IpRange};
use chrono::{DateTime, Utc};
use ipnet::IpNet;
use itertools::Itertools;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;

/// Placeholder written for attributes the element does not carry.
pub const NOT_AVAILABLE: &str = "N/A";

/// A stream element whose prefix lies inside a watch-list range.
///
/// The [Display] implementation produces one match-log line:
///
/// ```text
/// 2022-06-01 00:00:05 A 192.0.2.1 10.1.2.0/24 AS Path: 65001 65002 Next Hop: N/A Communities: N/A
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchRecord {
    /// Record time in seconds since the Unix epoch.
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub kind: ElemKind,
    pub peer_address: IpAddr,
    pub peer_asn: Option<u32>,
    /// The announced or withdrawn prefix, with host bits cleared.
    pub prefix: IpNet,
    pub as_path: Option<AsPath>,
    pub next_hop: Option<IpAddr>,
    pub communities: Option<Vec<String>>,
    /// The first watch-list range, in load order, containing the prefix.
    pub range: IpRange,
}

impl MatchRecord {
    /// Returns the record time as `YYYY-MM-DD HH:MM:SS` in UTC.
    pub fn time_string(&self) -> String {
        format_timestamp(self.timestamp)
    }
}

/// Formats seconds since the Unix epoch as `YYYY-MM-DD HH:MM:SS` in UTC.
///
/// Timestamps chrono cannot represent are printed as the raw number.
pub fn format_timestamp(ts: u64) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Writes the wrapped value, or [NOT_AVAILABLE] when absent.
struct OrNa<'a, T>(&'a Option<T>);

impl<T: Display> Display for OrNa<'_, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            None => write!(f, "{}", NOT_AVAILABLE),
            Some(x) => write!(f, "{}", x),
        }
    }
}

/// Communities joined by spaces; an absent or empty list counts as not available.
struct CommunitiesOrNa<'a>(&'a Option<Vec<String>>);

impl Display for CommunitiesOrNa<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(v) if !v.is_empty() => write!(f, "{}", v.iter().join(" ")),
            _ => write!(f, "{}", NOT_AVAILABLE),
        }
    }
}

impl Display for MatchRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let as_path = self.as_path.as_ref().filter(|p| !p.is_empty());
        write!(
            f,
            "{} {} {} {} AS Path: {} Next Hop: {} Communities: {}",
            self.time_string(),
            self.kind,
            self.peer_address,
            self.prefix,
            OrNa(&as_path),
            OrNa(&self.next_hop),
            CommunitiesOrNa(&self.communities),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn sample() -> MatchRecord {
        MatchRecord {
            timestamp: 1654041605,
            kind: ElemKind::Announce,
            peer_address: IpAddr::from_str("192.0.2.1").unwrap(),
            peer_asn: Some(64496),
            prefix: IpNet::from_str("10.1.2.0/24").unwrap(),
            as_path: Some(AsPath::from_sequence([65001, 65002])),
            next_hop: None,
            communities: None,
            range: IpNet::from_str("10.0.0.0/8").unwrap(),
        }
    }

    #[test]
    fn test_match_line_format() {
        assert_eq!(
            sample().to_string(),
            "2022-06-01 00:00:05 A 192.0.2.1 10.1.2.0/24 AS Path: 65001 65002 Next Hop: N/A Communities: N/A"
        );
    }

    #[test]
    fn test_match_line_with_all_attributes() {
        let mut record = sample();
        record.kind = ElemKind::Withdraw;
        record.next_hop = Some(IpAddr::from_str("2001:db8::1").unwrap());
        record.communities = Some(vec!["65001:100".to_string(), "65001:200".to_string()]);
        assert_eq!(
            record.to_string(),
            "2022-06-01 00:00:05 W 192.0.2.1 10.1.2.0/24 AS Path: 65001 65002 Next Hop: 2001:db8::1 Communities: 65001:100 65001:200"
        );
    }

    #[test]
    fn test_empty_attributes_are_not_available() {
        let mut record = sample();
        record.as_path = Some(AsPath::default());
        record.communities = Some(vec![]);
        assert!(record
            .to_string()
            .ends_with("AS Path: N/A Next Hop: N/A Communities: N/A"));
    }

    #[test]
    fn test_json_keys() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["type"], "A");
        assert_eq!(value["prefix"], "10.1.2.0/24");
        assert_eq!(value["as_path"], "65001 65002");
        assert_eq!(value["range"], "10.0.0.0/8");
        assert!(value["next_hop"].is_null());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(1667174400), "2022-10-31 00:00:00");
        assert_eq!(format_timestamp(u64::MAX), u64::MAX.to_string());
    }
}
