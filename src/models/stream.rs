use crate::models::AsPath;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::net::IpAddr;
use std::str::FromStr;

/// # ElemKind
///
/// The kind of a routing-update element.
///
/// - `Announce`: the peer can reach the prefix.
/// - `Withdraw`: the peer no longer reaches the prefix.
/// - `Other`: anything else a feed may report (peer state changes, RIB entries, ...). These are
///   never matched against the watch-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ElemKind {
    #[serde(rename = "A")]
    Announce,
    #[serde(rename = "W")]
    Withdraw,
    #[serde(rename = "O")]
    Other,
}

impl ElemKind {
    /// Returns true for announcements and withdrawals, the only kinds worth matching.
    pub fn is_update(&self) -> bool {
        matches!(self, ElemKind::Announce | ElemKind::Withdraw)
    }
}

impl Display for ElemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let t = match self {
            ElemKind::Announce => "A",
            ElemKind::Withdraw => "W",
            ElemKind::Other => "O",
        };
        write!(f, "{}", t)
    }
}

impl FromStr for ElemKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "a" | "announce" | "announcement" => Ok(ElemKind::Announce),
            "w" | "withdraw" | "withdrawal" => Ok(ElemKind::Withdraw),
            _ => Err(format!("unknown element type {}", s)),
        }
    }
}

/// One routing-update entry within a [StreamRecord].
///
/// The prefix is kept as text: feeds do carry malformed prefixes, and deciding what to do with
/// them is up to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamElement {
    pub kind: ElemKind,
    pub peer_address: IpAddr,
    /// Peer ASN, when the feed reports one.
    pub peer_asn: Option<u32>,
    pub prefix: String,
    pub as_path: Option<AsPath>,
    pub next_hop: Option<IpAddr>,
    pub communities: Option<Vec<String>>,
}

impl StreamElement {
    /// Creates an element with no optional attributes.
    pub fn new(kind: ElemKind, peer_address: IpAddr, prefix: &str) -> Self {
        StreamElement {
            kind,
            peer_address,
            peer_asn: None,
            prefix: prefix.to_string(),
            as_path: None,
            next_hop: None,
            communities: None,
        }
    }

    pub fn with_as_path(mut self, as_path: AsPath) -> Self {
        self.as_path = Some(as_path);
        self
    }

    pub fn with_next_hop(mut self, next_hop: IpAddr) -> Self {
        self.next_hop = Some(next_hop);
        self
    }

    pub fn with_communities<S: ToString>(mut self, communities: &[S]) -> Self {
        self.communities = Some(communities.iter().map(|c| c.to_string()).collect());
        self
    }

    pub fn with_peer_asn(mut self, asn: u32) -> Self {
        self.peer_asn = Some(asn);
        self
    }
}

/// One unit yielded by a feed: a UTC timestamp and the elements carried by the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub elements: Vec<StreamElement>,
}

impl StreamRecord {
    pub fn new(timestamp: u64, elements: Vec<StreamElement>) -> Self {
        StreamRecord {
            timestamp,
            elements,
        }
    }
}
