use itertools::Itertools;
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// One hop of an AS path: a single ASN from an AS_SEQUENCE, or an unordered AS_SET.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AsHop {
    Asn(u32),
    Set(Vec<u32>),
}

/// Ordered sequence of AS hops a route traversed, most recent first.
///
/// The text form matches the one used by bgpkit-parser and bgpdump: sequence members separated
/// by spaces and sets written as `{a,b}`, e.g. `174 1299 {64512,64513}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AsPath {
    pub hops: Vec<AsHop>,
}

impl AsPath {
    pub fn from_sequence<S: AsRef<[u32]>>(seq: S) -> Self {
        AsPath {
            hops: seq.as_ref().iter().copied().map(AsHop::Asn).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Returns the origin ASNs of the path: the last hop, expanded if it is a set.
    pub fn origins(&self) -> Vec<u32> {
        match self.hops.last() {
            None => vec![],
            Some(AsHop::Asn(asn)) => vec![*asn],
            Some(AsHop::Set(asns)) => asns.clone(),
        }
    }
}

impl Display for AsHop {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AsHop::Asn(asn) => write!(f, "{}", asn),
            AsHop::Set(asns) => write!(f, "{{{}}}", asns.iter().join(",")),
        }
    }
}

impl Display for AsPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.hops.iter().join(" "))
    }
}

impl FromStr for AsPath {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut hops = vec![];
        for token in s.split_whitespace() {
            // confederation segments are printed with parentheses by some tools
            let token = token.trim_matches(|c| c == '(' || c == ')');
            if token.is_empty() {
                continue;
            }
            match token.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
                Some(inner) => {
                    let asns = inner
                        .split(',')
                        .filter(|v| !v.is_empty())
                        .map(u32::from_str)
                        .collect::<Result<Vec<u32>, _>>()?;
                    hops.push(AsHop::Set(asns));
                }
                None => hops.push(AsHop::Asn(u32::from_str(token)?)),
            }
        }
        Ok(AsPath { hops })
    }
}

impl Serialize for AsPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
