/*!
## Element Filters

Optional filters narrowing which stream elements are tested against the watch-list. Elements
rejected by a filter still count as seen, they are only never matched.

The available filters are (`filter_type` -- definition):
- `peer_ip` -- peer's IP address
- `peer_ips` -- comma-separated peers' IP addresses
- `peer_asn` -- peer's AS number
- `type` -- element type (`a`/`announce` or `w`/`withdraw`)
- `origin_asn` -- origin AS number
- `as_path` -- regular expression for the AS path string

### Example

```
use bgp_watchlist::Filter;

let filters = vec![
    Filter::new("type", "a").unwrap(),
    Filter::new("as_path", r" 1299 ").unwrap(),
];
assert!(Filter::new("type", "x").is_err());
```
*/
use crate::error::ConfigError;
use crate::models::{ElemKind, StreamElement};
use regex::Regex;
use std::net::IpAddr;
use std::str::FromStr;

/// Filter enum: definition of types of filters
#[derive(Debug, Clone)]
pub enum Filter {
    PeerIp(IpAddr),
    PeerIps(Vec<IpAddr>),
    PeerAsn(u32),
    Type(ElemKind),
    OriginAsn(u32),
    AsPath(Regex),
}

impl Filter {
    pub fn new(filter_type: &str, filter_value: &str) -> Result<Filter, ConfigError> {
        let invalid = || ConfigError::InvalidFilter {
            filter_type: filter_type.to_string(),
            value: filter_value.to_string(),
        };
        match filter_type {
            "peer_ip" => IpAddr::from_str(filter_value)
                .map(Filter::PeerIp)
                .map_err(|_| invalid()),
            "peer_ips" => {
                let mut ips = vec![];
                for ip_str in filter_value.replace(' ', "").split(',') {
                    ips.push(IpAddr::from_str(ip_str).map_err(|_| invalid())?);
                }
                Ok(Filter::PeerIps(ips))
            }
            "peer_asn" => u32::from_str(filter_value)
                .map(Filter::PeerAsn)
                .map_err(|_| invalid()),
            "type" => match ElemKind::from_str(filter_value) {
                Ok(kind) if kind.is_update() => Ok(Filter::Type(kind)),
                _ => Err(invalid()),
            },
            "origin_asn" => u32::from_str(filter_value)
                .map(Filter::OriginAsn)
                .map_err(|_| invalid()),
            "as_path" => Regex::new(filter_value)
                .map(Filter::AsPath)
                .map_err(|_| invalid()),
            _ => Err(invalid()),
        }
    }
}

pub trait Filterable {
    fn match_filter(&self, filter: &Filter) -> bool;
    fn match_filters(&self, filters: &[Filter]) -> bool;
}

impl Filterable for StreamElement {
    fn match_filter(&self, filter: &Filter) -> bool {
        match filter {
            Filter::PeerIp(v) => self.peer_address == *v,
            Filter::PeerIps(v) => v.contains(&self.peer_address),
            Filter::PeerAsn(v) => self.peer_asn == Some(*v),
            Filter::Type(v) => self.kind == *v,
            Filter::OriginAsn(v) => match &self.as_path {
                Some(path) => path.origins().contains(v),
                None => false,
            },
            Filter::AsPath(v) => match &self.as_path {
                Some(path) => v.is_match(path.to_string().as_str()),
                None => false,
            },
        }
    }

    fn match_filters(&self, filters: &[Filter]) -> bool {
        filters.iter().all(|f| self.match_filter(f))
    }
}
