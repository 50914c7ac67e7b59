/*!
The watch-list: the IP ranges whose announcements and withdrawals are recorded.

A watch-list is a table with a header row, read from a local file, a compressed file, or a URL.
Two layouts are understood:

- a CIDR column (`CIDR` by default) holding one address block per row;
- a pair of `Start IP` / `End IP` columns, each row being summarised into the smallest list of
  CIDR blocks covering exactly that range.

CIDR fields are parsed leniently: host bits are cleared (`10.1.2.3/8` loads as `10.0.0.0/8`) and
a bare address loads as a host route.

### Example

```no_run
use bgp_watchlist::{LoadOptions, RangeSet};

let options = LoadOptions::default().country("PK");
let ranges = RangeSet::load("pakistan_ip_data_with_cidr.csv", &options).unwrap();
println!("{} ranges loaded", ranges.len());
```
*/
mod load;

pub use load::LoadOptions;

use crate::error::WatchlistError;
use crate::io::get_reader;
use crate::models::IpRange;
use ipnet::IpNet;
use std::io::Read;
use std::net::IpAddr;
use std::str::FromStr;

/// An ordered, read-only list of watched IP ranges of both address families.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<IpRange>,
}

impl RangeSet {
    pub fn new(ranges: Vec<IpRange>) -> Self {
        RangeSet { ranges }
    }

    /// Loads a watch-list from a local path or URL.
    pub fn load(path: &str, options: &LoadOptions) -> Result<RangeSet, WatchlistError> {
        let reader = get_reader(path)?;
        Self::from_reader(reader, options)
    }

    /// Loads a watch-list from any reader producing CSV text.
    pub fn from_reader<R: Read>(
        reader: R,
        options: &LoadOptions,
    ) -> Result<RangeSet, WatchlistError> {
        let ranges = load::read_ranges(reader, options)?;
        Ok(RangeSet { ranges })
    }

    /// Returns the first range, in load order, that contains `prefix`.
    ///
    /// A prefix is contained in a range when both are of the same IP version and every address
    /// of the prefix lies inside the range. Equal blocks contain each other.
    pub fn contains(&self, prefix: &IpNet) -> Option<&IpRange> {
        self.ranges.iter().find(|range| range.contains(prefix))
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IpRange> {
        self.ranges.iter()
    }
}

impl FromIterator<IpRange> for RangeSet {
    fn from_iter<T: IntoIterator<Item = IpRange>>(iter: T) -> Self {
        RangeSet::new(iter.into_iter().collect())
    }
}

/// Parses a prefix the way routing feeds and watch-lists write them.
///
/// Accepts `addr/len` with host bits set (they are cleared) and bare addresses (loaded as `/32`
/// or `/128`). Returns `None` for anything else.
pub fn parse_prefix(value: &str) -> Option<IpNet> {
    let value = value.trim();
    if let Ok(net) = IpNet::from_str(value) {
        return Some(net.trunc());
    }
    IpAddr::from_str(value).ok().map(IpNet::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> IpNet {
        IpNet::from_str(s).unwrap()
    }

    #[test]
    fn test_contains_subnet_and_equal() {
        let set = RangeSet::new(vec![net("10.0.0.0/8")]);
        assert_eq!(set.contains(&net("10.1.2.0/24")), Some(&net("10.0.0.0/8")));
        assert_eq!(set.contains(&net("10.0.0.0/8")), Some(&net("10.0.0.0/8")));
        assert_eq!(set.contains(&net("10.0.0.0/7")), None);
        assert_eq!(set.contains(&net("192.168.0.0/16")), None);
    }

    #[test]
    fn test_contains_ignores_other_family() {
        // ::a00:0/104 spans the same numeric values as 10.0.0.0/8
        let set = RangeSet::new(vec![net("10.0.0.0/8"), net("2001:db8::/32")]);
        assert_eq!(set.contains(&net("::a00:0/104")), None);
        assert_eq!(set.contains(&net("::a01:200/120")), None);
        assert_eq!(
            set.contains(&net("2001:db8:1::/48")),
            Some(&net("2001:db8::/32"))
        );
        assert_eq!(set.contains(&net("2001:db9::/48")), None);
    }

    #[test]
    fn test_first_loaded_range_wins() {
        let set = RangeSet::new(vec![net("10.0.0.0/16"), net("10.0.0.0/8")]);
        assert_eq!(set.contains(&net("10.0.1.0/24")), Some(&net("10.0.0.0/16")));
        assert_eq!(set.contains(&net("10.1.0.0/24")), Some(&net("10.0.0.0/8")));

        let set = RangeSet::new(vec![net("10.0.0.0/8"), net("10.0.0.0/16")]);
        assert_eq!(set.contains(&net("10.0.1.0/24")), Some(&net("10.0.0.0/8")));
    }

    #[test]
    fn test_parse_prefix() {
        assert_eq!(parse_prefix("10.1.2.0/24"), Some(net("10.1.2.0/24")));
        assert_eq!(parse_prefix(" 10.1.2.3/24 "), Some(net("10.1.2.0/24")));
        assert_eq!(parse_prefix("192.0.2.7"), Some(net("192.0.2.7/32")));
        assert_eq!(parse_prefix("2001:db8::/32"), Some(net("2001:db8::/32")));
        assert_eq!(parse_prefix("10.0.0.0/33"), None);
        assert_eq!(parse_prefix("not-a-prefix"), None);
        assert_eq!(parse_prefix(""), None);
    }

    #[test]
    fn test_empty_set() {
        let set = RangeSet::default();
        assert!(set.is_empty());
        assert_eq!(set.contains(&net("0.0.0.0/0")), None);
    }
}
