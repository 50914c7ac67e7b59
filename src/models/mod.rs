/*!
Data structures flowing through the watch pipeline.

- [StreamRecord] and [StreamElement]: what a [StreamSource](crate::StreamSource) yields.
- [MatchRecord]: one element that fell inside the watch-list, as written to the match log.
- [IpRange]: one watch-list entry.
*/
mod aspath;
mod matched;
mod stream;

pub use aspath::*;
pub use matched::*;
pub use stream::*;

/// A contiguous block of addresses of one IP version, as base address and prefix length.
pub type IpRange = ipnet::IpNet;
