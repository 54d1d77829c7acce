//! IPv4 blacklist ranges
//!
//! The scheduler refuses to place bindings whose drain host falls inside a
//! configured address range. Ranges are inclusive start/end pairs and are
//! validated at construction; matching is a pure numeric comparison with no
//! DNS resolution.

use std::net::Ipv4Addr;

use thiserror::Error;

/// Errors from parsing or validating blacklist ranges.
#[derive(Debug, Error)]
pub enum RangeError {
    #[error("invalid IPv4 address in range: {0}")]
    InvalidAddr(String),

    #[error("range start {start} is greater than end {end}")]
    Reversed { start: Ipv4Addr, end: Ipv4Addr },

    #[error("malformed range '{0}', expected start-end")]
    Malformed(String),
}

/// One inclusive IPv4 range. `start <= end` is enforced by [`IpRanges::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpRange {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
}

impl IpRange {
    /// Parse a `start-end` pair of IPv4 literals.
    pub fn parse(s: &str) -> Result<Self, RangeError> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| RangeError::Malformed(s.to_string()))?;
        Ok(Self {
            start: parse_addr(start)?,
            end: parse_addr(end)?,
        })
    }
}

fn parse_addr(s: &str) -> Result<Ipv4Addr, RangeError> {
    s.trim()
        .parse()
        .map_err(|_| RangeError::InvalidAddr(s.to_string()))
}

/// A validated set of blacklist ranges.
#[derive(Debug, Clone, Default)]
pub struct IpRanges {
    ranges: Vec<IpRange>,
}

impl IpRanges {
    /// Validate and wrap a set of ranges. Rejects any reversed range.
    pub fn new(ranges: Vec<IpRange>) -> Result<Self, RangeError> {
        for range in &ranges {
            if u32::from(range.start) > u32::from(range.end) {
                return Err(RangeError::Reversed {
                    start: range.start,
                    end: range.end,
                });
            }
        }
        Ok(Self { ranges })
    }

    /// Parse the comma-separated `start-end,start-end` CLI form. An empty
    /// string yields an empty set.
    pub fn parse(s: &str) -> Result<Self, RangeError> {
        if s.is_empty() {
            return Ok(Self::default());
        }
        let ranges = s
            .split(',')
            .map(IpRange::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(ranges)
    }

    /// Whether `host` is an IPv4 literal inside any range. Hostnames that are
    /// not IP literals never match.
    pub fn contains(&self, host: &str) -> bool {
        let Ok(addr) = host.parse::<Ipv4Addr>() else {
            return false;
        };
        let addr = u32::from(addr);
        self.ranges
            .iter()
            .any(|r| u32::from(r.start) <= addr && addr <= u32::from(r.end))
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }
}

#[cfg(test)]
#[path = "ip_range_test.rs"]
mod ip_range_test;
