//! Address items stored inside objects.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use plshell_types::error::ShellError;

/// An address item: a single host, an inclusive range, or a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Item {
    /// `10.0.0.1`
    Address(Ipv4Addr),
    /// `10.0.0.1-10.0.0.9`
    Range(Ipv4Addr, Ipv4Addr),
    /// `10.0.0.0/255.255.255.0` or `10.0.0.0/24`, stored with a netmask.
    Network(Ipv4Addr, Ipv4Addr),
}

fn parse_addr(s: &str) -> Result<Ipv4Addr, ShellError> {
    s.trim()
        .parse()
        .map_err(|_| ShellError::Tree(format!("invalid address: {s}")))
}

fn parse_mask(s: &str) -> Result<Ipv4Addr, ShellError> {
    if let Ok(bits) = s.parse::<u32>() {
        if bits > 32 {
            return Err(ShellError::Tree(format!("invalid prefix length: {s}")));
        }
        let mask = if bits == 0 { 0 } else { u32::MAX << (32 - bits) };
        return Ok(Ipv4Addr::from(mask));
    }
    let mask = parse_addr(s)?;
    let raw = u32::from(mask);
    // A netmask is a run of ones followed by a run of zeros.
    if raw.leading_ones() + raw.trailing_zeros() != 32 {
        return Err(ShellError::Tree(format!("invalid netmask: {s}")));
    }
    Ok(mask)
}

impl FromStr for Item {
    type Err = ShellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((start, end)) = s.split_once('-') {
            let (start, end) = (parse_addr(start)?, parse_addr(end)?);
            if start > end {
                return Err(ShellError::Tree(format!("range start after end: {s}")));
            }
            return Ok(Item::Range(start, end));
        }
        if let Some((net, mask)) = s.split_once('/') {
            return Ok(Item::Network(parse_addr(net)?, parse_mask(mask)?));
        }
        Ok(Item::Address(parse_addr(s)?))
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Address(a) => write!(f, "{a}"),
            Item::Range(a, b) => write!(f, "{a}-{b}"),
            Item::Network(n, m) => write!(f, "{n}/{m}"),
        }
    }
}
