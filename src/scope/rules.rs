use std::fmt;
use std::net::IpAddr;
use std::sync::LazyLock;

use ipnet::{IpNet, Ipv4Net};
use regex::Regex;

use crate::errors::ScopeError;

const MAX_TARGET_LEN: usize = 253;

static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?)+$")
        .expect("hostname pattern is valid")
});

/// A candidate scan target after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeTarget {
    Ip(IpAddr),
    Host(String),
}

impl ScopeTarget {
    /// Parse untrusted input into a normalized target. Addresses are
    /// canonicalized (IPv4-mapped IPv6 becomes IPv4) and hostnames lowercased.
    pub fn parse(candidate: &str) -> Result<Self, ScopeError> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return Err(ScopeError::Validation("Target is empty".into()));
        }
        if trimmed.len() > MAX_TARGET_LEN {
            return Err(ScopeError::Validation("Target is too long".into()));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == ':' || c == '-') {
            return Err(ScopeError::Validation(format!("Target contains invalid characters: {}", trimmed.escape_debug())));
        }

        if let Ok(ip) = trimmed.parse::<IpAddr>() {
            return Ok(ScopeTarget::Ip(ip.to_canonical()));
        }

        let host = trimmed.to_ascii_lowercase();
        if is_valid_hostname(&host) {
            Ok(ScopeTarget::Host(host))
        } else {
            Err(ScopeError::Validation(format!("'{}' is not a valid IP address or hostname", trimmed)))
        }
    }
}

impl fmt::Display for ScopeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(ip) => write!(f, "{}", ip),
            Self::Host(host) => f.write_str(host),
        }
    }
}

/// One allow or deny entry from the scope configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeRule {
    Network(IpNet),
    Host(String),
    /// `*.example.org`; holds the suffix without the leading `*.`.
    Wildcard(String),
}

impl ScopeRule {
    pub fn parse(entry: &str) -> Result<Self, ScopeError> {
        let entry = entry.trim();

        if let Some(suffix) = entry.strip_prefix("*.") {
            let suffix = suffix.to_ascii_lowercase();
            if !is_valid_hostname(&suffix) {
                return Err(ScopeError::Config(format!("Invalid wildcard scope rule: {}", entry)));
            }
            return Ok(ScopeRule::Wildcard(suffix));
        }

        if entry.contains('/') {
            let net: IpNet = entry.parse()
                .map_err(|e| ScopeError::Config(format!("Invalid CIDR scope rule '{}': {}", entry, e)))?;
            return Ok(ScopeRule::Network(canonical_net(net.trunc())));
        }

        if let Ok(ip) = entry.parse::<IpAddr>() {
            let ip = ip.to_canonical();
            let prefix = if ip.is_ipv4() { 32 } else { 128 };
            let net = IpNet::new(ip, prefix)
                .map_err(|e| ScopeError::Config(format!("Invalid address scope rule '{}': {}", entry, e)))?;
            return Ok(ScopeRule::Network(net));
        }

        let host = entry.to_ascii_lowercase();
        if is_valid_hostname(&host) {
            Ok(ScopeRule::Host(host))
        } else {
            Err(ScopeError::Config(format!("Invalid scope rule: {}", entry)))
        }
    }

    pub fn matches(&self, target: &ScopeTarget) -> bool {
        match (self, target) {
            (ScopeRule::Network(IpNet::V6(net)), ScopeTarget::Ip(IpAddr::V4(v4))) => {
                // Targets are canonical, so an IPv6 range spanning ::ffff:0:0/96 sees them mapped
                net.contains(&v4.to_ipv6_mapped())
            }
            (ScopeRule::Network(net), ScopeTarget::Ip(ip)) => net.contains(ip),
            (ScopeRule::Host(host), ScopeTarget::Host(candidate)) => host == candidate,
            (ScopeRule::Wildcard(suffix), ScopeTarget::Host(candidate)) => {
                candidate.len() > suffix.len() + 1
                    && candidate.ends_with(suffix.as_str())
                    && candidate.as_bytes()[candidate.len() - suffix.len() - 1] == b'.'
            }
            // No DNS resolution: address rules never match names and vice versa
            _ => false,
        }
    }
}

impl fmt::Display for ScopeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(net) => write!(f, "{}", net),
            Self::Host(host) => f.write_str(host),
            Self::Wildcard(suffix) => write!(f, "*.{}", suffix),
        }
    }
}

/// Ranges inside ::ffff:0:0/96 are rewritten as the IPv4 range they cover.
fn canonical_net(net: IpNet) -> IpNet {
    if let IpNet::V6(v6) = net {
        if v6.prefix_len() >= 96 {
            if let Some(v4) = v6.network().to_ipv4_mapped() {
                if let Ok(mapped) = Ipv4Net::new(v4, v6.prefix_len() - 96) {
                    return IpNet::V4(mapped);
                }
            }
        }
    }
    net
}

fn is_valid_hostname(host: &str) -> bool {
    if !HOSTNAME_RE.is_match(host) {
        return false;
    }
    // An all-numeric final label is a malformed address, not a name
    host.rsplit('.')
        .next()
        .map(|tld| !tld.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}
