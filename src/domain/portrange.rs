use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid port range '{0}': expected 'first' or 'first-last'")]
    Malformed(String),

    #[error("Invalid port range '{entry}': port {port} outside 1-65535")]
    PortOutOfRange { entry: String, port: u64 },

    #[error("Invalid port range '{0}': last port before first port")]
    Inverted(String),
}

/// Inclusive TCP port range, validated at parse time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    pub first: u16,
    pub last: u16,
}

impl PortRange {
    /// Iterate all ports in the range
    pub fn ports(&self) -> impl Iterator<Item = u16> {
        self.first..=self.last
    }
}

impl std::fmt::Display for PortRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.first == self.last {
            write!(f, "{}", self.first)
        } else {
            write!(f, "{}-{}", self.first, self.last)
        }
    }
}

/// Parse a single `first[-last]` entry. A bare port denotes a single-port range.
pub fn parse_port_range(entry: &str) -> Result<PortRange, ConfigError> {
    let (first, last) = match entry.split_once('-') {
        Some((first, last)) => (first, last),
        None => (entry, entry),
    };

    let first = parse_port(first, entry)?;
    let last = parse_port(last, entry)?;

    if last < first {
        return Err(ConfigError::Inverted(entry.to_string()));
    }

    Ok(PortRange { first, last })
}

/// Parse a whole configuration list, aborting on the first invalid entry.
pub fn parse_port_ranges(entries: &[String]) -> Result<Vec<PortRange>, ConfigError> {
    entries.iter().map(|e| parse_port_range(e)).collect()
}

fn parse_port(s: &str, entry: &str) -> Result<u16, ConfigError> {
    let port: u64 = s
        .parse()
        .map_err(|_| ConfigError::Malformed(entry.to_string()))?;

    if !(1..=65535).contains(&port) {
        return Err(ConfigError::PortOutOfRange {
            entry: entry.to_string(),
            port,
        });
    }

    Ok(port as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_port() {
        let range = parse_port_range("80").unwrap();
        assert_eq!(range, PortRange { first: 80, last: 80 });
    }

    #[test]
    fn test_parse_full_range() {
        let range = parse_port_range("1-1024").unwrap();
        assert_eq!(range, PortRange { first: 1, last: 1024 });
        assert_eq!(range.ports().count(), 1024);
    }

    #[test]
    fn test_parse_inverted_range() {
        assert!(matches!(
            parse_port_range("1024-1"),
            Err(ConfigError::Inverted(_))
        ));
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_port_range("abc"),
            Err(ConfigError::Malformed(_))
        ));
        assert!(matches!(parse_port_range(""), Err(ConfigError::Malformed(_))));
        assert!(matches!(
            parse_port_range("80-"),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_out_of_bounds() {
        assert!(matches!(
            parse_port_range("0-70000"),
            Err(ConfigError::PortOutOfRange { port: 0, .. })
        ));
        assert!(matches!(
            parse_port_range("65536"),
            Err(ConfigError::PortOutOfRange { port: 65536, .. })
        ));
    }

    #[test]
    fn test_parse_list_fails_fast() {
        let entries = vec!["22".to_string(), "abc".to_string(), "80".to_string()];
        assert!(parse_port_ranges(&entries).is_err());

        let entries = vec!["22".to_string(), "8000-9000".to_string()];
        let ranges = parse_port_ranges(&entries).unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[1].ports().count(), 1001);
    }
}
