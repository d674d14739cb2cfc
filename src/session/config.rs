//! Session configuration and its validation
//!
//! Everything here is checked synchronously when a session is created, from
//! the creation form or a `[[servers]]` preset. A config that fails
//! validation never becomes a session.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Rejections raised while building a [`SessionConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("name and address required")]
    MissingField,

    #[error("invalid server address {address:?}: {reason}")]
    InvalidAddress {
        address: String,
        reason: &'static str,
    },

    #[error("invalid port {port:?}")]
    InvalidPort { port: String },
}

/// A `host:port` pair, bracketed IPv6 hosts allowed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    pub host: String,
    pub port: u16,
}

impl FromStr for ServerAddress {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| ConfigError::InvalidAddress {
            address: s.to_string(),
            reason,
        };

        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest.split_once(']').ok_or_else(|| invalid("missing ']'"))?;
            let port = tail.strip_prefix(':').ok_or_else(|| invalid("missing port"))?;
            (host, port)
        } else {
            let (host, port) = s.rsplit_once(':').ok_or_else(|| invalid("missing port"))?;
            if host.contains(':') {
                return Err(invalid("too many colons"));
            }
            (host, port)
        };

        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        let port = port.parse::<u16>().map_err(|_| ConfigError::InvalidPort {
            port: port.to_string(),
        })?;

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Raw field values as typed into the creation form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionForm {
    pub tls: String,
    pub name: String,
    pub address: String,
    pub nick: String,
    pub channels: String,
}

/// A validated session description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub name: String,
    pub address: ServerAddress,
    pub tls: bool,
    pub nick: String,
    pub channels: Vec<String>,
}

impl SessionConfig {
    /// Validate form input; `default_nick` fills an empty nick field
    pub fn from_form(form: &SessionForm, default_nick: &str) -> Result<Self, ConfigError> {
        let name = form.name.trim();
        let address = form.address.trim();
        if name.is_empty() || address.is_empty() {
            return Err(ConfigError::MissingField);
        }

        let nick = match form.nick.trim() {
            "" => default_nick.to_string(),
            nick => nick.to_string(),
        };

        Ok(Self {
            name: name.to_string(),
            address: address.parse()?,
            tls: parse_flag(&form.tls),
            nick,
            channels: split_channels(&form.channels),
        })
    }
}

/// `true`, `1` and `yes` enable; anything else is off
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

/// Split a comma separated channel list, dropping blanks and repeats
pub fn split_channels(value: &str) -> Vec<String> {
    let mut channels: Vec<String> = Vec::new();
    for channel in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if !channels.iter().any(|c| c == channel) {
            channels.push(channel.to_string());
        }
    }
    channels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, address: &str) -> SessionForm {
        SessionForm {
            name: name.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    #[test]
    fn parses_host_and_port() {
        let addr: ServerAddress = "irc.example:6697".parse().unwrap();
        assert_eq!(addr.host, "irc.example");
        assert_eq!(addr.port, 6697);
        assert_eq!(addr.to_string(), "irc.example:6697");
    }

    #[test]
    fn parses_bracketed_ipv6() {
        let addr: ServerAddress = "[::1]:6667".parse().unwrap();
        assert_eq!(addr.host, "::1");
        assert_eq!(addr.to_string(), "[::1]:6667");
    }

    #[test]
    fn rejects_malformed_addresses() {
        assert!(matches!(
            "irc.example".parse::<ServerAddress>(),
            Err(ConfigError::InvalidAddress { .. })
        ));
        assert!(matches!(
            ":6667".parse::<ServerAddress>(),
            Err(ConfigError::InvalidAddress { .. })
        ));
        assert!(matches!(
            "::1:6667".parse::<ServerAddress>(),
            Err(ConfigError::InvalidAddress { .. })
        ));
        assert_eq!(
            "irc.example:ircs".parse::<ServerAddress>(),
            Err(ConfigError::InvalidPort {
                port: "ircs".into()
            })
        );
    }

    #[test]
    fn form_requires_name_and_address() {
        assert_eq!(
            SessionConfig::from_form(&form("net1", "  "), "zuse"),
            Err(ConfigError::MissingField)
        );
        assert_eq!(
            SessionConfig::from_form(&form("", "irc.example:6697"), "zuse"),
            Err(ConfigError::MissingField)
        );
    }

    #[test]
    fn form_fills_defaults_and_splits_channels() {
        let mut f = form(" net1 ", "irc.example:6697");
        f.tls = "Yes".into();
        f.channels = "#a, #b,,#a ,".into();

        let cfg = SessionConfig::from_form(&f, "zuse").unwrap();
        assert_eq!(cfg.name, "net1");
        assert_eq!(cfg.nick, "zuse");
        assert!(cfg.tls);
        assert_eq!(cfg.channels, vec!["#a", "#b"]);
    }

    #[test]
    fn flag_values() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("no"));
    }
}
