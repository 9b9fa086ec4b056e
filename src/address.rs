//! Resource addresses (`kind.name`) and target filters

use anyhow::{Result, bail};
use std::fmt;

/// Key of a resource in the config and the state file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    pub kind: String,
    pub name: String,
}

impl Address {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Parse "kind.name"
    pub fn parse(s: &str) -> Result<Self> {
        match s.split_once('.') {
            Some((kind, name)) if !kind.is_empty() && valid_name(name) => {
                Ok(Self::new(kind, name))
            }
            _ => bail!("Invalid resource address '{s}' (expected KIND.NAME)"),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.name)
    }
}

/// Resource names: letters, digits, `-` and `_`
pub fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// `--target` filter: a whole kind or a single address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    kind: String,
    name: Option<String>,
}

impl Target {
    pub fn parse(s: &str) -> Result<Self> {
        let (kind, name) = match s.split_once('.') {
            Some((kind, name)) => (kind, Some(name)),
            None => (s, None),
        };
        if kind.is_empty() || name.is_some_and(|n| !valid_name(n)) {
            bail!("Invalid target '{s}' (expected KIND or KIND.NAME)");
        }
        Ok(Self {
            kind: kind.to_string(),
            name: name.map(str::to_string),
        })
    }

    pub fn matches(&self, address: &Address) -> bool {
        self.kind == address.kind && self.name.as_ref().is_none_or(|n| *n == address.name)
    }
}

/// Parse an optional `--target` value
pub fn parse_target(target: Option<&str>) -> Result<Option<Target>> {
    target.map(Target::parse).transpose()
}

/// Check an address against an optional target
pub fn selected(target: Option<&Target>, address: &Address) -> bool {
    target.is_none_or(|t| t.matches(address))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let addr = Address::parse("account_user.ann").unwrap();
        assert_eq!(addr.kind, "account_user");
        assert_eq!(addr.name, "ann");
        assert_eq!(addr.to_string(), "account_user.ann");
    }

    #[test]
    fn test_parse_address_invalid() {
        assert!(Address::parse("site").is_err());
        assert!(Address::parse(".blog").is_err());
        assert!(Address::parse("site.").is_err());
        assert!(Address::parse("site.a.b").is_err());
    }

    #[test]
    fn test_target_kind() {
        let target = Target::parse("site").unwrap();
        assert!(target.matches(&Address::new("site", "blog")));
        assert!(target.matches(&Address::new("site", "shop")));
        assert!(!target.matches(&Address::new("install", "blog")));
    }

    #[test]
    fn test_target_address() {
        let target = Target::parse("site.blog").unwrap();
        assert!(target.matches(&Address::new("site", "blog")));
        assert!(!target.matches(&Address::new("site", "shop")));
    }

    #[test]
    fn test_selected_without_target() {
        assert!(selected(None, &Address::new("cdn", "x")));
        assert!(parse_target(Some("")).is_err());
        assert!(parse_target(None).unwrap().is_none());
    }
}
