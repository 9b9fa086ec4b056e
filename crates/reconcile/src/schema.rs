//! Static resource schemas
//!
//! A [`ResourceKind`] declares, once per kind of remote entity, which
//! attributes exist and how each one behaves during reconciliation. Kinds are
//! plain `const` data so a catalogue of them can live in a `static`.

use crate::attributes::AttributeSet;
use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{LazyLock, Mutex, PoisonError};

/// Compiled attribute patterns, keyed by source
static PATTERNS: LazyLock<Mutex<HashMap<&'static str, Regex>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Compile `pattern` once per process.
fn compiled(pattern: &'static str) -> std::result::Result<Regex, regex::Error> {
    let mut cache = PATTERNS.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(re) = cache.get(pattern) {
        return Ok(re.clone());
    }
    let re = Regex::new(pattern)?;
    cache.insert(pattern, re.clone());
    Ok(re)
}

/// Expected shape of an attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Any,
    String,
    Number,
    Bool,
    Object,
    List,
}

impl ValueType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Bool => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::List => value.is_array(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::String => "string",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Object => "object",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

/// Declaration of one attribute of a resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    /// Must appear in desired state
    pub required: bool,
    /// Assigned by the server, never sent
    pub computed: bool,
    /// May be changed in place with an update call
    pub mutable: bool,
    pub value_type: ValueType,
    /// Regular expression string values must match
    pub pattern: Option<&'static str>,
}

impl Attribute {
    const fn base(name: &'static str) -> Self {
        Self {
            name,
            required: false,
            computed: false,
            mutable: false,
            value_type: ValueType::Any,
            pattern: None,
        }
    }

    /// A required, immutable attribute
    pub const fn required(name: &'static str) -> Self {
        Self {
            required: true,
            ..Self::base(name)
        }
    }

    /// An optional, immutable attribute
    pub const fn optional(name: &'static str) -> Self {
        Self::base(name)
    }

    /// A server-assigned attribute
    pub const fn computed(name: &'static str) -> Self {
        Self {
            computed: true,
            ..Self::base(name)
        }
    }

    pub const fn mutable(self) -> Self {
        Self {
            mutable: true,
            ..self
        }
    }

    pub const fn of_type(self, value_type: ValueType) -> Self {
        Self { value_type, ..self }
    }

    pub const fn pattern(self, pattern: &'static str) -> Self {
        Self {
            pattern: Some(pattern),
            ..self
        }
    }

    /// Whether a change to this attribute forces delete and re-create
    pub fn forces_replacement(&self) -> bool {
        !self.computed && !self.mutable
    }
}

/// Static descriptor of a kind of remote resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceKind {
    /// Kind name, e.g. "account_user"
    pub name: &'static str,
    /// Attribute holding the server-assigned identifier
    pub id_attribute: &'static str,
    pub attributes: &'static [Attribute],
}

impl ResourceKind {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Every declared attribute as `(name, required, computed, mutable)`
    pub fn attributes_of(&self) -> impl Iterator<Item = (&'static str, bool, bool, bool)> + '_ {
        self.attributes
            .iter()
            .map(|a| (a.name, a.required, a.computed, a.mutable))
    }

    pub fn required(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.required)
    }

    pub fn mutable(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.mutable)
    }

    pub fn is_computed(&self, name: &str) -> bool {
        self.attribute(name).is_some_and(|a| a.computed)
    }

    /// Check the kind's own invariants.
    ///
    /// The identifier attribute must be declared, computed and immutable;
    /// computed attributes can be neither required nor mutable; names are
    /// unique; patterns compile.
    pub fn check(&self) -> Result<()> {
        let invalid = |message: String| -> Result<()> { Err(Error::validation(self.name, message)) };

        match self.attribute(self.id_attribute) {
            None => {
                return invalid(format!(
                    "identifier attribute '{}' is not declared",
                    self.id_attribute
                ));
            }
            Some(id) if !id.computed || id.mutable => {
                return invalid(format!(
                    "identifier attribute '{}' must be computed and immutable",
                    self.id_attribute
                ));
            }
            Some(_) => {}
        }

        let mut seen = HashSet::new();
        for attr in self.attributes {
            if !seen.insert(attr.name) {
                return invalid(format!("attribute '{}' declared twice", attr.name));
            }
            if attr.computed && (attr.required || attr.mutable) {
                return invalid(format!(
                    "computed attribute '{}' cannot be required or mutable",
                    attr.name
                ));
            }
            if let Some(pattern) = attr.pattern
                && let Err(e) = compiled(pattern)
            {
                return invalid(format!("attribute '{}' has a bad pattern: {e}", attr.name));
            }
        }

        Ok(())
    }

    /// Validate desired state against this kind.
    ///
    /// Computed attributes are ignored here; they are stripped before any
    /// request is built.
    pub fn validate(&self, desired: &AttributeSet) -> Result<()> {
        self.check()?;

        for name in desired.names() {
            if self.attribute(name).is_none() {
                return Err(Error::validation(
                    self.name,
                    format!("unknown attribute '{name}'"),
                ));
            }
        }

        for attr in self.attributes.iter().filter(|a| !a.computed) {
            let value = match desired.get(attr.name) {
                Some(Value::Null) | None if attr.required => {
                    return Err(Error::validation(
                        self.name,
                        format!("missing required attribute '{}'", attr.name),
                    ));
                }
                Some(Value::Null) | None => continue,
                Some(value) => value,
            };

            if !attr.value_type.accepts(value) {
                return Err(Error::validation(
                    self.name,
                    format!("attribute '{}' must be a {}", attr.name, attr.value_type),
                ));
            }

            if let Some(pattern) = attr.pattern {
                let re = compiled(pattern).map_err(|e| {
                    Error::validation(self.name, format!("bad pattern for '{}': {e}", attr.name))
                })?;
                let matched = value.as_str().is_some_and(|s| re.is_match(s));
                if !matched {
                    return Err(Error::validation(
                        self.name,
                        format!("attribute '{}' does not match {pattern}", attr.name),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Copy of `set` without computed, undeclared or null attributes.
    ///
    /// Null means unset, so it is never sent.
    pub fn payload(&self, set: &AttributeSet) -> AttributeSet {
        set.filtered(|name| {
            self.attribute(name).is_some_and(|a| !a.computed)
                && !matches!(set.get(name), Some(Value::Null))
        })
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Lookup table of resource kinds by name
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    kinds: &'static [ResourceKind],
}

impl Catalog {
    pub const fn new(kinds: &'static [ResourceKind]) -> Self {
        Self { kinds }
    }

    pub fn get(&self, name: &str) -> Option<&'static ResourceKind> {
        self.kinds.iter().find(|k| k.name == name)
    }

    pub fn kinds(&self) -> &'static [ResourceKind] {
        self.kinds
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.kinds.iter().map(|k| k.name)
    }

    /// Check every kind's invariants.
    pub fn check(&self) -> Result<()> {
        self.kinds.iter().try_for_each(ResourceKind::check)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;

    static USER: ResourceKind = ResourceKind {
        name: "account_user",
        id_attribute: "user_id",
        attributes: &[
            Attribute::computed("user_id"),
            Attribute::required("first_name").mutable(),
            Attribute::required("last_name").mutable(),
            Attribute::required("email")
                .mutable()
                .pattern(r"^[^@\s]+@[^@\s]+$"),
            Attribute::optional("admin").mutable().of_type(ValueType::Bool),
        ],
    };

    #[test]
    fn test_attribute_builders() {
        let attr = Attribute::required("name").mutable();
        assert!(attr.required && attr.mutable && !attr.computed);
        assert!(!attr.forces_replacement());

        let attr = Attribute::required("account_id");
        assert!(attr.forces_replacement());

        let attr = Attribute::computed("id");
        assert!(!attr.forces_replacement());
    }

    #[test]
    fn test_attributes_of() {
        let flags: Vec<_> = USER.attributes_of().collect();
        assert_eq!(flags[0], ("user_id", false, true, false));
        assert_eq!(flags[1], ("first_name", true, false, true));
        assert_eq!(USER.required().count(), 3);
        assert_eq!(USER.mutable().count(), 4);
    }

    #[test]
    fn test_check_accepts_valid_kind() {
        assert!(USER.check().is_ok());
    }

    #[test]
    fn test_check_rejects_mutable_identifier() {
        static BAD: ResourceKind = ResourceKind {
            name: "bad",
            id_attribute: "id",
            attributes: &[Attribute::optional("id").mutable()],
        };
        let err = BAD.check().unwrap_err();
        assert!(err.to_string().contains("computed and immutable"));
    }

    #[test]
    fn test_check_rejects_undeclared_identifier() {
        static BAD: ResourceKind = ResourceKind {
            name: "bad",
            id_attribute: "id",
            attributes: &[Attribute::required("name")],
        };
        assert!(BAD.check().is_err());
    }

    #[test]
    fn test_validate_missing_required() {
        let desired = attrs! { "first_name" => "Ann", "last_name" => "Lee" };
        let err = USER.validate(&desired).unwrap_err();
        assert!(err.to_string().contains("'email'"));
    }

    #[test]
    fn test_validate_null_required_is_missing() {
        let desired = attrs! {
            "first_name" => "Ann",
            "last_name" => "Lee",
            "email" => Value::Null,
        };
        assert!(USER.validate(&desired).is_err());
    }

    #[test]
    fn test_validate_unknown_attribute() {
        let desired = attrs! {
            "first_name" => "Ann",
            "last_name" => "Lee",
            "email" => "a@x.com",
            "nickname" => "annie",
        };
        let err = USER.validate(&desired).unwrap_err();
        assert!(err.to_string().contains("nickname"));
    }

    #[test]
    fn test_validate_type_and_pattern() {
        let desired = attrs! {
            "first_name" => "Ann",
            "last_name" => "Lee",
            "email" => "not-an-email",
        };
        assert!(USER.validate(&desired).is_err());

        let desired = attrs! {
            "first_name" => "Ann",
            "last_name" => "Lee",
            "email" => "a@x.com",
            "admin" => "yes",
        };
        let err = USER.validate(&desired).unwrap_err();
        assert!(err.to_string().contains("must be a bool"));
    }

    #[test]
    fn test_validate_ignores_computed() {
        let desired = attrs! {
            "user_id" => "42",
            "first_name" => "Ann",
            "last_name" => "Lee",
            "email" => "a@x.com",
        };
        assert!(USER.validate(&desired).is_ok());
    }

    #[test]
    fn test_payload_strips_computed() {
        let set = attrs! { "user_id" => "42", "email" => "a@x.com", "extra" => 1 };
        let payload = USER.payload(&set);
        assert_eq!(payload, attrs! { "email" => "a@x.com" });
    }

    #[test]
    fn test_payload_drops_nulls() {
        let set = attrs! { "email" => "a@x.com", "admin" => Value::Null };
        assert!(USER.validate(&attrs! {
            "first_name" => "Ann",
            "last_name" => "Lee",
            "email" => "a@x.com",
            "admin" => Value::Null,
        })
        .is_ok());
        assert_eq!(USER.payload(&set), attrs! { "email" => "a@x.com" });
    }

    #[test]
    fn test_patterns_compiled_once() {
        let pattern = r"^[^@\s]+@[^@\s]+$";
        let first = compiled(pattern).unwrap();
        let second = compiled(pattern).unwrap();
        assert_eq!(first.as_str(), second.as_str());
        assert!(PATTERNS.lock().unwrap().contains_key(pattern));
        assert!(compiled("(unclosed").is_err());
        assert!(!PATTERNS.lock().unwrap().contains_key("(unclosed"));
    }

    #[test]
    fn test_catalog_lookup() {
        static KINDS: Catalog = Catalog::new(std::slice::from_ref(&USER));
        assert!(KINDS.get("account_user").is_some());
        assert!(KINDS.get("site").is_none());
        assert_eq!(KINDS.names().collect::<Vec<_>>(), vec!["account_user"]);
        assert!(KINDS.check().is_ok());
    }
}
