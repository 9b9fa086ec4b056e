//! URL paths for each resource kind.

use reconcile::{AttributeSet, Error, ResourceKind, Result};
use serde_json::Value;

/// Paths for one resource kind, relative to the API base URL.
///
/// The collection path is used by create and may contain `{attribute}`
/// placeholders filled from the desired attributes. The item path is used by
/// read, update and delete and contains `{id}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub collection: &'static str,
    pub item: &'static str,
}

impl Endpoint {
    const fn new(collection: &'static str, item: &'static str) -> Self {
        Self { collection, item }
    }

    /// Look up the endpoint of a kind by name.
    #[must_use]
    pub fn for_kind(name: &str) -> Option<Self> {
        let endpoint = match name {
            "account" => Self::new("/accounts", "/accounts/{id}"),
            "account_user" => Self::new("/accounts/{account_id}/account_users", "/users/{id}"),
            "site" => Self::new("/sites", "/sites/{id}"),
            "install" => Self::new("/installs", "/installs/{id}"),
            "domain" => Self::new("/domains", "/domains/{id}"),
            "ssh_key" => Self::new("/ssh_keys", "/ssh_keys/{id}"),
            "cdn" => Self::new("/cdns", "/cdns/{id}"),
            _ => return None,
        };
        Some(endpoint)
    }

    /// Render the create path and the request body.
    ///
    /// Attributes consumed by the path are removed from the body.
    pub fn collection_path(
        &self,
        kind: &ResourceKind,
        attributes: &AttributeSet,
    ) -> Result<(String, AttributeSet)> {
        let mut body = attributes.clone();
        let mut path = String::with_capacity(self.collection.len());
        let mut rest = self.collection;

        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let name = &rest[start + 1..start + len];
            let value = body
                .remove(name)
                .and_then(|v| segment(&v))
                .ok_or_else(|| {
                    Error::validation(kind.name, format!("'{name}' is required to build the request path"))
                })?;
            check_segment(kind, name, &value)?;

            path.push_str(&rest[..start]);
            path.push_str(&value);
            rest = &rest[start + len + 1..];
        }
        path.push_str(rest);

        Ok((path, body))
    }

    /// Render the path of one entity.
    pub fn item_path(&self, kind: &ResourceKind, remote_id: &str) -> Result<String> {
        check_segment(kind, kind.id_attribute, remote_id)?;
        Ok(self.item.replace("{id}", remote_id))
    }
}

fn segment(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Path segments are interpolated verbatim, so only plain identifiers pass.
fn check_segment(kind: &ResourceKind, name: &str, value: &str) -> Result<()> {
    // "." and ".." would be resolved as relative references
    let plain = !value.is_empty()
        && !value.chars().all(|c| c == '.')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if plain {
        Ok(())
    } else {
        Err(Error::validation(
            kind.name,
            format!("'{name}' is not a valid path segment: {value:?}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds::{ACCOUNT_USER, CATALOG, SSH_KEY};
    use reconcile::attrs;

    #[test]
    fn test_every_kind_has_endpoint() {
        for name in CATALOG.names() {
            let endpoint = Endpoint::for_kind(name).unwrap();
            assert!(endpoint.item.contains("{id}"), "{name}");
        }
        assert!(Endpoint::for_kind("backup").is_none());
    }

    #[test]
    fn test_account_user_collection_consumes_account_id() {
        let endpoint = Endpoint::for_kind("account_user").unwrap();
        let attributes = attrs! {
            "account_id" => "acct-1",
            "first_name" => "Ann",
            "last_name" => "Lee",
            "email" => "a@x.com",
        };

        let (path, body) = endpoint.collection_path(&ACCOUNT_USER, &attributes).unwrap();

        assert_eq!(path, "/accounts/acct-1/account_users");
        assert_eq!(
            body,
            attrs! { "first_name" => "Ann", "last_name" => "Lee", "email" => "a@x.com" }
        );
    }

    #[test]
    fn test_collection_missing_placeholder() {
        let endpoint = Endpoint::for_kind("account_user").unwrap();
        let err = endpoint
            .collection_path(&ACCOUNT_USER, &attrs! { "first_name" => "Ann" })
            .unwrap_err();
        assert!(err.to_string().contains("account_id"));
    }

    #[test]
    fn test_collection_without_placeholders_keeps_body() {
        let endpoint = Endpoint::for_kind("ssh_key").unwrap();
        let attributes = attrs! { "public_key" => "ssh-ed25519 AAAA" };
        let (path, body) = endpoint.collection_path(&SSH_KEY, &attributes).unwrap();
        assert_eq!(path, "/ssh_keys");
        assert_eq!(body, attributes);
    }

    #[test]
    fn test_item_path() {
        let endpoint = Endpoint::for_kind("account_user").unwrap();
        assert_eq!(endpoint.item_path(&ACCOUNT_USER, "42").unwrap(), "/users/42");
        assert!(endpoint.item_path(&ACCOUNT_USER, "../accounts").is_err());
        assert!(endpoint.item_path(&ACCOUNT_USER, "").is_err());
    }

    #[test]
    fn test_dot_segments_rejected() {
        let endpoint = Endpoint::for_kind("account_user").unwrap();
        assert!(endpoint.item_path(&ACCOUNT_USER, "..").is_err());
        assert!(endpoint.item_path(&ACCOUNT_USER, ".").is_err());
        assert!(endpoint.item_path(&ACCOUNT_USER, "...").is_err());
        assert_eq!(endpoint.item_path(&ACCOUNT_USER, "v1.2").unwrap(), "/users/v1.2");

        let err = endpoint
            .collection_path(
                &ACCOUNT_USER,
                &attrs! { "account_id" => "..", "first_name" => "Ann" },
            )
            .unwrap_err();
        assert!(err.to_string().contains("account_id"));
    }
}
