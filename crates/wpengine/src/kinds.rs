//! Resource kinds exposed by the WP Engine API.
//!
//! Each kind is a static schema table; the generic reconciler needs nothing
//! else to manage it.

use reconcile::{Attribute, Catalog, ResourceKind, ValueType};

/// Install names: 3 to 14 lowercase letters and digits, starting with a letter.
const INSTALL_NAME: &str = "^[a-z][a-z0-9]{2,13}$";

const ENVIRONMENT: &str = "^(production|staging|development)$";

const EMAIL: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

const DOMAIN_NAME: &str = r"^([a-z0-9-]+\.)+[a-z]{2,}$";

pub const ACCOUNT: ResourceKind = ResourceKind {
    name: "account",
    id_attribute: "id",
    attributes: &[
        Attribute::computed("id"),
        Attribute::required("name").mutable(),
        Attribute::computed("created_on"),
    ],
};

/// Created under an account, then addressed on its own by `user_id`.
pub const ACCOUNT_USER: ResourceKind = ResourceKind {
    name: "account_user",
    id_attribute: "user_id",
    attributes: &[
        Attribute::computed("user_id"),
        Attribute::required("account_id"),
        Attribute::required("first_name").mutable(),
        Attribute::required("last_name").mutable(),
        Attribute::required("email").mutable().pattern(EMAIL),
        Attribute::optional("roles").mutable(),
        Attribute::optional("install_ids")
            .mutable()
            .of_type(ValueType::List),
        Attribute::computed("invite_accepted"),
        Attribute::computed("mfa_enabled"),
    ],
};

pub const SITE: ResourceKind = ResourceKind {
    name: "site",
    id_attribute: "id",
    attributes: &[
        Attribute::computed("id"),
        Attribute::required("name").mutable(),
        Attribute::required("account_id"),
        Attribute::computed("group_name"),
        Attribute::computed("installs"),
    ],
};

pub const INSTALL: ResourceKind = ResourceKind {
    name: "install",
    id_attribute: "id",
    attributes: &[
        Attribute::computed("id"),
        Attribute::required("name").pattern(INSTALL_NAME),
        Attribute::required("account_id"),
        Attribute::optional("site_id"),
        Attribute::optional("environment")
            .mutable()
            .pattern(ENVIRONMENT),
        Attribute::computed("primary_domain"),
        Attribute::computed("cname"),
        Attribute::computed("php_version"),
        Attribute::computed("status"),
        Attribute::computed("is_multisite"),
    ],
};

pub const DOMAIN: ResourceKind = ResourceKind {
    name: "domain",
    id_attribute: "id",
    attributes: &[
        Attribute::computed("id"),
        Attribute::required("install_id"),
        Attribute::required("name").pattern(DOMAIN_NAME),
        Attribute::optional("primary")
            .mutable()
            .of_type(ValueType::Bool),
        Attribute::optional("redirect_to").mutable(),
        Attribute::computed("duplicate"),
        Attribute::computed("network_type"),
    ],
};

pub const SSH_KEY: ResourceKind = ResourceKind {
    name: "ssh_key",
    id_attribute: "id",
    attributes: &[
        Attribute::computed("id"),
        Attribute::required("public_key"),
        Attribute::computed("comment"),
        Attribute::computed("fingerprint"),
        Attribute::computed("created_at"),
    ],
};

pub const CDN: ResourceKind = ResourceKind {
    name: "cdn",
    id_attribute: "id",
    attributes: &[
        Attribute::computed("id"),
        Attribute::required("install_id"),
        Attribute::required("domain").pattern(DOMAIN_NAME),
        Attribute::optional("enabled")
            .mutable()
            .of_type(ValueType::Bool),
        Attribute::computed("status"),
    ],
};

static KINDS: [ResourceKind; 7] = [ACCOUNT, ACCOUNT_USER, SITE, INSTALL, DOMAIN, SSH_KEY, CDN];

/// Every kind the WP Engine API client can manage.
pub static CATALOG: Catalog = Catalog::new(&KINDS);
