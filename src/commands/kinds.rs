//! `wpe kinds` - list resource kinds, or describe one

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use reconcile::{Attribute, ResourceKind};
use wpengine::{CATALOG, Endpoint};

use crate::ui;

pub fn run(name: Option<&str>) -> Result<()> {
    match name {
        None => {
            list();
            Ok(())
        }
        Some(name) => {
            let kind = CATALOG.get(name).with_context(|| {
                let known: Vec<_> = CATALOG.names().collect();
                format!("Unknown kind '{name}' (known: {})", known.join(", "))
            })?;
            describe(kind);
            Ok(())
        }
    }
}

fn list() {
    ui::header("Resource kinds");
    for kind in CATALOG.kinds() {
        let mutable: Vec<_> = kind.mutable().map(|a| a.name).collect();
        println!(
            "  {:<14} {}",
            kind.name.bold(),
            format!("updatable: {}", or_none(&mutable)).dimmed()
        );
    }
}

fn describe(kind: &ResourceKind) {
    ui::header(kind.name);
    ui::kv("identifier", kind.id_attribute);
    if let Some(endpoint) = Endpoint::for_kind(kind.name) {
        ui::kv("create", &format!("POST {}", endpoint.collection));
        ui::kv("item", &format!("GET/PUT/DELETE {}", endpoint.item));
    }

    println!();
    for attr in kind.attributes {
        println!("  {:<16} {}", attr.name, flags(attr).dimmed());
        if let Some(pattern) = attr.pattern {
            ui::dim(&format!("  matches {pattern}"));
        }
    }
}

/// Short description of how an attribute behaves
fn flags(attr: &Attribute) -> String {
    let mut flags = vec![attr.value_type.to_string()];
    if attr.computed {
        flags.push("computed".into());
    } else {
        flags.push(if attr.required { "required" } else { "optional" }.into());
        flags.push(if attr.mutable { "updatable" } else { "forces replacement" }.into());
    }
    flags.join(", ")
}

fn or_none(names: &[&str]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wpengine::kinds::{ACCOUNT_USER, INSTALL};

    #[test]
    fn test_flags() {
        let email = ACCOUNT_USER.attribute("email").unwrap();
        assert_eq!(flags(email), "any, required, updatable");

        let name = INSTALL.attribute("name").unwrap();
        assert_eq!(flags(name), "any, required, forces replacement");

        let id = INSTALL.attribute("id").unwrap();
        assert_eq!(flags(id), "any, computed");
    }

    #[test]
    fn test_or_none() {
        assert_eq!(or_none(&[]), "none");
        assert_eq!(or_none(&["a", "b"]), "a, b");
    }

    #[test]
    fn test_unknown_kind() {
        let err = run(Some("droplet")).unwrap_err();
        assert!(err.to_string().contains("account_user"));
    }
}
