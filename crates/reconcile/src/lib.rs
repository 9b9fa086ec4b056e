//! # Reconcile
//!
//! A generic engine for converging remote resources.
//!
//! This crate compares the attributes a caller wants with the attributes a
//! remote management API reports, and issues the minimal create, update or
//! delete calls needed to make them match.
//!
//! ## Core Concepts
//!
//! - **ResourceKind**: Static schema of a remote resource type
//! - **ResourceInstance**: One resource being reconciled, with its remote identity
//! - **RemoteClient**: CRUD calls against the remote API
//! - **Reconciler**: The state machine driving the client
//!
//! ## Example
//!
//! ```
//! use reconcile::{attrs, Attribute, MockClient, Outcome, Reconciler, ResourceInstance, ResourceKind};
//!
//! static USER: ResourceKind = ResourceKind {
//!     name: "account_user",
//!     id_attribute: "user_id",
//!     attributes: &[
//!         Attribute::computed("user_id"),
//!         Attribute::required("first_name").mutable(),
//!         Attribute::required("last_name").mutable(),
//!         Attribute::required("email").mutable(),
//!     ],
//! };
//!
//! let client = MockClient::with_next_id(42);
//! let reconciler = Reconciler::new(&client);
//!
//! let mut user = ResourceInstance::new(
//!     &USER,
//!     attrs! { "first_name" => "Ann", "last_name" => "Lee", "email" => "a@x.com" },
//! );
//!
//! let outcome = reconciler.reconcile(&mut user)?;
//! assert_eq!(outcome, Outcome::Created { remote_id: "42".into() });
//!
//! // Converged: nothing left to do
//! assert_eq!(reconciler.reconcile(&mut user)?, Outcome::NoChange);
//! # Ok::<(), reconcile::Error>(())
//! ```
//!
//! ## Failure Model
//!
//! Every failure carries an [`ErrorCategory`]. Only transport failures are
//! retryable, and the engine never retries on its own; retry policy belongs
//! to the caller.

pub mod attributes;
pub mod client;
pub mod diff;
pub mod error;
pub mod instance;
pub mod reconciler;
pub mod schema;
pub mod types;

// Used by the `attrs!` macro
pub use serde_json;

// Re-export main types at crate root
pub use attributes::{AttributeSet, values_equal};
pub use client::{Call, MockClient, Operation, RemoteClient};
pub use diff::{ChangeSet, diff};
pub use error::{Error, ErrorCategory, Result};
pub use instance::{Phase, ResourceInstance};
pub use reconciler::{Reconciler, plan};
pub use schema::{Attribute, Catalog, ResourceKind, ValueType};
pub use types::{Action, Outcome, Summary};
