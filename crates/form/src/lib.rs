//! In-memory reference form host.
//!
//! Implements the [`dynaform_types::host`] contract with shared, interior
//! mutable handles so that listeners can reshape a form while it is being
//! populated or submitted. It exists to exercise the dependency engine; it
//! does not render markup or bind HTTP requests.
//!
//! ```rust
//! use dynaform_form::FormBuilder;
//! use dynaform_types::{FormBuilderHandle, FormHandle};
//! use indexmap::indexmap;
//! use serde_json::json;
//!
//! let builder = FormBuilder::root("address", json!({"country": "US"}));
//! builder.add("country", Some("choice"), indexmap! {"choices".into() => json!(["US", "CA"])})?;
//!
//! let form = builder.get_form()?;
//! form.submit(json!({"country": "CA"}))?;
//! assert!(form.is_valid());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod builder;
pub mod dispatcher;
pub mod error;
pub mod field_type;
pub mod form;
pub mod validation;

pub use builder::{FormBuilder, VALIDATION_LISTENER_PRIORITY};
pub use error::FormHostError;
pub use field_type::{ChoiceEntry, FieldKind};
pub use form::{Form, FormView};
