//! # Dynaform Engine
//!
//! Lets a form declare fields whose existence, type, and options depend on the
//! values of other fields. Values are observed while the form is populated
//! with initial data and again after it is submitted, so a field can appear,
//! disappear, or change shape from one request to the next.
//!
//! ## Key Features
//!
//! - **Dependent fields**: a callback per field decides, from the dependency
//!   values, whether the field exists and how it is configured
//! - **Chains**: a dependent field can itself be a dependency of another one
//! - **Error masking**: a dependent field that rejected a stale submitted
//!   value keeps the form invalid without showing a misleading message
//! - **Host agnostic**: works against any [`dynaform_types::FormBuilderHandle`] implementation
//!
//! ## Usage
//!
//! ```rust
//! use dynaform_engine::DynamicFormBuilder;
//! use dynaform_form::FormBuilder;
//! use dynaform_types::{FormBuilderHandle, FormHandle};
//! use indexmap::indexmap;
//! use serde_json::json;
//!
//! let builder = DynamicFormBuilder::new(FormBuilder::root("address", json!({"country": "US"})));
//! builder.add("country", Some("choice"), indexmap! {"choices".into() => json!(["US", "CA"])})?;
//! builder.add_dependent("state", "country", |field, values| {
//!     let choices = match values[0].as_str() {
//!         Some("US") => json!(["MI", "CA"]),
//!         Some("CA") => json!(["ON", "QC"]),
//!         _ => return Ok(()),
//!     };
//!     field.request("choice", indexmap! {"choices".into() => choices});
//!     Ok(())
//! });
//!
//! let form = builder.get_form()?;
//! assert!(form.has("state"));
//!
//! form.submit(json!({"country": "CA", "state": "ON"}))?;
//! assert!(form.is_valid());
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - **`dependent_field`**: what a callback fills in
//! - **`config`**: one declared dependent field with its readiness rules
//! - **`builder`**: the orchestrator wrapping a host builder
//! - **`error`**: engine failures

pub mod builder;
pub mod config;
pub mod dependent_field;
pub mod error;

pub use builder::DynamicFormBuilder;
pub use config::{DependentCallback, Dependencies, DependentFieldConfig};
pub use dependent_field::{DependentField, Materialization};
pub use error::DynamicFormError;
