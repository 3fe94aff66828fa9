//! Result holder a dependent-field callback fills in.

use dynaform_types::FieldOptions;

/// What a callback decided for its field.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Materialization {
    /// Leave the field out, removing it when present.
    #[default]
    NotRequested,
    /// Add the field with the given type (host default when `None`) and options.
    Requested {
        field_type: Option<String>,
        options: FieldOptions,
    },
}

/// Handed to a callback right before it runs; untouched means "no field".
///
/// Requesting more than once is allowed and the last request wins, so a
/// callback can request conditionally from several branches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependentField {
    field_type: Option<String>,
    options: FieldOptions,
    requested: bool,
}

impl DependentField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests the field as `field_type` with `options`.
    pub fn request(&mut self, field_type: impl Into<String>, options: FieldOptions) -> &mut Self {
        self.field_type = Some(field_type.into());
        self.options = options;
        self.requested = true;
        self
    }

    /// Requests the field with the host's default type.
    pub fn request_untyped(&mut self, options: FieldOptions) -> &mut Self {
        self.field_type = None;
        self.options = options;
        self.requested = true;
        self
    }

    pub fn field_type(&self) -> Option<&str> {
        self.field_type.as_deref()
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    pub fn is_requested(&self) -> bool {
        self.requested
    }

    pub fn into_materialization(self) -> Materialization {
        if self.requested {
            Materialization::Requested {
                field_type: self.field_type,
                options: self.options,
            }
        } else {
            Materialization::NotRequested
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;
    use serde_json::json;

    #[test]
    fn untouched_field_is_not_requested() {
        let field = DependentField::new();
        assert!(!field.is_requested());
        assert_eq!(field.field_type(), None);
        assert!(field.options().is_empty());
        assert_eq!(field.into_materialization(), Materialization::NotRequested);
    }

    #[test]
    fn last_request_wins() {
        let mut field = DependentField::new();
        field
            .request("text", indexmap! {"label".into() => json!("State")})
            .request("choice", indexmap! {"choices".into() => json!(["MI", "CA"])});

        assert!(field.is_requested());
        assert_eq!(field.field_type(), Some("choice"));
        assert_eq!(field.options().get("choices"), Some(&json!(["MI", "CA"])));
        assert!(field.options().get("label").is_none());
    }

    #[test]
    fn untyped_request_leaves_type_to_host() {
        let mut field = DependentField::new();
        field.request("choice", FieldOptions::new()).request_untyped(FieldOptions::new());

        assert_eq!(
            field.into_materialization(),
            Materialization::Requested {
                field_type: None,
                options: FieldOptions::new(),
            }
        );
    }
}
