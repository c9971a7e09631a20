use crate::core::error::FormError;
use crate::core::value::Value;
use crate::schema::{FieldKind, StandardDescriptor};
use crate::validation::ValidationRule;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldState {
    pub value: Value,
    /// Result of the latest validation run against `value`; empty means valid.
    pub error: String,
    #[serde(skip)]
    pub validation_rules: Arc<[ValidationRule]>,
    pub is_visible: bool,
    pub disabled: bool,
    pub use_second_label: bool,
}

impl FieldState {
    /// Builds the first state of a field. Validation does not run here.
    pub fn init(
        name: &str,
        descriptor: &StandardDescriptor,
        init_value: Option<&Value>,
    ) -> Result<Self, FormError> {
        Ok(Self {
            value: initial_value(name, descriptor, init_value)?,
            error: String::new(),
            validation_rules: Arc::from(descriptor.validation_rules.as_slice()),
            is_visible: descriptor.is_visible,
            disabled: descriptor.disabled,
            use_second_label: descriptor.use_second_label,
        })
    }

    pub fn with_value(&self, value: Value) -> Self {
        Self {
            value,
            ..self.clone()
        }
    }

    pub fn with_error(&self, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..self.clone()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_empty()
    }
}

fn initial_value(
    name: &str,
    descriptor: &StandardDescriptor,
    init_value: Option<&Value>,
) -> Result<Value, FormError> {
    if descriptor.kind == FieldKind::Checkbox {
        if let Some(value) = init_value {
            return match value {
                Value::Bool(_) => Ok(value.clone()),
                other => Err(FormError::InvalidInitValue {
                    field: name.to_string(),
                    value: other.clone(),
                }),
            };
        }
        return match &descriptor.default_value {
            None => Ok(Value::Bool(false)),
            Some(Value::Bool(flag)) => Ok(Value::Bool(*flag)),
            Some(other) => Err(FormError::InvalidDefaultValue {
                field: name.to_string(),
                value: other.clone(),
            }),
        };
    }

    match init_value {
        Some(value) if !matches!(value, Value::Null) => Ok(value.clone()),
        _ => Ok(descriptor
            .default_value
            .clone()
            .unwrap_or_else(|| Value::text(""))),
    }
}
