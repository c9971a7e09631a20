use crate::core::value::Value;
use crate::schema::FieldKind;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("field name is required")]
    MissingFieldName,
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("unknown sub-field '{sub_field}' in dynamic field '{field}'")]
    UnknownSubField { field: String, sub_field: String },
    #[error("field '{0}' is not a dynamic field")]
    NotDynamic(String),
    #[error("field '{0}' is dynamic and must be addressed by item index and sub-field")]
    NotStandard(String),
    #[error("item index {index} is out of range for '{field}' ({len} items)")]
    ItemOutOfRange {
        field: String,
        index: usize,
        len: usize,
    },
    #[error("invalid init value {value} for checkbox field '{field}': expected a boolean")]
    InvalidInitValue { field: String, value: Value },
    #[error("invalid default value {value} for checkbox field '{field}': expected a boolean")]
    InvalidDefaultValue { field: String, value: Value },
    #[error("{kind:?} field cannot take change {value}")]
    InvalidChange { kind: FieldKind, value: Value },
    #[error("dynamic field '{field}' expects a list of objects, got {value}")]
    InvalidDynamicValue { field: String, value: Value },
    #[error("unknown validation rule '{0}'")]
    UnknownRule(String),
    #[error("invalid arguments for rule '{rule}': {reason}")]
    InvalidRuleArgs { rule: String, reason: String },
    #[error("invalid field selector: {0}")]
    InvalidSelector(String),
    #[error("invalid schema config: {0}")]
    Config(String),
}

impl From<serde_json::Error> for FormError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for FormError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}
