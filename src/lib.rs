pub mod core;
pub mod form;
pub mod payload;
pub mod runtime;
pub mod schema;
pub mod state;
pub mod validation;

pub use crate::core::address::FieldAddress;
pub use crate::core::error::FormError;
pub use crate::core::value::Value;
pub use form::{FieldView, Form};
pub use payload::{clone_state_values, prepare_for_server};
pub use runtime::action::{FormAction, SetFieldValue, SetFieldValueBulk, ValueChanged};
pub use runtime::normalizer::ChangeNotification;
pub use runtime::reducer::{Reducer, Transition};
pub use schema::{
    DynamicDescriptor, FieldDescriptor, FieldKind, RuleRegistry, Schema, StandardDescriptor,
};
pub use state::{DynamicFieldState, FieldNode, FieldState, FormState, Record};
pub use validation::{FieldError, RuleArgs, ValidationRule, rules};
