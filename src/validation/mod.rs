pub mod rules;

use crate::core::address::FieldAddress;
use crate::core::value::Value;
use crate::state::field::FieldState;
use crate::state::tree::{FieldNode, FormState};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Rule function contract: `(value, override_message, args)`. `None` or an
/// empty string means valid; anything else is the field's error.
pub type RuleFn = Arc<dyn Fn(&Value, Option<&str>, &RuleArgs) -> Option<String> + Send + Sync>;

/// Read access to the current values a rule may depend on.
pub trait FieldLookup {
    fn field_value(&self, name: &str) -> Option<&Value>;
}

impl FieldLookup for IndexMap<String, Value> {
    fn field_value(&self, name: &str) -> Option<&Value> {
        self.get(name)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleArgs {
    /// Field whose current value is handed to the rule as `dependency_field_value`.
    pub dependency_field_name: Option<String>,
    /// Resolved per call from `dependency_field_name`; never cached on the rule.
    pub dependency_field_value: Option<Value>,
    /// Field gating whether the rule runs at all.
    pub dependency_field: Option<String>,
    pub dependency_value: Option<Value>,
    pub extra: IndexMap<String, Value>,
}

impl RuleArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dependency_field_name(mut self, name: impl Into<String>) -> Self {
        self.dependency_field_name = Some(name.into());
        self
    }

    /// Only run the rule when `field` holds `value` (or, with `None`, any
    /// non-empty value).
    pub fn with_dependency(mut self, field: impl Into<String>, value: Option<Value>) -> Self {
        self.dependency_field = Some(field.into());
        self.dependency_value = value;
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    fn resolved(&self, snapshot: &dyn FieldLookup) -> Self {
        let mut args = self.clone();
        if let Some(name) = self.dependency_field_name.as_deref() {
            args.dependency_field_value = snapshot.field_value(name).cloned();
        }
        args
    }
}

#[derive(Clone)]
pub struct RuleCheck {
    pub name: Option<String>,
    pub check: RuleFn,
    pub message: Option<String>,
    pub args: RuleArgs,
}

#[derive(Clone)]
pub enum ValidationRule {
    Check(RuleCheck),
    /// Not a check on this field: stops evaluation of the remaining rules and
    /// marks `target` for re-validation once this field is committed.
    ValidateAnotherField(String),
}

impl ValidationRule {
    pub fn check<F>(check: F) -> Self
    where
        F: Fn(&Value, Option<&str>, &RuleArgs) -> Option<String> + Send + Sync + 'static,
    {
        Self::from_fn(Arc::new(check))
    }

    pub fn from_fn(check: RuleFn) -> Self {
        Self::Check(RuleCheck {
            name: None,
            check,
            message: None,
            args: RuleArgs::default(),
        })
    }

    pub fn validate_another_field(target: impl Into<String>) -> Self {
        Self::ValidateAnotherField(target.into())
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        if let Self::Check(check) = &mut self {
            check.name = Some(name.into());
        }
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        if let Self::Check(check) = &mut self {
            check.message = Some(message.into());
        }
        self
    }

    pub fn with_args(mut self, args: RuleArgs) -> Self {
        if let Self::Check(check) = &mut self {
            check.args = args;
        }
        self
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Check(check) => check.name.as_deref(),
            Self::ValidateAnotherField(_) => None,
        }
    }
}

impl fmt::Debug for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Check(check) => f
                .debug_struct("Check")
                .field("name", &check.name)
                .field("message", &check.message)
                .field("args", &check.args)
                .finish_non_exhaustive(),
            Self::ValidateAnotherField(target) => {
                f.debug_tuple("ValidateAnotherField").field(target).finish()
            }
        }
    }
}

/// Runs the field's own rules against its current value.
pub fn validate_field(state: &FieldState, snapshot: &dyn FieldLookup) -> String {
    validate_value(&state.validation_rules, &state.value, snapshot, None)
}

/// First failing rule wins. `extra` takes precedence over `snapshot` when a
/// rule's dependency condition is looked up.
pub fn validate_value(
    rules: &[ValidationRule],
    value: &Value,
    snapshot: &dyn FieldLookup,
    extra: Option<&dyn FieldLookup>,
) -> String {
    for rule in rules {
        match rule {
            ValidationRule::ValidateAnotherField(target) => {
                trace!(target_field = %target, "rule evaluation stopped at cross-field marker");
                break;
            }
            ValidationRule::Check(check) => {
                if !dependency_satisfied(&check.args, snapshot, extra) {
                    trace!(rule = ?check.name, "dependency condition not met, rule skipped");
                    continue;
                }
                let args = check.args.resolved(snapshot);
                if let Some(error) = (check.check)(value, check.message.as_deref(), &args)
                    && !error.is_empty()
                {
                    trace!(rule = ?check.name, %error, "rule failed");
                    return error;
                }
            }
        }
    }
    String::new()
}

/// Externally computed error for one (sub-)field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub address: FieldAddress,
    pub field_error: String,
}

impl FieldError {
    pub fn new(address: impl Into<FieldAddress>, field_error: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            field_error: field_error.into(),
        }
    }
}

/// Whole-form pass: every field runs its own rules only, no propagation.
/// Dynamic sub-fields validate against their item record; hidden fields
/// report no error.
pub fn validate_form(state: &FormState, extra: Option<&dyn FieldLookup>) -> Vec<FieldError> {
    let mut errors = Vec::new();
    for (name, node) in state.iter() {
        match node {
            FieldNode::Standard(field) => {
                errors.push(FieldError::new(
                    FieldAddress::field(name),
                    own_error(field, state, extra),
                ));
            }
            FieldNode::Dynamic(dynamic) => {
                for (index, record) in dynamic.value.iter().enumerate() {
                    for (sub_field, field) in record.iter() {
                        errors.push(FieldError::new(
                            FieldAddress::item(name, index, sub_field.as_str()),
                            own_error(field, &**record, extra),
                        ));
                    }
                }
            }
        }
    }
    errors
}

fn own_error(field: &FieldState, snapshot: &dyn FieldLookup, extra: Option<&dyn FieldLookup>) -> String {
    if !field.is_visible {
        return String::new();
    }
    validate_value(&field.validation_rules, &field.value, snapshot, extra)
}

/// The field a committed change must re-validate, if any rule declares one.
pub fn propagation_target(rules: &[ValidationRule]) -> Option<&str> {
    rules.iter().find_map(|rule| match rule {
        ValidationRule::ValidateAnotherField(target) => Some(target.as_str()),
        ValidationRule::Check(_) => None,
    })
}

fn dependency_satisfied(
    args: &RuleArgs,
    snapshot: &dyn FieldLookup,
    extra: Option<&dyn FieldLookup>,
) -> bool {
    let Some(field) = args.dependency_field.as_deref() else {
        return true;
    };
    let current = extra
        .and_then(|values| values.field_value(field))
        .or_else(|| snapshot.field_value(field));
    let Some(current) = current else {
        return false;
    };
    match &args.dependency_value {
        Some(expected) => current == expected || current.unwrap_option() == expected,
        None => !current.is_missing(),
    }
}
