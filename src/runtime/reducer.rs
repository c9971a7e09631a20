use crate::core::address::FieldAddress;
use crate::core::error::FormError;
use crate::core::value::Value;
use crate::runtime::action::{FormAction, SetFieldValue, SetFieldValueBulk, ValueChanged};
use crate::runtime::effect::Effect;
use crate::runtime::normalizer::normalize;
use crate::schema::{FieldDescriptor, FieldKind};
use crate::state::field::FieldState;
use crate::state::tree::{FieldNode, FormState, Record, build_items};
use crate::validation::{FieldError, ValidationRule, propagation_target, validate_field};
use std::sync::Arc;
use tracing::{debug, trace};

/// Result of one transition: the committed tree plus the hooks to run on it.
#[derive(Debug)]
pub struct Transition {
    pub state: FormState,
    pub effects: Vec<Effect>,
}

pub struct Reducer;

impl Reducer {
    /// Computes the next tree. On `Err` nothing was committed and `state`
    /// is still the latest tree.
    pub fn reduce(state: &FormState, action: FormAction) -> Result<Transition, FormError> {
        let action_name = action.name();
        let mut effects = Vec::new();
        let next = match action {
            FormAction::ValueChanged(action) => value_changed(state, action, &mut effects)?,
            FormAction::SetFieldValue(action) => set_field_value(state, action, &mut effects)?,
            FormAction::SetFieldValueBulk(action) => set_bulk(state, action, &mut effects)?,
            FormAction::ValidationErrorsApplied(errors) => apply_errors(state, errors)?,
            FormAction::FieldVisibilityChanged {
                address,
                is_visible,
            } => {
                let field = state.field_at(&address)?;
                let updated = FieldState {
                    is_visible,
                    error: String::new(),
                    ..field.clone()
                };
                state.set_at(&address, updated)?
            }
            FormAction::DynamicItemAdded {
                field_name,
                init_data,
            } => {
                let record = state.build_record(&field_name, init_data.as_ref())?;
                state.append_dynamic_item(&field_name, record)?
            }
            FormAction::DynamicItemRemoved { field_name, index } => {
                state.remove_dynamic_item(&field_name, index)?
            }
        };

        debug!(
            action = action_name,
            changed = ?next.changed_fields(state),
            effects = effects.len(),
            "transition committed"
        );
        Ok(Transition {
            state: next,
            effects,
        })
    }
}

fn value_changed(
    state: &FormState,
    action: ValueChanged,
    effects: &mut Vec<Effect>,
) -> Result<FormState, FormError> {
    let ValueChanged {
        address,
        change,
        on_complete,
    } = action;
    let value = normalize(field_kind(state, &address)?, &change)?;
    let next = commit_value(state, &address, value.clone(), false)?;
    if let Some(hook) = on_complete {
        effects.push(Effect::ValueCommitted { hook, value });
    }
    Ok(next)
}

fn set_field_value(
    state: &FormState,
    action: SetFieldValue,
    effects: &mut Vec<Effect>,
) -> Result<FormState, FormError> {
    let SetFieldValue {
        full_field_name,
        new_value,
        skip_validation,
        on_complete,
    } = action;
    if full_field_name.is_empty() {
        return Err(FormError::MissingFieldName);
    }

    let next = match state.get(&full_field_name) {
        Some(FieldNode::Dynamic(_)) => {
            set_dynamic_value(state, &full_field_name, &new_value, skip_validation)?
        }
        _ => commit_value(
            state,
            &FieldAddress::field(full_field_name.as_str()),
            new_value.clone(),
            skip_validation,
        )?,
    };
    if let Some(hook) = on_complete {
        effects.push(Effect::ValueCommitted {
            hook,
            value: new_value,
        });
    }
    Ok(next)
}

fn set_bulk(
    state: &FormState,
    action: SetFieldValueBulk,
    effects: &mut Vec<Effect>,
) -> Result<FormState, FormError> {
    let SetFieldValueBulk {
        values,
        skip_validation,
        on_complete,
    } = action;

    // Write every value first so each field validates against the final tree.
    let mut next = state.clone();
    let mut standard = Vec::with_capacity(values.len());
    for (name, value) in &values {
        if name.is_empty() {
            return Err(FormError::MissingFieldName);
        }
        next = match next.get(name) {
            Some(FieldNode::Dynamic(_)) => {
                set_dynamic_value(&next, name, value, skip_validation)?
            }
            _ => {
                let field = next.field(name)?.with_value(value.clone()).with_error("");
                standard.push(name.as_str());
                next.set(name, field)?
            }
        };
    }

    if !skip_validation {
        for name in &standard {
            let validated = {
                let field = next.field(name)?;
                field.with_error(validate_field(field, &next))
            };
            next = next.set(name, validated)?;
        }
        for name in &standard {
            let rules = next.field(name)?.validation_rules.clone();
            next = propagate(next, &FieldAddress::field(*name), &rules)?;
        }
    }

    if let Some(hook) = on_complete {
        effects.push(Effect::ValuesCommitted { hook, values });
    }
    Ok(next)
}

fn apply_errors(state: &FormState, errors: Vec<FieldError>) -> Result<FormState, FormError> {
    let mut next = state.clone();
    for FieldError {
        address,
        field_error,
    } in errors
    {
        let field = next.field_at(&address)?;
        // Unchanged branches stay shared.
        if field.error == field_error {
            continue;
        }
        let updated = field.with_error(field_error);
        next = next.set_at(&address, updated)?;
    }
    Ok(next)
}

/// Validates the candidate against the tree it will live in, commits it,
/// then runs the single propagation hop declared by the field's rules.
fn commit_value(
    state: &FormState,
    address: &FieldAddress,
    value: Value,
    skip_validation: bool,
) -> Result<FormState, FormError> {
    let current = state.field_at(address)?;
    let candidate = current.with_value(value);
    if skip_validation {
        return state.set_at(address, candidate.with_error(""));
    }

    let provisional = state.set_at(address, candidate.clone())?;
    let error = match address {
        FieldAddress::Field(_) => validate_field(&candidate, &provisional),
        FieldAddress::Item { field, index, .. } => {
            validate_field(&candidate, provisional.record(field, *index)?)
        }
    };
    let committed = provisional.set_at(address, candidate.with_error(error))?;
    propagate(committed, address, &current.validation_rules)
}

/// Re-validates the `validateAnotherField` target of `rules` once. Targets of
/// a dynamic sub-field are resolved within the same item.
fn propagate(
    state: FormState,
    source: &FieldAddress,
    rules: &[ValidationRule],
) -> Result<FormState, FormError> {
    let Some(target) = propagation_target(rules) else {
        return Ok(state);
    };
    let target = match source {
        FieldAddress::Field(_) => FieldAddress::field(target),
        FieldAddress::Item { field, index, .. } => {
            FieldAddress::item(field.as_str(), *index, target)
        }
    };

    let revalidated = {
        let field = state.field_at(&target)?;
        let error = match &target {
            FieldAddress::Field(_) => validate_field(field, &state),
            FieldAddress::Item { field: name, index, .. } => {
                validate_field(field, state.record(name, *index)?)
            }
        };
        trace!(source = %source, target_field = %target, %error, "propagated validation");
        field.with_error(error)
    };
    state.set_at(&target, revalidated)
}

fn set_dynamic_value(
    state: &FormState,
    name: &str,
    value: &Value,
    skip_validation: bool,
) -> Result<FormState, FormError> {
    let descriptor = state
        .schema()
        .get(name)
        .and_then(FieldDescriptor::as_dynamic)
        .ok_or_else(|| FormError::NotDynamic(name.to_string()))?;
    let items = build_items(name, descriptor, Some(value))?
        .value
        .into_iter()
        .map(Arc::unwrap_or_clone)
        .map(|record| {
            if skip_validation {
                record
            } else {
                validate_record(record)
            }
        })
        .collect();
    state.replace_dynamic_items(name, items)
}

fn validate_record(record: Record) -> Record {
    let errors: Vec<String> = record
        .values()
        .map(|field| validate_field(field, &record))
        .collect();
    record
        .into_iter()
        .zip(errors)
        .map(|((name, field), error)| (name, FieldState { error, ..field }))
        .collect()
}

fn field_kind(state: &FormState, address: &FieldAddress) -> Result<FieldKind, FormError> {
    let name = address.field_name();
    if name.is_empty() {
        return Err(FormError::MissingFieldName);
    }
    let descriptor = state
        .schema()
        .get(name)
        .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
    match (descriptor, address) {
        (FieldDescriptor::Standard(standard), FieldAddress::Field(_)) => Ok(standard.kind),
        (FieldDescriptor::Dynamic(dynamic), FieldAddress::Item { sub_field, .. }) => dynamic
            .sub_field(sub_field)
            .map(|standard| standard.kind)
            .ok_or_else(|| FormError::UnknownSubField {
                field: name.to_string(),
                sub_field: sub_field.clone(),
            }),
        (FieldDescriptor::Dynamic(_), FieldAddress::Field(_)) => {
            Err(FormError::NotStandard(name.to_string()))
        }
        (FieldDescriptor::Standard(_), FieldAddress::Item { .. }) => {
            Err(FormError::NotDynamic(name.to_string()))
        }
    }
}
