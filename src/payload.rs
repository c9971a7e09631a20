use crate::core::value::Value;
use crate::state::tree::{FieldNode, FormState, Record};
use indexmap::IndexMap;

/// Submission payload: blanks become `null`, option objects collapse to their
/// inner `value`, dynamic items become lists of prepared objects.
pub fn prepare_for_server(state: &FormState) -> IndexMap<String, Value> {
    state
        .iter()
        .map(|(name, node)| {
            let prepared = match node {
                FieldNode::Standard(field) => prepare_value(&field.value),
                FieldNode::Dynamic(dynamic) => Value::List(
                    dynamic
                        .value
                        .iter()
                        .map(|record| prepare_record(record))
                        .collect(),
                ),
            };
            (name.to_string(), prepared)
        })
        .collect()
}

/// One field's prepared value. An option whose own `value` is an object is
/// emitted as that object, not unwrapped again.
pub fn prepare_value(value: &Value) -> Value {
    if value.is_blank() {
        return Value::Null;
    }
    if let Some(inner) = value.option_value() {
        return inner.clone();
    }
    match value {
        Value::List(items) => Value::List(
            items
                .iter()
                .map(|item| item.unwrap_option().clone())
                .collect(),
        ),
        other => other.clone(),
    }
}

fn prepare_record(record: &Record) -> Value {
    Value::Object(
        record
            .iter()
            .map(|(name, field)| (name.clone(), prepare_value(&field.value)))
            .collect(),
    )
}

/// Plain copy of every field's value; dynamic fields become lists of
/// `sub_field -> value` objects.
pub fn clone_state_values(state: &FormState) -> IndexMap<String, Value> {
    state
        .iter()
        .map(|(name, node)| {
            let value = match node {
                FieldNode::Standard(field) => field.value.clone(),
                FieldNode::Dynamic(dynamic) => Value::List(
                    dynamic
                        .value
                        .iter()
                        .map(|record| record_values(record))
                        .collect(),
                ),
            };
            (name.to_string(), value)
        })
        .collect()
}

pub(crate) fn record_values(record: &Record) -> Value {
    Value::Object(
        record
            .iter()
            .map(|(name, field)| (name.clone(), field.value.clone()))
            .collect(),
    )
}
