use crate::core::error::FormError;
use crate::core::value::Value;
use crate::schema::FieldKind;

/// Raw change notification handed over by the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeNotification {
    /// An input-like control reporting its current text and checked flag.
    Target { value: String, checked: bool },
    /// A select-like control reporting the new value itself.
    Selection(Value),
}

impl ChangeNotification {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Target {
            value: value.into(),
            checked: false,
        }
    }

    pub fn checked(checked: bool) -> Self {
        Self::Target {
            value: String::new(),
            checked,
        }
    }

    pub fn selection(value: impl Into<Value>) -> Self {
        Self::Selection(value.into())
    }
}

/// Typed value to store for a change of a field of `kind`.
pub fn normalize(kind: FieldKind, change: &ChangeNotification) -> Result<Value, FormError> {
    match kind {
        FieldKind::Text | FieldKind::TextArea | FieldKind::DatePicker => Ok(carried_value(change)),
        // The notification already is the option, option list or null.
        FieldKind::Select | FieldKind::MultiSelect => Ok(carried_value(change)),
        // RADIOGROUP stores the checked flag of the notifying radio, not the
        // chosen option; the rendering layer maps it back.
        FieldKind::Checkbox | FieldKind::RadioGroup => checked_flag(kind, change),
    }
}

fn carried_value(change: &ChangeNotification) -> Value {
    match change {
        ChangeNotification::Target { value, .. } => Value::Text(value.clone()),
        ChangeNotification::Selection(value) => value.clone(),
    }
}

fn checked_flag(kind: FieldKind, change: &ChangeNotification) -> Result<Value, FormError> {
    match change {
        ChangeNotification::Target { checked, .. } => Ok(Value::Bool(*checked)),
        ChangeNotification::Selection(Value::Bool(flag)) => Ok(Value::Bool(*flag)),
        ChangeNotification::Selection(other) => Err(FormError::InvalidChange {
            kind,
            value: other.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeNotification, normalize};
    use crate::core::error::FormError;
    use crate::core::value::Value;
    use crate::schema::FieldKind;

    #[test]
    fn text_kinds_take_current_text() {
        for kind in [FieldKind::Text, FieldKind::TextArea, FieldKind::DatePicker] {
            let value = normalize(kind, &ChangeNotification::text(" hi ")).expect("value");
            assert_eq!(value, Value::text(" hi "));
        }
    }

    #[test]
    fn select_kinds_take_the_notification_value() {
        let option = Value::option("FEMALE", "Female");
        let value =
            normalize(FieldKind::Select, &ChangeNotification::Selection(option.clone())).expect("value");
        assert_eq!(value, option);

        let many = Value::List(vec![Value::option(1, "One"), Value::option(2, "Two")]);
        let value = normalize(FieldKind::MultiSelect, &ChangeNotification::Selection(many.clone()))
            .expect("value");
        assert_eq!(value, many);

        let cleared =
            normalize(FieldKind::Select, &ChangeNotification::Selection(Value::Null)).expect("value");
        assert_eq!(cleared, Value::Null);
    }

    #[test]
    fn checkbox_takes_checked_flag() {
        let value = normalize(FieldKind::Checkbox, &ChangeNotification::checked(true)).expect("value");
        assert_eq!(value, Value::Bool(true));
        let err = normalize(FieldKind::Checkbox, &ChangeNotification::selection("yes")).unwrap_err();
        assert!(matches!(err, FormError::InvalidChange { kind: FieldKind::Checkbox, .. }));
    }

    // Pins current behaviour: a radio change stores the boolean `checked`
    // flag rather than the selected option's value.
    #[test]
    fn radio_group_stores_checked_flag_not_option_value() {
        let change = ChangeNotification::Target {
            value: "MALE".to_string(),
            checked: true,
        };
        let value = normalize(FieldKind::RadioGroup, &change).expect("value");
        assert_eq!(value, Value::Bool(true));
    }
}
