use crate::core::address::FieldAddress;
use crate::core::value::Value;
use crate::runtime::normalizer::ChangeNotification;
use crate::validation::FieldError;
use indexmap::IndexMap;
use std::fmt;

/// Callback run once, after the transition that carries it is committed.
pub struct CompletionHook<T: ?Sized>(Box<dyn FnOnce(&T)>);

impl<T: ?Sized> CompletionHook<T> {
    pub fn new(hook: impl FnOnce(&T) + 'static) -> Self {
        Self(Box::new(hook))
    }

    pub fn call(self, value: &T) {
        (self.0)(value)
    }
}

impl<T: ?Sized> fmt::Debug for CompletionHook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CompletionHook")
    }
}

#[derive(Debug)]
pub struct ValueChanged {
    pub address: FieldAddress,
    pub change: ChangeNotification,
    pub on_complete: Option<CompletionHook<Value>>,
}

impl ValueChanged {
    pub fn new(address: impl Into<FieldAddress>, change: ChangeNotification) -> Self {
        Self {
            address: address.into(),
            change,
            on_complete: None,
        }
    }

    pub fn with_on_complete(mut self, hook: impl FnOnce(&Value) + 'static) -> Self {
        self.on_complete = Some(CompletionHook::new(hook));
        self
    }
}

#[derive(Debug)]
pub struct SetFieldValue {
    pub full_field_name: String,
    pub new_value: Value,
    pub skip_validation: bool,
    pub on_complete: Option<CompletionHook<Value>>,
}

impl SetFieldValue {
    pub fn new(full_field_name: impl Into<String>, new_value: impl Into<Value>) -> Self {
        Self {
            full_field_name: full_field_name.into(),
            new_value: new_value.into(),
            skip_validation: false,
            on_complete: None,
        }
    }

    pub fn with_skip_validation(mut self, skip: bool) -> Self {
        self.skip_validation = skip;
        self
    }

    pub fn with_on_complete(mut self, hook: impl FnOnce(&Value) + 'static) -> Self {
        self.on_complete = Some(CompletionHook::new(hook));
        self
    }
}

#[derive(Debug, Default)]
pub struct SetFieldValueBulk {
    pub values: IndexMap<String, Value>,
    pub skip_validation: bool,
    pub on_complete: Option<CompletionHook<IndexMap<String, Value>>>,
}

impl SetFieldValueBulk {
    pub fn new(values: IndexMap<String, Value>) -> Self {
        Self {
            values,
            ..Self::default()
        }
    }

    pub fn with_skip_validation(mut self, skip: bool) -> Self {
        self.skip_validation = skip;
        self
    }

    pub fn with_on_complete(
        mut self,
        hook: impl FnOnce(&IndexMap<String, Value>) + 'static,
    ) -> Self {
        self.on_complete = Some(CompletionHook::new(hook));
        self
    }
}

/// Every transition the reducer knows. The set is closed.
#[derive(Debug)]
pub enum FormAction {
    ValueChanged(ValueChanged),
    SetFieldValue(SetFieldValue),
    SetFieldValueBulk(SetFieldValueBulk),
    ValidationErrorsApplied(Vec<FieldError>),
    FieldVisibilityChanged {
        address: FieldAddress,
        is_visible: bool,
    },
    DynamicItemAdded {
        field_name: String,
        init_data: Option<IndexMap<String, Value>>,
    },
    DynamicItemRemoved {
        field_name: String,
        index: usize,
    },
}

impl FormAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ValueChanged(_) => "ValueChanged",
            Self::SetFieldValue(_) => "SetFieldValue",
            Self::SetFieldValueBulk(_) => "SetFieldValueBulk",
            Self::ValidationErrorsApplied(_) => "ValidationErrorsApplied",
            Self::FieldVisibilityChanged { .. } => "FieldVisibilityChanged",
            Self::DynamicItemAdded { .. } => "DynamicItemAdded",
            Self::DynamicItemRemoved { .. } => "DynamicItemRemoved",
        }
    }
}

impl From<ValueChanged> for FormAction {
    fn from(action: ValueChanged) -> Self {
        Self::ValueChanged(action)
    }
}

impl From<SetFieldValue> for FormAction {
    fn from(action: SetFieldValue) -> Self {
        Self::SetFieldValue(action)
    }
}

impl From<SetFieldValueBulk> for FormAction {
    fn from(action: SetFieldValueBulk) -> Self {
        Self::SetFieldValueBulk(action)
    }
}
