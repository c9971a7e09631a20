pub mod config;

use crate::core::value::Value;
use crate::validation::ValidationRule;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use config::{RuleFactory, RuleRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldKind {
    Text,
    Select,
    MultiSelect,
    Checkbox,
    RadioGroup,
    TextArea,
    DatePicker,
}

#[derive(Debug, Clone)]
pub struct StandardDescriptor {
    pub name: Option<String>,
    pub kind: FieldKind,
    pub default_value: Option<Value>,
    pub label: Option<String>,
    pub label2: Option<String>,
    pub validation_rules: Vec<ValidationRule>,
    pub is_visible: bool,
    pub disabled: bool,
    pub use_second_label: bool,
}

impl StandardDescriptor {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            name: None,
            kind,
            default_value: None,
            label: None,
            label2: None,
            validation_rules: Vec::new(),
            is_visible: true,
            disabled: false,
            use_second_label: false,
        }
    }

    pub fn text() -> Self {
        Self::new(FieldKind::Text)
    }

    pub fn select() -> Self {
        Self::new(FieldKind::Select)
    }

    pub fn multi_select() -> Self {
        Self::new(FieldKind::MultiSelect)
    }

    pub fn checkbox() -> Self {
        Self::new(FieldKind::Checkbox)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_second_label(mut self, label: impl Into<String>) -> Self {
        self.label2 = Some(label.into());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation_rules.push(rule);
        self
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = ValidationRule>) -> Self {
        self.validation_rules.extend(rules);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.is_visible = visible;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_use_second_label(mut self, use_second_label: bool) -> Self {
        self.use_second_label = use_second_label;
        self
    }
}

/// A repeatable group: every item holds one state per sub-field below.
#[derive(Debug, Clone, Default)]
pub struct DynamicDescriptor {
    pub dynamic_schema_item: IndexMap<String, StandardDescriptor>,
}

impl DynamicDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, descriptor: StandardDescriptor) -> Self {
        self.dynamic_schema_item.insert(name.into(), descriptor);
        self
    }

    pub fn sub_field(&self, name: &str) -> Option<&StandardDescriptor> {
        self.dynamic_schema_item.get(name)
    }
}

#[derive(Debug, Clone)]
pub enum FieldDescriptor {
    Standard(StandardDescriptor),
    Dynamic(DynamicDescriptor),
}

impl FieldDescriptor {
    pub fn as_standard(&self) -> Option<&StandardDescriptor> {
        match self {
            Self::Standard(descriptor) => Some(descriptor),
            Self::Dynamic(_) => None,
        }
    }

    pub fn as_dynamic(&self) -> Option<&DynamicDescriptor> {
        match self {
            Self::Standard(_) => None,
            Self::Dynamic(descriptor) => Some(descriptor),
        }
    }
}

impl From<StandardDescriptor> for FieldDescriptor {
    fn from(value: StandardDescriptor) -> Self {
        Self::Standard(value)
    }
}

impl From<DynamicDescriptor> for FieldDescriptor {
    fn from(value: DynamicDescriptor) -> Self {
        Self::Dynamic(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: IndexMap<String, FieldDescriptor>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: impl Into<String>, descriptor: impl Into<FieldDescriptor>) -> Self {
        self.insert(name, descriptor);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, descriptor: impl Into<FieldDescriptor>) {
        self.fields.insert(name.into(), descriptor.into());
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldDescriptor)> {
        self.fields.iter().map(|(name, descriptor)| (name.as_str(), descriptor))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
