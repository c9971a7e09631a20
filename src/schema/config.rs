use crate::core::error::FormError;
use crate::core::value::Value;
use crate::schema::{DynamicDescriptor, FieldDescriptor, FieldKind, Schema, StandardDescriptor};
use crate::validation::{RuleArgs, ValidationRule, rules};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::Arc;

pub type RuleFactory = Arc<dyn Fn(&RuleArgs) -> Result<ValidationRule, FormError> + Send + Sync>;

/// Named rule constructors used when a schema is loaded from text.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    factories: IndexMap<String, RuleFactory>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        Self::new()
            .with_rule("isRequired", |_| Ok(rules::is_required()))
            .with_rule("minLength", |args| {
                Ok(rules::min_length(usize_arg("minLength", args, "min")?))
            })
            .with_rule("maxLength", |args| {
                Ok(rules::max_length(usize_arg("maxLength", args, "max")?))
            })
            .with_rule("pattern", |args| {
                let pattern = args.get("pattern").and_then(Value::as_text).ok_or_else(|| {
                    FormError::InvalidRuleArgs {
                        rule: "pattern".to_string(),
                        reason: "expected text argument 'pattern'".to_string(),
                    }
                })?;
                rules::pattern(pattern)
            })
            .with_rule("email", |_| Ok(rules::email()))
            .with_rule("isNumber", |_| Ok(rules::is_number()))
            .with_rule("mustBeChecked", |_| Ok(rules::must_be_checked()))
            .with_rule("equalsDependency", |args| {
                let field = args.dependency_field_name.clone().ok_or_else(|| {
                    FormError::InvalidRuleArgs {
                        rule: "equalsDependency".to_string(),
                        reason: "expected 'dependencyFieldName'".to_string(),
                    }
                })?;
                Ok(rules::equals_dependency(field))
            })
    }

    pub fn with_rule<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&RuleArgs) -> Result<ValidationRule, FormError> + Send + Sync + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&RuleArgs) -> Result<ValidationRule, FormError> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn build(
        &self,
        name: &str,
        args: RuleArgs,
        message: Option<String>,
    ) -> Result<ValidationRule, FormError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| FormError::UnknownRule(name.to_string()))?;
        let rule = factory(&args)?.named(name).with_args(args);
        Ok(match message {
            Some(message) => rule.with_message(message),
            None => rule,
        })
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn usize_arg(rule: &str, args: &RuleArgs, key: &str) -> Result<usize, FormError> {
    args.get(key)
        .and_then(Value::as_number)
        .filter(|number| *number >= 0.0 && number.fract() == 0.0)
        .map(|number| number as usize)
        .ok_or_else(|| FormError::InvalidRuleArgs {
            rule: rule.to_string(),
            reason: format!("expected non-negative integer '{key}'"),
        })
}

// ---------------------------------------------------------------------------
// Declarative schema text
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DescriptorConfig {
    Dynamic {
        #[serde(rename = "dynamicSchemaItem")]
        dynamic_schema_item: IndexMap<String, StandardConfig>,
    },
    Standard(StandardConfig),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StandardConfig {
    kind: FieldKind,
    #[serde(default, deserialize_with = "present_value")]
    default_value: Option<Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    label2: Option<String>,
    #[serde(default)]
    validation_rules: Vec<RuleConfig>,
    #[serde(default = "default_visible")]
    is_visible: bool,
    #[serde(default)]
    disabled: bool,
    #[serde(default)]
    use_second_label: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RuleConfig {
    Another {
        #[serde(rename = "validateAnotherField")]
        validate_another_field: String,
    },
    Named {
        rule: String,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        args: IndexMap<String, Value>,
    },
}

fn default_visible() -> bool {
    true
}

/// Keeps an explicit `null` as `Some(Value::Null)`; only a missing key is `None`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn rule_args(mut raw: IndexMap<String, Value>) -> RuleArgs {
    let mut args = RuleArgs::new();
    if let Some(Value::Text(name)) = raw.shift_remove("dependencyFieldName") {
        args.dependency_field_name = Some(name);
    }
    if let Some(Value::Text(field)) = raw.shift_remove("dependencyField") {
        args.dependency_field = Some(field);
    }
    // An explicit null means "any non-empty value", same as leaving it out.
    args.dependency_value = raw
        .shift_remove("dependencyValue")
        .filter(|value| !matches!(value, Value::Null));
    raw.shift_remove("dependencyFieldValue");
    args.extra = raw;
    args
}

impl RuleConfig {
    fn build(self, registry: &RuleRegistry) -> Result<ValidationRule, FormError> {
        match self {
            Self::Another {
                validate_another_field,
            } => Ok(ValidationRule::validate_another_field(validate_another_field)),
            Self::Named {
                rule,
                message,
                args,
            } => registry.build(rule.as_str(), rule_args(args), message),
        }
    }
}

impl StandardConfig {
    fn build(self, registry: &RuleRegistry) -> Result<StandardDescriptor, FormError> {
        let validation_rules = self
            .validation_rules
            .into_iter()
            .map(|rule| rule.build(registry))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StandardDescriptor {
            name: self.name,
            kind: self.kind,
            default_value: self.default_value,
            label: self.label,
            label2: self.label2,
            validation_rules,
            is_visible: self.is_visible,
            disabled: self.disabled,
            use_second_label: self.use_second_label,
        })
    }
}

impl DescriptorConfig {
    fn build(self, registry: &RuleRegistry) -> Result<FieldDescriptor, FormError> {
        match self {
            Self::Standard(config) => Ok(FieldDescriptor::Standard(config.build(registry)?)),
            Self::Dynamic {
                dynamic_schema_item,
            } => {
                let mut descriptor = DynamicDescriptor::new();
                for (name, config) in dynamic_schema_item {
                    descriptor = descriptor.with_field(name, config.build(registry)?);
                }
                Ok(FieldDescriptor::Dynamic(descriptor))
            }
        }
    }
}

fn build_schema(
    raw: IndexMap<String, DescriptorConfig>,
    registry: &RuleRegistry,
) -> Result<Schema, FormError> {
    let mut schema = Schema::new();
    for (name, config) in raw {
        schema.insert(name, config.build(registry)?);
    }
    Ok(schema)
}

impl Schema {
    pub fn from_json_str(text: &str, registry: &RuleRegistry) -> Result<Self, FormError> {
        let raw: IndexMap<String, DescriptorConfig> = serde_json::from_str(text)?;
        build_schema(raw, registry)
    }

    pub fn from_yaml_str(text: &str, registry: &RuleRegistry) -> Result<Self, FormError> {
        let raw: IndexMap<String, DescriptorConfig> = serde_yaml::from_str(text)?;
        build_schema(raw, registry)
    }
}

/// Parses a JSON object of field name -> value, e.g. initial values.
pub fn values_from_json_str(text: &str) -> Result<IndexMap<String, Value>, FormError> {
    Ok(serde_json::from_str(text)?)
}
