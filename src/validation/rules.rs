use crate::core::error::FormError;
use crate::core::value::Value;
use crate::validation::{RuleArgs, ValidationRule};
use regex::Regex;
use std::sync::LazyLock;

pub const REQUIRED_MESSAGE: &str = "Is required default";
pub const MIN_LENGTH_MESSAGE: &str = "Value is too short";
pub const MAX_LENGTH_MESSAGE: &str = "Value is too long";
pub const PATTERN_MESSAGE: &str = "Value has an invalid format";
pub const EMAIL_MESSAGE: &str = "Invalid email address";
pub const NUMBER_MESSAGE: &str = "Value must be a number";
pub const CHECKED_MESSAGE: &str = "Must be checked";
pub const MISMATCH_MESSAGE: &str = "Values do not match";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("email pattern is a valid regex")
});

fn fail(message: Option<&str>, default: &str) -> Option<String> {
    Some(message.unwrap_or(default).to_string())
}

fn length_of(value: &Value) -> Option<usize> {
    match value.unwrap_option() {
        Value::List(items) => Some(items.len()),
        other => other.to_text_scalar().map(|text| text.chars().count()),
    }
}

pub fn is_required() -> ValidationRule {
    ValidationRule::check(|value, message, _| {
        if value.is_missing() {
            fail(message, REQUIRED_MESSAGE)
        } else {
            None
        }
    })
    .named("isRequired")
}

pub fn min_length(min: usize) -> ValidationRule {
    ValidationRule::check(move |value, message, _| {
        if value.is_blank() {
            return None;
        }
        match length_of(value) {
            Some(len) if len < min => fail(message, MIN_LENGTH_MESSAGE),
            _ => None,
        }
    })
    .named("minLength")
}

pub fn max_length(max: usize) -> ValidationRule {
    ValidationRule::check(move |value, message, _| match length_of(value) {
        Some(len) if len > max => fail(message, MAX_LENGTH_MESSAGE),
        _ => None,
    })
    .named("maxLength")
}

pub fn pattern(pattern: &str) -> Result<ValidationRule, FormError> {
    let re = Regex::new(pattern).map_err(|err| FormError::InvalidRuleArgs {
        rule: "pattern".to_string(),
        reason: err.to_string(),
    })?;
    Ok(matching(re, PATTERN_MESSAGE).named("pattern"))
}

pub fn email() -> ValidationRule {
    matching(EMAIL_RE.clone(), EMAIL_MESSAGE).named("email")
}

fn matching(re: Regex, default_message: &'static str) -> ValidationRule {
    ValidationRule::check(move |value, message, _| {
        if value.is_blank() {
            return None;
        }
        match value.to_text_scalar() {
            Some(text) if re.is_match(text.as_str()) => None,
            _ => fail(message, default_message),
        }
    })
}

pub fn is_number() -> ValidationRule {
    ValidationRule::check(|value, message, _| match value {
        Value::Null | Value::Number(_) => None,
        Value::Text(text) if text.is_empty() || text.trim().parse::<f64>().is_ok() => None,
        _ => fail(message, NUMBER_MESSAGE),
    })
    .named("isNumber")
}

pub fn must_be_checked() -> ValidationRule {
    ValidationRule::check(|value, message, _| {
        if value.as_bool() == Some(true) {
            None
        } else {
            fail(message, CHECKED_MESSAGE)
        }
    })
    .named("mustBeChecked")
}

/// Value must equal the current value of the rule's `dependency_field_name`.
pub fn equals_dependency(field: impl Into<String>) -> ValidationRule {
    ValidationRule::check(|value, message, args| {
        let other = args.dependency_field_value.as_ref().unwrap_or(&Value::Null);
        if value.unwrap_option() == other.unwrap_option() {
            None
        } else {
            fail(message, MISMATCH_MESSAGE)
        }
    })
    .named("equalsDependency")
    .with_args(RuleArgs::new().with_dependency_field_name(field))
}
