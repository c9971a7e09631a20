use crate::core::error::FormError;
use std::fmt;

/// Points at a top-level field or at one sub-field of a dynamic item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldAddress {
    Field(String),
    Item {
        field: String,
        index: usize,
        sub_field: String,
    },
}

impl FieldAddress {
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    pub fn item(field: impl Into<String>, index: usize, sub_field: impl Into<String>) -> Self {
        Self::Item {
            field: field.into(),
            index,
            sub_field: sub_field.into(),
        }
    }

    /// Selector format:
    /// - `email` -> top-level field
    /// - `students[1].name` -> sub-field of a dynamic item
    pub fn parse(selector: &str) -> Result<Self, FormError> {
        let trimmed = selector.trim();
        if trimmed.is_empty() {
            return Err(FormError::MissingFieldName);
        }

        let Some((field, rest)) = trimmed.split_once('[') else {
            if trimmed.contains([']', '.']) {
                return Err(FormError::InvalidSelector(format!(
                    "unexpected separator in '{trimmed}'"
                )));
            }
            return Ok(Self::Field(trimmed.to_string()));
        };

        let field = field.trim();
        if field.is_empty() {
            return Err(FormError::InvalidSelector("selector field is empty".into()));
        }

        let Some((raw_index, rest)) = rest.split_once(']') else {
            return Err(FormError::InvalidSelector("unterminated '[' segment".into()));
        };
        let index = raw_index.trim().parse::<usize>().map_err(|_| {
            FormError::InvalidSelector(format!("expected item index, got '{raw_index}'"))
        })?;

        let Some(sub_field) = rest.strip_prefix('.') else {
            return Err(FormError::InvalidSelector(format!(
                "expected '.subField' after index in '{trimmed}'"
            )));
        };
        let sub_field = sub_field.trim();
        if sub_field.is_empty() || sub_field.contains(['[', ']', '.']) {
            return Err(FormError::InvalidSelector(format!(
                "invalid sub-field in '{trimmed}'"
            )));
        }

        Ok(Self::item(field, index, sub_field))
    }

    pub fn field_name(&self) -> &str {
        match self {
            Self::Field(field) => field,
            Self::Item { field, .. } => field,
        }
    }

    pub fn item_path(&self) -> Option<(usize, &str)> {
        match self {
            Self::Field(_) => None,
            Self::Item {
                index, sub_field, ..
            } => Some((*index, sub_field.as_str())),
        }
    }

    pub fn to_selector(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FieldAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => f.write_str(field),
            Self::Item {
                field,
                index,
                sub_field,
            } => write!(f, "{field}[{index}].{sub_field}"),
        }
    }
}

impl From<&str> for FieldAddress {
    fn from(value: &str) -> Self {
        Self::Field(value.to_string())
    }
}

impl From<String> for FieldAddress {
    fn from(value: String) -> Self {
        Self::Field(value)
    }
}
