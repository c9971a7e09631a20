use crate::core::value::Value;
use crate::runtime::action::CompletionHook;
use indexmap::IndexMap;

/// Work the caller runs once the new state is in place.
#[derive(Debug)]
pub enum Effect {
    ValueCommitted {
        hook: CompletionHook<Value>,
        value: Value,
    },
    ValuesCommitted {
        hook: CompletionHook<IndexMap<String, Value>>,
        values: IndexMap<String, Value>,
    },
}

impl Effect {
    pub fn run(self) {
        match self {
            Self::ValueCommitted { hook, value } => hook.call(&value),
            Self::ValuesCommitted { hook, values } => hook.call(&values),
        }
    }
}
