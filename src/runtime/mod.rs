pub mod action;
pub mod effect;
pub mod normalizer;
pub mod reducer;

pub use action::{CompletionHook, FormAction, SetFieldValue, SetFieldValueBulk, ValueChanged};
pub use effect::Effect;
pub use normalizer::{ChangeNotification, normalize};
pub use reducer::{Reducer, Transition};
