pub mod field;
pub mod tree;

pub use field::FieldState;
pub use tree::{DynamicFieldState, FieldNode, FormState, Record};
