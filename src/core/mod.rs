pub mod address;
pub mod error;
pub mod value;

pub use address::FieldAddress;
pub use error::FormError;
pub use value::Value;
