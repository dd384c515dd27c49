//! Wire-level building blocks: type tags, the error taxonomy, value types
//! without a natural home in the Rust ecosystem, and the token-level binary
//! reader/writer.

pub mod bson_type;
pub mod error;
pub mod io;
pub mod values;

pub use bson_type::{BinarySubType, BsonType};
pub use error::{BsonError, DiscriminatorError, LossKind, Result};
