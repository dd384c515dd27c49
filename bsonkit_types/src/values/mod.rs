//! Value types that the wire format carries but the Rust ecosystem in use
//! here has no type for.

mod bson_null;
mod culture;
mod decimal;
mod guid;
pub mod hex;
mod object_id;
pub mod ticks;
mod uri;
mod version;

pub use bson_null::BsonNull;
pub use culture::Culture;
pub use decimal::Decimal;
pub use guid::{GuidRepresentation, GuidConverter};
pub use object_id::ObjectId;
pub use uri::Uri;
pub use version::Version;
