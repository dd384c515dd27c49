/// The null value as a first-class value, distinct from "absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BsonNull;
