use crate::bson_type::BsonType;
use std::io;
use thiserror::Error;

pub type Result<T, E = BsonError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BsonError {
    #[error("{representation} is not a valid representation for {type_name}.")]
    UnsupportedRepresentation {
        type_name: &'static str,
        representation: BsonType,
    },

    #[error("Invalid serialization options for {type_name}: expected {expected}.")]
    InvalidOptions {
        type_name: &'static str,
        expected: &'static str,
    },

    #[error("{0}")]
    Format(String),

    #[error("{kind} while converting {from} to {to}.")]
    LossyConversion {
        kind: LossKind,
        from: &'static str,
        to: &'static str,
    },

    #[error("No serializer found for type {0}.")]
    UnregisteredType(String),

    #[error("There is already a serializer registered for {0}.")]
    DuplicateRegistration(String),

    #[error("Generic definition {definition} expects {expected} type arguments, {closed} has {actual}.")]
    GenericArity {
        definition: &'static str,
        closed: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Discriminator(#[from] DiscriminatorError),

    #[error("{0}")]
    Serialization(String),

    #[error("Serializer for {expected} was handed a value of another type.")]
    TypeMismatch { expected: &'static str },

    #[error("{0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl BsonError {
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    pub fn cannot_deserialize(type_name: &str, bson_type: BsonType) -> Self {
        Self::Format(format!(
            "Cannot deserialize {type_name} from BsonType {bson_type}."
        ))
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    pub fn is_lossy(&self) -> bool {
        matches!(self, Self::LossyConversion { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossKind {
    Overflow,
    Truncation,
}

impl std::fmt::Display for LossKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overflow => write!(f, "Overflow"),
            Self::Truncation => write!(f, "Truncation"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DiscriminatorError {
    #[error("Unknown discriminator value '{0}'.")]
    Unknown(String),

    #[error("Discriminator is required to deserialize {nominal}, but none was found.")]
    Missing { nominal: &'static str },

    #[error("Ambiguous discriminator '{0}'.")]
    Ambiguous(String),

    #[error("Actual type {actual} is not assignable to the nominal type {nominal}.")]
    NotAssignable {
        actual: &'static str,
        nominal: &'static str,
    },

    #[error("Discriminator element must be a String, found {0}.")]
    Malformed(BsonType),
}
