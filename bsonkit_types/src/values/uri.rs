use crate::error::{BsonError, Result};
use derive_more::{Deref, Display};
use std::str::FromStr;

/// A URI kept in its original textual form.
///
/// Only the scheme is validated: absolute URIs need `scheme ":"` with a scheme
/// of ASCII letters, digits, `+`, `-` or `.` starting with a letter. Anything
/// else is treated as a relative reference.
#[derive(Deref, Display, Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri(String);

impl Uri {
    pub fn parse(s: &str) -> Result<Self> {
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(BsonError::format(format!("Invalid URI '{s}'.")));
        }
        Ok(Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn scheme(&self) -> Option<&str> {
        let (scheme, _) = self.0.split_once(':')?;
        let mut chars = scheme.chars();
        let first = chars.next()?;
        let valid = first.is_ascii_alphabetic()
            && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        valid.then_some(scheme)
    }

    pub fn is_absolute(&self) -> bool {
        self.scheme().is_some()
    }
}

impl FromStr for Uri {
    type Err = BsonError;
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
