use crate::error::{BsonError, Result};
use derive_more::Display;

/// A culture (locale) identified by its BCP 47 style name, e.g. `en-US`.
/// The empty name is the invariant culture.
#[derive(Display, Debug, Clone, PartialEq, Eq, Hash)]
#[display(fmt = "{}", name)]
pub struct Culture {
    name: String,
    use_user_override: bool,
}

impl Culture {
    pub fn new(name: &str) -> Result<Self> {
        Self::with_user_override(name, true)
    }

    pub fn with_user_override(name: &str, use_user_override: bool) -> Result<Self> {
        let valid = name.is_empty()
            || name.split('-').all(|part| {
                !part.is_empty() && part.len() <= 8 && part.chars().all(|c| c.is_ascii_alphanumeric())
            });
        if !valid {
            return Err(BsonError::format(format!("'{name}' is not a valid culture name.")));
        }
        Ok(Self {
            name: name.to_owned(),
            use_user_override,
        })
    }

    pub fn invariant() -> Self {
        Self {
            name: String::new(),
            use_user_override: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn use_user_override(&self) -> bool {
        self.use_user_override
    }
}
