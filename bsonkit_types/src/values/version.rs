use crate::error::{BsonError, Result};
use itertools::Itertools;
use std::fmt;
use std::str::FromStr;

/// A four-part version number `major.minor[.build[.revision]]`.
/// `revision` may only be present when `build` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    major: u32,
    minor: u32,
    build: Option<u32>,
    revision: Option<u32>,
}

impl Version {
    pub fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            build: None,
            revision: None,
        }
    }

    pub fn with_build(major: u32, minor: u32, build: u32) -> Self {
        Self {
            build: Some(build),
            ..Self::new(major, minor)
        }
    }

    pub fn with_revision(major: u32, minor: u32, build: u32, revision: u32) -> Self {
        Self {
            build: Some(build),
            revision: Some(revision),
            ..Self::new(major, minor)
        }
    }

    /// Assembles a version from possibly-absent components, as read from a
    /// document representation.
    pub fn from_components(
        major: u32,
        minor: u32,
        build: Option<u32>,
        revision: Option<u32>,
    ) -> Result<Self> {
        if build.is_none() && revision.is_some() {
            return Err(BsonError::format("Version has a Revision but no Build."));
        }
        Ok(Self {
            major,
            minor,
            build,
            revision,
        })
    }

    pub fn major(&self) -> u32 {
        self.major
    }
    pub fn minor(&self) -> u32 {
        self.minor
    }
    pub fn build(&self) -> Option<u32> {
        self.build
    }
    pub fn revision(&self) -> Option<u32> {
        self.revision
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts = [Some(self.major), Some(self.minor), self.build, self.revision];
        write!(f, "{}", parts.iter().flatten().join("."))
    }
}

impl FromStr for Version {
    type Err = BsonError;
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BsonError::format(format!("'{s}' is not a valid version string."));
        let parts = s
            .split('.')
            .map(|part| part.parse::<u32>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>>>()?;
        match parts[..] {
            [major, minor] => Ok(Self::new(major, minor)),
            [major, minor, build] => Ok(Self::with_build(major, minor, build)),
            [major, minor, build, revision] => {
                Ok(Self::with_revision(major, minor, build, revision))
            }
            _ => Err(invalid()),
        }
    }
}
