use super::{cannot_deserialize, missing_element, next_element, unexpected_element, unsupported};
use crate::options::{RepresentationOptions, SerializationOptions};
use crate::serializer::{SerializationContext, ValueSerializer};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::values::Version;
use bsonkit_types::{BsonError, BsonType, Result};

const MAJOR: &str = "Major";
const MINOR: &str = "Minor";
const BUILD: &str = "Build";
const REVISION: &str = "Revision";

/// A version as `major.minor[.build[.revision]]` text (default), or as a
/// document of Int32 components where absent components are omitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionSerializer;

fn write_component(w: &mut dyn BsonWriter, name: &str, component: u32) -> Result<()> {
    let component = i32::try_from(component).map_err(|_| {
        BsonError::Serialization(format!("Version component {name} {component} does not fit an Int32."))
    })?;
    w.write_name(name)?;
    w.write_int32(component)
}

fn read_component(r: &mut dyn BsonReader, name: &str) -> Result<u32> {
    let component = r.read_int32()?;
    u32::try_from(component)
        .map_err(|_| BsonError::format(format!("Version component {name} {component} is negative.")))
}

impl ValueSerializer for VersionSerializer {
    type Value = Version;

    fn serialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        w: &mut dyn BsonWriter,
        value: &Version,
        options: Option<&SerializationOptions>,
    ) -> Result<()> {
        let repr = RepresentationOptions::resolve::<Version>(options, BsonType::String)?;
        match repr.representation {
            BsonType::String => w.write_string(&value.to_string()),
            BsonType::Document => {
                w.write_start_document()?;
                write_component(w, MAJOR, value.major())?;
                write_component(w, MINOR, value.minor())?;
                if let Some(build) = value.build() {
                    write_component(w, BUILD, build)?;
                    if let Some(revision) = value.revision() {
                        write_component(w, REVISION, revision)?;
                    }
                }
                w.write_end_document()
            }
            other => Err(unsupported::<Version>(other)),
        }
    }

    fn deserialize_value(
        &self,
        _ctx: &SerializationContext<'_>,
        r: &mut dyn BsonReader,
        _options: Option<&SerializationOptions>,
    ) -> Result<Version> {
        match r.current_bson_type()? {
            BsonType::String => r.read_string()?.parse(),
            BsonType::Document => {
                let [mut major, mut minor, mut build, mut revision] = [None; 4];
                r.read_start_document()?;
                while let Some((bson_type, name)) = next_element(r)? {
                    let slot = match (name.as_str(), bson_type) {
                        (MAJOR, BsonType::Int32) => &mut major,
                        (MINOR, BsonType::Int32) => &mut minor,
                        (BUILD, BsonType::Int32) => &mut build,
                        (REVISION, BsonType::Int32) => &mut revision,
                        _ => return Err(unexpected_element::<Version>(&name)),
                    };
                    *slot = Some(read_component(r, &name)?);
                }
                r.read_end_document()?;
                let major = major.ok_or_else(|| missing_element::<Version>(MAJOR))?;
                let minor = minor.ok_or_else(|| missing_element::<Version>(MINOR))?;
                Version::from_components(major, minor, build, revision)
            }
            other => Err(cannot_deserialize::<Version>(other)),
        }
    }
}
