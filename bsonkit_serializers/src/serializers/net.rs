use super::{cannot_deserialize, invalid_text, unsupported};
use crate::describe::Describe;
use crate::options::{RepresentationOptions, SerializationOptions};
use crate::serializer::{SerializationContext, ValueSerializer};
use bsonkit_types::io::{BsonReader, BsonWriter};
use bsonkit_types::values::Uri;
use bsonkit_types::{BsonType, Result};
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

fn write_text<T: Display>(w: &mut dyn BsonWriter, value: &T, options: Option<&SerializationOptions>) -> Result<()> {
    let repr = RepresentationOptions::resolve::<T>(options, BsonType::String)?;
    match repr.representation {
        BsonType::String => w.write_string(&value.to_string()),
        other => Err(unsupported::<T>(other)),
    }
}

fn read_text<T: Describe + FromStr>(r: &mut dyn BsonReader) -> Result<T> {
    match r.current_bson_type()? {
        BsonType::String => {
            let s = r.read_string()?;
            s.parse().map_err(|_| invalid_text::<T>(&s))
        }
        other => Err(cannot_deserialize::<T>(other)),
    }
}

macro_rules! text_serializer {
    ($(#[$doc:meta])* $name:ident, $t:ty) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $name;

        impl ValueSerializer for $name {
            type Value = $t;

            fn serialize_value(
                &self,
                _ctx: &SerializationContext<'_>,
                w: &mut dyn BsonWriter,
                value: &$t,
                options: Option<&SerializationOptions>,
            ) -> Result<()> {
                write_text(w, value, options)
            }

            fn deserialize_value(
                &self,
                _ctx: &SerializationContext<'_>,
                r: &mut dyn BsonReader,
                _options: Option<&SerializationOptions>,
            ) -> Result<$t> {
                read_text(r)
            }
        }
    };
}

text_serializer!(
    /// A URI in its original text, absolute or relative.
    UriSerializer,
    Uri
);
text_serializer!(IpAddrSerializer, IpAddr);
text_serializer!(
    /// `address:port`, with IPv6 addresses in brackets.
    SocketAddrSerializer,
    SocketAddr
);
