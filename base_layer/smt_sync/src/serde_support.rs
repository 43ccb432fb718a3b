// Copyright 2024. The Tari Project
// SPDX-License-Identifier: BSD-3-Clause

/// Serializes a 32-byte hash as a hex string for human readable formats and as raw bytes otherwise.
pub mod hash {
    use std::fmt;

    use serde::{
        de::{self, SeqAccess, Visitor},
        Deserializer,
        Serializer,
    };
    use tari_utilities::hex::{from_hex, to_hex};

    use crate::hash::DIGEST_LENGTH;

    pub fn serialize<S>(hash: &[u8; DIGEST_LENGTH], ser: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        if ser.is_human_readable() {
            ser.serialize_str(&to_hex(hash.as_slice()))
        } else {
            ser.serialize_bytes(hash.as_slice())
        }
    }

    pub fn deserialize<'de, D>(de: D) -> Result<[u8; DIGEST_LENGTH], D::Error>
    where D: Deserializer<'de> {
        struct HashVisitor;

        impl HashVisitor {
            fn from_slice<E: de::Error>(bytes: &[u8]) -> Result<[u8; DIGEST_LENGTH], E> {
                if bytes.len() != DIGEST_LENGTH {
                    return Err(E::invalid_length(bytes.len(), &"32 bytes"));
                }
                let mut result = [0u8; DIGEST_LENGTH];
                result.copy_from_slice(bytes);
                Ok(result)
            }
        }

        impl<'de> Visitor<'de> for HashVisitor {
            type Value = [u8; DIGEST_LENGTH];

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a 32 byte hash, or its hex representation")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where E: de::Error {
                let v = v.strip_prefix("0x").unwrap_or(v);
                let bytes = from_hex(v).map_err(de::Error::custom)?;
                Self::from_slice(&bytes)
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where E: de::Error {
                Self::from_slice(v)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where A: SeqAccess<'de> {
                let mut bytes = Vec::with_capacity(DIGEST_LENGTH);
                while let Some(b) = seq.next_element::<u8>()? {
                    bytes.push(b);
                }
                Self::from_slice(&bytes)
            }
        }

        if de.is_human_readable() {
            de.deserialize_str(HashVisitor)
        } else {
            de.deserialize_bytes(HashVisitor)
        }
    }
}

/// Serializes a variable length byte string as hex for human readable formats and as raw bytes otherwise.
pub mod bytes {
    use std::fmt;

    use serde::{
        de::{self, SeqAccess, Visitor},
        Deserializer,
        Serializer,
    };
    use tari_utilities::hex::{from_hex, to_hex};

    pub fn serialize<S>(bytes: &[u8], ser: S) -> Result<S::Ok, S::Error>
    where S: Serializer {
        if ser.is_human_readable() {
            ser.serialize_str(&to_hex(bytes))
        } else {
            ser.serialize_bytes(bytes)
        }
    }

    pub fn deserialize<'de, D>(de: D) -> Result<Vec<u8>, D::Error>
    where D: Deserializer<'de> {
        struct BytesVisitor;

        impl<'de> Visitor<'de> for BytesVisitor {
            type Value = Vec<u8>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a byte string, or its hex representation")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where E: de::Error {
                from_hex(v.strip_prefix("0x").unwrap_or(v)).map_err(de::Error::custom)
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
            where E: de::Error {
                Ok(v.to_vec())
            }

            fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Self::Value, E>
            where E: de::Error {
                Ok(v)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where A: SeqAccess<'de> {
                let mut result = Vec::with_capacity(seq.size_hint().unwrap_or(32));
                while let Some(b) = seq.next_element::<u8>()? {
                    result.push(b);
                }
                Ok(result)
            }
        }

        if de.is_human_readable() {
            de.deserialize_str(BytesVisitor)
        } else {
            de.deserialize_byte_buf(BytesVisitor)
        }
    }
}
