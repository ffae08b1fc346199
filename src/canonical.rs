//! Canonical serialization for deterministic hashing.
//!
//! This module turns hash-input projections into a canonical, deterministic
//! byte form suitable for fingerprinting.
//!
//! ## Determinism Guarantees
//!
//! - Object keys are sorted: values pass through `serde_json::Value` and every
//!   object is rebuilt in key order, so `{a, b}` and `{b, a}` serialize
//!   identically regardless of struct field order or insertion order.
//! - Stable Vec order: sequences serialize in index order.
//! - No silent coercion of maps with non-string keys: they are an error.
//! - No silent coercion of NaN or infinite floats: `serde_json` would write
//!   them as `null`, so they are rejected before conversion.

use std::fmt;

use serde::ser;
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use xxhash_rust::xxh64::xxh64;

/// Error raised when a value cannot be canonically serialized.
#[derive(Debug, thiserror::Error)]
pub enum CanonicalError {
    /// `serde_json` rejected the value (non-string map key, failing `Serialize` impl).
    #[error("Canonical serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The value contains a NaN or infinite float, which has no JSON form.
    #[error("Canonical serialization failed: non-finite float {0}")]
    NonFinite(f64),
}

/// Serialize a value to canonical JSON bytes for hashing.
///
/// Keys of every JSON object are emitted in sorted order.
///
/// # Errors
/// [`CanonicalError::NonFinite`] if any float in `value` is NaN or infinite,
/// [`CanonicalError::Json`] if `serde_json` cannot represent it.
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CanonicalError> {
    if let Err(FloatCheck::NonFinite(v)) = value.serialize(FiniteFloats) {
        return Err(CanonicalError::NonFinite(v));
    }
    let value = sort_keys(serde_json::to_value(value)?);
    Ok(serde_json::to_vec(&value)?)
}

/// Rebuild every object with its entries in key order.
///
/// Holds whether or not `serde_json`'s `preserve_order` feature is enabled.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k, sort_keys(v)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Outcome of a failed [`FiniteFloats`] pass.
///
/// Only `NonFinite` is reported; any other failure is left for `serde_json`
/// to raise on the real conversion.
#[derive(Debug)]
enum FloatCheck {
    NonFinite(f64),
    Other(String),
}

impl fmt::Display for FloatCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FloatCheck::NonFinite(v) => write!(f, "non-finite float {v}"),
            FloatCheck::Other(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for FloatCheck {}

impl ser::Error for FloatCheck {
    fn custom<M: fmt::Display>(msg: M) -> Self {
        FloatCheck::Other(msg.to_string())
    }
}

/// Serializer that discards everything and fails on the first NaN or
/// infinite float.
struct FiniteFloats;

impl FiniteFloats {
    fn check(v: f64) -> Result<(), FloatCheck> {
        if v.is_finite() {
            Ok(())
        } else {
            Err(FloatCheck::NonFinite(v))
        }
    }
}

impl ser::Serializer for FiniteFloats {
    type Ok = ();
    type Error = FloatCheck;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_f32(self, v: f32) -> Result<(), FloatCheck> {
        Self::check(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<(), FloatCheck> {
        Self::check(v)
    }

    fn serialize_bool(self, _: bool) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_i8(self, _: i8) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_i16(self, _: i16) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_i32(self, _: i32) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_i64(self, _: i64) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_i128(self, _: i128) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_u8(self, _: u8) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_u16(self, _: u16) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_u32(self, _: u32) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_u64(self, _: u64) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_u128(self, _: u128) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_char(self, _: char) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_str(self, _: &str) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_bytes(self, _: &[u8]) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_none(self) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_some<V: Serialize + ?Sized>(self, value: &V) -> Result<(), FloatCheck> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<(), FloatCheck> {
        Ok(())
    }

    fn serialize_newtype_struct<V: Serialize + ?Sized>(
        self,
        _: &'static str,
        value: &V,
    ) -> Result<(), FloatCheck> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<V: Serialize + ?Sized>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &V,
    ) -> Result<(), FloatCheck> {
        value.serialize(self)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self, FloatCheck> {
        Ok(self)
    }

    fn serialize_tuple(self, _: usize) -> Result<Self, FloatCheck> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Self, FloatCheck> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, FloatCheck> {
        Ok(self)
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self, FloatCheck> {
        Ok(self)
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self, FloatCheck> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, FloatCheck> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteFloats {
    type Ok = ();
    type Error = FloatCheck;

    fn serialize_element<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<(), FloatCheck> {
        value.serialize(FiniteFloats)
    }

    fn end(self) -> Result<(), FloatCheck> {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteFloats {
    type Ok = ();
    type Error = FloatCheck;

    fn serialize_element<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<(), FloatCheck> {
        value.serialize(FiniteFloats)
    }

    fn end(self) -> Result<(), FloatCheck> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteFloats {
    type Ok = ();
    type Error = FloatCheck;

    fn serialize_field<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<(), FloatCheck> {
        value.serialize(FiniteFloats)
    }

    fn end(self) -> Result<(), FloatCheck> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteFloats {
    type Ok = ();
    type Error = FloatCheck;

    fn serialize_field<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<(), FloatCheck> {
        value.serialize(FiniteFloats)
    }

    fn end(self) -> Result<(), FloatCheck> {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteFloats {
    type Ok = ();
    type Error = FloatCheck;

    fn serialize_key<V: Serialize + ?Sized>(&mut self, key: &V) -> Result<(), FloatCheck> {
        key.serialize(FiniteFloats)
    }

    fn serialize_value<V: Serialize + ?Sized>(&mut self, value: &V) -> Result<(), FloatCheck> {
        value.serialize(FiniteFloats)
    }

    fn end(self) -> Result<(), FloatCheck> {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteFloats {
    type Ok = ();
    type Error = FloatCheck;

    fn serialize_field<V: Serialize + ?Sized>(
        &mut self,
        _: &'static str,
        value: &V,
    ) -> Result<(), FloatCheck> {
        value.serialize(FiniteFloats)
    }

    fn end(self) -> Result<(), FloatCheck> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteFloats {
    type Ok = ();
    type Error = FloatCheck;

    fn serialize_field<V: Serialize + ?Sized>(
        &mut self,
        _: &'static str,
        value: &V,
    ) -> Result<(), FloatCheck> {
        value.serialize(FiniteFloats)
    }

    fn end(self) -> Result<(), FloatCheck> {
        Ok(())
    }
}

/// SHA-256 of the canonical bytes, as a 64-character lowercase hex string.
///
/// This is the content fingerprint used for node identity.
pub fn canonical_sha256_hex<T: Serialize + ?Sized>(value: &T) -> Result<String, CanonicalError> {
    let bytes = to_canonical_bytes(value)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

/// Compute a fast, non-cryptographic canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize + ?Sized>(value: &T) -> Result<u64, CanonicalError> {
    let bytes = to_canonical_bytes(value)?;
    Ok(xxh64(&bytes, 0))
}

/// Compute canonical xxh64 hash and return as hex string.
pub fn canonical_hash_hex<T: Serialize + ?Sized>(value: &T) -> Result<String, CanonicalError> {
    Ok(format!("{:016x}", canonical_hash(value)?))
}
