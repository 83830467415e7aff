use serde_json::Value;

use crate::address::Address;
use crate::era::Era;
use crate::error::ScaleError;
use crate::reader::ScaleReader;
use crate::registry::{split_subtypes, TypeRegistry};


/// Upper bound on collection lengths accepted from the wire.
const MAX_SEQUENCE_LEN: usize = 16 * 1024 * 1024;


/// Shape of a type as recorded in the type catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// Decoder family, `None` when no decoder covers the type.
    pub class: Option<&'static str>,
    pub sub_type: Option<String>,
}


/// Classifies a resolved type string without decoding anything.
pub fn type_info(registry: &TypeRegistry, ty: &str) -> TypeInfo {
    let ty = registry.resolve(ty);
    if let Some(inner) = generic_inner(&ty, "Compact") {
        return TypeInfo {
            class: Some("Compact"),
            sub_type: Some(inner.to_string()),
        };
    }
    if let Some(inner) = generic_inner(&ty, "Vec") {
        return TypeInfo {
            class: Some("Vec"),
            sub_type: Some(inner.to_string()),
        };
    }
    if let Some(inner) = generic_inner(&ty, "Option") {
        return TypeInfo {
            class: Some("Option"),
            sub_type: Some(inner.to_string()),
        };
    }
    if let Some(inner) = tuple_inner(&ty) {
        return TypeInfo {
            class: Some("Tuple"),
            sub_type: Some(inner.to_string()),
        };
    }
    let class = match ty.as_str() {
        "u8" => Some("U8"),
        "u16" => Some("U16"),
        "u32" => Some("U32"),
        "u64" => Some("U64"),
        "u128" => Some("U128"),
        "bool" => Some("Bool"),
        "Null" => Some("Null"),
        "String" => Some("String"),
        "Bytes" => Some("Bytes"),
        "H160" => Some("H160"),
        "H256" => Some("H256"),
        "H512" => Some("H512"),
        "AccountId" => Some("AccountId"),
        "AccountIndex" => Some("AccountIndex"),
        "Address" => Some("Address"),
        "Balance" => Some("Balance"),
        "BlockNumber" => Some("BlockNumber"),
        "Moment" => Some("Moment"),
        "Era" => Some("Era"),
        "Signature" => Some("Signature"),
        _ => None,
    };
    TypeInfo {
        class,
        sub_type: None,
    }
}


/// Decodes one value of `ty` from the reader into JSON.
///
/// Unsigned integers that fit a JSON number stay numeric; 128 bit values
/// that do not are rendered as decimal strings. Fixed hashes, account ids
/// and byte strings come out as `0x` hex.
pub fn decode_value(
    registry: &TypeRegistry,
    ty: &str,
    input: &mut ScaleReader<'_>,
) -> Result<Value, ScaleError> {
    let ty = registry.resolve(ty);
    if let Some(inner) = generic_inner(&ty, "Compact") {
        return decode_compact(registry, inner, input);
    }
    if let Some(inner) = generic_inner(&ty, "Vec") {
        let len = input.compact_len()?;
        if len > MAX_SEQUENCE_LEN {
            return Err(ScaleError::invalid(format!(
                "sequence length {len} exceeds limit"
            )));
        }
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(decode_value(registry, inner, input)?);
        }
        return Ok(Value::Array(items));
    }
    if let Some(inner) = generic_inner(&ty, "Option") {
        return match input.byte()? {
            0 => Ok(Value::Null),
            1 => decode_value(registry, inner, input),
            other => Err(ScaleError::invalid(format!(
                "invalid option discriminant {other}"
            ))),
        };
    }
    if let Some(inner) = tuple_inner(&ty) {
        let mut items = Vec::new();
        for part in split_subtypes(inner) {
            items.push(decode_value(registry, &part, input)?);
        }
        return Ok(Value::Array(items));
    }
    match ty.as_str() {
        "Null" => Ok(Value::Null),
        "u8" => Ok(input.byte()?.into()),
        "u16" => Ok(input.u16()?.into()),
        "u32" | "AccountIndex" => Ok(input.u32()?.into()),
        "u64" | "Moment" | "BlockNumber" => Ok(input.u64()?.into()),
        "u128" | "Balance" => Ok(json_u128(input.u128()?)),
        "bool" => match input.byte()? {
            0 => Ok(Value::Bool(false)),
            1 => Ok(Value::Bool(true)),
            other => Err(ScaleError::invalid(format!(
                "invalid bool byte 0x{other:02x}"
            ))),
        },
        "String" => Ok(Value::String(input.string()?)),
        "Bytes" => Ok(hex_value(input.byte_string()?)),
        "H160" => Ok(hex_value(input.bytes(20)?)),
        "H256" | "AccountId" => Ok(hex_value(input.bytes(32)?)),
        "H512" | "Signature" => Ok(hex_value(input.bytes(64)?)),
        "Era" => Ok(Value::String(Era::decode(input)?.to_hex())),
        "Address" => match Address::decode(input)? {
            Address::Id(id) => Ok(hex_value(&id)),
            Address::Index(idx) => Ok(idx.into()),
        },
        other => Err(ScaleError::UnsupportedType(other.to_string())),
    }
}


fn decode_compact(
    registry: &TypeRegistry,
    inner: &str,
    input: &mut ScaleReader<'_>,
) -> Result<Value, ScaleError> {
    let inner = registry.resolve(inner);
    match inner.as_str() {
        "u8" | "u16" | "u32" | "u64" | "u128" | "Balance" | "Moment" | "BlockNumber"
        | "AccountIndex" => Ok(json_u128(input.compact_u128()?)),
        other => Err(ScaleError::UnsupportedType(format!("Compact<{other}>"))),
    }
}


fn json_u128(value: u128) -> Value {
    match u64::try_from(value) {
        Ok(small) => small.into(),
        Err(_) => Value::String(value.to_string()),
    }
}


fn hex_value(data: &[u8]) -> Value {
    Value::String(format!("0x{}", hex::encode(data)))
}


fn generic_inner<'t>(ty: &'t str, wrapper: &str) -> Option<&'t str> {
    ty.strip_prefix(wrapper)?
        .strip_prefix('<')?
        .strip_suffix('>')
}


fn tuple_inner(ty: &str) -> Option<&str> {
    ty.strip_prefix('(')?.strip_suffix(')')
}
