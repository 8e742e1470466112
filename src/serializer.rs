//! Turns schema-typed [`IdlValue`] trees into plain JSON.
//!
//! Integers of 64 bits and wider become decimal strings, public keys become
//! base58, `bytes` become base64 and strings lose embedded NUL characters.
//! Struct output keeps the declared field order. Enums are emitted as
//! `{ "<variant>": { ...fields } }`, with the variant matched against the
//! declaration case-insensitively.

use base64::{Engine, prelude::BASE64_STANDARD};
use serde_json::{Map, Number, Value};

use crate::codec::{IdlValue, MAX_DEPTH};
use crate::error::Error;
use crate::idl::{
    IdlDefinedFields, IdlEnumVariant, IdlType, IdlTypeDefTy, TypeCatalog, describe_type,
};
use crate::keys::pubkey_to_base58;

pub fn serialize_value(
    value: &IdlValue,
    ty: &IdlType,
    catalog: &TypeCatalog,
) -> Result<Value, Error> {
    serialize(value, ty, catalog, 0)
}

/// Serializes a struct (or tuple struct) value against its declared fields.
pub fn serialize_fields(
    value: &IdlValue,
    fields: &IdlDefinedFields,
    catalog: &TypeCatalog,
) -> Result<Value, Error> {
    serialize_fields_nested(value, fields, catalog, 0)
}

fn serialize(
    value: &IdlValue,
    ty: &IdlType,
    catalog: &TypeCatalog,
    depth: usize,
) -> Result<Value, Error> {
    if depth > MAX_DEPTH {
        return Err(Error::malformed("type nesting exceeds depth limit"));
    }
    Ok(match (ty, value) {
        (IdlType::Bool, IdlValue::Bool(v)) => Value::Bool(*v),
        (IdlType::U8, IdlValue::U8(v)) => Value::from(*v),
        (IdlType::I8, IdlValue::I8(v)) => Value::from(*v),
        (IdlType::U16, IdlValue::U16(v)) => Value::from(*v),
        (IdlType::I16, IdlValue::I16(v)) => Value::from(*v),
        (IdlType::U32, IdlValue::U32(v)) => Value::from(*v),
        (IdlType::I32, IdlValue::I32(v)) => Value::from(*v),
        (IdlType::F32, IdlValue::F32(v)) => float(f64::from(*v)),
        (IdlType::F64, IdlValue::F64(v)) => float(*v),
        (IdlType::U64, IdlValue::U64(v)) => Value::String(v.to_string()),
        (IdlType::I64, IdlValue::I64(v)) => Value::String(v.to_string()),
        (IdlType::U128, IdlValue::U128(v)) => Value::String(v.to_string()),
        (IdlType::I128, IdlValue::I128(v)) => Value::String(v.to_string()),
        (IdlType::U256, IdlValue::U256(bytes)) => Value::String(u256_to_decimal(*bytes)),
        (IdlType::I256, IdlValue::I256(bytes)) => Value::String(i256_to_decimal(*bytes)),
        (IdlType::String, IdlValue::String(s)) => Value::String(s.replace('\0', "")),
        (IdlType::Bytes, IdlValue::Bytes(bytes)) => Value::String(BASE64_STANDARD.encode(bytes)),
        (IdlType::Pubkey, IdlValue::PublicKey(key)) => Value::String(pubkey_to_base58(key)),
        (IdlType::Option(_), IdlValue::Option(None)) => Value::Null,
        (IdlType::Option(inner), IdlValue::Option(Some(inner_value))) => {
            serialize(inner_value, inner, catalog, depth + 1)?
        }
        (IdlType::Vec(inner) | IdlType::Array(inner, _), IdlValue::Seq(items)) => items
            .iter()
            .map(|item| serialize(item, inner, catalog, depth + 1))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)?,
        (IdlType::Defined { name, .. }, _) => match &catalog.resolve(name)?.ty {
            IdlTypeDefTy::Struct { fields: Some(fields) } => {
                serialize_fields_nested(value, fields, catalog, depth + 1)?
            }
            IdlTypeDefTy::Struct { fields: None } => match value {
                IdlValue::Struct(_) => Value::Object(Map::new()),
                other => return Err(mismatch(ty, other)),
            },
            IdlTypeDefTy::Enum { variants } => serialize_enum(value, variants, catalog, depth + 1)?,
            IdlTypeDefTy::Type { alias } => serialize(value, alias, catalog, depth + 1)?,
        },
        (IdlType::Generic(_), _) => {
            return Err(Error::UnsupportedType {
                name: describe_type(ty),
            });
        }
        (ty, other) => return Err(mismatch(ty, other)),
    })
}

fn serialize_fields_nested(
    value: &IdlValue,
    fields: &IdlDefinedFields,
    catalog: &TypeCatalog,
    depth: usize,
) -> Result<Value, Error> {
    match (fields, value) {
        (IdlDefinedFields::Named(named), IdlValue::Struct(_)) => {
            let mut out = Map::with_capacity(named.len());
            for field in named {
                let serialized = match value.field(&field.name) {
                    Some(field_value) => serialize(field_value, &field.ty, catalog, depth)?,
                    None if matches!(field.ty, IdlType::Option(_)) => Value::Null,
                    None => {
                        return Err(Error::mismatch(format!(
                            "value has no field `{}`",
                            field.name
                        )));
                    }
                };
                out.insert(field.name.clone(), serialized);
            }
            Ok(Value::Object(out))
        }
        (IdlDefinedFields::Tuple(types), IdlValue::Tuple(items)) if types.len() == items.len() => {
            types
                .iter()
                .zip(items)
                .map(|(ty, item)| serialize(item, ty, catalog, depth))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        (_, other) => Err(Error::mismatch(format!(
            "expected a struct value, got {}",
            other.kind()
        ))),
    }
}

fn serialize_enum(
    value: &IdlValue,
    variants: &[IdlEnumVariant],
    catalog: &TypeCatalog,
    depth: usize,
) -> Result<Value, Error> {
    let IdlValue::Enum {
        variant,
        fields: variant_value,
    } = value
    else {
        return Err(Error::mismatch(format!(
            "expected an enum value, got {}",
            value.kind()
        )));
    };

    let declared = variants
        .iter()
        .find(|v| v.name.eq_ignore_ascii_case(variant))
        .ok_or_else(|| Error::mismatch(format!("unknown enum variant `{variant}`")))?;

    let body = match &declared.fields {
        None => Value::Object(Map::new()),
        Some(IdlDefinedFields::Tuple(types)) if types.is_empty() => Value::Object(Map::new()),
        Some(IdlDefinedFields::Tuple(_)) => {
            return Err(Error::UnsupportedTupleEnum {
                variant: declared.name.clone(),
            });
        }
        Some(named) => serialize_fields_nested(variant_value, named, catalog, depth)?,
    };

    let mut out = Map::with_capacity(1);
    out.insert(variant.clone(), body);
    Ok(Value::Object(out))
}

/// Non-finite floats have no JSON number form and are emitted as text.
fn float(v: f64) -> Value {
    Number::from_f64(v).map_or_else(|| Value::String(v.to_string()), Value::Number)
}

fn u256_to_decimal(le: [u8; 32]) -> String {
    // Little-endian base-2^32 limbs, repeatedly divided by 10^9.
    let mut limbs = [0u32; 8];
    for (limb, chunk) in limbs.iter_mut().zip(le.chunks_exact(4)) {
        *limb = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }

    let mut groups = Vec::new();
    while limbs.iter().any(|&l| l != 0) {
        let mut rem = 0u64;
        for limb in limbs.iter_mut().rev() {
            let cur = (rem << 32) | u64::from(*limb);
            *limb = (cur / 1_000_000_000) as u32;
            rem = cur % 1_000_000_000;
        }
        groups.push(rem as u32);
    }

    let Some((most, rest)) = groups.split_last() else {
        return "0".to_string();
    };
    let mut out = most.to_string();
    for group in rest.iter().rev() {
        out.push_str(&format!("{group:09}"));
    }
    out
}

fn i256_to_decimal(le: [u8; 32]) -> String {
    if le[31] & 0x80 == 0 {
        return u256_to_decimal(le);
    }
    // Two's complement magnitude: invert and add one.
    let mut magnitude = le.map(|b| !b);
    for byte in &mut magnitude {
        let (sum, carry) = byte.overflowing_add(1);
        *byte = sum;
        if !carry {
            break;
        }
    }
    format!("-{}", u256_to_decimal(magnitude))
}

fn mismatch(ty: &IdlType, value: &IdlValue) -> Error {
    Error::mismatch(format!("expected {}, got {}", describe_type(ty), value.kind()))
}
