use borsh::BorshSerialize;

use crate::codec::{IdlValue, MAX_DEPTH, array_len};
use crate::error::Error;
use crate::idl::{IdlDefinedFields, IdlType, IdlTypeDefTy, TypeCatalog, describe_type};

/// Borsh encoder, the inverse of [`crate::codec::BorshReader`].
#[derive(Debug, Default)]
pub struct BorshWriter {
    buf: Vec<u8>,
}

impl BorshWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Serializes one borsh value onto the end of the buffer.
    pub fn write<T: BorshSerialize + ?Sized>(&mut self, value: &T) -> Result<(), Error> {
        value
            .serialize(&mut self.buf)
            .map_err(|e| Error::mismatch(e.to_string()))
    }

    pub fn write_value(
        &mut self,
        ty: &IdlType,
        value: &IdlValue,
        catalog: &TypeCatalog,
    ) -> Result<(), Error> {
        self.write_nested(ty, value, catalog, 0)
    }

    pub fn write_fields(
        &mut self,
        fields: &IdlDefinedFields,
        value: &IdlValue,
        catalog: &TypeCatalog,
    ) -> Result<(), Error> {
        self.write_fields_nested(fields, value, catalog, 0)
    }

    fn write_len(&mut self, len: usize) -> Result<(), Error> {
        let len = u32::try_from(len)
            .map_err(|_| Error::mismatch(format!("length {len} does not fit in u32")))?;
        self.write(&len)
    }

    fn write_fields_nested(
        &mut self,
        fields: &IdlDefinedFields,
        value: &IdlValue,
        catalog: &TypeCatalog,
        depth: usize,
    ) -> Result<(), Error> {
        match (fields, value) {
            (IdlDefinedFields::Named(named), IdlValue::Struct(_)) => {
                for field in named {
                    let field_value = value.field(&field.name).ok_or_else(|| {
                        Error::mismatch(format!("missing field `{}`", field.name))
                    })?;
                    self.write_nested(&field.ty, field_value, catalog, depth)?;
                }
                Ok(())
            }
            (IdlDefinedFields::Tuple(types), IdlValue::Tuple(items))
                if types.len() == items.len() =>
            {
                for (ty, item) in types.iter().zip(items) {
                    self.write_nested(ty, item, catalog, depth)?;
                }
                Ok(())
            }
            (_, other) => Err(Error::mismatch(format!(
                "expected field list, got {}",
                other.kind()
            ))),
        }
    }

    fn write_nested(
        &mut self,
        ty: &IdlType,
        value: &IdlValue,
        catalog: &TypeCatalog,
        depth: usize,
    ) -> Result<(), Error> {
        if depth > MAX_DEPTH {
            return Err(Error::malformed("type nesting exceeds depth limit"));
        }
        match (ty, value) {
            (IdlType::Bool, IdlValue::Bool(v)) => self.write(v),
            (IdlType::U8, IdlValue::U8(v)) => self.write(v),
            (IdlType::I8, IdlValue::I8(v)) => self.write(v),
            (IdlType::U16, IdlValue::U16(v)) => self.write(v),
            (IdlType::I16, IdlValue::I16(v)) => self.write(v),
            (IdlType::U32, IdlValue::U32(v)) => self.write(v),
            (IdlType::I32, IdlValue::I32(v)) => self.write(v),
            (IdlType::F32, IdlValue::F32(v)) => self.write(&v.to_bits()),
            (IdlType::U64, IdlValue::U64(v)) => self.write(v),
            (IdlType::I64, IdlValue::I64(v)) => self.write(v),
            (IdlType::F64, IdlValue::F64(v)) => self.write(&v.to_bits()),
            (IdlType::U128, IdlValue::U128(v)) => self.write(v),
            (IdlType::I128, IdlValue::I128(v)) => self.write(v),
            (IdlType::U256, IdlValue::U256(v)) | (IdlType::I256, IdlValue::I256(v)) => {
                self.write(v)
            }
            (IdlType::String, IdlValue::String(v)) => self.write(v),
            (IdlType::Bytes, IdlValue::Bytes(v)) => self.write(v),
            (IdlType::Pubkey, IdlValue::PublicKey(key)) => self.write(&key.to_bytes()),
            (IdlType::Option(inner), IdlValue::Option(opt)) => {
                self.write(&opt.is_some())?;
                match opt {
                    Some(inner_value) => self.write_nested(inner, inner_value, catalog, depth + 1),
                    None => Ok(()),
                }
            }
            (IdlType::Vec(inner), IdlValue::Seq(items)) => {
                self.write_len(items.len())?;
                self.write_items(inner, items, catalog, depth)
            }
            (IdlType::Array(inner, len), IdlValue::Seq(items)) => {
                let len = array_len(len)?;
                if items.len() != len {
                    return Err(Error::mismatch(format!(
                        "array expects {len} elements, got {}",
                        items.len()
                    )));
                }
                self.write_items(inner, items, catalog, depth)
            }
            (IdlType::Defined { name, .. }, _) => match &catalog.resolve(name)?.ty {
                IdlTypeDefTy::Struct { fields: Some(fields) } => {
                    self.write_fields_nested(fields, value, catalog, depth + 1)
                }
                IdlTypeDefTy::Struct { fields: None } => match value {
                    IdlValue::Struct(_) => Ok(()),
                    other => Err(unexpected(ty, other)),
                },
                IdlTypeDefTy::Enum { variants } => {
                    let IdlValue::Enum { variant, fields } = value else {
                        return Err(unexpected(ty, value));
                    };
                    let (index, declared) = variants
                        .iter()
                        .enumerate()
                        .find(|(_, v)| v.name.eq_ignore_ascii_case(variant))
                        .ok_or_else(|| {
                            Error::mismatch(format!("enum `{name}` has no variant `{variant}`"))
                        })?;
                    let index = u8::try_from(index).map_err(|_| {
                        Error::mismatch(format!("enum `{name}` has more than 256 variants"))
                    })?;
                    self.write(&index)?;
                    match &declared.fields {
                        Some(declared) => {
                            self.write_fields_nested(declared, fields, catalog, depth + 1)
                        }
                        None => Ok(()),
                    }
                }
                IdlTypeDefTy::Type { alias } => self.write_nested(alias, value, catalog, depth + 1),
            },
            (IdlType::Generic(_), _) => Err(Error::UnsupportedType {
                name: describe_type(ty),
            }),
            (ty, other) => Err(unexpected(ty, other)),
        }
    }

    fn write_items(
        &mut self,
        inner: &IdlType,
        items: &[IdlValue],
        catalog: &TypeCatalog,
        depth: usize,
    ) -> Result<(), Error> {
        for item in items {
            self.write_nested(inner, item, catalog, depth + 1)?;
        }
        Ok(())
    }
}

fn unexpected(ty: &IdlType, value: &IdlValue) -> Error {
    Error::mismatch(format!("expected {}, got {}", describe_type(ty), value.kind()))
}
