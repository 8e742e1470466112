use borsh::BorshDeserialize;
use solana_pubkey::Pubkey;

use crate::codec::{IdlValue, MAX_DEPTH, array_len};
use crate::error::Error;
use crate::idl::{IdlDefinedFields, IdlType, IdlTypeDefTy, TypeCatalog, describe_type};

/// Upper bound on the declared length of a sequence whose elements take no bytes.
const ZERO_SIZED_SEQ_LIMIT: usize = 4096;

/// Cursor over a borsh payload. Leaf values go through [`BorshDeserialize`];
/// the reader only walks the declared schema around them.
pub struct BorshReader<'a> {
    rest: &'a [u8],
    len: usize,
}

impl<'a> BorshReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            rest: data,
            len: data.len(),
        }
    }

    pub fn position(&self) -> usize {
        self.len - self.rest.len()
    }

    pub fn remaining(&self) -> usize {
        self.rest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Deserializes one borsh value and advances past it.
    pub fn read<T: BorshDeserialize>(&mut self) -> Result<T, Error> {
        let offset = self.position();
        T::deserialize(&mut self.rest)
            .map_err(|e| Error::malformed(format!("{e} at offset {offset}")))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        if len > self.rest.len() {
            return Err(Error::malformed(format!(
                "unexpected end of data: need {len} bytes at offset {}, {} left",
                self.position(),
                self.remaining()
            )));
        }
        let (head, tail) = self.rest.split_at(len);
        self.rest = tail;
        Ok(head)
    }

    /// Everything not consumed yet.
    pub fn read_rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.rest)
    }

    pub fn read_value(&mut self, ty: &IdlType, catalog: &TypeCatalog) -> Result<IdlValue, Error> {
        self.read_nested(ty, catalog, 0)
    }

    /// Reads the fields of a struct or enum variant in declaration order.
    pub fn read_fields(
        &mut self,
        fields: &IdlDefinedFields,
        catalog: &TypeCatalog,
    ) -> Result<IdlValue, Error> {
        self.read_fields_nested(fields, catalog, 0)
    }

    fn read_fields_nested(
        &mut self,
        fields: &IdlDefinedFields,
        catalog: &TypeCatalog,
        depth: usize,
    ) -> Result<IdlValue, Error> {
        match fields {
            IdlDefinedFields::Named(named) => {
                let mut out = Vec::with_capacity(named.len());
                for field in named {
                    let value = self
                        .read_nested(&field.ty, catalog, depth)
                        .map_err(|e| annotate(e, &field.name))?;
                    out.push((field.name.clone(), value));
                }
                Ok(IdlValue::Struct(out))
            }
            IdlDefinedFields::Tuple(types) => {
                let mut out = Vec::with_capacity(types.len());
                for ty in types {
                    out.push(self.read_nested(ty, catalog, depth)?);
                }
                Ok(IdlValue::Tuple(out))
            }
        }
    }

    fn read_nested(
        &mut self,
        ty: &IdlType,
        catalog: &TypeCatalog,
        depth: usize,
    ) -> Result<IdlValue, Error> {
        if depth > MAX_DEPTH {
            return Err(Error::malformed("type nesting exceeds depth limit"));
        }
        Ok(match ty {
            IdlType::Bool => IdlValue::Bool(self.read()?),
            IdlType::U8 => IdlValue::U8(self.read()?),
            IdlType::I8 => IdlValue::I8(self.read()?),
            IdlType::U16 => IdlValue::U16(self.read()?),
            IdlType::I16 => IdlValue::I16(self.read()?),
            IdlType::U32 => IdlValue::U32(self.read()?),
            IdlType::I32 => IdlValue::I32(self.read()?),
            // borsh refuses NaN, which a program is free to store
            IdlType::F32 => IdlValue::F32(f32::from_bits(self.read()?)),
            IdlType::U64 => IdlValue::U64(self.read()?),
            IdlType::I64 => IdlValue::I64(self.read()?),
            IdlType::F64 => IdlValue::F64(f64::from_bits(self.read()?)),
            IdlType::U128 => IdlValue::U128(self.read()?),
            IdlType::I128 => IdlValue::I128(self.read()?),
            IdlType::U256 => IdlValue::U256(self.read()?),
            IdlType::I256 => IdlValue::I256(self.read()?),
            IdlType::String => IdlValue::String(self.read()?),
            IdlType::Bytes => IdlValue::Bytes(self.read()?),
            IdlType::Pubkey => IdlValue::PublicKey(Pubkey::new_from_array(self.read()?)),
            IdlType::Option(inner) => {
                let present: bool = self.read().map_err(|e| annotate(e, "option tag"))?;
                IdlValue::Option(if present {
                    Some(Box::new(self.read_nested(inner, catalog, depth + 1)?))
                } else {
                    None
                })
            }
            IdlType::Vec(inner) => {
                let len: u32 = self.read()?;
                self.read_seq(inner, len as usize, catalog, depth)?
            }
            IdlType::Array(inner, len) => self.read_seq(inner, array_len(len)?, catalog, depth)?,
            IdlType::Defined { name, .. } => match &catalog.resolve(name)?.ty {
                IdlTypeDefTy::Struct { fields: Some(fields) } => {
                    self.read_fields_nested(fields, catalog, depth + 1)?
                }
                IdlTypeDefTy::Struct { fields: None } => IdlValue::Struct(Vec::new()),
                IdlTypeDefTy::Enum { variants } => {
                    let index: u8 = self.read()?;
                    let variant = variants.get(usize::from(index)).ok_or_else(|| {
                        Error::malformed(format!("enum `{name}` has no variant {index}"))
                    })?;
                    let fields = match &variant.fields {
                        Some(fields) => self.read_fields_nested(fields, catalog, depth + 1)?,
                        None => IdlValue::Struct(Vec::new()),
                    };
                    IdlValue::Enum {
                        variant: variant.name.clone(),
                        fields: Box::new(fields),
                    }
                }
                IdlTypeDefTy::Type { alias } => self.read_nested(alias, catalog, depth + 1)?,
            },
            other => {
                return Err(Error::UnsupportedType {
                    name: describe_type(other),
                });
            }
        })
    }

    fn read_seq(
        &mut self,
        inner: &IdlType,
        len: usize,
        catalog: &TypeCatalog,
        depth: usize,
    ) -> Result<IdlValue, Error> {
        let mut items = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            let before = self.remaining();
            items.push(self.read_nested(inner, catalog, depth + 1)?);
            if self.remaining() == before && len > ZERO_SIZED_SEQ_LIMIT {
                return Err(Error::malformed(format!(
                    "sequence of {len} zero-sized elements"
                )));
            }
        }
        Ok(IdlValue::Seq(items))
    }
}

fn annotate(err: Error, field: &str) -> Error {
    match err {
        Error::MalformedPayload { reason } => Error::MalformedPayload {
            reason: format!("{field}: {reason}"),
        },
        other => other,
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::*;
    use crate::idl::IdlTypeDef;

    fn catalog() -> TypeCatalog {
        let defs: Vec<IdlTypeDef> = serde_json::from_value(serde_json::json!([
            {"name": "Point", "type": {"kind": "struct", "fields": [
                {"name": "x", "type": "i16"}, {"name": "y", "type": "i16"}
            ]}},
            {"name": "Shape", "type": {"kind": "enum", "variants": [
                {"name": "Empty"},
                {"name": "Dot", "fields": [{"name": "at", "type": {"defined": {"name": "Point"}}}]}
            ]}},
            {"name": "Loop", "type": {"kind": "struct", "fields": [
                {"name": "next", "type": {"defined": {"name": "Loop"}}}
            ]}},
            {"name": "Unit", "type": {"kind": "struct"}}
        ]))
        .unwrap();
        TypeCatalog::new(defs)
    }

    fn defined(name: &str) -> IdlType {
        IdlType::Defined {
            name: name.to_string(),
            generics: Vec::new(),
        }
    }

    #[test]
    fn reads_little_endian_leaves() {
        let mut reader = BorshReader::new(&[0x34, 0x12, 0xff, 1]);
        assert_eq!(reader.read::<u16>().unwrap(), 0x1234);
        assert_eq!(reader.read::<i8>().unwrap(), -1);
        assert!(reader.read::<bool>().unwrap());
        assert!(reader.is_empty());
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn truncated_input_is_malformed() {
        let mut reader = BorshReader::new(&[1, 2, 3]);
        assert!(matches!(
            reader.read::<u64>(),
            Err(Error::MalformedPayload { .. })
        ));
        assert!(matches!(
            BorshReader::new(&[1]).read_bytes(2),
            Err(Error::MalformedPayload { .. })
        ));
    }

    #[test]
    fn reads_nested_enum_struct() {
        let data = [1u8, 0xfe, 0xff, 0x05, 0x00];
        let mut reader = BorshReader::new(&data);
        let value = reader.read_value(&defined("Shape"), &catalog()).unwrap();
        assert_eq!(
            value,
            IdlValue::Enum {
                variant: "Dot".to_string(),
                fields: Box::new(IdlValue::Struct(vec![(
                    "at".to_string(),
                    IdlValue::Struct(vec![
                        ("x".to_string(), IdlValue::I16(-2)),
                        ("y".to_string(), IdlValue::I16(5)),
                    ])
                )])),
            }
        );
    }

    #[test]
    fn invalid_option_tag_is_rejected() {
        let ty = IdlType::Option(Box::new(IdlType::U8));
        let mut reader = BorshReader::new(&[2, 0]);
        let err = reader.read_value(&ty, &catalog()).unwrap_err();
        assert!(err.to_string().contains("option tag"));
    }

    #[test]
    fn nan_floats_are_read_bit_for_bit() {
        let bits = f64::NAN.to_bits();
        let bytes = bits.to_le_bytes();
        let mut reader = BorshReader::new(&bytes);
        let IdlValue::F64(value) = reader.read_value(&IdlType::F64, &catalog()).unwrap() else {
            unreachable!("declared as f64");
        };
        assert_eq!(value.to_bits(), bits);
    }

    #[test]
    fn strings_and_vectors_use_u32_prefix() {
        let mut data = vec![3, 0, 0, 0];
        data.extend_from_slice(b"abc");
        data.extend_from_slice(&[2, 0, 0, 0, 7, 9]);
        let mut reader = BorshReader::new(&data);
        let cat = catalog();
        assert_eq!(
            reader.read_value(&IdlType::String, &cat).unwrap(),
            IdlValue::String("abc".to_string())
        );
        assert_eq!(
            reader
                .read_value(&IdlType::Vec(Box::new(IdlType::U8)), &cat)
                .unwrap(),
            IdlValue::Seq(vec![IdlValue::U8(7), IdlValue::U8(9)])
        );
    }

    #[test]
    fn self_referential_type_hits_depth_limit() {
        let mut reader = BorshReader::new(&[]);
        let err = reader.read_value(&defined("Loop"), &catalog()).unwrap_err();
        assert!(matches!(err, Error::MalformedPayload { .. }));
    }

    #[test]
    fn zero_sized_sequence_with_huge_length_is_rejected() {
        let ty = IdlType::Vec(Box::new(defined("Unit")));
        let mut reader = BorshReader::new(&[0xff, 0xff, 0xff, 0xff]);
        assert!(reader.read_value(&ty, &catalog()).is_err());
    }
}
