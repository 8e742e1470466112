//! Borsh codec driven by interface definitions.
//!
//! Decoding produces an [`IdlValue`] tree that still mirrors the declared
//! types; [`crate::serializer`] turns it into plain JSON.

pub mod account;
pub mod event;
pub mod instruction;
pub mod reader;
pub mod writer;

use sha2::{Digest, Sha256};
use solana_pubkey::Pubkey;

pub use account::{AccountLayout, AccountsCoder};
pub use event::{DecodedIdlEvent, EventLayout, EventParser};
pub use instruction::{DecodedIdlInstruction, InstructionCoder, InstructionLayout};
pub use reader::BorshReader;
pub use writer::BorshWriter;

use crate::error::Error;
use crate::idl::{
    IdlArrayLen, IdlDefinedFields, IdlType, IdlTypeDefTy, TypeCatalog, describe_type,
};

pub const DISCRIMINATOR_LEN: usize = 8;

/// Nesting limit for `defined` references, options and sequences.
pub const MAX_DEPTH: usize = 64;

/// Largest transaction packet, and so an upper bound on any instruction payload.
pub const PACKET_DATA_SIZE: usize = 1232;

/// First eight bytes of `sha256("{namespace}:{name}")`.
pub fn sighash(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LEN] {
    let digest = Sha256::digest(format!("{namespace}:{name}").as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&digest[..DISCRIMINATOR_LEN]);
    out
}

/// A decoded value that still carries the shape of its declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum IdlValue {
    Bool(bool),
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    F32(f32),
    U64(u64),
    I64(i64),
    F64(f64),
    U128(u128),
    I128(i128),
    /// Little-endian two's complement bytes.
    U256([u8; 32]),
    I256([u8; 32]),
    String(String),
    Bytes(Vec<u8>),
    PublicKey(Pubkey),
    Option(Option<Box<IdlValue>>),
    Seq(Vec<IdlValue>),
    Struct(Vec<(String, IdlValue)>),
    Tuple(Vec<IdlValue>),
    Enum {
        variant: String,
        fields: Box<IdlValue>,
    },
}

impl IdlValue {
    pub fn field(&self, name: &str) -> Option<&IdlValue> {
        match self {
            Self::Struct(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::U8(_) => "u8",
            Self::I8(_) => "i8",
            Self::U16(_) => "u16",
            Self::I16(_) => "i16",
            Self::U32(_) => "u32",
            Self::I32(_) => "i32",
            Self::F32(_) => "f32",
            Self::U64(_) => "u64",
            Self::I64(_) => "i64",
            Self::F64(_) => "f64",
            Self::U128(_) => "u128",
            Self::I128(_) => "i128",
            Self::U256(_) => "u256",
            Self::I256(_) => "i256",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::PublicKey(_) => "pubkey",
            Self::Option(_) => "option",
            Self::Seq(_) => "sequence",
            Self::Struct(_) => "struct",
            Self::Tuple(_) => "tuple",
            Self::Enum { .. } => "enum",
        }
    }

    /// The all-zero value of `ty`: zero numbers, empty strings and sequences,
    /// `None` options and the first variant of enums. Fixed arrays are expanded,
    /// so their combined element count is capped at [`PACKET_DATA_SIZE`].
    pub fn zero_of(ty: &IdlType, catalog: &TypeCatalog) -> Result<Self, Error> {
        ZeroBuilder::new(catalog).value(ty, 0, 1)
    }

    pub fn zero_of_fields(fields: &IdlDefinedFields, catalog: &TypeCatalog) -> Result<Self, Error> {
        ZeroBuilder::new(catalog).fields(fields, 0, 1)
    }
}

/// Declared length of a fixed array. Const-generic lengths cannot be resolved.
pub(crate) fn array_len(len: &IdlArrayLen) -> Result<usize, Error> {
    match len {
        IdlArrayLen::Value(len) => Ok(*len),
        IdlArrayLen::Generic(name) => Err(Error::UnsupportedType {
            name: format!("array length `{name}`"),
        }),
    }
}

struct ZeroBuilder<'a> {
    catalog: &'a TypeCatalog,
    /// Array elements still allowed, counting every copy of nested arrays.
    budget: usize,
}

impl<'a> ZeroBuilder<'a> {
    fn new(catalog: &'a TypeCatalog) -> Self {
        Self {
            catalog,
            budget: PACKET_DATA_SIZE,
        }
    }

    /// `copies` is how many times the produced value is repeated by enclosing arrays.
    fn value(&mut self, ty: &IdlType, depth: usize, copies: usize) -> Result<IdlValue, Error> {
        if depth > MAX_DEPTH {
            return Err(Error::malformed("type nesting exceeds depth limit"));
        }
        Ok(match ty {
            IdlType::Bool => IdlValue::Bool(false),
            IdlType::U8 => IdlValue::U8(0),
            IdlType::I8 => IdlValue::I8(0),
            IdlType::U16 => IdlValue::U16(0),
            IdlType::I16 => IdlValue::I16(0),
            IdlType::U32 => IdlValue::U32(0),
            IdlType::I32 => IdlValue::I32(0),
            IdlType::F32 => IdlValue::F32(0.0),
            IdlType::U64 => IdlValue::U64(0),
            IdlType::I64 => IdlValue::I64(0),
            IdlType::F64 => IdlValue::F64(0.0),
            IdlType::U128 => IdlValue::U128(0),
            IdlType::I128 => IdlValue::I128(0),
            IdlType::U256 => IdlValue::U256([0; 32]),
            IdlType::I256 => IdlValue::I256([0; 32]),
            IdlType::String => IdlValue::String(String::new()),
            IdlType::Bytes => IdlValue::Bytes(Vec::new()),
            IdlType::Pubkey => IdlValue::PublicKey(Pubkey::new_from_array([0; 32])),
            IdlType::Option(_) => IdlValue::Option(None),
            IdlType::Vec(_) => IdlValue::Seq(Vec::new()),
            IdlType::Array(inner, len) => {
                let len = array_len(len)?;
                let total = len
                    .checked_mul(copies)
                    .filter(|total| *total <= self.budget)
                    .ok_or_else(|| {
                        Error::mismatch(format!(
                            "fixed array of {len} elements cannot fit an instruction payload"
                        ))
                    })?;
                self.budget -= total;
                let item = self.value(inner, depth + 1, total)?;
                IdlValue::Seq(vec![item; len])
            }
            IdlType::Defined { name, .. } => match &self.catalog.resolve(name)?.ty {
                IdlTypeDefTy::Struct { fields: Some(fields) } => {
                    self.fields(fields, depth + 1, copies)?
                }
                IdlTypeDefTy::Struct { fields: None } => IdlValue::Struct(Vec::new()),
                IdlTypeDefTy::Enum { variants } => {
                    let first = variants.first().ok_or_else(|| {
                        Error::mismatch(format!("enum `{name}` declares no variants"))
                    })?;
                    let fields = match &first.fields {
                        Some(fields) => self.fields(fields, depth + 1, copies)?,
                        None => IdlValue::Struct(Vec::new()),
                    };
                    IdlValue::Enum {
                        variant: first.name.clone(),
                        fields: Box::new(fields),
                    }
                }
                IdlTypeDefTy::Type { alias } => self.value(alias, depth + 1, copies)?,
            },
            other => {
                return Err(Error::UnsupportedType {
                    name: describe_type(other),
                });
            }
        })
    }

    fn fields(
        &mut self,
        fields: &IdlDefinedFields,
        depth: usize,
        copies: usize,
    ) -> Result<IdlValue, Error> {
        Ok(match fields {
            IdlDefinedFields::Named(named) => IdlValue::Struct(
                named
                    .iter()
                    .map(|f| Ok((f.name.clone(), self.value(&f.ty, depth, copies)?)))
                    .collect::<Result<_, Error>>()?,
            ),
            IdlDefinedFields::Tuple(types) => IdlValue::Tuple(
                types
                    .iter()
                    .map(|t| self.value(t, depth, copies))
                    .collect::<Result<_, Error>>()?,
            ),
        })
    }
}
