use anchor_lang_idl_spec::{IdlDefinedFields, IdlType, IdlTypeDef, IdlTypeDefTy};

use crate::error::Error;

/// Named types an interface makes available to `defined` references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeCatalog {
    types: Vec<IdlTypeDef>,
}

impl TypeCatalog {
    pub fn new(types: Vec<IdlTypeDef>) -> Self {
        Self { types }
    }

    /// First definition with a matching name wins.
    pub fn resolve(&self, name: &str) -> Result<&IdlTypeDef, Error> {
        self.types
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::MissingDefinedType {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.iter().any(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Field list of the named struct. Enums and aliases are rejected because
    /// accounts and events always decode as a field list.
    pub fn struct_fields(&self, name: &str) -> Result<IdlDefinedFields, Error> {
        match &self.resolve(name)?.ty {
            IdlTypeDefTy::Struct { fields } => Ok(fields_or_empty(fields.as_ref())),
            IdlTypeDefTy::Enum { .. } | IdlTypeDefTy::Type { .. } => Err(Error::Interface {
                reason: format!("`{name}` must be declared as a struct"),
            }),
        }
    }
}

/// A struct declared without `fields` has no fields at all.
pub fn fields_or_empty(fields: Option<&IdlDefinedFields>) -> IdlDefinedFields {
    fields
        .cloned()
        .unwrap_or_else(|| IdlDefinedFields::Named(Vec::new()))
}

/// Short human-readable rendering of a declared type for error messages.
pub fn describe_type(ty: &IdlType) -> String {
    match serde_json::to_value(ty) {
        Ok(serde_json::Value::String(name)) => name,
        Ok(other) => other.to_string(),
        Err(_) => format!("{ty:?}"),
    }
}
