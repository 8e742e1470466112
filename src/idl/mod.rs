//! Operator-supplied program interface definitions (IDLs).
//!
//! Two historical JSON shapes exist. The current one carries a top-level
//! `address` and explicit `discriminator` arrays on instructions, accounts and
//! events. The legacy one carries neither; it is brought into the current
//! model by `anchor_lang_idl::convert`, which derives the discriminators from
//! hashed names (see [`crate::codec::sighash`]).

pub mod catalog;

pub use anchor_lang_idl_spec::{
    Idl, IdlArrayLen, IdlDefinedFields, IdlEnumVariant, IdlField, IdlType, IdlTypeDef,
    IdlTypeDefTy,
};
pub use catalog::{TypeCatalog, describe_type, fields_or_empty};

use anchor_lang_idl::convert::convert_idl;
use heck::ToLowerCamelCase;
use serde_json::{Map, Value, json};

use crate::error::Error;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum InterfaceDialect {
    /// Pre-0.30 Anchor layout: discriminators are hashed from names.
    Legacy,
    /// 0.30+ Anchor layout: discriminators are spelled out.
    Current,
}

impl InterfaceDialect {
    /// An interface is current when it declares a top-level `address`, or when its
    /// first instruction carries a `discriminator`. Anything else is legacy.
    pub fn detect(interface: &Value) -> Self {
        let instructions = entries(interface, "instructions");
        let first_has_discriminator = instructions
            .first()
            .is_some_and(|ix| ix.get("discriminator").is_some());
        if interface.get("address").is_some() || first_has_discriminator {
            return Self::Current;
        }

        let stray_discriminators = instructions
            .iter()
            .chain(entries(interface, "accounts"))
            .any(|item| item.get("discriminator").is_some());
        if stray_discriminators {
            tracing::warn!(
                interface = interface
                    .get("name")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("<unnamed>"),
                "interface carries discriminators but no dialect signature; treating it as legacy"
            );
        }
        Self::Legacy
    }
}

fn entries<'a>(interface: &'a Value, key: &str) -> &'a [Value] {
    interface
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Schema for one on-chain program. Immutable once registered.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramInterface {
    dialect: InterfaceDialect,
    idl: Idl,
}

impl ProgramInterface {
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Self::from_value(serde_json::from_str(json)?)
    }

    /// Parses either dialect into the current interface model. Legacy names
    /// come back from conversion in snake case and are restored to camel case,
    /// which is how legacy clients spell instruction and field names.
    pub fn from_value(value: Value) -> Result<Self, Error> {
        let dialect = InterfaceDialect::detect(&value);
        let idl = match dialect {
            InterfaceDialect::Current => serde_json::from_value(normalize_current(value)?)
                .map_err(|e| rejected(dialect, e))?,
            InterfaceDialect::Legacy => {
                let bytes = serde_json::to_vec(&normalize_legacy(value)?)?;
                let mut idl = convert_idl(&bytes).map_err(|e| rejected(dialect, format!("{e:#}")))?;
                camel_case_names(&mut idl);
                idl
            }
        };
        Ok(Self { dialect, idl })
    }

    pub fn dialect(&self) -> InterfaceDialect {
        self.dialect
    }

    pub fn idl(&self) -> &Idl {
        &self.idl
    }

    pub fn display_name(&self) -> &str {
        match self.idl.metadata.name.as_str() {
            "" => "<unnamed>",
            name => name,
        }
    }

    /// Program address declared by the interface itself, if any.
    pub fn declared_address(&self) -> Option<&str> {
        Some(self.idl.address.as_str()).filter(|address| !address.is_empty())
    }

    /// Named types available to `defined` references. For legacy interfaces
    /// this includes the inline account and event layouts.
    pub fn type_catalog(&self) -> TypeCatalog {
        TypeCatalog::new(self.idl.types.clone())
    }

    pub fn instruction_names(&self) -> impl Iterator<Item = &str> {
        self.idl.instructions.iter().map(|ix| ix.name.as_str())
    }
}

fn rejected(dialect: InterfaceDialect, reason: impl std::fmt::Display) -> Error {
    Error::Interface {
        reason: format!("{dialect} interface rejected: {reason}"),
    }
}

fn root_object(value: &mut Value) -> Result<&mut Map<String, Value>, Error> {
    value.as_object_mut().ok_or_else(|| Error::Interface {
        reason: "interface must be a JSON object".to_string(),
    })
}

fn objects_in<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a mut Map<String, Value>> {
    parent
        .get_mut(key)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object_mut)
}

/// Fills the bookkeeping fields the current model requires but hand-written
/// interfaces routinely omit. Discriminators are never filled in.
fn normalize_current(mut value: Value) -> Result<Value, Error> {
    let root = root_object(&mut value)?;
    let name = root.get("name").cloned().unwrap_or_else(|| json!(""));
    root.entry("address").or_insert_with(|| json!(""));
    if let Some(metadata) = root
        .entry("metadata")
        .or_insert_with(|| json!({}))
        .as_object_mut()
    {
        metadata.entry("name").or_insert(name);
        metadata.entry("version").or_insert_with(|| json!("0.0.0"));
        metadata
            .entry("spec")
            .or_insert_with(|| json!(anchor_lang_idl_spec::IDL_SPEC));
    }
    root.entry("instructions").or_insert_with(|| json!([]));
    for ix in objects_in(root, "instructions") {
        ix.entry("accounts").or_insert_with(|| json!([]));
        ix.entry("args").or_insert_with(|| json!([]));
    }
    Ok(value)
}

/// Shapes a legacy interface so the converter accepts it. The converter picks
/// its input dialect from `metadata.spec`, so that key is removed, and it
/// requires `metadata.address`, which an empty string stands in for.
fn normalize_legacy(mut value: Value) -> Result<Value, Error> {
    let root = root_object(&mut value)?;
    let name = root
        .get("name")
        .or_else(|| root.get("metadata").and_then(|m| m.get("name")))
        .cloned()
        .unwrap_or_else(|| json!(""));
    root.insert("name".to_string(), name);
    root.entry("version").or_insert_with(|| json!("0.0.0"));
    if let Some(metadata) = root
        .entry("metadata")
        .or_insert_with(|| json!({}))
        .as_object_mut()
    {
        metadata.entry("address").or_insert_with(|| json!(""));
        metadata.remove("spec");
    }
    root.entry("instructions").or_insert_with(|| json!([]));
    for ix in objects_in(root, "instructions") {
        ix.entry("args").or_insert_with(|| json!([]));
        fill_legacy_accounts(ix.entry("accounts").or_insert_with(|| json!([])));
    }
    for event in objects_in(root, "events") {
        event.entry("fields").or_insert_with(|| json!([]));
        for field in objects_in(event, "fields") {
            field.entry("index").or_insert(Value::Bool(false));
        }
    }
    Ok(value)
}

/// PDA seeds take no part in decoding and some legacy seed shapes do not
/// convert, so they are dropped.
fn fill_legacy_accounts(items: &mut Value) {
    for item in items
        .as_array_mut()
        .into_iter()
        .flatten()
        .filter_map(Value::as_object_mut)
    {
        item.remove("pda");
        if let Some(nested) = item.get_mut("accounts") {
            fill_legacy_accounts(nested);
            continue;
        }
        item.entry("isMut").or_insert(Value::Bool(false));
        item.entry("isSigner").or_insert(Value::Bool(false));
    }
}

fn camel_case_names(idl: &mut Idl) {
    for ix in &mut idl.instructions {
        ix.name = ix.name.to_lower_camel_case();
        camel_case_fields(&mut ix.args);
    }
    for def in &mut idl.types {
        match &mut def.ty {
            IdlTypeDefTy::Struct {
                fields: Some(fields),
            } => camel_case_defined(fields),
            IdlTypeDefTy::Enum { variants } => variants
                .iter_mut()
                .filter_map(|variant| variant.fields.as_mut())
                .for_each(camel_case_defined),
            IdlTypeDefTy::Struct { fields: None } | IdlTypeDefTy::Type { .. } => {}
        }
    }
}

fn camel_case_defined(fields: &mut IdlDefinedFields) {
    if let IdlDefinedFields::Named(named) = fields {
        camel_case_fields(named);
    }
}

fn camel_case_fields(fields: &mut [IdlField]) {
    for field in fields {
        field.name = field.name.to_lower_camel_case();
    }
}
