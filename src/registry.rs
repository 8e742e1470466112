//! Program id → decode tables, built once from interface definitions.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::codec::{AccountsCoder, DecodedIdlInstruction, EventParser, IdlValue, InstructionCoder};
use crate::error::Error;
use crate::idl::{IdlDefinedFields, InterfaceDialect, ProgramInterface, TypeCatalog};
use crate::keys::pubkey_from_base58;
use crate::serializer::serialize_fields;

/// Everything needed to decode one program's instructions, accounts and events.
#[derive(Debug, Clone)]
pub struct DecodeContext {
    program_id: String,
    dialect: InterfaceDialect,
    catalog: Arc<TypeCatalog>,
    instructions: InstructionCoder,
    accounts: AccountsCoder,
    events: Option<EventParser>,
    unverified: Vec<String>,
}

impl DecodeContext {
    pub fn new(program_id: &str, interface: &ProgramInterface) -> Result<Self, Error> {
        let dialect = interface.dialect();
        let catalog = Arc::new(interface.type_catalog());
        let instructions = InstructionCoder::new(program_id, interface, Arc::clone(&catalog));
        let accounts = AccountsCoder::new(program_id, interface, Arc::clone(&catalog))?;
        let events = EventParser::new(program_id, interface, Arc::clone(&catalog))?;

        let mut unverified = Vec::new();
        for layout in instructions.layouts() {
            if let Err(error) = instructions.verify_layout(&layout.name) {
                tracing::warn!(
                    program_id,
                    instruction = %layout.name,
                    %dialect,
                    %error,
                    "instruction layout failed its round-trip check"
                );
                unverified.push(layout.name.clone());
            }
        }
        for (first, second) in accounts.duplicate_discriminators() {
            tracing::warn!(
                program_id,
                first,
                second,
                "account discriminators collide; only the first is decodable"
            );
        }

        Ok(Self {
            program_id: program_id.to_string(),
            dialect,
            catalog,
            instructions,
            accounts,
            events,
            unverified,
        })
    }

    pub fn program_id(&self) -> &str {
        &self.program_id
    }

    pub fn dialect(&self) -> InterfaceDialect {
        self.dialect
    }

    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    pub fn instruction_coder(&self) -> &InstructionCoder {
        &self.instructions
    }

    pub fn accounts_coder(&self) -> &AccountsCoder {
        &self.accounts
    }

    pub fn event_parser(&self) -> Option<&EventParser> {
        self.events.as_ref()
    }

    /// Instructions whose zero value did not survive encode → decode at registration.
    pub fn unverified_instructions(&self) -> &[String] {
        &self.unverified
    }

    /// Account type name → discriminator bytes.
    pub fn account_discriminator(&self, name: &str) -> Option<&[u8]> {
        self.accounts.discriminator(name)
    }

    pub fn account_fields(&self, name: &str) -> Option<&IdlDefinedFields> {
        self.accounts.fields(name)
    }

    /// Decodes instruction bytes and serializes the arguments.
    pub fn decode_instruction(&self, data: &[u8]) -> Result<(String, serde_json::Value), Error> {
        let DecodedIdlInstruction { name, args } = self.instructions.decode(data)?;
        let layout = self
            .instructions
            .layout(&name)
            .ok_or_else(|| Error::mismatch(format!("instruction `{name}` lost its layout")))?;
        let data = serialize_fields(&args, &layout.args, &self.catalog)?;
        Ok((name, data))
    }

    /// Matches the discriminator, decodes the remaining bytes and serializes
    /// the fields in declared order.
    pub fn decode_account_data(&self, data: &[u8]) -> Result<(String, serde_json::Value), Error> {
        let (name, value) = self.accounts.decode(data)?;
        let fields = self
            .accounts
            .fields(&name)
            .ok_or_else(|| Error::mismatch(format!("account `{name}` lost its layout")))?;
        let parsed = serialize_fields(&value, fields, &self.catalog)?;
        Ok((name, parsed))
    }

    /// Events this program emitted into `logs`, one result per recognised payload.
    pub fn parse_events<S: AsRef<str>>(
        &self,
        logs: &[S],
    ) -> Vec<Result<(String, serde_json::Value), Error>> {
        let Some(parser) = &self.events else {
            return Vec::new();
        };
        parser
            .parse_logs(logs)
            .into_iter()
            .map(|event| {
                let event = event?;
                let fields = parser.fields(&event.name).ok_or_else(|| {
                    Error::mismatch(format!("event `{}` lost its layout", event.name))
                })?;
                let data = serialize_fields(&event.data, fields, &self.catalog)?;
                Ok((event.name, data))
            })
            .collect()
    }

    /// Encodes `args` for `name`; the inverse of [`DecodeContext::decode_instruction`]
    /// at the value level.
    pub fn encode_instruction(&self, name: &str, args: &IdlValue) -> Result<Vec<u8>, Error> {
        self.instructions.encode(name, args)
    }
}

/// Registered programs, keyed by base58 program id.
///
/// Registration needs `&mut self`; once setup is done the registry is only
/// read and can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    contexts: HashMap<String, DecodeContext>,
    instruction_names: BTreeSet<String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds and stores the decode tables for `program_id`. Registering the
    /// same id again replaces the previous tables.
    pub fn register(
        &mut self,
        program_id: &str,
        interface: &ProgramInterface,
    ) -> Result<(), Error> {
        pubkey_from_base58(program_id).map_err(|e| Error::Interface {
            reason: format!("program id `{program_id}` is not a public key: {e}"),
        })?;
        if let Some(declared) = interface.declared_address()
            && declared != program_id
        {
            tracing::debug!(
                program_id,
                declared,
                "interface declares a different address; using the registered id"
            );
        }

        let context = DecodeContext::new(program_id, interface)?;
        tracing::debug!(
            program_id,
            interface = interface.display_name(),
            dialect = %context.dialect(),
            instructions = context.instructions.layouts().len(),
            accounts = context.accounts.layouts().len(),
            events = context.events.as_ref().map_or(0, |p| p.layouts().len()),
            "registered interface"
        );

        self.instruction_names
            .extend(interface.instruction_names().map(str::to_string));
        if self
            .contexts
            .insert(program_id.to_string(), context)
            .is_some()
        {
            tracing::debug!(program_id, "replaced previously registered interface");
        }
        Ok(())
    }

    pub fn lookup(&self, program_id: &str) -> Option<&DecodeContext> {
        self.contexts.get(program_id)
    }

    pub fn contains(&self, program_id: &str) -> bool {
        self.contexts.contains_key(program_id)
    }

    pub fn program_ids(&self) -> impl Iterator<Item = &str> {
        self.contexts.keys().map(String::as_str)
    }

    /// Snapshot of every instruction name seen across all registrations.
    pub fn all_instruction_names(&self) -> BTreeSet<String> {
        self.instruction_names.clone()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
