//! Walks canonical transactions and accounts and resolves every payload.
//!
//! Instruction and event failures stay local to the item: the instruction
//! keeps its program id and accounts and its data falls back to base58.
//! Account failures are returned to the caller.

use base64::{Engine, prelude::BASE64_STANDARD};

use crate::config::DecoderConfig;
use crate::error::Error;
use crate::idl::ProgramInterface;
use crate::keys::pubkey_to_base58;
use crate::natives::{AccountMeta, NativeProgram};
use crate::registry::SchemaRegistry;
use crate::types::{
    DecodedAccount, DecodedAddressTableLookup, DecodedInnerInstruction, DecodedInstruction,
    DecodedLoadedAddresses, DecodedMessage, DecodedMeta, DecodedTransaction, Event,
    InstructionPayload, ParsedAccount,
};
use crate::wire::{
    AccountUpdate, CanonicalAccount, CanonicalMeta, CanonicalTransaction, TransactionUpdate,
    format_account_update, format_transaction_update,
};

/// Turns a failed instruction decode into the raw base58 passthrough.
pub trait PassthroughExt {
    fn or_passthrough(
        self,
        program_id: &str,
        data: &[u8],
        log_failures: bool,
    ) -> InstructionPayload;
}

impl PassthroughExt for Result<InstructionPayload, Error> {
    fn or_passthrough(
        self,
        program_id: &str,
        data: &[u8],
        log_failures: bool,
    ) -> InstructionPayload {
        match self {
            Ok(payload) => payload,
            Err(Error::NoSchemaForProgram { .. }) => InstructionPayload::raw(data),
            Err(error) => {
                if log_failures {
                    tracing::warn!(
                        program_id,
                        %error,
                        "instruction decode failed; passing raw bytes through"
                    );
                }
                InstructionPayload::raw(data)
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Decoder {
    registry: SchemaRegistry,
    config: DecoderConfig,
}

impl Decoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            registry: SchemaRegistry::new(),
            config,
        }
    }

    pub fn register_interface(
        &mut self,
        program_id: &str,
        interface: &ProgramInterface,
    ) -> Result<(), Error> {
        self.registry.register(program_id, interface)
    }

    pub fn register_interface_json(&mut self, program_id: &str, json: &str) -> Result<(), Error> {
        let interface = ProgramInterface::from_json(json)?;
        self.register_interface(program_id, &interface)
    }

    pub fn set_native_decoding_enabled(&mut self, enabled: bool) {
        self.config.native_decoding = enabled;
    }

    pub fn set_event_parsing_enabled(&mut self, enabled: bool) {
        self.config.event_parsing = enabled;
    }

    pub fn set_failure_logging_enabled(&mut self, enabled: bool) {
        self.config.log_failures = enabled;
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn all_instruction_names(&self) -> std::collections::BTreeSet<String> {
        self.registry.all_instruction_names()
    }

    /// Decodes one instruction payload without the passthrough fallback.
    ///
    /// Built-in tables take precedence when native decoding is on; otherwise
    /// the program must have a registered interface.
    pub fn decode_instruction_data(
        &self,
        program_id: &str,
        data: &[u8],
        accounts: &[AccountMeta],
    ) -> Result<InstructionPayload, Error> {
        if self.config.native_decoding
            && let Some(native) = NativeProgram::from_program_id(program_id)
        {
            return native.decode(data, accounts).map(InstructionPayload::Native);
        }
        let context = self
            .registry
            .lookup(program_id)
            .ok_or_else(|| Error::NoSchemaForProgram {
                program_id: program_id.to_string(),
            })?;
        let (name, data) = context.decode_instruction(data)?;
        Ok(InstructionPayload::Idl { name, data })
    }

    pub fn decode_transaction_update(
        &self,
        update: &TransactionUpdate,
        block_time: Option<i64>,
    ) -> Result<DecodedTransaction, Error> {
        let transaction = format_transaction_update(update, block_time)?;
        Ok(self.decode_transaction(&transaction))
    }

    /// Never fails: every instruction either decodes or passes through raw.
    pub fn decode_transaction(&self, tx: &CanonicalTransaction) -> DecodedTransaction {
        let account_keys: Vec<String> = tx.account_keys.iter().map(pubkey_to_base58).collect();
        let metas = tx.account_metas();
        let signature = tx.signature().unwrap_or_default();

        let instructions: Vec<DecodedInstruction> = tx
            .message
            .instructions
            .iter()
            .map(|ix| {
                let (program_id, accounts) = self.resolve(
                    &account_keys,
                    &metas,
                    ix.program_id_index,
                    &ix.accounts,
                    signature,
                );
                let data = self
                    .decode_instruction_data(&program_id, &ix.data, &accounts)
                    .or_passthrough(&program_id, &ix.data, self.config.log_failures);
                DecodedInstruction {
                    program_id,
                    accounts,
                    data,
                }
            })
            .collect();

        let meta = tx
            .meta
            .as_ref()
            .map(|meta| self.decode_meta(meta, &account_keys, &metas, signature));

        let events = match &meta {
            Some(decoded) if self.config.event_parsing => {
                let program_ids = instructions
                    .iter()
                    .map(|ix| ix.program_id.as_str())
                    .chain(decoded.inner_instructions.iter().map(|ix| ix.program_id.as_str()));
                self.collect_events(program_ids, &decoded.log_messages, signature)
            }
            _ => Vec::new(),
        };

        DecodedTransaction {
            slot: tx.slot,
            version: tx.version,
            block_time: tx.block_time,
            signatures: tx.signatures.clone(),
            message: DecodedMessage {
                header: tx.message.header,
                account_keys,
                recent_blockhash: tx.message.recent_blockhash.clone(),
                instructions,
                address_table_lookups: tx
                    .message
                    .address_table_lookups
                    .iter()
                    .map(|lookup| DecodedAddressTableLookup {
                        account_key: pubkey_to_base58(&lookup.account_key),
                        writable_indexes: lookup.writable_indexes.clone(),
                        readonly_indexes: lookup.readonly_indexes.clone(),
                    })
                    .collect(),
                events,
            },
            meta,
        }
    }

    pub fn decode_account_update(&self, update: &AccountUpdate) -> Result<DecodedAccount, Error> {
        let account = format_account_update(update)?;
        self.decode_account(&account)
    }

    /// Decodes an account through its owner's interface. Unlike instructions
    /// there is no raw fallback: an unregistered owner or an unknown
    /// discriminator is an error.
    pub fn decode_account(&self, account: &CanonicalAccount) -> Result<DecodedAccount, Error> {
        let owner = pubkey_to_base58(&account.owner);
        let context = self
            .registry
            .lookup(&owner)
            .ok_or_else(|| Error::NoSchemaForProgram {
                program_id: owner.clone(),
            })?;
        let (account_name, parsed) = context.decode_account_data(&account.data)?;

        Ok(DecodedAccount {
            data: BASE64_STANDARD.encode(&account.data),
            parsed: ParsedAccount {
                account_name,
                parsed,
            },
            pubkey: pubkey_to_base58(&account.pubkey),
            lamports: account.lamports,
            owner,
            executable: account.executable,
            rent_epoch: account.rent_epoch,
            slot: account.slot,
        })
    }

    /// Program id and account metas for one compiled instruction. Indexes
    /// past the end of the key list resolve to an empty key.
    fn resolve(
        &self,
        account_keys: &[String],
        metas: &[AccountMeta],
        program_id_index: u8,
        accounts: &[u8],
        signature: &str,
    ) -> (String, Vec<AccountMeta>) {
        let program_id = match account_keys.get(usize::from(program_id_index)) {
            Some(key) => key.clone(),
            None => {
                tracing::warn!(
                    signature,
                    index = program_id_index,
                    "program id index out of range"
                );
                String::new()
            }
        };
        let accounts = accounts
            .iter()
            .map(|&index| match metas.get(usize::from(index)) {
                Some(meta) => meta.clone(),
                None => {
                    tracing::warn!(
                        signature,
                        index,
                        program_id = %program_id,
                        "account index out of range"
                    );
                    AccountMeta {
                        pubkey: String::new(),
                        is_signer: false,
                        is_writable: false,
                    }
                }
            })
            .collect();
        (program_id, accounts)
    }

    fn decode_meta(
        &self,
        meta: &CanonicalMeta,
        account_keys: &[String],
        metas: &[AccountMeta],
        signature: &str,
    ) -> DecodedMeta {
        let inner_instructions = meta
            .inner_instructions
            .iter()
            .flat_map(|group| group.instructions.iter().map(move |ix| (group.index, ix)))
            .map(|(outer_index, ix)| {
                let (program_id, accounts) = self.resolve(
                    account_keys,
                    metas,
                    ix.program_id_index,
                    &ix.accounts,
                    signature,
                );
                let data = self
                    .decode_instruction_data(&program_id, &ix.data, &accounts)
                    .or_passthrough(&program_id, &ix.data, self.config.log_failures);
                DecodedInnerInstruction {
                    outer_index,
                    program_id,
                    accounts,
                    data,
                    stack_height: ix.stack_height,
                }
            })
            .collect();

        DecodedMeta {
            err: meta.err.clone(),
            fee: meta.fee,
            pre_balances: meta.pre_balances.clone(),
            post_balances: meta.post_balances.clone(),
            pre_token_balances: meta.pre_token_balances.clone(),
            post_token_balances: meta.post_token_balances.clone(),
            log_messages: meta.log_messages.clone(),
            loaded_addresses: DecodedLoadedAddresses {
                writable: meta.loaded_addresses.writable.iter().map(pubkey_to_base58).collect(),
                readonly: meta.loaded_addresses.readonly.iter().map(pubkey_to_base58).collect(),
            },
            inner_instructions,
            compute_units_consumed: meta.compute_units_consumed,
        }
    }

    /// Events of every registered program that took part in the transaction,
    /// grouped by program in order of first appearance.
    fn collect_events<'a>(
        &self,
        program_ids: impl Iterator<Item = &'a str>,
        logs: &[String],
        signature: &str,
    ) -> Vec<Event> {
        let mut seen: Vec<&str> = Vec::new();
        for program_id in program_ids {
            if !seen.contains(&program_id) {
                seen.push(program_id);
            }
        }

        let mut events = Vec::new();
        for program_id in seen {
            let Some(context) = self.registry.lookup(program_id) else {
                continue;
            };
            for result in context.parse_events(logs) {
                match result {
                    Ok((name, data)) => events.push(Event {
                        program_id: program_id.to_string(),
                        name,
                        data,
                    }),
                    Err(error) => {
                        if self.config.log_failures {
                            tracing::warn!(
                                signature,
                                program_id,
                                %error,
                                "event decode failed; skipping"
                            );
                        }
                    }
                }
            }
        }
        events
    }
}
