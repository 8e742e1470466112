use serde::Serialize;
use serde_json::Value;

use crate::natives::{AccountMeta, NativeInstruction};
use crate::wire::{MessageHeader, TransactionError, TransactionVersion};

/// A streamed transaction with every instruction resolved against the
/// registered interfaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedTransaction {
    /// Slot the transaction landed in.
    pub slot: u64,
    /// `"legacy"` or `0`.
    pub version: TransactionVersion,
    /// Receipt timestamp supplied by the transport, in unix seconds.
    pub block_time: Option<i64>,
    /// Base58 signatures; the first one identifies the transaction.
    pub signatures: Vec<String>,
    /// Decoded message, including the events found in the logs.
    pub message: DecodedMessage,
    /// `None` when the feed delivered no status metadata.
    pub meta: Option<DecodedMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedMessage {
    /// Signer and readonly counts of the static keys.
    pub header: MessageHeader,
    /// Static keys, loaded writable keys, loaded readonly keys (base58).
    pub account_keys: Vec<String>,
    /// Base58.
    pub recent_blockhash: String,
    /// Top-level instructions in execution order.
    pub instructions: Vec<DecodedInstruction>,
    /// Empty for legacy messages.
    pub address_table_lookups: Vec<DecodedAddressTableLookup>,
    /// Events emitted by registered programs that took part in the transaction.
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedAddressTableLookup {
    /// Lookup table address (base58).
    pub account_key: String,
    /// Table positions loaded as writable.
    pub writable_indexes: Vec<u8>,
    /// Table positions loaded as readonly.
    pub readonly_indexes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedMeta {
    /// `{ "err": … }` when the transaction failed.
    pub err: Option<TransactionError>,
    /// Fee in lamports.
    pub fee: u64,
    /// Lamport balances before execution, by account key position.
    pub pre_balances: Vec<u64>,
    /// Lamport balances after execution, by account key position.
    pub post_balances: Vec<u64>,
    /// Token balances before execution, as delivered by the feed.
    pub pre_token_balances: Vec<Value>,
    /// Token balances after execution, as delivered by the feed.
    pub post_token_balances: Vec<Value>,
    /// Program log output.
    pub log_messages: Vec<String>,
    /// Keys loaded through address lookup tables.
    pub loaded_addresses: DecodedLoadedAddresses,
    /// Inner instructions, flattened, each tagged with its outer index.
    pub inner_instructions: Vec<DecodedInnerInstruction>,
    /// Compute units used, when the feed reports them.
    pub compute_units_consumed: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodedLoadedAddresses {
    /// Base58.
    pub writable: Vec<String>,
    /// Base58.
    pub readonly: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedInstruction {
    /// Invoked program (base58).
    pub program_id: String,
    /// Instruction accounts with the privileges the message grants them.
    pub accounts: Vec<AccountMeta>,
    /// Decoded payload, or the raw bytes in base58.
    pub data: InstructionPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedInnerInstruction {
    /// Position of the top-level instruction that made this call.
    pub outer_index: u8,
    /// Invoked program (base58).
    pub program_id: String,
    /// Instruction accounts with the privileges the message grants them.
    pub accounts: Vec<AccountMeta>,
    /// Decoded payload, or the raw bytes in base58.
    pub data: InstructionPayload,
    /// Invocation depth reported by the runtime, if any.
    pub stack_height: Option<u32>,
}

/// What an instruction's bytes turned into.
///
/// Decoded variants serialize as objects and [`InstructionPayload::Raw`] as a
/// plain string, so consumers can tell them apart without a tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InstructionPayload {
    /// Decoded through a registered interface.
    Idl { name: String, data: Value },
    /// Decoded through a built-in program table.
    Native(NativeInstruction),
    /// Original bytes in base58.
    Raw(String),
}

impl InstructionPayload {
    pub fn raw(data: &[u8]) -> Self {
        Self::Raw(bs58::encode(data).into_string())
    }

    pub fn is_decoded(&self) -> bool {
        !matches!(self, Self::Raw(_))
    }

    /// Instruction name when decoded.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Idl { name, .. } => Some(name),
            Self::Native(ix) => Some(&ix.name),
            Self::Raw(_) => None,
        }
    }
}

/// An event extracted from the log lines of a registered program.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Program that emitted the event (base58).
    pub program_id: String,
    /// Event name as declared by the interface.
    pub name: String,
    /// Event fields in declared order.
    pub data: Value,
}

/// A program account decoded through its owner's interface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedAccount {
    /// Raw account data in base64.
    pub data: String,
    pub parsed: ParsedAccount,
    /// Account address (base58).
    pub pubkey: String,
    pub lamports: u64,
    /// Owning program (base58).
    pub owner: String,
    pub executable: bool,
    pub rent_epoch: u64,
    pub slot: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedAccount {
    /// Account type matched by discriminator.
    pub account_name: String,
    /// Account fields in declared order.
    pub parsed: Value,
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn raw_payload_serializes_as_a_bare_string() {
        let payload = InstructionPayload::raw(&[1, 2, 3]);
        assert!(!payload.is_decoded());
        assert_eq!(payload.name(), None);
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!(bs58::encode([1u8, 2, 3]).into_string())
        );
    }

    #[test]
    fn decoded_payload_serializes_as_an_object() {
        let payload = InstructionPayload::Idl {
            name: "deposit".to_string(),
            data: json!({"amount": "5"}),
        };
        assert!(payload.is_decoded());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"name": "deposit", "data": {"amount": "5"}})
        );
    }

    #[test]
    fn inner_instruction_keys_are_camel_case() {
        let inner = DecodedInnerInstruction {
            outer_index: 1,
            program_id: "p".to_string(),
            accounts: vec![],
            data: InstructionPayload::Raw(String::new()),
            stack_height: Some(2),
        };
        let value = serde_json::to_value(&inner).unwrap();
        assert_eq!(value["outerIndex"], 1);
        assert_eq!(value["stackHeight"], 2);
        assert_eq!(value["programId"], "p");
    }

    #[test]
    fn instruction_accounts_serialize_as_metas() {
        let ix = DecodedInstruction {
            program_id: "p".to_string(),
            accounts: vec![AccountMeta {
                pubkey: "k".to_string(),
                is_signer: true,
                is_writable: false,
            }],
            data: InstructionPayload::Raw(String::new()),
        };
        let value = serde_json::to_value(&ix).unwrap();
        assert_eq!(
            value["accounts"],
            json!([{"pubkey": "k", "isSigner": true, "isWritable": false}])
        );
    }
}
