//! Feed messages as delivered by the streaming transport, in their JSON form.

use base64::{Engine, prelude::BASE64_STANDARD};
use serde::Deserialize;
use solana_pubkey::Pubkey;

use crate::error::Error;
use crate::keys::{PUBKEY_BYTES, pubkey_from_bytes};

/// A byte field as it appears on the wire: a base64 string, a plain byte array,
/// or a serialized Node `Buffer` (`{"type": "Buffer", "data": [..]}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ByteField {
    Encoded(String),
    Raw(Vec<u8>),
    Buffer { data: Vec<u8> },
}

impl Default for ByteField {
    fn default() -> Self {
        Self::Raw(Vec::new())
    }
}

impl ByteField {
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        match self {
            Self::Encoded(text) => BASE64_STANDARD
                .decode(text)
                .map_err(|e| Error::wire(format!("invalid base64 field: {e}"))),
            Self::Raw(bytes) | Self::Buffer { data: bytes } => Ok(bytes.clone()),
        }
    }

    /// Keys normally arrive base64-encoded; a string that does not decode to
    /// 32 bytes is retried as base58.
    pub fn to_pubkey(&self) -> Result<Pubkey, Error> {
        if let Self::Encoded(text) = self {
            return match BASE64_STANDARD.decode(text) {
                Ok(bytes) if bytes.len() == PUBKEY_BYTES => pubkey_from_bytes(&bytes),
                _ => crate::keys::pubkey_from_base58(text),
            };
        }
        pubkey_from_bytes(&self.to_bytes()?)
    }
}

/// A u64 sent either as a JSON number or as a decimal string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "NumberOrText")]
pub struct LenientU64(pub u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

impl TryFrom<NumberOrText> for LenientU64 {
    type Error = String;

    fn try_from(value: NumberOrText) -> Result<Self, Self::Error> {
        match value {
            NumberOrText::Number(n) => Ok(Self(n)),
            NumberOrText::Text(text) => text
                .trim()
                .parse()
                .map(Self)
                .map_err(|e| format!("invalid u64 `{text}`: {e}")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionUpdate {
    pub slot: LenientU64,
    pub transaction: TransactionInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInfo {
    #[serde(default)]
    pub signature: Option<ByteField>,
    #[serde(default)]
    pub is_vote: bool,
    pub transaction: RawTransaction,
    #[serde(default)]
    pub meta: Option<RawMeta>,
    #[serde(default)]
    pub index: Option<LenientU64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    #[serde(default)]
    pub signatures: Vec<ByteField>,
    pub message: RawMessage,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHeader {
    #[serde(default)]
    pub num_required_signatures: u8,
    #[serde(default)]
    pub num_readonly_signed_accounts: u8,
    #[serde(default)]
    pub num_readonly_unsigned_accounts: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    #[serde(default)]
    pub header: RawHeader,
    #[serde(default)]
    pub account_keys: Vec<ByteField>,
    #[serde(default)]
    pub recent_blockhash: ByteField,
    #[serde(default)]
    pub instructions: Vec<RawInstruction>,
    #[serde(default)]
    pub versioned: bool,
    #[serde(default)]
    pub address_table_lookups: Vec<RawAddressTableLookup>,
}

/// Account indexes and data are byte strings on the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInstruction {
    pub program_id_index: u8,
    #[serde(default)]
    pub accounts: ByteField,
    #[serde(default)]
    pub data: ByteField,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddressTableLookup {
    pub account_key: ByteField,
    #[serde(default)]
    pub writable_indexes: ByteField,
    #[serde(default)]
    pub readonly_indexes: ByteField,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInnerInstructions {
    #[serde(default)]
    pub index: u8,
    #[serde(default)]
    pub instructions: Vec<RawInnerInstruction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInnerInstruction {
    pub program_id_index: u8,
    #[serde(default)]
    pub accounts: ByteField,
    #[serde(default)]
    pub data: ByteField,
    #[serde(default)]
    pub stack_height: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMeta {
    #[serde(default)]
    pub error_info: Option<serde_json::Value>,
    #[serde(default)]
    pub fee: LenientU64,
    #[serde(default)]
    pub pre_balances: Vec<LenientU64>,
    #[serde(default)]
    pub post_balances: Vec<LenientU64>,
    #[serde(default)]
    pub inner_instructions: Vec<RawInnerInstructions>,
    #[serde(default)]
    pub log_messages: Vec<String>,
    #[serde(default)]
    pub pre_token_balances: Vec<serde_json::Value>,
    #[serde(default)]
    pub post_token_balances: Vec<serde_json::Value>,
    #[serde(default)]
    pub loaded_writable_addresses: Vec<ByteField>,
    #[serde(default)]
    pub loaded_readonly_addresses: Vec<ByteField>,
    #[serde(default)]
    pub compute_units_consumed: Option<LenientU64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountUpdate {
    pub slot: LenientU64,
    #[serde(default)]
    pub is_startup: bool,
    pub account: RawAccount,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAccount {
    pub pubkey: ByteField,
    #[serde(default)]
    pub lamports: LenientU64,
    pub owner: ByteField,
    #[serde(default)]
    pub data: ByteField,
    #[serde(default)]
    pub executable: bool,
    #[serde(default)]
    pub rent_epoch: LenientU64,
    #[serde(default)]
    pub write_version: LenientU64,
    #[serde(default)]
    pub txn_signature: Option<ByteField>,
}
