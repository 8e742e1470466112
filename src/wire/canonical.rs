//! Encoding-independent transaction and account records.

use serde::{Serialize, Serializer};
use solana_pubkey::Pubkey;

use crate::keys::pubkey_to_base58;
use crate::natives::AccountMeta;

/// `"legacy"` or `0` when serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TransactionVersion {
    Legacy,
    V0,
}

impl Serialize for TransactionVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Legacy => serializer.serialize_str("legacy"),
            Self::V0 => serializer.serialize_u8(0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    /// Positions in [`CanonicalTransaction::account_keys`].
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
    pub stack_height: Option<u32>,
}

/// Inner instructions invoked by the outer instruction at `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerInstructionGroup {
    pub index: u8,
    pub instructions: Vec<InnerInstruction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressTableLookup {
    pub account_key: Pubkey,
    pub writable_indexes: Vec<u8>,
    pub readonly_indexes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadedAddresses {
    pub writable: Vec<Pubkey>,
    pub readonly: Vec<Pubkey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalMessage {
    pub header: MessageHeader,
    pub static_account_keys: Vec<Pubkey>,
    /// Base58.
    pub recent_blockhash: String,
    pub instructions: Vec<CompiledInstruction>,
    pub address_table_lookups: Vec<AddressTableLookup>,
}

/// The `{ "err": … }` wrapper around a failed transaction's error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionError {
    pub err: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalMeta {
    pub err: Option<TransactionError>,
    pub fee: u64,
    pub pre_balances: Vec<u64>,
    pub post_balances: Vec<u64>,
    pub pre_token_balances: Vec<serde_json::Value>,
    pub post_token_balances: Vec<serde_json::Value>,
    pub log_messages: Vec<String>,
    pub loaded_addresses: LoadedAddresses,
    pub inner_instructions: Vec<InnerInstructionGroup>,
    pub compute_units_consumed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTransaction {
    pub slot: u64,
    pub version: TransactionVersion,
    pub block_time: Option<i64>,
    /// Base58.
    pub signatures: Vec<String>,
    pub message: CanonicalMessage,
    /// Static keys, then loaded writable, then loaded readonly.
    pub account_keys: Vec<Pubkey>,
    pub meta: Option<CanonicalMeta>,
}

impl CanonicalTransaction {
    pub fn signature(&self) -> Option<&str> {
        self.signatures.first().map(String::as_str)
    }

    pub fn key_at(&self, index: u8) -> Option<&Pubkey> {
        self.account_keys.get(usize::from(index))
    }

    /// Signer and writable flags for every entry of `account_keys`.
    ///
    /// Static keys follow the message header; loaded addresses are never
    /// signers and are writable exactly when they came from a writable index.
    pub fn account_metas(&self) -> Vec<AccountMeta> {
        let header = &self.message.header;
        let static_len = self.message.static_account_keys.len();
        let signers = usize::from(header.num_required_signatures);
        let writable_signers =
            signers.saturating_sub(usize::from(header.num_readonly_signed_accounts));
        let writable_unsigned_end =
            static_len.saturating_sub(usize::from(header.num_readonly_unsigned_accounts));
        let loaded_writable = self
            .meta
            .as_ref()
            .map_or(0, |meta| meta.loaded_addresses.writable.len());

        self.account_keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let (is_signer, is_writable) = if i < static_len {
                    if i < signers {
                        (true, i < writable_signers)
                    } else {
                        (false, i < writable_unsigned_end)
                    }
                } else {
                    (false, i < static_len + loaded_writable)
                };
                AccountMeta {
                    pubkey: pubkey_to_base58(key),
                    is_signer,
                    is_writable,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalAccount {
    pub slot: u64,
    pub pubkey: Pubkey,
    pub owner: Pubkey,
    pub lamports: u64,
    pub data: Vec<u8>,
    pub executable: bool,
    pub rent_epoch: u64,
    pub write_version: u64,
    /// Base58 signature of the transaction that last wrote the account.
    pub txn_signature: Option<String>,
    pub is_startup: bool,
}
