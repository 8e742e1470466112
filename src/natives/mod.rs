//! Fixed-table decoders for the programs every cluster ships.
//!
//! These run only when native decoding is enabled. A recognised program with
//! an unrecognised discriminator decodes to an `unknown` result carrying the
//! raw payload; only a truncated or malformed payload for a known instruction
//! is an error.

pub mod associated_token;
pub mod system;
pub mod token;
pub mod token_2022;

use borsh::BorshDeserialize;
use serde::Serialize;
use serde_json::{Map, Value};
use solana_pubkey::Pubkey;

use crate::codec::BorshReader;
use crate::error::Error;
use crate::keys::pubkey_to_base58;

pub const SYSTEM_PROGRAM_ID: &str = "11111111111111111111111111111111";
pub const TOKEN_PROGRAM_ID: &str = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA";
pub const TOKEN_2022_PROGRAM_ID: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";
pub const ASSOCIATED_TOKEN_PROGRAM_ID: &str = "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display, strum_macros::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum NativeProgram {
    System,
    Token,
    Token2022,
    AssociatedToken,
}

impl NativeProgram {
    pub fn from_program_id(program_id: &str) -> Option<Self> {
        match program_id {
            SYSTEM_PROGRAM_ID => Some(Self::System),
            TOKEN_PROGRAM_ID => Some(Self::Token),
            TOKEN_2022_PROGRAM_ID => Some(Self::Token2022),
            ASSOCIATED_TOKEN_PROGRAM_ID => Some(Self::AssociatedToken),
            _ => None,
        }
    }

    pub fn program_id(self) -> &'static str {
        match self {
            Self::System => SYSTEM_PROGRAM_ID,
            Self::Token => TOKEN_PROGRAM_ID,
            Self::Token2022 => TOKEN_2022_PROGRAM_ID,
            Self::AssociatedToken => ASSOCIATED_TOKEN_PROGRAM_ID,
        }
    }

    pub fn all_program_ids() -> &'static [&'static str] {
        &[
            SYSTEM_PROGRAM_ID,
            TOKEN_PROGRAM_ID,
            TOKEN_2022_PROGRAM_ID,
            ASSOCIATED_TOKEN_PROGRAM_ID,
        ]
    }

    pub fn decode(self, data: &[u8], accounts: &[AccountMeta]) -> Result<NativeInstruction, Error> {
        match self {
            Self::System => system::decode(data, accounts),
            Self::Token => token::decode(data, accounts),
            Self::Token2022 => token_2022::decode(data, accounts),
            Self::AssociatedToken => associated_token::decode(data, accounts),
        }
    }
}

/// An instruction account with the privileges the message header grants it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMeta {
    pub pubkey: String,
    pub is_signer: bool,
    pub is_writable: bool,
}

/// `{ name, accounts: { role: meta }, data }` as emitted for native programs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NativeInstruction {
    pub name: String,
    pub accounts: Map<String, Value>,
    pub data: Value,
}

impl NativeInstruction {
    /// Assigns `roles` to `accounts` in order. Accounts past the last role are
    /// listed under `surplus` (`signers` for multisig authorities, otherwise
    /// `remaining`).
    pub(crate) fn new(
        name: &str,
        accounts: &[AccountMeta],
        roles: &[&str],
        surplus: &str,
        data: Value,
    ) -> Self {
        let mut named = Map::with_capacity(roles.len() + 1);
        for (role, meta) in roles.iter().zip(accounts) {
            named.insert((*role).to_string(), meta_value(meta));
        }
        if accounts.len() > roles.len() {
            let rest = accounts[roles.len()..].iter().map(meta_value).collect();
            named.insert(surplus.to_string(), Value::Array(rest));
        }
        Self {
            name: name.to_string(),
            accounts: named,
            data,
        }
    }

    /// Recognised program, unrecognised instruction. `data` is the raw payload in base58.
    pub fn unknown(data: &[u8], accounts: &[AccountMeta]) -> Self {
        Self::new(
            "unknown",
            accounts,
            &[],
            "remaining",
            Value::String(bs58::encode(data).into_string()),
        )
    }

    pub fn is_unknown(&self) -> bool {
        self.name == "unknown"
    }
}

fn meta_value(meta: &AccountMeta) -> Value {
    serde_json::json!({
        "pubkey": meta.pubkey,
        "isSigner": meta.is_signer,
        "isWritable": meta.is_writable,
    })
}

/// Reads a borsh argument struct and renders it through its serde shape.
pub(crate) fn read_args<T>(reader: &mut BorshReader<'_>) -> Result<Value, Error>
where
    T: BorshDeserialize + Serialize,
{
    let args: T = reader.read()?;
    Ok(serde_json::to_value(args)?)
}

/// Little-endian u16 list filling the rest of the payload.
pub(crate) fn read_u16_list(reader: &mut BorshReader<'_>) -> Result<Value, Error> {
    let mut out = Vec::with_capacity(reader.remaining() / 2);
    while !reader.is_empty() {
        out.push(Value::from(reader.read::<u16>()?));
    }
    Ok(Value::Array(out))
}

/// 32 bytes where all zeroes means "none".
pub(crate) fn nonzero_key(key: &[u8; 32]) -> Value {
    if *key == [0u8; 32] {
        Value::Null
    } else {
        Value::String(pubkey_to_base58(&Pubkey::new_from_array(*key)))
    }
}

/// `serialize_with` adapters for native argument structs. Amounts render as
/// decimal strings and keys as base58.
pub(crate) mod repr {
    use serde::Serializer;
    use solana_pubkey::Pubkey;

    pub fn decimal<S: Serializer>(value: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(value)
    }

    pub fn optional_decimal<S: Serializer>(value: &Option<u64>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => s.collect_str(value),
            None => s.serialize_none(),
        }
    }

    pub fn base58<S: Serializer>(key: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&Pubkey::new_from_array(*key))
    }

    pub fn optional_base58<S: Serializer>(key: &Option<[u8; 32]>, s: S) -> Result<S::Ok, S::Error> {
        match key {
            Some(key) => base58(key, s),
            None => s.serialize_none(),
        }
    }

    pub fn nonzero_base58<S: Serializer>(key: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        if *key == [0u8; 32] {
            s.serialize_none()
        } else {
            base58(key, s)
        }
    }
}
