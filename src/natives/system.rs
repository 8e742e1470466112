use borsh::BorshDeserialize;
use borsh::io::{self, ErrorKind, Read};
use serde::Serialize;
use serde_json::{Value, json};

use crate::codec::BorshReader;
use crate::error::Error;
use crate::natives::{AccountMeta, NativeInstruction, read_args, repr};

/// System program instructions, keyed by their little-endian u32 tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::FromRepr, strum_macros::AsRefStr)]
#[strum(serialize_all = "camelCase")]
#[repr(u32)]
pub enum SystemInstruction {
    CreateAccount = 0,
    Assign = 1,
    Transfer = 2,
    CreateAccountWithSeed = 3,
    AdvanceNonceAccount = 4,
    WithdrawNonceAccount = 5,
    InitializeNonceAccount = 6,
    AuthorizeNonceAccount = 7,
    Allocate = 8,
    AllocateWithSeed = 9,
    AssignWithSeed = 10,
    TransferWithSeed = 11,
    UpgradeNonceAccount = 12,
}

impl SystemInstruction {
    fn roles(self) -> &'static [&'static str] {
        match self {
            Self::CreateAccount => &["from", "newAccount"],
            Self::Assign | Self::Allocate => &["account"],
            Self::Transfer => &["from", "to"],
            Self::CreateAccountWithSeed => &["from", "newAccount", "base"],
            Self::AdvanceNonceAccount => {
                &["nonceAccount", "recentBlockhashesSysvar", "nonceAuthority"]
            }
            Self::WithdrawNonceAccount => &[
                "nonceAccount",
                "to",
                "recentBlockhashesSysvar",
                "rentSysvar",
                "nonceAuthority",
            ],
            Self::InitializeNonceAccount => {
                &["nonceAccount", "recentBlockhashesSysvar", "rentSysvar"]
            }
            Self::AuthorizeNonceAccount => &["nonceAccount", "nonceAuthority"],
            Self::AllocateWithSeed | Self::AssignWithSeed => &["account", "base"],
            Self::TransferWithSeed => &["from", "base", "to"],
            Self::UpgradeNonceAccount => &["nonceAccount"],
        }
    }
}

/// Seed strings use bincode framing: a u64 length, then UTF-8 bytes.
#[derive(Debug, Serialize)]
#[serde(transparent)]
struct BincodeString(String);

impl BorshDeserialize for BincodeString {
    fn deserialize_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let len = u64::deserialize_reader(reader)?;
        let mut bytes = Vec::new();
        reader.by_ref().take(len).read_to_end(&mut bytes)?;
        if bytes.len() as u64 != len {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                format!("seed declares {len} bytes, {} present", bytes.len()),
            ));
        }
        String::from_utf8(bytes)
            .map(Self)
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e))
    }
}

#[derive(BorshDeserialize, Serialize)]
struct CreateAccount {
    #[serde(serialize_with = "repr::decimal")]
    lamports: u64,
    #[serde(serialize_with = "repr::decimal")]
    space: u64,
    #[serde(serialize_with = "repr::base58")]
    owner: [u8; 32],
}

#[derive(BorshDeserialize, Serialize)]
struct Assign {
    #[serde(serialize_with = "repr::base58")]
    owner: [u8; 32],
}

#[derive(BorshDeserialize, Serialize)]
struct Lamports {
    #[serde(serialize_with = "repr::decimal")]
    lamports: u64,
}

#[derive(BorshDeserialize, Serialize)]
struct CreateAccountWithSeed {
    #[serde(serialize_with = "repr::base58")]
    base: [u8; 32],
    seed: BincodeString,
    #[serde(serialize_with = "repr::decimal")]
    lamports: u64,
    #[serde(serialize_with = "repr::decimal")]
    space: u64,
    #[serde(serialize_with = "repr::base58")]
    owner: [u8; 32],
}

#[derive(BorshDeserialize, Serialize)]
struct NonceAuthority {
    #[serde(serialize_with = "repr::base58")]
    authority: [u8; 32],
}

#[derive(BorshDeserialize, Serialize)]
struct Allocate {
    #[serde(serialize_with = "repr::decimal")]
    space: u64,
}

#[derive(BorshDeserialize, Serialize)]
struct AllocateWithSeed {
    #[serde(serialize_with = "repr::base58")]
    base: [u8; 32],
    seed: BincodeString,
    #[serde(serialize_with = "repr::decimal")]
    space: u64,
    #[serde(serialize_with = "repr::base58")]
    owner: [u8; 32],
}

#[derive(BorshDeserialize, Serialize)]
struct AssignWithSeed {
    #[serde(serialize_with = "repr::base58")]
    base: [u8; 32],
    seed: BincodeString,
    #[serde(serialize_with = "repr::base58")]
    owner: [u8; 32],
}

#[derive(BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferWithSeed {
    #[serde(serialize_with = "repr::decimal")]
    lamports: u64,
    from_seed: BincodeString,
    #[serde(serialize_with = "repr::base58")]
    from_owner: [u8; 32],
}

pub fn decode(data: &[u8], accounts: &[AccountMeta]) -> Result<NativeInstruction, Error> {
    if data.len() < 4 {
        return Ok(NativeInstruction::unknown(data, accounts));
    }
    let mut reader = BorshReader::new(data);
    let Some(ix) = SystemInstruction::from_repr(reader.read::<u32>()?) else {
        return Ok(NativeInstruction::unknown(data, accounts));
    };
    let r = &mut reader;

    let args: Value = match ix {
        SystemInstruction::CreateAccount => read_args::<CreateAccount>(r)?,
        SystemInstruction::Assign => read_args::<Assign>(r)?,
        SystemInstruction::Transfer | SystemInstruction::WithdrawNonceAccount => {
            read_args::<Lamports>(r)?
        }
        SystemInstruction::CreateAccountWithSeed => read_args::<CreateAccountWithSeed>(r)?,
        SystemInstruction::AdvanceNonceAccount | SystemInstruction::UpgradeNonceAccount => {
            json!({})
        }
        SystemInstruction::InitializeNonceAccount | SystemInstruction::AuthorizeNonceAccount => {
            read_args::<NonceAuthority>(r)?
        }
        SystemInstruction::Allocate => read_args::<Allocate>(r)?,
        SystemInstruction::AllocateWithSeed => read_args::<AllocateWithSeed>(r)?,
        SystemInstruction::AssignWithSeed => read_args::<AssignWithSeed>(r)?,
        SystemInstruction::TransferWithSeed => read_args::<TransferWithSeed>(r)?,
    };

    Ok(NativeInstruction::new(ix.as_ref(), accounts, ix.roles(), "remaining", args))
}
