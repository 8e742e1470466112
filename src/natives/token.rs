use borsh::BorshDeserialize;
use serde::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::codec::BorshReader;
use crate::error::Error;
use crate::natives::{AccountMeta, NativeInstruction, read_args, read_u16_list, repr};

/// Instructions shared by SPL Token and Token-2022.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::FromRepr, strum_macros::AsRefStr)]
#[strum(serialize_all = "camelCase")]
#[repr(u8)]
pub enum TokenInstruction {
    InitializeMint = 0,
    InitializeAccount = 1,
    InitializeMultisig = 2,
    Transfer = 3,
    Approve = 4,
    Revoke = 5,
    SetAuthority = 6,
    MintTo = 7,
    Burn = 8,
    CloseAccount = 9,
    FreezeAccount = 10,
    ThawAccount = 11,
    TransferChecked = 12,
    ApproveChecked = 13,
    MintToChecked = 14,
    BurnChecked = 15,
    InitializeAccount2 = 16,
    SyncNative = 17,
    InitializeAccount3 = 18,
    InitializeMultisig2 = 19,
    InitializeMint2 = 20,
    GetAccountDataSize = 21,
    InitializeImmutableOwner = 22,
    AmountToUiAmount = 23,
    UiAmountToAmount = 24,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::FromRepr, strum_macros::AsRefStr)]
#[strum(serialize_all = "camelCase")]
#[repr(u8)]
pub enum AuthorityType {
    MintTokens = 0,
    FreezeAccount = 1,
    AccountOwner = 2,
    CloseAccount = 3,
    TransferFeeConfig = 4,
    WithheldWithdraw = 5,
    CloseMint = 6,
    InterestRate = 7,
    PermanentDelegate = 8,
    ConfidentialTransferMint = 9,
    TransferHookProgramId = 10,
    ConfidentialTransferFeeConfig = 11,
    MetadataPointer = 12,
    GroupPointer = 13,
    GroupMemberPointer = 14,
    ScaledUiAmount = 15,
    Pause = 16,
}

impl TokenInstruction {
    /// Account roles in documented order and the key their surplus is listed under.
    fn roles(self) -> (&'static [&'static str], &'static str) {
        match self {
            Self::InitializeMint => (&["mint", "rent"], "remaining"),
            Self::InitializeAccount => (&["account", "mint", "owner", "rent"], "remaining"),
            Self::InitializeMultisig => (&["multisig", "rent"], "signers"),
            Self::Transfer => (&["source", "destination", "owner"], "signers"),
            Self::Approve => (&["source", "delegate", "owner"], "signers"),
            Self::Revoke => (&["source", "owner"], "signers"),
            Self::SetAuthority => (&["account", "currentAuthority"], "signers"),
            Self::MintTo | Self::MintToChecked => {
                (&["mint", "destination", "authority"], "signers")
            }
            Self::Burn | Self::BurnChecked => (&["account", "mint", "owner"], "signers"),
            Self::CloseAccount => (&["account", "destination", "authority"], "signers"),
            Self::FreezeAccount | Self::ThawAccount => {
                (&["account", "mint", "authority"], "signers")
            }
            Self::TransferChecked => (&["source", "mint", "destination", "owner"], "signers"),
            Self::ApproveChecked => (&["source", "mint", "delegate", "owner"], "signers"),
            Self::InitializeAccount2 => (&["account", "mint", "rent"], "remaining"),
            Self::SyncNative | Self::InitializeImmutableOwner => (&["account"], "remaining"),
            Self::InitializeAccount3 => (&["account", "mint"], "remaining"),
            Self::InitializeMultisig2 => (&["multisig"], "signers"),
            Self::InitializeMint2
            | Self::GetAccountDataSize
            | Self::AmountToUiAmount
            | Self::UiAmountToAmount => (&["mint"], "remaining"),
        }
    }
}

#[derive(BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeMint {
    decimals: u8,
    #[serde(serialize_with = "repr::base58")]
    mint_authority: [u8; 32],
    #[serde(serialize_with = "repr::optional_base58")]
    freeze_authority: Option<[u8; 32]>,
}

#[derive(BorshDeserialize, Serialize)]
struct Multisig {
    m: u8,
}

#[derive(BorshDeserialize, Serialize)]
struct Amount {
    #[serde(serialize_with = "repr::decimal")]
    amount: u64,
}

#[derive(BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct SetAuthority {
    #[serde(serialize_with = "authority_name")]
    authority_type: u8,
    #[serde(serialize_with = "repr::optional_base58")]
    new_authority: Option<[u8; 32]>,
}

#[derive(BorshDeserialize, Serialize)]
struct AmountDecimals {
    #[serde(serialize_with = "repr::decimal")]
    amount: u64,
    decimals: u8,
}

#[derive(BorshDeserialize, Serialize)]
struct Owner {
    #[serde(serialize_with = "repr::base58")]
    owner: [u8; 32],
}

/// Known authority types render by name, anything else as its raw tag.
fn authority_name<S: Serializer>(tag: &u8, s: S) -> Result<S::Ok, S::Error> {
    match AuthorityType::from_repr(*tag) {
        Some(kind) => s.serialize_str(kind.as_ref()),
        None => s.serialize_u8(*tag),
    }
}

pub fn decode(data: &[u8], accounts: &[AccountMeta]) -> Result<NativeInstruction, Error> {
    let Some(ix) = data.first().and_then(|&tag| TokenInstruction::from_repr(tag)) else {
        return Ok(NativeInstruction::unknown(data, accounts));
    };
    decode_base(ix, &data[1..], accounts)
}

/// Decodes one of the shared instructions; `args` starts after the tag byte.
pub(crate) fn decode_base(
    ix: TokenInstruction,
    args: &[u8],
    accounts: &[AccountMeta],
) -> Result<NativeInstruction, Error> {
    let mut reader = BorshReader::new(args);
    let r = &mut reader;

    let data: Value = match ix {
        TokenInstruction::InitializeMint | TokenInstruction::InitializeMint2 => {
            read_args::<InitializeMint>(r)?
        }
        TokenInstruction::InitializeAccount
        | TokenInstruction::Revoke
        | TokenInstruction::CloseAccount
        | TokenInstruction::FreezeAccount
        | TokenInstruction::ThawAccount
        | TokenInstruction::SyncNative
        | TokenInstruction::InitializeImmutableOwner => json!({}),
        TokenInstruction::InitializeMultisig | TokenInstruction::InitializeMultisig2 => {
            read_args::<Multisig>(r)?
        }
        TokenInstruction::Transfer
        | TokenInstruction::Approve
        | TokenInstruction::MintTo
        | TokenInstruction::Burn
        | TokenInstruction::AmountToUiAmount => read_args::<Amount>(r)?,
        TokenInstruction::SetAuthority => read_args::<SetAuthority>(r)?,
        TokenInstruction::TransferChecked
        | TokenInstruction::ApproveChecked
        | TokenInstruction::MintToChecked
        | TokenInstruction::BurnChecked => read_args::<AmountDecimals>(r)?,
        TokenInstruction::InitializeAccount2 | TokenInstruction::InitializeAccount3 => {
            read_args::<Owner>(r)?
        }
        TokenInstruction::GetAccountDataSize => json!({ "extensionTypes": read_u16_list(r)? }),
        TokenInstruction::UiAmountToAmount => {
            let text = std::str::from_utf8(r.read_rest())
                .map_err(|e| Error::malformed(format!("ui amount is not utf-8: {e}")))?;
            json!({ "uiAmount": text })
        }
    };

    let (roles, surplus) = ix.roles();
    Ok(NativeInstruction::new(ix.as_ref(), accounts, roles, surplus, data))
}
