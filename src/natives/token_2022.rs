use borsh::BorshDeserialize;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::codec::{BorshReader, DISCRIMINATOR_LEN, sighash};
use crate::error::Error;
use crate::natives::token::{TokenInstruction, decode_base};
use crate::natives::{AccountMeta, NativeInstruction, nonzero_key, read_args, read_u16_list, repr};

/// Token-2022 tags beyond the shared instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::FromRepr, strum_macros::AsRefStr)]
#[strum(serialize_all = "camelCase")]
#[repr(u8)]
pub enum ExtensionInstruction {
    InitializeMintCloseAuthority = 25,
    TransferFeeExtension = 26,
    ConfidentialTransferExtension = 27,
    DefaultAccountStateExtension = 28,
    Reallocate = 29,
    MemoTransferExtension = 30,
    CreateNativeMint = 31,
    InitializeNonTransferableMint = 32,
    InterestBearingMintExtension = 33,
    CpiGuardExtension = 34,
    InitializePermanentDelegate = 35,
    TransferHookExtension = 36,
    ConfidentialTransferFeeExtension = 37,
    WithdrawExcessLamports = 38,
    MetadataPointerExtension = 39,
    GroupPointerExtension = 40,
    GroupMemberPointerExtension = 41,
}

impl ExtensionInstruction {
    /// Families whose second byte selects the instruction.
    fn has_sub_instructions(self) -> bool {
        !matches!(
            self,
            Self::InitializeMintCloseAuthority
                | Self::Reallocate
                | Self::CreateNativeMint
                | Self::InitializeNonTransferableMint
                | Self::InitializePermanentDelegate
                | Self::WithdrawExcessLamports
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::FromRepr, strum_macros::AsRefStr)]
#[strum(serialize_all = "camelCase")]
#[repr(u8)]
pub enum TransferFeeInstruction {
    InitializeTransferFeeConfig = 0,
    TransferCheckedWithFee = 1,
    WithdrawWithheldTokensFromMint = 2,
    WithdrawWithheldTokensFromAccounts = 3,
    HarvestWithheldTokensToMint = 4,
    SetTransferFee = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::FromRepr, strum_macros::AsRefStr)]
#[strum(serialize_all = "camelCase")]
#[repr(u8)]
pub enum AccountState {
    Uninitialized = 0,
    Initialized = 1,
    Frozen = 2,
}

/// Token metadata interface instructions, identified by an 8-byte hash prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::AsRefStr, strum_macros::EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum MetadataInstruction {
    InitializeMetadata,
    UpdateField,
    RemoveKey,
    UpdateAuthority,
    Emit,
}

impl MetadataInstruction {
    fn hashed_name(self) -> &'static str {
        match self {
            Self::InitializeMetadata => "initialize_account",
            Self::UpdateField => "updating_field",
            Self::RemoveKey => "remove_key_ix",
            Self::UpdateAuthority => "update_the_authority",
            Self::Emit => "emitter",
        }
    }

    pub fn discriminator(self) -> [u8; DISCRIMINATOR_LEN] {
        sighash("spl_token_metadata_interface", self.hashed_name())
    }

    fn from_data(data: &[u8]) -> Option<Self> {
        use strum::IntoEnumIterator;

        Self::iter().find(|ix| data.starts_with(&ix.discriminator()))
    }

    fn roles(self) -> &'static [&'static str] {
        match self {
            Self::InitializeMetadata => &["metadata", "updateAuthority", "mint", "mintAuthority"],
            Self::UpdateField | Self::RemoveKey => &["metadata", "updateAuthority"],
            Self::UpdateAuthority => &["metadata", "currentUpdateAuthority"],
            Self::Emit => &["metadata"],
        }
    }
}

#[derive(BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct CloseAuthority {
    #[serde(serialize_with = "repr::optional_base58")]
    close_authority: Option<[u8; 32]>,
}

#[derive(BorshDeserialize, Serialize)]
struct PermanentDelegate {
    #[serde(serialize_with = "repr::base58")]
    delegate: [u8; 32],
}

#[derive(BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct DefaultAccountState {
    #[serde(serialize_with = "state_name")]
    account_state: u8,
}

#[derive(BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeTransferFeeConfig {
    #[serde(serialize_with = "repr::optional_base58")]
    transfer_fee_config_authority: Option<[u8; 32]>,
    #[serde(serialize_with = "repr::optional_base58")]
    withdraw_withheld_authority: Option<[u8; 32]>,
    transfer_fee_basis_points: u16,
    #[serde(serialize_with = "repr::decimal")]
    maximum_fee: u64,
}

#[derive(BorshDeserialize, Serialize)]
struct TransferCheckedWithFee {
    #[serde(serialize_with = "repr::decimal")]
    amount: u64,
    decimals: u8,
    #[serde(serialize_with = "repr::decimal")]
    fee: u64,
}

#[derive(BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawFromAccounts {
    num_token_accounts: u8,
}

#[derive(BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct SetTransferFee {
    transfer_fee_basis_points: u16,
    #[serde(serialize_with = "repr::decimal")]
    maximum_fee: u64,
}

#[derive(BorshDeserialize, Serialize)]
struct InitializeMetadata {
    name: String,
    symbol: String,
    uri: String,
}

#[derive(BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
enum MetadataField {
    Name,
    Symbol,
    Uri,
    Key(String),
}

#[derive(BorshDeserialize, Serialize)]
struct UpdateField {
    field: MetadataField,
    value: String,
}

#[derive(BorshDeserialize, Serialize)]
struct RemoveKey {
    idempotent: bool,
    key: String,
}

#[derive(BorshDeserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateAuthority {
    #[serde(serialize_with = "repr::nonzero_base58")]
    new_authority: [u8; 32],
}

#[derive(BorshDeserialize, Serialize)]
struct Emit {
    #[serde(serialize_with = "repr::optional_decimal")]
    start: Option<u64>,
    #[serde(serialize_with = "repr::optional_decimal")]
    end: Option<u64>,
}

fn state_name<S: Serializer>(tag: &u8, s: S) -> Result<S::Ok, S::Error> {
    match AccountState::from_repr(*tag) {
        Some(state) => s.serialize_str(state.as_ref()),
        None => s.serialize_u8(*tag),
    }
}

pub fn decode(data: &[u8], accounts: &[AccountMeta]) -> Result<NativeInstruction, Error> {
    let Some(&tag) = data.first() else {
        return Ok(NativeInstruction::unknown(data, accounts));
    };
    if let Some(ix) = TokenInstruction::from_repr(tag) {
        return decode_base(ix, &data[1..], accounts);
    }
    if let Some(ix) = ExtensionInstruction::from_repr(tag) {
        return decode_extension(ix, data, accounts);
    }
    if let Some(ix) = MetadataInstruction::from_data(data) {
        return decode_metadata(ix, &data[DISCRIMINATOR_LEN..], accounts);
    }
    Ok(NativeInstruction::unknown(data, accounts))
}

fn decode_extension(
    ix: ExtensionInstruction,
    data: &[u8],
    accounts: &[AccountMeta],
) -> Result<NativeInstruction, Error> {
    if ix.has_sub_instructions() {
        return match data.get(1) {
            Some(&sub) => decode_family(ix, sub, data, accounts),
            None => Ok(NativeInstruction::unknown(data, accounts)),
        };
    }

    let mut reader = BorshReader::new(&data[1..]);
    let r = &mut reader;

    let (roles, surplus, args): (&[&str], &str, Value) = match ix {
        ExtensionInstruction::InitializeMintCloseAuthority => {
            (&["mint"], "remaining", read_args::<CloseAuthority>(r)?)
        }
        ExtensionInstruction::Reallocate => (
            &["account", "payer", "systemProgram", "owner"],
            "signers",
            json!({ "extensionTypes": read_u16_list(r)? }),
        ),
        ExtensionInstruction::CreateNativeMint => {
            (&["payer", "nativeMint", "systemProgram"], "remaining", json!({}))
        }
        ExtensionInstruction::InitializeNonTransferableMint => (&["mint"], "remaining", json!({})),
        ExtensionInstruction::InitializePermanentDelegate => {
            (&["mint"], "remaining", read_args::<PermanentDelegate>(r)?)
        }
        ExtensionInstruction::WithdrawExcessLamports => {
            (&["source", "destination", "authority"], "signers", json!({}))
        }
        _ => return Ok(NativeInstruction::unknown(data, accounts)),
    };

    Ok(NativeInstruction::new(ix.as_ref(), accounts, roles, surplus, args))
}

/// Extension families dispatch on the byte after the tag; `data` still holds both.
fn decode_family(
    ix: ExtensionInstruction,
    sub: u8,
    data: &[u8],
    accounts: &[AccountMeta],
) -> Result<NativeInstruction, Error> {
    let mut reader = BorshReader::new(&data[2..]);
    let r = &mut reader;

    match ix {
        ExtensionInstruction::TransferFeeExtension => decode_transfer_fee(sub, r, data, accounts),
        ExtensionInstruction::DefaultAccountStateExtension => {
            let (name, roles): (&str, &[&str]) = match sub {
                0 => ("initializeDefaultAccountState", &["mint"]),
                1 => ("updateDefaultAccountState", &["mint", "freezeAuthority"]),
                _ => return Ok(NativeInstruction::unknown(data, accounts)),
            };
            let args = read_args::<DefaultAccountState>(r)?;
            Ok(NativeInstruction::new(name, accounts, roles, "signers", args))
        }
        ExtensionInstruction::MemoTransferExtension => {
            Ok(toggle(sub, data, accounts, "RequiredMemoTransfers"))
        }
        ExtensionInstruction::CpiGuardExtension => Ok(toggle(sub, data, accounts, "CpiGuard")),
        ExtensionInstruction::TransferHookExtension => {
            pointer_family(sub, r, data, accounts, "TransferHook", "programId")
        }
        ExtensionInstruction::MetadataPointerExtension => {
            pointer_family(sub, r, data, accounts, "MetadataPointer", "metadataAddress")
        }
        ExtensionInstruction::GroupPointerExtension => {
            pointer_family(sub, r, data, accounts, "GroupPointer", "groupAddress")
        }
        ExtensionInstruction::GroupMemberPointerExtension => {
            pointer_family(sub, r, data, accounts, "GroupMemberPointer", "memberAddress")
        }
        _ => Ok(NativeInstruction::unknown(data, accounts)),
    }
}

/// `enable<feature>` / `disable<feature>` on a token account.
fn toggle(sub: u8, data: &[u8], accounts: &[AccountMeta], feature: &str) -> NativeInstruction {
    let name = match sub {
        0 => format!("enable{feature}"),
        1 => format!("disable{feature}"),
        _ => return NativeInstruction::unknown(data, accounts),
    };
    NativeInstruction::new(&name, accounts, &["account", "owner"], "signers", json!({}))
}

/// Transfer-hook and the pointer extensions share one shape: `initialize` with an
/// authority and an address, `update` with the address alone.
fn pointer_family(
    sub: u8,
    r: &mut BorshReader<'_>,
    data: &[u8],
    accounts: &[AccountMeta],
    family: &str,
    address_field: &str,
) -> Result<NativeInstruction, Error> {
    let mut args = Map::new();
    let (name, roles, surplus): (String, &[&str], &str) = match sub {
        0 => {
            args.insert("authority".to_string(), nonzero_key(&r.read()?));
            (format!("initialize{family}"), &["mint"], "remaining")
        }
        1 => (format!("update{family}"), &["mint", "authority"], "signers"),
        _ => return Ok(NativeInstruction::unknown(data, accounts)),
    };
    args.insert(address_field.to_string(), nonzero_key(&r.read()?));
    Ok(NativeInstruction::new(&name, accounts, roles, surplus, Value::Object(args)))
}

fn decode_transfer_fee(
    sub: u8,
    r: &mut BorshReader<'_>,
    data: &[u8],
    accounts: &[AccountMeta],
) -> Result<NativeInstruction, Error> {
    let Some(ix) = TransferFeeInstruction::from_repr(sub) else {
        return Ok(NativeInstruction::unknown(data, accounts));
    };

    let (roles, surplus, args): (&[&str], &str, Value) = match ix {
        TransferFeeInstruction::InitializeTransferFeeConfig => {
            (&["mint"], "remaining", read_args::<InitializeTransferFeeConfig>(r)?)
        }
        TransferFeeInstruction::TransferCheckedWithFee => (
            &["source", "mint", "destination", "authority"],
            "signers",
            read_args::<TransferCheckedWithFee>(r)?,
        ),
        TransferFeeInstruction::WithdrawWithheldTokensFromMint => {
            (&["mint", "destination", "authority"], "signers", json!({}))
        }
        TransferFeeInstruction::WithdrawWithheldTokensFromAccounts => (
            &["mint", "destination", "authority"],
            "sources",
            read_args::<WithdrawFromAccounts>(r)?,
        ),
        TransferFeeInstruction::HarvestWithheldTokensToMint => (&["mint"], "sources", json!({})),
        TransferFeeInstruction::SetTransferFee => {
            (&["mint", "authority"], "signers", read_args::<SetTransferFee>(r)?)
        }
    };

    Ok(NativeInstruction::new(ix.as_ref(), accounts, roles, surplus, args))
}

fn decode_metadata(
    ix: MetadataInstruction,
    args: &[u8],
    accounts: &[AccountMeta],
) -> Result<NativeInstruction, Error> {
    let mut reader = BorshReader::new(args);
    let r = &mut reader;

    let data = match ix {
        MetadataInstruction::InitializeMetadata => read_args::<InitializeMetadata>(r)?,
        MetadataInstruction::UpdateField => read_args::<UpdateField>(r)?,
        MetadataInstruction::RemoveKey => read_args::<RemoveKey>(r)?,
        MetadataInstruction::UpdateAuthority => read_args::<UpdateAuthority>(r)?,
        MetadataInstruction::Emit => read_args::<Emit>(r)?,
    };

    Ok(NativeInstruction::new(ix.as_ref(), accounts, ix.roles(), "remaining", data))
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::*;
    use crate::natives::test_support::metas;

    #[test]
    fn shared_instructions_delegate_to_token_tables() {
        let mut data = vec![3];
        data.extend_from_slice(&5u64.to_le_bytes());
        let ix = decode(&data, &metas(3)).unwrap();
        assert_eq!(ix.name, "transfer");
        assert_eq!(ix.data["amount"], "5");
    }

    #[test]
    fn transfer_checked_with_fee() {
        let mut data = vec![26, 1];
        data.extend_from_slice(&100u64.to_le_bytes());
        data.push(2);
        data.extend_from_slice(&3u64.to_le_bytes());
        let ix = decode(&data, &metas(4)).unwrap();
        assert_eq!(ix.name, "transferCheckedWithFee");
        assert_eq!(ix.data, json!({"amount": "100", "decimals": 2, "fee": "3"}));
    }

    #[test]
    fn unknown_extension_sub_instruction_is_unknown() {
        for family in [26u8, 27, 28, 30, 33, 34, 36, 37, 39, 40, 41] {
            let ix = decode(&[family, 0xee, 1, 2, 3], &metas(2)).unwrap();
            assert!(ix.is_unknown(), "family {family}");
            let ix = decode(&[family], &metas(2)).unwrap();
            assert!(ix.is_unknown(), "family {family} without a sub-instruction");
        }
    }

    #[test]
    fn metadata_pointer_initialize_reads_optional_keys() {
        let mut data = vec![39, 0];
        data.extend_from_slice(&[0u8; 32]);
        data.extend_from_slice(&[7u8; 32]);
        let ix = decode(&data, &metas(1)).unwrap();
        assert_eq!(ix.name, "initializeMetadataPointer");
        assert_eq!(ix.data["authority"], Value::Null);
        assert!(ix.data["metadataAddress"].is_string());
    }

    #[test]
    fn default_account_state_names_the_state() {
        let ix = decode(&[28, 1, 2], &metas(2)).unwrap();
        assert_eq!(ix.name, "updateDefaultAccountState");
        assert_eq!(ix.data["accountState"], "frozen");
    }

    #[test]
    fn token_metadata_initialize() {
        let mut data = MetadataInstruction::InitializeMetadata.discriminator().to_vec();
        for s in ["Coin", "CN", "https://x"] {
            data.extend_from_slice(&(s.len() as u32).to_le_bytes());
            data.extend_from_slice(s.as_bytes());
        }
        let ix = decode(&data, &metas(4)).unwrap();
        assert_eq!(ix.name, "initializeMetadata");
        assert_eq!(ix.data, json!({"name": "Coin", "symbol": "CN", "uri": "https://x"}));
        assert!(ix.accounts.contains_key("mintAuthority"));
    }

    #[test]
    fn flat_extensions_read_their_arguments() {
        let ix = decode(&[25, 0], &metas(1)).unwrap();
        assert_eq!(ix.name, "initializeMintCloseAuthority");
        assert_eq!(ix.data, json!({ "closeAuthority": null }));
        let ix = decode(&[31], &metas(3)).unwrap();
        assert_eq!(ix.name, "createNativeMint");
        assert!(decode(&[35, 1, 2], &metas(1)).is_err());
    }

    #[test]
    fn toggles_name_the_feature() {
        assert_eq!(decode(&[30, 0], &metas(2)).unwrap().name, "enableRequiredMemoTransfers");
        assert_eq!(decode(&[34, 1], &metas(2)).unwrap().name, "disableCpiGuard");
    }

    #[test]
    fn pointer_update_reads_the_address_alone() {
        let mut data = vec![40, 1];
        data.extend_from_slice(&[9u8; 32]);
        let ix = decode(&data, &metas(2)).unwrap();
        assert_eq!(ix.name, "updateGroupPointer");
        let keys: Vec<_> = ix.data.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["groupAddress"]);
        assert!(ix.accounts.contains_key("authority"));
    }

    #[test]
    fn metadata_update_field_reads_custom_keys() {
        let mut data = MetadataInstruction::UpdateField.discriminator().to_vec();
        data.push(3);
        for s in ["color", "blue"] {
            data.extend_from_slice(&(s.len() as u32).to_le_bytes());
            data.extend_from_slice(s.as_bytes());
        }
        let ix = decode(&data, &metas(2)).unwrap();
        assert_eq!(ix.data, json!({"field": {"key": "color"}, "value": "blue"}));

        let mut data = MetadataInstruction::UpdateField.discriminator().to_vec();
        data.extend_from_slice(&[1, 1, 0, 0, 0, b'X']);
        let ix = decode(&data, &metas(2)).unwrap();
        assert_eq!(ix.data, json!({"field": "symbol", "value": "X"}));
    }

    #[test]
    fn metadata_unknown_field_tag_is_an_error() {
        let mut data = MetadataInstruction::UpdateField.discriminator().to_vec();
        data.extend_from_slice(&[9, 0, 0, 0, 0]);
        assert!(matches!(decode(&data, &metas(2)), Err(Error::MalformedPayload { .. })));
    }

    #[test]
    fn metadata_emit_reads_optional_bounds() {
        let mut data = MetadataInstruction::Emit.discriminator().to_vec();
        data.extend_from_slice(&[1, 4, 0, 0, 0, 0, 0, 0, 0, 0]);
        let ix = decode(&data, &metas(1)).unwrap();
        assert_eq!(ix.data, json!({"start": "4", "end": null}));
    }
}
