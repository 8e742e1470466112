use solana_pubkey::Pubkey;

use crate::error::Error;
use crate::wire::canonical::{
    AddressTableLookup, CanonicalAccount, CanonicalMessage, CanonicalMeta, CanonicalTransaction,
    CompiledInstruction, InnerInstruction, InnerInstructionGroup, LoadedAddresses, MessageHeader,
    TransactionError, TransactionVersion,
};
use crate::wire::raw::{AccountUpdate, ByteField, RawMessage, RawMeta, TransactionUpdate};

/// Normalizes a streamed transaction. `block_time` is the receipt timestamp
/// supplied by the transport, if any.
pub fn format_transaction_update(
    update: &TransactionUpdate,
    block_time: Option<i64>,
) -> Result<CanonicalTransaction, Error> {
    let raw = &update.transaction.transaction;
    let message = format_message(&raw.message)?;
    let meta = update
        .transaction
        .meta
        .as_ref()
        .map(format_meta)
        .transpose()?;

    let mut signatures = raw
        .signatures
        .iter()
        .map(base58_field)
        .collect::<Result<Vec<_>, _>>()?;
    if signatures.is_empty()
        && let Some(signature) = &update.transaction.signature
    {
        signatures.push(base58_field(signature)?);
    }

    let loaded = meta.as_ref().map(|m| &m.loaded_addresses);
    let account_keys = resolve_account_keys(&message.static_account_keys, loaded);

    Ok(CanonicalTransaction {
        slot: update.slot.0,
        version: if raw.message.versioned {
            TransactionVersion::V0
        } else {
            TransactionVersion::Legacy
        },
        block_time,
        signatures,
        message,
        account_keys,
        meta,
    })
}

/// Static keys, then loaded writable keys, then loaded readonly keys.
/// Instruction account indexes point into this list.
pub fn resolve_account_keys(
    static_keys: &[Pubkey],
    loaded: Option<&LoadedAddresses>,
) -> Vec<Pubkey> {
    let mut keys = static_keys.to_vec();
    if let Some(loaded) = loaded {
        keys.reserve(loaded.writable.len() + loaded.readonly.len());
        keys.extend_from_slice(&loaded.writable);
        keys.extend_from_slice(&loaded.readonly);
    }
    keys
}

pub fn format_account_update(update: &AccountUpdate) -> Result<CanonicalAccount, Error> {
    let account = &update.account;
    Ok(CanonicalAccount {
        slot: update.slot.0,
        pubkey: account.pubkey.to_pubkey()?,
        owner: account.owner.to_pubkey()?,
        lamports: account.lamports.0,
        data: account.data.to_bytes()?,
        executable: account.executable,
        rent_epoch: account.rent_epoch.0,
        write_version: account.write_version.0,
        txn_signature: account.txn_signature.as_ref().map(base58_field).transpose()?,
        is_startup: update.is_startup,
    })
}

fn format_message(raw: &RawMessage) -> Result<CanonicalMessage, Error> {
    let header = MessageHeader {
        num_required_signatures: raw.header.num_required_signatures,
        num_readonly_signed_accounts: raw.header.num_readonly_signed_accounts,
        num_readonly_unsigned_accounts: raw.header.num_readonly_unsigned_accounts,
    };

    let instructions = raw
        .instructions
        .iter()
        .map(|ix| {
            Ok(CompiledInstruction {
                program_id_index: ix.program_id_index,
                accounts: ix.accounts.to_bytes()?,
                data: ix.data.to_bytes()?,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    // Legacy messages have no lookup tables even if the feed sends an empty list.
    let address_table_lookups = if raw.versioned {
        raw.address_table_lookups
            .iter()
            .map(|lookup| {
                Ok(AddressTableLookup {
                    account_key: lookup.account_key.to_pubkey()?,
                    writable_indexes: lookup.writable_indexes.to_bytes()?,
                    readonly_indexes: lookup.readonly_indexes.to_bytes()?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?
    } else {
        Vec::new()
    };

    Ok(CanonicalMessage {
        header,
        static_account_keys: pubkeys(&raw.account_keys)?,
        recent_blockhash: base58_field(&raw.recent_blockhash)?,
        instructions,
        address_table_lookups,
    })
}

fn format_meta(raw: &RawMeta) -> Result<CanonicalMeta, Error> {
    let inner_instructions = raw
        .inner_instructions
        .iter()
        .map(|group| {
            let instructions = group
                .instructions
                .iter()
                .map(|ix| {
                    Ok(InnerInstruction {
                        program_id_index: ix.program_id_index,
                        accounts: ix.accounts.to_bytes()?,
                        data: ix.data.to_bytes()?,
                        stack_height: ix.stack_height,
                    })
                })
                .collect::<Result<Vec<_>, Error>>()?;
            Ok(InnerInstructionGroup {
                index: group.index,
                instructions,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(CanonicalMeta {
        err: raw
            .error_info
            .as_ref()
            .filter(|info| !info.is_null())
            .map(|info| TransactionError { err: info.clone() }),
        fee: raw.fee.0,
        pre_balances: raw.pre_balances.iter().map(|b| b.0).collect(),
        post_balances: raw.post_balances.iter().map(|b| b.0).collect(),
        pre_token_balances: raw.pre_token_balances.clone(),
        post_token_balances: raw.post_token_balances.clone(),
        log_messages: raw.log_messages.clone(),
        loaded_addresses: LoadedAddresses {
            writable: pubkeys(&raw.loaded_writable_addresses)?,
            readonly: pubkeys(&raw.loaded_readonly_addresses)?,
        },
        inner_instructions,
        compute_units_consumed: raw.compute_units_consumed.map(|units| units.0),
    })
}

fn pubkeys(fields: &[ByteField]) -> Result<Vec<Pubkey>, Error> {
    fields.iter().map(ByteField::to_pubkey).collect()
}

fn base58_field(field: &ByteField) -> Result<String, Error> {
    Ok(bs58::encode(field.to_bytes()?).into_string())
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use base64::{Engine, prelude::BASE64_STANDARD};
    use serde_json::json;

    use super::*;

    fn b64(bytes: &[u8]) -> String {
        BASE64_STANDARD.encode(bytes)
    }

    fn legacy_update(meta: serde_json::Value) -> TransactionUpdate {
        serde_json::from_value(json!({
            "slot": "42",
            "transaction": {
                "transaction": {
                    "signatures": [b64(&[9; 64])],
                    "message": {
                        "header": {"numRequiredSignatures": 1},
                        "accountKeys": [b64(&[1; 32]), b64(&[2; 32])],
                        "recentBlockhash": b64(&[3; 32]),
                        "instructions": [
                            {"programIdIndex": 1, "accounts": b64(&[0]), "data": b64(&[7, 7])}
                        ],
                        "addressTableLookups": [
                            {
                                "accountKey": b64(&[4; 32]),
                                "writableIndexes": "",
                                "readonlyIndexes": ""
                            }
                        ]
                    }
                },
                "meta": meta
            }
        }))
        .unwrap()
    }

    #[test]
    fn legacy_message_is_normalized() {
        let tx =
            format_transaction_update(&legacy_update(json!(null)), Some(1_700_000_000)).unwrap();
        assert_eq!(tx.slot, 42);
        assert_eq!(tx.version, TransactionVersion::Legacy);
        assert_eq!(tx.block_time, Some(1_700_000_000));
        assert_eq!(tx.signature(), Some(bs58::encode([9u8; 64]).into_string().as_str()));
        assert_eq!(tx.message.recent_blockhash, bs58::encode([3u8; 32]).into_string());
        assert_eq!(tx.message.instructions[0].data, vec![7, 7]);
        assert!(tx.message.address_table_lookups.is_empty());
        assert!(tx.meta.is_none());
        assert_eq!(tx.account_keys.len(), 2);
    }

    #[test]
    fn meta_defaults_and_error_wrapper() {
        let meta = json!({
            "errorInfo": {"InstructionError": [0, "Custom"]},
            "fee": 5000,
            "innerInstructions": [
                {
                    "index": 0,
                    "instructions": [{"programIdIndex": 1, "data": b64(&[1]), "stackHeight": 2}]
                }
            ]
        });
        let tx = format_transaction_update(&legacy_update(meta), None).unwrap();
        let meta = tx.meta.unwrap();
        assert_eq!(meta.err.unwrap().err, json!({"InstructionError": [0, "Custom"]}));
        assert_eq!(meta.fee, 5000);
        assert!(meta.log_messages.is_empty());
        assert!(meta.pre_token_balances.is_empty());
        assert_eq!(meta.inner_instructions[0].instructions[0].stack_height, Some(2));
        assert!(meta.inner_instructions[0].instructions[0].accounts.is_empty());
    }

    #[test]
    fn loaded_keys_follow_static_keys_in_fixed_order() {
        let statics = [Pubkey::new_from_array([1; 32])];
        let loaded = LoadedAddresses {
            writable: vec![Pubkey::new_from_array([2; 32])],
            readonly: vec![Pubkey::new_from_array([3; 32])],
        };
        let keys = resolve_account_keys(&statics, Some(&loaded));
        let firsts: Vec<u8> = keys.iter().map(|k| k.to_bytes()[0]).collect();
        assert_eq!(firsts, vec![1, 2, 3]);
        assert_eq!(resolve_account_keys(&statics, None).len(), 1);
    }

    #[test]
    fn account_update_is_normalized() {
        let update: AccountUpdate = serde_json::from_value(json!({
            "slot": 9,
            "isStartup": true,
            "account": {
                "pubkey": b64(&[1; 32]),
                "lamports": "1000",
                "owner": {"type": "Buffer", "data": vec![2u8; 32]},
                "data": b64(&[0xAA, 0xBB]),
                "rentEpoch": "18446744073709551615",
                "writeVersion": 3
            }
        }))
        .unwrap();
        let account = format_account_update(&update).unwrap();
        assert_eq!(account.lamports, 1000);
        assert_eq!(account.owner.to_bytes(), [2; 32]);
        assert_eq!(account.data, vec![0xAA, 0xBB]);
        assert_eq!(account.rent_epoch, u64::MAX);
        assert!(account.is_startup);
        assert!(account.txn_signature.is_none());
    }

    #[test]
    fn bad_base64_is_a_wire_error() {
        let mut update = legacy_update(json!(null));
        update.transaction.transaction.message.recent_blockhash =
            ByteField::Encoded("***".to_string());
        assert!(matches!(
            format_transaction_update(&update, None),
            Err(Error::Wire { .. })
        ));
    }
}
