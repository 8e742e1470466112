#![expect(
    clippy::unwrap_used,
    clippy::panic,
    reason = "test code uses unwrap/panic for concise assertions"
)]

use idl_stream_decoder::{
    AccountUpdate, Decoder, DecoderConfig, Error, IdlValue, InstructionPayload, InterfaceDialect,
    ProgramInterface, TransactionUpdate, format_transaction_update, sighash,
};
use serde_json::{Value, json};

const VAULT: &str = "29d2S7vB453rNYFdR5Ycwt7y9haRT5fwVwL9zTmBhfV2";
const SWAP: &str = "3JF3sEqM796hk5WFqA6EtmEwJQ9quALszsfJyvXNQKy3";
const PAYER: &str = "4vJ9JU1bJJE96FWSJKvHsmmFADCg4gpZQff4P3bkLKi";
const LOADED_WRITABLE: &str = "gBxS1f6uyyGPuW5MzGBukidSb71jdsCb5fZaoSzULE5";
const LOADED_READONLY: &str = "k7FaK87WHGVXzkaoHb7CdVPgkKDQhZ29VLDeBVbDfYn";
const VAULT_OWNER: &str = "3EKkiwNLWqoUbzFkPrmKbtUB4EweE6f4STzevYUmezeL";
const TOKEN_2022: &str = "TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb";

fn fixture(filename: &str) -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let path = format!("{manifest_dir}/tests/fixtures/{filename}");
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("failed to read {path}: {e}"))
}

fn load<T: serde::de::DeserializeOwned>(filename: &str) -> T {
    serde_json::from_str(&fixture(filename))
        .unwrap_or_else(|e| panic!("failed to parse {filename}: {e}"))
}

fn decoder(config: DecoderConfig) -> Decoder {
    let mut decoder = Decoder::new(config);
    decoder
        .register_interface_json(VAULT, &fixture("vault_legacy_idl.json"))
        .unwrap();
    decoder
        .register_interface_json(SWAP, &fixture("swap_current_idl.json"))
        .unwrap();
    decoder
}

fn payload_json(payload: &InstructionPayload) -> Value {
    serde_json::to_value(payload).unwrap()
}

// ──────────────────── registration ────────────────────

#[test]
fn dialect_follows_interface_shape() {
    let legacy = ProgramInterface::from_json(&fixture("vault_legacy_idl.json")).unwrap();
    let current = ProgramInterface::from_json(&fixture("swap_current_idl.json")).unwrap();
    assert_eq!(legacy.dialect(), InterfaceDialect::Legacy);
    assert_eq!(current.dialect(), InterfaceDialect::Current);

    let decoder = decoder(DecoderConfig::default());
    let registry = decoder.registry();
    assert_eq!(
        registry.lookup(VAULT).unwrap().dialect(),
        InterfaceDialect::Legacy
    );
    assert_eq!(
        registry.lookup(SWAP).unwrap().account_discriminator("Pool"),
        Some(sighash("account", "Pool").as_slice())
    );
    assert!(registry.lookup(VAULT).unwrap().unverified_instructions().is_empty());
    assert!(registry.lookup(SWAP).unwrap().unverified_instructions().is_empty());
}

#[test]
fn instruction_names_accumulate_across_interfaces() {
    let names = decoder(DecoderConfig::default()).all_instruction_names();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["deposit", "initialize", "setStatus", "swap", "withdraw"]
    );
}

// ──────────────────── transactions ────────────────────

#[test]
fn loaded_addresses_follow_static_keys_writable_first() {
    let update: TransactionUpdate = load("versioned_transaction.json");
    let tx = format_transaction_update(&update, Some(1_750_000_000)).unwrap();
    assert_eq!(tx.slot, 281_000_000);
    assert_eq!(tx.message.static_account_keys.len(), 4);
    assert_eq!(tx.message.address_table_lookups.len(), 2);
    assert_eq!(tx.account_keys[4].to_string(), LOADED_WRITABLE);
    assert_eq!(tx.account_keys[5].to_string(), LOADED_READONLY);

    let decoded = decoder(DecoderConfig::default()).decode_transaction(&tx);
    let deposit = &decoded.message.instructions[0];
    let accounts: Vec<(&str, bool, bool)> = deposit
        .accounts
        .iter()
        .map(|a| (a.pubkey.as_str(), a.is_signer, a.is_writable))
        .collect();
    assert_eq!(
        accounts,
        vec![
            (PAYER, true, true),
            (LOADED_WRITABLE, false, true),
            (LOADED_READONLY, false, false),
        ]
    );
}

#[test]
fn registered_programs_decode_and_failures_pass_through() {
    let update: TransactionUpdate = load("versioned_transaction.json");
    let decoded = decoder(DecoderConfig::default())
        .decode_transaction_update(&update, None)
        .unwrap();
    let ixs = &decoded.message.instructions;
    assert_eq!(ixs.len(), 4);

    assert_eq!(ixs[0].program_id, VAULT);
    assert_eq!(
        payload_json(&ixs[0].data),
        json!({"name": "deposit", "data": {"amount": "250", "memo": "hi"}})
    );

    // Token-2022 without native decoding, then garbage for a registered program.
    assert_eq!(ixs[1].data, InstructionPayload::raw(&[26, 99]));
    assert_eq!(ixs[2].data, InstructionPayload::Raw("Ldp".to_string()));
    assert_eq!(ixs[2].program_id, VAULT);

    assert_eq!(
        payload_json(&ixs[3].data),
        json!({
            "name": "swap",
            "data": {"amount_in": "10", "minimum_out": "9", "side": {"Ask": {}}}
        })
    );
}

#[test]
fn unregistered_programs_pass_raw_bytes_through() {
    let update: TransactionUpdate = load("versioned_transaction.json");
    let tx = format_transaction_update(&update, None).unwrap();
    let decoded = Decoder::new(DecoderConfig::default()).decode_transaction(&tx);

    for (raw, ix) in tx.message.instructions.iter().zip(&decoded.message.instructions) {
        assert_eq!(ix.data, InstructionPayload::Raw(bs58::encode(&raw.data).into_string()));
    }
    let meta = decoded.meta.unwrap();
    assert!(meta.inner_instructions.iter().all(|ix| !ix.data.is_decoded()));
    assert!(decoded.message.events.is_empty());
}

#[test]
fn native_extension_with_unknown_sub_instruction_is_named_unknown() {
    let update: TransactionUpdate = load("versioned_transaction.json");
    let decoder = decoder(DecoderConfig {
        native_decoding: true,
        ..DecoderConfig::default()
    });
    let decoded = decoder.decode_transaction_update(&update, None).unwrap();

    let InstructionPayload::Native(unknown) = &decoded.message.instructions[1].data else {
        panic!("expected a native result");
    };
    assert_eq!(unknown.name, "unknown");
    assert_eq!(unknown.data, json!("31U"));

    let meta = decoded.meta.unwrap();
    let inner = &meta.inner_instructions[0];
    assert_eq!(inner.outer_index, 0);
    assert_eq!(inner.stack_height, Some(2));
    assert_eq!(inner.program_id, TOKEN_2022);
    assert_eq!(
        payload_json(&inner.data)["data"],
        json!({"amount": "1000000", "decimals": 6})
    );
    assert_eq!(
        payload_json(&inner.data)["accounts"]["destination"]["pubkey"],
        json!(PAYER)
    );
}

#[test]
fn events_come_from_participating_registered_programs() {
    let update: TransactionUpdate = load("versioned_transaction.json");
    let mut decoder = decoder(DecoderConfig::default());
    let decoded = decoder.decode_transaction_update(&update, None).unwrap();

    let events: Vec<(&str, &str)> = decoded
        .message
        .events
        .iter()
        .map(|e| (e.program_id.as_str(), e.name.as_str()))
        .collect();
    assert_eq!(events, vec![(VAULT, "DepositEvent"), (SWAP, "SwapEvent")]);
    assert_eq!(
        decoded.message.events[0].data,
        json!({"vault": LOADED_WRITABLE, "amount": "250"})
    );
    assert_eq!(
        decoded.message.events[1].data,
        json!({"pool": LOADED_WRITABLE, "amount_out": "9"})
    );

    decoder.set_event_parsing_enabled(false);
    let decoded = decoder.decode_transaction_update(&update, None).unwrap();
    assert!(decoded.message.events.is_empty());
}

#[test]
fn decoded_transaction_serializes_with_canonical_keys() {
    let update: TransactionUpdate = load("versioned_transaction.json");
    let decoded = decoder(DecoderConfig::default())
        .decode_transaction_update(&update, Some(1_750_000_000))
        .unwrap();
    let value = serde_json::to_value(&decoded).unwrap();

    assert_eq!(value["version"], json!(0));
    assert_eq!(value["blockTime"], json!(1_750_000_000));
    assert_eq!(
        value["message"]["recentBlockhash"],
        json!("4Ss5JMkXAD9Z7cktFEdrqeMuT6jGMF1pVozTyPHZ6zT4")
    );
    assert_eq!(value["message"]["addressTableLookups"][0]["writableIndexes"], json!([5]));
    assert_eq!(value["meta"]["err"], Value::Null);
    assert_eq!(value["meta"]["fee"], json!(5000));
    assert_eq!(value["meta"]["computeUnitsConsumed"], json!(21000));
    assert_eq!(value["meta"]["loadedAddresses"]["readonly"], json!([LOADED_READONLY]));
    assert_eq!(value["meta"]["preTokenBalances"], json!([]));
    assert!(value["message"]["events"].is_array());
}

// ──────────────────── accounts ────────────────────

#[test]
fn account_update_decodes_in_declared_field_order() {
    let update: AccountUpdate = load("vault_account_update.json");
    let account = decoder(DecoderConfig::default())
        .decode_account_update(&update)
        .unwrap();

    assert_eq!(account.pubkey, LOADED_WRITABLE);
    assert_eq!(account.owner, VAULT);
    assert_eq!(account.lamports, 2_039_280);
    assert_eq!(account.rent_epoch, u64::MAX);
    assert_eq!(account.parsed.account_name, "Vault");

    let parsed = account.parsed.parsed.as_object().unwrap();
    let keys: Vec<&str> = parsed.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["owner", "balance", "status", "config", "label", "history", "delegate"]
    );
    assert_eq!(parsed["owner"], json!(VAULT_OWNER));
    assert_eq!(parsed["balance"], json!("18446744073709551615"));
    assert_eq!(parsed["status"], json!({"Frozen": {"reason": "audit"}}));
    assert_eq!(
        parsed["config"],
        json!({"feeBps": 25, "maxDeposit": "1000000", "paused": false})
    );
    assert_eq!(parsed["label"], json!("main"));
    assert_eq!(parsed["history"], json!([1, 2, 3]));
    assert_eq!(parsed["delegate"], Value::Null);

    let value = serde_json::to_value(&account).unwrap();
    assert_eq!(value["parsed"]["accountName"], json!("Vault"));
    assert_eq!(value["rentEpoch"], json!(u64::MAX));
}

#[test]
fn unknown_account_discriminator_is_an_error() {
    let mut update: AccountUpdate = load("vault_account_update.json");
    update.account.data = idl_stream_decoder::wire::ByteField::Raw(vec![0xFF; 64]);
    let result = decoder(DecoderConfig::default()).decode_account_update(&update);
    assert!(matches!(
        result,
        Err(Error::UnknownAccountDiscriminator { ref program_id, .. }) if program_id == VAULT
    ));
}

// ──────────────────── round trips ────────────────────

fn next(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1);
    *state
}

#[test]
fn instruction_bytes_survive_decode_then_encode() {
    let decoder = decoder(DecoderConfig::default());
    let context = decoder.registry().lookup(VAULT).unwrap();
    let coder = context.instruction_coder();
    let mut seed = 0x5EED_u64;

    for _ in 0..200 {
        let amount = next(&mut seed);
        let memo = if amount % 3 == 0 {
            IdlValue::Option(None)
        } else {
            let text: String = (0..(amount % 12))
                .map(|i| char::from(b'a' + ((amount >> i) % 26) as u8))
                .collect();
            IdlValue::Option(Some(Box::new(IdlValue::String(text))))
        };
        let args = IdlValue::Struct(vec![
            ("amount".to_string(), IdlValue::U64(amount)),
            ("memo".to_string(), memo),
        ]);

        let bytes = context.encode_instruction("deposit", &args).unwrap();
        let decoded = coder.decode(&bytes).unwrap();
        assert_eq!(decoded.name, "deposit");
        assert_eq!(coder.encode(&decoded.name, &decoded.args).unwrap(), bytes);
    }
}

#[test]
fn enum_variants_match_case_insensitively() {
    let decoder = decoder(DecoderConfig::default());
    let context = decoder.registry().lookup(VAULT).unwrap();
    let args = IdlValue::Struct(vec![(
        "status".to_string(),
        IdlValue::Enum {
            variant: "frozen".to_string(),
            fields: Box::new(IdlValue::Struct(vec![(
                "reason".to_string(),
                IdlValue::String("ops".to_string()),
            )])),
        },
    )]);

    let bytes = context.encode_instruction("setStatus", &args).unwrap();
    let (name, data) = context.decode_instruction(&bytes).unwrap();
    assert_eq!(name, "setStatus");
    assert_eq!(data, json!({"status": {"Frozen": {"reason": "ops"}}}));
}
