use solana_pubkey::Pubkey;

use crate::error::Error;

pub const PUBKEY_BYTES: usize = 32;

pub fn pubkey_from_bytes(bytes: &[u8]) -> Result<Pubkey, Error> {
    let array: [u8; PUBKEY_BYTES] = bytes.try_into().map_err(|_| {
        Error::wire(format!(
            "public key must be {PUBKEY_BYTES} bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(Pubkey::new_from_array(array))
}

pub fn pubkey_from_base58(text: &str) -> Result<Pubkey, Error> {
    text.parse::<Pubkey>()
        .map_err(|e| Error::wire(format!("invalid base58 public key `{text}`: {e}")))
}

pub fn pubkey_to_base58(key: &Pubkey) -> String {
    key.to_string()
}

/// Hex rendering used in discriminator error messages.
pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
