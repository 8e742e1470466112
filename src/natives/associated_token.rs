use serde_json::json;

use crate::error::Error;
use crate::natives::{AccountMeta, NativeInstruction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::FromRepr, strum_macros::AsRefStr)]
#[strum(serialize_all = "camelCase")]
#[repr(u8)]
pub enum AssociatedTokenInstruction {
    Create = 0,
    CreateIdempotent = 1,
    RecoverNested = 2,
}

/// An empty payload is the original `create`.
pub fn decode(data: &[u8], accounts: &[AccountMeta]) -> Result<NativeInstruction, Error> {
    let ix = match data.first() {
        None => AssociatedTokenInstruction::Create,
        Some(&tag) => match AssociatedTokenInstruction::from_repr(tag) {
            Some(ix) => ix,
            None => return Ok(NativeInstruction::unknown(data, accounts)),
        },
    };

    let roles: &[&str] = match ix {
        AssociatedTokenInstruction::Create | AssociatedTokenInstruction::CreateIdempotent => &[
            "funder",
            "associatedAccount",
            "wallet",
            "mint",
            "systemProgram",
            "tokenProgram",
        ],
        AssociatedTokenInstruction::RecoverNested => &[
            "nestedAssociatedAccount",
            "nestedMint",
            "destinationAssociatedAccount",
            "ownerAssociatedAccount",
            "ownerMint",
            "wallet",
            "tokenProgram",
        ],
    };

    Ok(NativeInstruction::new(
        ix.as_ref(),
        accounts,
        roles,
        "remaining",
        json!({}),
    ))
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::*;
    use crate::natives::test_support::metas;

    #[test]
    fn empty_payload_is_create() {
        let ix = decode(&[], &metas(6)).unwrap();
        assert_eq!(ix.name, "create");
        assert_eq!(ix.accounts["wallet"]["pubkey"], "Acct2");
    }

    #[test]
    fn idempotent_and_recover_nested() {
        assert_eq!(decode(&[1], &metas(6)).unwrap().name, "createIdempotent");
        let nested = decode(&[2], &metas(7)).unwrap();
        assert_eq!(nested.name, "recoverNested");
        assert_eq!(nested.accounts["tokenProgram"]["pubkey"], "Acct6");
    }

    #[test]
    fn unknown_tag() {
        assert!(decode(&[9], &metas(1)).unwrap().is_unknown());
    }
}
