//! Streamed feed messages and their canonical, encoding-independent form.

pub mod adapter;
pub mod canonical;
pub mod raw;

pub use adapter::{format_account_update, format_transaction_update, resolve_account_keys};
pub use canonical::{
    AddressTableLookup, CanonicalAccount, CanonicalMessage, CanonicalMeta, CanonicalTransaction,
    CompiledInstruction, InnerInstruction, InnerInstructionGroup, LoadedAddresses, MessageHeader,
    TransactionError, TransactionVersion,
};
pub use raw::{AccountUpdate, ByteField, LenientU64, TransactionUpdate};
