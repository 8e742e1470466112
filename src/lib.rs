#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::dbg_macro,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::panic,
    )
)]

pub mod codec;
pub mod config;
pub mod decoder;
pub mod error;
pub mod idl;
pub mod keys;
pub mod natives;
pub mod registry;
pub mod serializer;
pub mod types;
pub mod wire;

pub use codec::{AccountsCoder, EventParser, IdlValue, InstructionCoder, sighash};
pub use config::DecoderConfig;
pub use decoder::{Decoder, PassthroughExt};
pub use error::Error;
pub use idl::{InterfaceDialect, ProgramInterface, TypeCatalog};
pub use natives::{AccountMeta, NativeInstruction, NativeProgram};
pub use registry::{DecodeContext, SchemaRegistry};
pub use serializer::{serialize_fields, serialize_value};
pub use types::{
    DecodedAccount, DecodedInnerInstruction, DecodedInstruction, DecodedMessage, DecodedMeta,
    DecodedTransaction, Event, InstructionPayload, ParsedAccount,
};
pub use wire::{
    AccountUpdate, CanonicalAccount, CanonicalTransaction, TransactionUpdate,
    format_account_update, format_transaction_update,
};
