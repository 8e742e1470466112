#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no interface registered for program {program_id}")]
    NoSchemaForProgram { program_id: String },

    #[error("no instruction matches discriminator {discriminator} for program {program_id}")]
    UnknownInstructionDiscriminator {
        program_id: String,
        discriminator: String,
    },

    #[error("malformed payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("account discriminator {discriminator} is not registered for program {program_id}")]
    UnknownAccountDiscriminator {
        program_id: String,
        discriminator: String,
    },

    #[error("defined type `{name}` is not declared by the interface")]
    MissingDefinedType { name: String },

    #[error("tuple fields of enum variant `{variant}` cannot be serialized")]
    UnsupportedTupleEnum { variant: String },

    #[error("unsupported type `{name}`")]
    UnsupportedType { name: String },

    #[error("schema mismatch: {reason}")]
    SchemaMismatch { reason: String },

    #[error("wire format error: {reason}")]
    Wire { reason: String },

    #[error("interface error: {reason}")]
    Interface { reason: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            reason: reason.into(),
        }
    }

    pub(crate) fn mismatch(reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            reason: reason.into(),
        }
    }

    pub(crate) fn wire(reason: impl Into<String>) -> Self {
        Self::Wire {
            reason: reason.into(),
        }
    }
}
