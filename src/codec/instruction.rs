use std::sync::Arc;

use crate::codec::{BorshReader, BorshWriter, IdlValue};
use crate::error::Error;
use crate::idl::{IdlDefinedFields, ProgramInterface, TypeCatalog};
use crate::keys::to_hex;

/// Discriminator and argument layout of one instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct InstructionLayout {
    pub name: String,
    pub discriminator: Vec<u8>,
    pub args: IdlDefinedFields,
}

/// Instruction name plus its decoded arguments (always an [`IdlValue::Struct`]).
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedIdlInstruction {
    pub name: String,
    pub args: IdlValue,
}

#[derive(Debug, Clone)]
pub struct InstructionCoder {
    program_id: String,
    layouts: Vec<InstructionLayout>,
    catalog: Arc<TypeCatalog>,
}

impl InstructionCoder {
    pub fn new(program_id: &str, interface: &ProgramInterface, catalog: Arc<TypeCatalog>) -> Self {
        let layouts = interface
            .idl()
            .instructions
            .iter()
            .map(|ix| InstructionLayout {
                name: ix.name.clone(),
                discriminator: ix.discriminator.clone(),
                args: IdlDefinedFields::Named(ix.args.clone()),
            })
            .collect();

        Self {
            program_id: program_id.to_string(),
            layouts,
            catalog,
        }
    }

    pub fn layouts(&self) -> &[InstructionLayout] {
        &self.layouts
    }

    pub fn layout(&self, name: &str) -> Option<&InstructionLayout> {
        self.layouts.iter().find(|l| l.name == name)
    }

    /// The first layout whose discriminator prefixes `data` is used; bytes left over
    /// after the declared arguments are ignored.
    pub fn decode(&self, data: &[u8]) -> Result<DecodedIdlInstruction, Error> {
        let layout = self
            .layouts
            .iter()
            .find(|l| data.starts_with(&l.discriminator))
            .ok_or_else(|| Error::UnknownInstructionDiscriminator {
                program_id: self.program_id.clone(),
                discriminator: to_hex(&data[..data.len().min(8)]),
            })?;

        let mut reader = BorshReader::new(&data[layout.discriminator.len()..]);
        let args = reader.read_fields(&layout.args, &self.catalog)?;
        Ok(DecodedIdlInstruction {
            name: layout.name.clone(),
            args,
        })
    }

    pub fn encode(&self, name: &str, args: &IdlValue) -> Result<Vec<u8>, Error> {
        let layout = self
            .layout(name)
            .ok_or_else(|| Error::mismatch(format!("instruction `{name}` is not declared")))?;
        let mut writer = BorshWriter::new();
        writer.write_raw(&layout.discriminator);
        writer.write_fields(&layout.args, args, &self.catalog)?;
        Ok(writer.into_bytes())
    }

    /// Encodes the zero value of `name`'s arguments and checks that decoding
    /// lands on the same instruction and re-encodes to the same bytes.
    pub fn verify_layout(&self, name: &str) -> Result<(), Error> {
        let layout = self
            .layout(name)
            .ok_or_else(|| Error::mismatch(format!("instruction `{name}` is not declared")))?;
        let zero = IdlValue::zero_of_fields(&layout.args, &self.catalog)?;
        let bytes = self.encode(name, &zero)?;
        let decoded = self.decode(&bytes)?;
        if decoded.name != name {
            return Err(Error::mismatch(format!(
                "discriminator of `{name}` is shadowed by `{}`",
                decoded.name
            )));
        }
        if self.encode(&decoded.name, &decoded.args)? != bytes {
            return Err(Error::mismatch(format!(
                "`{name}` does not survive an encode/decode round trip"
            )));
        }
        Ok(())
    }
}
