use std::collections::HashMap;
use std::sync::Arc;

use crate::codec::{BorshReader, BorshWriter, DISCRIMINATOR_LEN, IdlValue};
use crate::error::Error;
use crate::idl::{IdlDefinedFields, ProgramInterface, TypeCatalog};
use crate::keys::to_hex;

#[derive(Debug, Clone, PartialEq)]
pub struct AccountLayout {
    pub name: String,
    pub discriminator: Vec<u8>,
    pub fields: IdlDefinedFields,
}

/// Discriminator tables and field layouts for one program's account types.
#[derive(Debug, Clone)]
pub struct AccountsCoder {
    program_id: String,
    layouts: Vec<AccountLayout>,
    by_name: HashMap<String, usize>,
    catalog: Arc<TypeCatalog>,
}

impl AccountsCoder {
    /// Each account's layout is the struct of the same name in `catalog`.
    pub fn new(
        program_id: &str,
        interface: &ProgramInterface,
        catalog: Arc<TypeCatalog>,
    ) -> Result<Self, Error> {
        let accounts = &interface.idl().accounts;
        let mut layouts = Vec::with_capacity(accounts.len());
        let mut by_name = HashMap::with_capacity(accounts.len());

        for account in accounts {
            let fields = catalog.struct_fields(&account.name)?;
            by_name.entry(account.name.clone()).or_insert(layouts.len());
            layouts.push(AccountLayout {
                name: account.name.clone(),
                discriminator: account.discriminator.clone(),
                fields,
            });
        }

        Ok(Self {
            program_id: program_id.to_string(),
            layouts,
            by_name,
            catalog,
        })
    }

    pub fn layouts(&self) -> &[AccountLayout] {
        &self.layouts
    }

    pub fn discriminator(&self, name: &str) -> Option<&[u8]> {
        self.layout(name).map(|l| l.discriminator.as_slice())
    }

    pub fn fields(&self, name: &str) -> Option<&IdlDefinedFields> {
        self.layout(name).map(|l| &l.fields)
    }

    fn layout(&self, name: &str) -> Option<&AccountLayout> {
        self.by_name.get(name).map(|&i| &self.layouts[i])
    }

    fn layout_for(&self, data: &[u8]) -> Result<&AccountLayout, Error> {
        self.layouts
            .iter()
            .find(|l| data.starts_with(&l.discriminator))
            .ok_or_else(|| Error::UnknownAccountDiscriminator {
                program_id: self.program_id.clone(),
                discriminator: to_hex(&data[..data.len().min(DISCRIMINATOR_LEN)]),
            })
    }

    /// Account type name for `data`, by discriminator prefix.
    pub fn account_name(&self, data: &[u8]) -> Result<&str, Error> {
        self.layout_for(data).map(|l| l.name.as_str())
    }

    pub fn decode(&self, data: &[u8]) -> Result<(String, IdlValue), Error> {
        let layout = self.layout_for(data)?;
        let mut reader = BorshReader::new(&data[layout.discriminator.len()..]);
        let value = reader.read_fields(&layout.fields, &self.catalog)?;
        Ok((layout.name.clone(), value))
    }

    pub fn encode(&self, name: &str, value: &IdlValue) -> Result<Vec<u8>, Error> {
        let layout = self
            .layout(name)
            .ok_or_else(|| Error::mismatch(format!("account `{name}` is not declared")))?;
        let mut writer = BorshWriter::new();
        writer.write_raw(&layout.discriminator);
        writer.write_fields(&layout.fields, value, &self.catalog)?;
        Ok(writer.into_bytes())
    }

    /// Pairs of account names whose discriminators collide. Only the first of
    /// each pair is reachable through [`AccountsCoder::decode`].
    pub fn duplicate_discriminators(&self) -> Vec<(&str, &str)> {
        let mut out = Vec::new();
        for (i, first) in self.layouts.iter().enumerate() {
            for second in &self.layouts[i + 1..] {
                if first.discriminator == second.discriminator {
                    out.push((first.name.as_str(), second.name.as_str()));
                }
            }
        }
        out
    }
}
