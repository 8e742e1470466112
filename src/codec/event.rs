use std::sync::Arc;

use base64::{Engine, prelude::BASE64_STANDARD};

use crate::codec::{BorshReader, IdlValue};
use crate::error::Error;
use crate::idl::{IdlDefinedFields, ProgramInterface, TypeCatalog};

const PROGRAM_DATA: &str = "Program data: ";
const PROGRAM_LOG: &str = "Program log: ";

#[derive(Debug, Clone, PartialEq)]
pub struct EventLayout {
    pub name: String,
    pub discriminator: Vec<u8>,
    pub fields: IdlDefinedFields,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedIdlEvent {
    pub name: String,
    pub data: IdlValue,
}

/// Extracts events one program emitted into a transaction's log lines.
#[derive(Debug, Clone)]
pub struct EventParser {
    program_id: String,
    layouts: Vec<EventLayout>,
    catalog: Arc<TypeCatalog>,
}

impl EventParser {
    /// `None` when the interface declares no events. Each event's layout is
    /// the struct of the same name in `catalog`.
    pub fn new(
        program_id: &str,
        interface: &ProgramInterface,
        catalog: Arc<TypeCatalog>,
    ) -> Result<Option<Self>, Error> {
        let events = &interface.idl().events;
        if events.is_empty() {
            return Ok(None);
        }

        let layouts = events
            .iter()
            .map(|event| {
                Ok(EventLayout {
                    name: event.name.clone(),
                    discriminator: event.discriminator.clone(),
                    fields: catalog.struct_fields(&event.name)?,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Some(Self {
            program_id: program_id.to_string(),
            layouts,
            catalog,
        }))
    }

    pub fn layouts(&self) -> &[EventLayout] {
        &self.layouts
    }

    pub fn fields(&self, name: &str) -> Option<&IdlDefinedFields> {
        self.layouts
            .iter()
            .find(|l| l.name == name)
            .map(|l| &l.fields)
    }

    /// Walks the invocation stack encoded in `logs` and decodes every payload
    /// emitted while this program is executing. Payloads without a known
    /// discriminator are skipped; ones that carry a known discriminator but
    /// fail to decode are returned as errors.
    pub fn parse_logs<S: AsRef<str>>(&self, logs: &[S]) -> Vec<Result<DecodedIdlEvent, Error>> {
        let mut stack: Vec<&str> = Vec::new();
        let mut out = Vec::new();

        for line in logs {
            let line = line.as_ref();
            if let Some(payload) = line
                .strip_prefix(PROGRAM_DATA)
                .or_else(|| line.strip_prefix(PROGRAM_LOG))
            {
                if stack.last() == Some(&self.program_id.as_str())
                    && let Some(event) = self.decode_payload(payload)
                {
                    out.push(event);
                }
                continue;
            }

            let Some(rest) = line.strip_prefix("Program ") else {
                continue;
            };
            let mut parts = rest.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(program), Some("invoke")) => stack.push(program),
                (Some(_), Some("success" | "failed:")) => {
                    stack.pop();
                }
                _ => {}
            }
        }
        out
    }

    fn decode_payload(&self, payload: &str) -> Option<Result<DecodedIdlEvent, Error>> {
        let bytes = BASE64_STANDARD.decode(payload.trim()).ok()?;
        let layout = self
            .layouts
            .iter()
            .find(|l| bytes.starts_with(&l.discriminator))?;
        let mut reader = BorshReader::new(&bytes[layout.discriminator.len()..]);
        Some(
            reader
                .read_fields(&layout.fields, &self.catalog)
                .map(|data| DecodedIdlEvent {
                    name: layout.name.clone(),
                    data,
                }),
        )
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "test assertions")]
mod tests {
    use super::*;
    use crate::codec::sighash;

    const PROGRAM: &str = "Evnt111111111111111111111111111111111111111";

    fn parser() -> EventParser {
        let idl = ProgramInterface::from_value(serde_json::json!({
            "name": "emitter",
            "instructions": [],
            "events": [{"name": "Tick", "fields": [{"name": "n", "type": "u32"}]}]
        }))
        .unwrap();
        EventParser::new(PROGRAM, &idl, Arc::new(idl.type_catalog()))
            .unwrap()
            .unwrap()
    }

    fn payload(n: u32) -> String {
        let mut bytes = sighash("event", "Tick").to_vec();
        bytes.extend_from_slice(&n.to_le_bytes());
        BASE64_STANDARD.encode(bytes)
    }

    #[test]
    fn only_payloads_of_the_executing_program_are_decoded() {
        let logs = vec![
            format!("Program {PROGRAM} invoke [1]"),
            "Program log: Instruction: Tick".to_string(),
            format!("Program data: {}", payload(1)),
            "Program Other11111111111111111111111111111111111 invoke [2]".to_string(),
            format!("Program data: {}", payload(2)),
            "Program Other11111111111111111111111111111111111 success".to_string(),
            format!("Program log: {}", payload(3)),
            format!("Program {PROGRAM} consumed 1200 of 200000 compute units"),
            format!("Program {PROGRAM} success"),
            format!("Program data: {}", payload(4)),
        ];
        let events: Vec<_> = parser()
            .parse_logs(&logs)
            .into_iter()
            .map(|e| e.unwrap())
            .collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data.field("n"), Some(&IdlValue::U32(1)));
        assert_eq!(events[1].data.field("n"), Some(&IdlValue::U32(3)));
    }

    #[test]
    fn truncated_known_payload_is_an_error() {
        let bytes = sighash("event", "Tick").to_vec();
        let logs = vec![
            format!("Program {PROGRAM} invoke [1]"),
            format!("Program data: {}", BASE64_STANDARD.encode(bytes)),
        ];
        let events = parser().parse_logs(&logs);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_err());
    }

    #[test]
    fn interface_without_events_has_no_parser() {
        let idl = ProgramInterface::from_value(serde_json::json!({"instructions": []})).unwrap();
        let parser = EventParser::new(PROGRAM, &idl, Arc::new(idl.type_catalog())).unwrap();
        assert!(parser.is_none());
    }

    #[test]
    fn current_event_layout_comes_from_types() {
        let idl = ProgramInterface::from_value(serde_json::json!({
            "address": PROGRAM,
            "events": [{"name": "Tock", "discriminator": [5, 5, 5, 5, 5, 5, 5, 5]}],
            "types": [{"name": "Tock", "type": {"kind": "struct", "fields": [
                {"name": "slot", "type": "u64"}
            ]}}]
        }))
        .unwrap();
        let parser = EventParser::new(PROGRAM, &idl, Arc::new(idl.type_catalog()))
            .unwrap()
            .unwrap();
        let mut bytes = vec![5u8; 8];
        bytes.extend_from_slice(&9u64.to_le_bytes());
        let logs = vec![
            format!("Program {PROGRAM} invoke [1]"),
            format!("Program data: {}", BASE64_STANDARD.encode(bytes)),
        ];
        let events = parser.parse_logs(&logs);
        assert_eq!(events.len(), 1);
        let event = events.into_iter().next().unwrap().unwrap();
        assert_eq!(event.name, "Tock");
        assert_eq!(event.data.field("slot"), Some(&IdlValue::U64(9)));
    }
}
