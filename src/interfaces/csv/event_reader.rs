use crate::application::service::ChatEvent;
use crate::domain::user::ActorProfile;
use crate::error::{EscrowError, Result};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum EventKind {
    Start,
    Message,
    Callback,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    actor: i64,
    name: String,
    kind: EventKind,
    payload: Option<String>,
}

impl EventRecord {
    fn into_event(self) -> Result<(ActorProfile, ChatEvent)> {
        let profile = ActorProfile::new(self.actor, self.name);
        let event = match self.kind {
            EventKind::Start => ChatEvent::Start {
                payload: self.payload.filter(|p| !p.is_empty()),
            },
            EventKind::Message => ChatEvent::Message {
                text: self
                    .payload
                    .ok_or_else(|| EscrowError::InvalidInput("message without text".into()))?,
            },
            EventKind::Callback => ChatEvent::Callback {
                data: self
                    .payload
                    .ok_or_else(|| EscrowError::InvalidInput("callback without data".into()))?,
            },
        };
        Ok((profile, event))
    }
}

/// Reads chat events from a CSV source with columns
/// `actor,name,kind,payload`.
///
/// Wraps `csv::Reader` and yields `Result<(ActorProfile, ChatEvent)>`
/// lazily, trimming whitespace and tolerating missing trailing fields.
pub struct EventReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> EventReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn events(self) -> impl Iterator<Item = Result<(ActorProfile, ChatEvent)>> {
        self.reader.into_deserialize().map(|result| {
            result
                .map_err(EscrowError::from)
                .and_then(EventRecord::into_event)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_valid_stream() {
        let data = "actor, name, kind, payload\n\
                    7, alice, start, \n\
                    7, alice, callback, create_deal\n\
                    7, alice, message, 10.5";
        let reader = EventReader::new(data.as_bytes());
        let events: Vec<_> = reader.events().collect::<Result<_>>().unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].0, ActorProfile::new(7, "alice"));
        assert_eq!(events[0].1, ChatEvent::Start { payload: None });
        assert_eq!(
            events[1].1,
            ChatEvent::Callback {
                data: "create_deal".into()
            }
        );
        assert_eq!(events[2].1, ChatEvent::Message { text: "10.5".into() });
    }

    #[test]
    fn test_start_with_join_payload() {
        let data = "actor, name, kind, payload\n20, bob, start, join_abc123def456";
        let reader = EventReader::new(data.as_bytes());
        let events: Vec<_> = reader.events().collect::<Result<_>>().unwrap();
        assert_eq!(
            events[0].1,
            ChatEvent::Start {
                payload: Some("join_abc123def456".into())
            }
        );
    }

    #[test]
    fn test_malformed_kind_is_an_error() {
        let data = "actor, name, kind, payload\n7, alice, poke, hi";
        let reader = EventReader::new(data.as_bytes());
        let results: Vec<_> = reader.events().collect();
        assert!(results[0].is_err());
    }
}
