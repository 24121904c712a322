use crate::domain::notification::Notification;
use crate::domain::ports::NotificationDispatcher;
use crate::error::{EscrowError, Result};
use async_trait::async_trait;
use std::io::Write;
use std::sync::Mutex;

/// Writes notification intents as CSV rows `recipient,kind,params`,
/// where `params` is the JSON object of template parameters.
///
/// This is the dispatcher used when replaying an event script: it stands
/// in for the chat transport that would otherwise render and deliver
/// each intent.
pub struct IntentWriter<W: Write> {
    writer: Mutex<csv::Writer<W>>,
}

impl<W: Write> IntentWriter<W> {
    pub fn new(sink: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new().from_writer(sink);
        writer.write_record(["recipient", "kind", "params"])?;
        writer.flush()?;
        Ok(Self {
            writer: Mutex::new(writer),
        })
    }
}

#[async_trait]
impl<W: Write + Send> NotificationDispatcher for IntentWriter<W> {
    async fn deliver(&self, intent: &Notification) -> Result<()> {
        let value = serde_json::to_value(&intent.template)?;
        let kind = value["kind"].as_str().unwrap_or_default().to_string();
        let params = value
            .get("params")
            .map(ToString::to_string)
            .unwrap_or_else(|| "{}".to_string());

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| EscrowError::StoreUnavailable("intent writer lock poisoned".into()))?;
        writer.write_record([intent.recipient.to_string(), kind, params])?;
        writer.flush()?;
        Ok(())
    }
}
