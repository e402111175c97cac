use std::collections::HashMap;

use tokio::sync::mpsc;
use tracing::debug;

use crate::actors::messages::{DnsRecord, RecordStoreMessage};

/// Owns the record table. Receives messages from the RecordStoreHandle and
/// answers them one at a time.
pub struct RecordStoreActor {
    // The receiver for incoming messages
    receiver: mpsc::Receiver<RecordStoreMessage>,
    // Records keyed by id
    records: HashMap<u64, DnsRecord>,
    // Id handed to the next inserted record
    next_id: u64,
}

impl RecordStoreActor {
    pub fn new(receiver: mpsc::Receiver<RecordStoreMessage>) -> Self {
        Self {
            receiver,
            records: HashMap::new(),
            next_id: 1,
        }
    }

    // Run until every handle is dropped
    pub async fn run(&mut self) {
        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg);
        }
        debug!("Record store actor stopped");
    }

    pub fn handle_message(&mut self, msg: RecordStoreMessage) {
        match msg {
            RecordStoreMessage::Insert {
                name,
                rtype,
                respond_to,
            } => {
                let record = DnsRecord {
                    id: self.next_id,
                    name,
                    rtype,
                };
                self.next_id += 1;
                debug!(
                    "Inserting record id={} name={} type={}",
                    record.id, record.name, record.rtype
                );
                self.records.insert(record.id, record.clone());
                let _ = respond_to.send(record);
            }

            RecordStoreMessage::FindByNameAndType {
                name,
                rtype,
                respond_to,
            } => {
                let found = self
                    .sorted()
                    .into_iter()
                    .find(|record| record.name == name && record.rtype == rtype);
                let _ = respond_to.send(found);
            }

            RecordStoreMessage::FindAll { respond_to } => {
                let _ = respond_to.send(self.sorted());
            }
        }
    }

    fn sorted(&self) -> Vec<DnsRecord> {
        let mut records: Vec<DnsRecord> = self.records.values().cloned().collect();
        records.sort_by_key(|record| record.id);
        records
    }
}
