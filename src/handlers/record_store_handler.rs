use tokio::sync::{mpsc, oneshot};

use crate::actors::messages::{DnsRecord, RecordStoreMessage};
use crate::actors::record_store_actor::RecordStoreActor;
use crate::errors::StoreError;
use crate::protocol::ResourceType;

/// Cloneable front end of the record store. Each handle talks to the same
/// actor task.
#[derive(Clone, Debug)]
pub struct RecordStoreHandle {
    sender: mpsc::Sender<RecordStoreMessage>,
}

impl Default for RecordStoreHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStoreHandle {
    /// Spawns the actor. Must be called from within a tokio runtime.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel(8);
        let mut actor = RecordStoreActor::new(receiver);
        tokio::spawn(async move { actor.run().await });

        Self { sender }
    }

    pub async fn insert(
        &self,
        name: impl Into<String>,
        rtype: ResourceType,
    ) -> Result<DnsRecord, StoreError> {
        let (send, recv) = oneshot::channel();
        let msg = RecordStoreMessage::Insert {
            name: name.into(),
            rtype,
            respond_to: send,
        };
        self.request(msg, recv).await
    }

    pub async fn find_by_name_and_type(
        &self,
        name: &str,
        rtype: ResourceType,
    ) -> Result<DnsRecord, StoreError> {
        let (send, recv) = oneshot::channel();
        let msg = RecordStoreMessage::FindByNameAndType {
            name: name.to_string(),
            rtype,
            respond_to: send,
        };
        self.request(msg, recv)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
                rtype,
            })
    }

    pub async fn find_all(&self) -> Result<Vec<DnsRecord>, StoreError> {
        let (send, recv) = oneshot::channel();
        self.request(RecordStoreMessage::FindAll { respond_to: send }, recv)
            .await
    }

    async fn request<T>(
        &self,
        msg: RecordStoreMessage,
        recv: oneshot::Receiver<T>,
    ) -> Result<T, StoreError> {
        // A failed send drops the responder, so recv reports it as well.
        let _ = self.sender.send(msg).await;
        recv.await.map_err(|_| StoreError::ActorGone)
    }
}
