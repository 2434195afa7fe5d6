//! Role-specific protocol handlers built on the routing layer

pub mod base;
pub mod discovery;
pub mod store;

pub use base::*;
pub use discovery::*;
pub use store::*;

use crate::error::{ErrorCode, ExchangeError, ExchangeResult};
use crate::protocol::{protocols, MessageHeader, RolePair};
use crate::routing::DispatchOutcome;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// One protocol as played by one role on a session
#[async_trait]
pub trait ProtocolHandler: Send + Sync {
    fn protocol(&self) -> u16;

    fn roles(&self) -> RolePair;

    /// Route one inbound message of this protocol
    async fn dispatch(
        &self,
        header: &MessageHeader,
        raw_body: &[u8],
    ) -> ExchangeResult<DispatchOutcome>;
}

/// The handlers of one session, at most one per protocol
#[derive(Default, Clone)]
pub struct HandlerSet {
    handlers: HashMap<u16, Arc<dyn ProtocolHandler>>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H: ProtocolHandler + 'static>(&mut self, handler: Arc<H>) -> ExchangeResult<()> {
        let protocol = handler.protocol();
        if self.handlers.contains_key(&protocol) {
            return Err(ExchangeError::new(
                ErrorCode::DuplicateRegistration,
                format!(
                    "a handler for protocol {} is already registered",
                    protocols::name(protocol)
                ),
            ));
        }
        self.handlers.insert(protocol, handler);
        Ok(())
    }

    pub fn get(&self, protocol: u16) -> Option<&Arc<dyn ProtocolHandler>> {
        self.handlers.get(&protocol)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Hand a message to the handler of its protocol
    pub async fn dispatch(
        &self,
        header: &MessageHeader,
        raw_body: &[u8],
    ) -> ExchangeResult<DispatchOutcome> {
        match self.handlers.get(&header.protocol) {
            Some(handler) => handler.dispatch(header, raw_body).await,
            None => {
                warn!(
                    protocol = header.protocol,
                    message_type = header.message_type,
                    message_id = header.message_id,
                    "no handler for protocol"
                );
                Ok(DispatchOutcome::Unrecognized(
                    ExchangeError::unrecognized_message_type(header.protocol, header.message_type),
                ))
            }
        }
    }
}

impl std::fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut protocols: Vec<u16> = self.handlers.keys().copied().collect();
        protocols.sort_unstable();
        f.debug_struct("HandlerSet")
            .field("protocols", &protocols)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{discovery_messages, store_messages, GetObject, MessageFlags};
    use crate::codec::{BincodeCodec, PayloadCodec};
    use crate::session::MemorySession;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn messages_reach_the_handler_of_their_protocol() {
        let session = Arc::new(MemorySession::new());
        let builder = HandlerBuilder::new(session.clone());
        let discovery = Arc::new(DiscoveryStore::new(&builder).unwrap());
        let store = Arc::new(StoreStore::new(&builder).unwrap());
        let gets = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&gets);
        store.on_get_object().subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        discovery
            .on_get_resources()
            .subscribe(|_| panic!("discovery must not see store traffic"));

        let mut set = HandlerSet::new();
        set.register(discovery).unwrap();
        set.register(store).unwrap();

        let mut header = MessageHeader::new_request(
            protocols::STORE,
            store_messages::GET_OBJECT,
            MessageFlags::FINAL_PART,
        );
        header.message_id = 2;
        let body = BincodeCodec::new()
            .encode(&GetObject {
                uri: "eml:///".into(),
            })
            .unwrap();

        let outcome = set.dispatch(&header, &body).await.unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Handled {
                message_type: store_messages::GET_OBJECT,
                routine: "GET_OBJECT"
            }
        );
        assert_eq!(gets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_protocol_is_unrecognized() {
        let set = HandlerSet::new();
        let header = MessageHeader::new_request(
            42,
            discovery_messages::GET_RESOURCES,
            MessageFlags::FINAL_PART,
        );

        let outcome = set.dispatch(&header, &[]).await.unwrap();
        assert!(!outcome.is_handled());
    }

    #[test]
    fn one_handler_per_protocol() {
        let builder = HandlerBuilder::new(Arc::new(MemorySession::new()));
        let mut set = HandlerSet::new();
        set.register(Arc::new(StoreStore::new(&builder).unwrap()))
            .unwrap();

        let err = set
            .register(Arc::new(StoreCustomer::new(&builder).unwrap()))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateRegistration);
        assert_eq!(set.len(), 1);
    }
}
