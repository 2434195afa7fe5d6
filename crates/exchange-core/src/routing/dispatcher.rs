use crate::error::{ExchangeError, ExchangeResult};
use crate::protocol::{message_name, MessageHeader, RolePair};
use crate::routing::registry::DispatchTable;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to an inbound message that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A registered routine ran to completion
    Handled { message_type: u16, routine: &'static str },
    /// No routine knows the message type; carries an
    /// `UnrecognizedMessageType` error describing it
    Unrecognized(ExchangeError),
}

impl DispatchOutcome {
    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled { .. })
    }

    pub fn unrecognized(&self) -> Option<&ExchangeError> {
        match self {
            DispatchOutcome::Unrecognized(error) => Some(error),
            DispatchOutcome::Handled { .. } => None,
        }
    }
}

/// Last stop for messages nothing in the table recognizes
#[async_trait]
pub trait Fallback: Send + Sync {
    async fn on_unrecognized(
        &self,
        header: &MessageHeader,
        raw_body: &[u8],
        roles: RolePair,
    ) -> ExchangeResult<DispatchOutcome>;
}

/// Default fallback: log and report, send nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportUnrecognized;

#[async_trait]
impl Fallback for ReportUnrecognized {
    async fn on_unrecognized(
        &self,
        header: &MessageHeader,
        _raw_body: &[u8],
        roles: RolePair,
    ) -> ExchangeResult<DispatchOutcome> {
        warn!(
            protocol = header.protocol,
            message_type = header.message_type,
            message_id = header.message_id,
            roles = %roles,
            "message type not recognized"
        );
        Ok(DispatchOutcome::Unrecognized(
            ExchangeError::unrecognized_message_type(header.protocol, header.message_type),
        ))
    }
}

/// Routes inbound messages of one protocol to their routines
pub struct MessageDispatcher {
    roles: RolePair,
    table: DispatchTable,
    fallback: Arc<dyn Fallback>,
}

impl MessageDispatcher {
    pub fn new(roles: RolePair, table: DispatchTable) -> Self {
        Self {
            roles,
            table,
            fallback: Arc::new(ReportUnrecognized),
        }
    }

    pub fn with_fallback(mut self, fallback: Arc<dyn Fallback>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn protocol(&self) -> u16 {
        self.table.protocol()
    }

    pub fn roles(&self) -> RolePair {
        self.roles
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// Run the routine registered for `header.message_type`.
    ///
    /// Unknown message types (or messages of another protocol) go to the
    /// fallback and come back as `DispatchOutcome::Unrecognized`. Decode
    /// failures and reply failures are returned as errors.
    pub async fn dispatch(
        &self,
        header: &MessageHeader,
        raw_body: &[u8],
    ) -> ExchangeResult<DispatchOutcome> {
        let routine = if header.protocol == self.table.protocol() {
            self.table.get(header.message_type)
        } else {
            None
        };

        let Some(routine) = routine else {
            return self
                .fallback
                .on_unrecognized(header, raw_body, self.roles)
                .await;
        };

        debug!(
            protocol = header.protocol,
            message = message_name(header.protocol, header.message_type),
            message_id = header.message_id,
            correlation_id = header.correlation_id,
            roles = %self.roles,
            "dispatching"
        );

        routine.handle_raw(*header, raw_body).await?;

        Ok(DispatchOutcome::Handled {
            message_type: header.message_type,
            routine: routine.message_name(),
        })
    }
}

impl std::fmt::Debug for MessageDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageDispatcher")
            .field("roles", &self.roles)
            .field("table", &self.table)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{BincodeCodec, PayloadCodec};
    use crate::error::ErrorCode;
    use crate::protocol::{MessageFlags, Role};
    use crate::routing::{DispatchTableBuilder, FnRoutine, HandlerResult, RoutineWrapper};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Calls {
        one: AtomicUsize,
        two: AtomicUsize,
    }

    struct RecordingFallback {
        seen: Mutex<Vec<u16>>,
    }

    #[async_trait]
    impl Fallback for RecordingFallback {
        async fn on_unrecognized(
            &self,
            header: &MessageHeader,
            raw_body: &[u8],
            roles: RolePair,
        ) -> ExchangeResult<DispatchOutcome> {
            self.seen.lock().unwrap().push(header.message_type);
            ReportUnrecognized
                .on_unrecognized(header, raw_body, roles)
                .await
        }
    }

    fn dispatcher(calls: Arc<Calls>) -> MessageDispatcher {
        let first = Arc::clone(&calls);
        let second = Arc::clone(&calls);
        let table = DispatchTableBuilder::new(7)
            .with_routine(
                1,
                RoutineWrapper::new(FnRoutine::new("one", move |_h: MessageHeader, _b: u32| {
                    first.one.fetch_add(1, Ordering::SeqCst);
                    async { HandlerResult::<()>::Ok(()) }
                })),
            )
            .with_routine(
                2,
                RoutineWrapper::new(FnRoutine::new("two", move |_h: MessageHeader, _b: String| {
                    second.two.fetch_add(1, Ordering::SeqCst);
                    async { HandlerResult::<()>::Ok(()) }
                })),
            )
            .build()
            .unwrap();

        MessageDispatcher::new(RolePair::playing(Role::Store), table)
    }

    fn header(message_type: u16) -> MessageHeader {
        let mut header = MessageHeader::new(7, message_type, 0, MessageFlags::FINAL_PART);
        header.message_id = 5;
        header
    }

    #[tokio::test]
    async fn registered_type_runs_only_its_routine() {
        let calls = Arc::new(Calls::default());
        let dispatcher = dispatcher(Arc::clone(&calls));
        let body = BincodeCodec::new().encode(&17u32).unwrap();

        let outcome = dispatcher.dispatch(&header(1), &body).await.unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Handled {
                message_type: 1,
                routine: "one"
            }
        );
        assert_eq!(calls.one.load(Ordering::SeqCst), 1);
        assert_eq!(calls.two.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unregistered_type_reaches_fallback_once() {
        let calls = Arc::new(Calls::default());
        let fallback = Arc::new(RecordingFallback {
            seen: Mutex::new(Vec::new()),
        });
        let dispatcher = dispatcher(Arc::clone(&calls)).with_fallback(fallback.clone());

        let outcome = dispatcher.dispatch(&header(999), &[]).await.unwrap();

        let error = outcome.unrecognized().expect("unrecognized outcome");
        assert_eq!(error.code, ErrorCode::UnrecognizedMessageType);
        assert_eq!(*fallback.seen.lock().unwrap(), vec![999]);
        assert_eq!(calls.one.load(Ordering::SeqCst), 0);
        assert_eq!(calls.two.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn other_protocol_is_unrecognized() {
        let dispatcher = dispatcher(Arc::new(Calls::default()));
        let mut foreign = header(1);
        foreign.protocol = 8;

        let outcome = dispatcher.dispatch(&foreign, &[]).await.unwrap();
        assert!(!outcome.is_handled());
    }

    #[tokio::test]
    async fn undecodable_body_is_an_error_not_a_fallback() {
        let calls = Arc::new(Calls::default());
        let dispatcher = dispatcher(Arc::clone(&calls));

        let err = dispatcher.dispatch(&header(1), &[0xff]).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::DecodeFailure);
        assert_eq!(calls.one.load(Ordering::SeqCst), 0);
    }
}
