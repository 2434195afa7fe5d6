use crate::codec::{BincodeCodec, PayloadCodec};
use crate::config::{HandlerConfig, UnrecognizedPolicy};
use crate::error::ExchangeResult;
use crate::protocol::{
    core_messages, Acknowledge, MessageFlags, MessageHeader, ProtocolException, Role, RolePair,
};
use crate::routing::{
    DispatchOutcome, DispatchTableBuilder, Fallback, HandlerResult, MessageDispatcher,
    MessageRoutine, NotificationGate, ReportUnrecognized, Responder, RoutineWrapper,
};
use crate::session::Session;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Shared construction parameters for protocol handlers on one session
#[derive(Clone)]
pub struct HandlerBuilder<C: PayloadCodec = BincodeCodec> {
    session: Arc<dyn Session>,
    codec: C,
    config: HandlerConfig,
}

impl HandlerBuilder<BincodeCodec> {
    pub fn new(session: Arc<dyn Session>) -> Self {
        Self::from_config(session, HandlerConfig::default())
    }

    /// Bincode handlers configured from `config`
    pub fn from_config(session: Arc<dyn Session>, config: HandlerConfig) -> Self {
        Self {
            session,
            codec: BincodeCodec::with_config(config.codec.clone()),
            config,
        }
    }
}

impl<C: PayloadCodec> HandlerBuilder<C> {
    /// Switch body encoding; both peers must agree on it
    pub fn with_codec<D: PayloadCodec>(self, codec: D) -> HandlerBuilder<D> {
        HandlerBuilder {
            session: self.session,
            codec,
            config: self.config,
        }
    }

    pub fn with_unrecognized(mut self, policy: UnrecognizedPolicy) -> Self {
        self.config.unrecognized = policy;
        self
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub(crate) fn core(&self, protocol: u16, role: Role) -> Arc<HandlerCore<C>> {
        let roles = RolePair::playing(role);
        Arc::new(HandlerCore {
            responder: Responder::new(
                Arc::clone(&self.session),
                self.codec.clone(),
                protocol,
                roles,
            ),
            on_acknowledge: NotificationGate::new("acknowledge"),
            on_protocol_exception: NotificationGate::new("protocol_exception"),
            config: self.config.clone(),
        })
    }
}

impl<C: PayloadCodec> std::fmt::Debug for HandlerBuilder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerBuilder")
            .field("session", &self.session.session_id())
            .field("codec", &self.codec.name())
            .field("config", &self.config)
            .finish()
    }
}

/// State every protocol handler has: its responder and the gates of the
/// message types all protocols share.
pub struct HandlerCore<C: PayloadCodec = BincodeCodec> {
    responder: Responder<C>,
    on_acknowledge: NotificationGate<Acknowledge>,
    on_protocol_exception: NotificationGate<ProtocolException>,
    config: HandlerConfig,
}

impl<C: PayloadCodec> HandlerCore<C> {
    pub fn responder(&self) -> &Responder<C> {
        &self.responder
    }

    pub fn roles(&self) -> RolePair {
        self.responder.roles()
    }

    pub fn protocol(&self) -> u16 {
        self.responder.protocol()
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub fn on_acknowledge(&self) -> &NotificationGate<Acknowledge> {
        &self.on_acknowledge
    }

    pub fn on_protocol_exception(&self) -> &NotificationGate<ProtocolException> {
        &self.on_protocol_exception
    }

    /// Wrap a routine with this handler's codec
    pub(crate) fn wrap<R: MessageRoutine>(&self, routine: R) -> RoutineWrapper<R, C> {
        RoutineWrapper::with_codec(routine, self.responder.codec().clone())
    }

    /// Finish a handler's table: append the shared routines after the
    /// protocol-specific ones and install the unrecognized-message policy.
    pub(crate) fn build_dispatcher(
        core: &Arc<Self>,
        table: DispatchTableBuilder,
    ) -> ExchangeResult<MessageDispatcher> {
        let table = table
            .with_routine(
                core_messages::ACKNOWLEDGE,
                core.wrap(AcknowledgeRoutine {
                    core: Arc::clone(core),
                }),
            )
            .with_routine(
                core_messages::PROTOCOL_EXCEPTION,
                core.wrap(ProtocolExceptionRoutine {
                    core: Arc::clone(core),
                }),
            )
            .build()?;

        let dispatcher = MessageDispatcher::new(core.roles(), table);
        Ok(match core.config.unrecognized {
            UnrecognizedPolicy::Report => dispatcher,
            UnrecognizedPolicy::ReportAndRespond => {
                dispatcher.with_fallback(Arc::new(RespondUnrecognized::new(core.responder.clone())))
            }
        })
    }

    /// Send a `FINAL_PART` acknowledge for `request` when it asked for one
    /// and its observers did not cancel
    pub async fn acknowledge_if_requested(
        &self,
        request: &MessageHeader,
        cancelled: bool,
    ) -> ExchangeResult<Option<u64>> {
        if !request.acknowledge_requested() || cancelled {
            return Ok(None);
        }
        let id = self
            .responder
            .acknowledge(request.message_id, MessageFlags::FINAL_PART)
            .await?;
        Ok(Some(id))
    }
}

impl<C: PayloadCodec> std::fmt::Debug for HandlerCore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerCore")
            .field("responder", &self.responder)
            .field("on_acknowledge", &self.on_acknowledge)
            .field("on_protocol_exception", &self.on_protocol_exception)
            .finish()
    }
}

struct AcknowledgeRoutine<C: PayloadCodec> {
    core: Arc<HandlerCore<C>>,
}

#[async_trait]
impl<C: PayloadCodec> MessageRoutine for AcknowledgeRoutine<C> {
    type Body = Acknowledge;

    async fn handle(&self, header: MessageHeader, body: Acknowledge) -> HandlerResult<()> {
        self.core
            .on_acknowledge
            .notify(header, body, (), self.core.roles());
        trace!(
            correlation_id = header.correlation_id,
            no_data = header.is_no_data(),
            "acknowledged"
        );
        Ok(())
    }

    fn message_name(&self) -> &'static str {
        "ACKNOWLEDGE"
    }
}

struct ProtocolExceptionRoutine<C: PayloadCodec> {
    core: Arc<HandlerCore<C>>,
}

#[async_trait]
impl<C: PayloadCodec> MessageRoutine for ProtocolExceptionRoutine<C> {
    type Body = ProtocolException;

    async fn handle(&self, header: MessageHeader, body: ProtocolException) -> HandlerResult<()> {
        warn!(
            correlation_id = header.correlation_id,
            error_code = body.error_code,
            error = %body.error_message,
            roles = %self.core.roles(),
            "peer reported protocol exception"
        );
        self.core
            .on_protocol_exception
            .notify(header, body, (), self.core.roles());
        Ok(())
    }

    fn message_name(&self) -> &'static str {
        "PROTOCOL_EXCEPTION"
    }
}

/// Fallback that tells the sender its message was not understood
pub struct RespondUnrecognized<C: PayloadCodec = BincodeCodec> {
    responder: Responder<C>,
}

impl<C: PayloadCodec> RespondUnrecognized<C> {
    pub fn new(responder: Responder<C>) -> Self {
        Self { responder }
    }
}

#[async_trait]
impl<C: PayloadCodec> Fallback for RespondUnrecognized<C> {
    async fn on_unrecognized(
        &self,
        header: &MessageHeader,
        raw_body: &[u8],
        roles: RolePair,
    ) -> ExchangeResult<DispatchOutcome> {
        let outcome = ReportUnrecognized
            .on_unrecognized(header, raw_body, roles)
            .await?;

        if let DispatchOutcome::Unrecognized(error) = &outcome {
            let id = self
                .responder
                .protocol_exception(header.message_id, error)
                .await?;
            debug!(
                correlation_id = header.message_id,
                message_id = id,
                "answered unrecognized message"
            );
        }

        Ok(outcome)
    }
}

impl<C: PayloadCodec> std::fmt::Debug for RespondUnrecognized<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RespondUnrecognized")
            .field("responder", &self.responder)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::protocol::protocols;
    use crate::session::MemorySession;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request(message_type: u16, message_id: u64, flags: MessageFlags) -> MessageHeader {
        let mut header = MessageHeader::new_request(protocols::STORE, message_type, flags);
        header.message_id = message_id;
        header
    }

    #[tokio::test]
    async fn shared_routines_are_registered_last_and_notify() {
        let session = Arc::new(MemorySession::new());
        let core = HandlerBuilder::new(session.clone()).core(protocols::STORE, Role::Customer);
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        core.on_acknowledge().subscribe(move |ctx| {
            assert!(ctx.header.is_no_data());
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let dispatcher =
            HandlerCore::build_dispatcher(&core, DispatchTableBuilder::new(protocols::STORE))
                .unwrap();
        assert_eq!(
            dispatcher.table().registered_types(),
            vec![core_messages::PROTOCOL_EXCEPTION, core_messages::ACKNOWLEDGE]
        );

        let mut ack = MessageHeader::new(
            protocols::STORE,
            core_messages::ACKNOWLEDGE,
            9,
            MessageFlags::NO_DATA,
        );
        ack.message_id = 10;
        let body = BincodeCodec::new().encode(&Acknowledge::default()).unwrap();

        let outcome = dispatcher.dispatch(&ack, &body).await.unwrap();

        assert!(outcome.is_handled());
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(session.sent_count(), 0);
    }

    #[tokio::test]
    async fn report_policy_sends_nothing() {
        let session = Arc::new(MemorySession::new());
        let core = HandlerBuilder::new(session.clone()).core(protocols::STORE, Role::Store);
        let dispatcher =
            HandlerCore::build_dispatcher(&core, DispatchTableBuilder::new(protocols::STORE))
                .unwrap();

        let outcome = dispatcher
            .dispatch(&request(999, 3, MessageFlags::FINAL_PART), &[])
            .await
            .unwrap();

        assert_eq!(
            outcome.unrecognized().unwrap().code,
            ErrorCode::UnrecognizedMessageType
        );
        assert_eq!(session.sent_count(), 0);
    }

    #[tokio::test]
    async fn respond_policy_sends_protocol_exception() {
        let session = Arc::new(MemorySession::new());
        let core = HandlerBuilder::new(session.clone())
            .with_unrecognized(UnrecognizedPolicy::ReportAndRespond)
            .core(protocols::STORE, Role::Store);
        let dispatcher =
            HandlerCore::build_dispatcher(&core, DispatchTableBuilder::new(protocols::STORE))
                .unwrap();

        let outcome = dispatcher
            .dispatch(&request(999, 3, MessageFlags::FINAL_PART), &[])
            .await
            .unwrap();
        assert!(!outcome.is_handled());

        let sent = session.sent();
        assert_eq!(sent.len(), 1);
        let envelope = sent[0]
            .decode::<ProtocolException, _>(&BincodeCodec::new())
            .unwrap();
        assert_eq!(envelope.header.message_type, core_messages::PROTOCOL_EXCEPTION);
        assert_eq!(envelope.header.correlation_id, 3);
        assert_eq!(
            envelope.body.error_code,
            ErrorCode::UnrecognizedMessageType as u32
        );
    }

    #[tokio::test]
    async fn acknowledge_only_when_requested_and_not_cancelled() {
        let session = Arc::new(MemorySession::new());
        let core = HandlerBuilder::new(session.clone()).core(protocols::STORE, Role::Store);

        let plain = request(2, 4, MessageFlags::FINAL_PART);
        let asking = request(2, 5, MessageFlags::FINAL_PART | MessageFlags::ACKNOWLEDGE);

        assert_eq!(core.acknowledge_if_requested(&plain, false).await.unwrap(), None);
        assert_eq!(core.acknowledge_if_requested(&asking, true).await.unwrap(), None);
        let id = core.acknowledge_if_requested(&asking, false).await.unwrap();

        let sent = session.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(Some(sent[0].header.message_id), id);
        assert_eq!(sent[0].header.correlation_id, 5);
        assert_eq!(sent[0].header.flags, MessageFlags::FINAL_PART);
    }
}
