use crate::codec::{BincodeCodec, PayloadCodec};
use crate::error::{ErrorBuilder, ExchangeError, ExchangeResult, HeaderValidator};
use crate::protocol::{
    core_messages, message_name, Acknowledge, MessageFlags, MessageHeader, ProtocolException,
    RolePair, NO_CORRELATION,
};
use crate::session::Session;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Builds, encodes and sends every outbound message of one handler.
///
/// Requests go out as single envelopes. Answers to a request go out through
/// `respond`, which splits a result set into one envelope per item.
#[derive(Clone)]
pub struct Responder<C: PayloadCodec = BincodeCodec> {
    session: Arc<dyn Session>,
    codec: C,
    protocol: u16,
    roles: RolePair,
}

impl<C: PayloadCodec> Responder<C> {
    pub fn new(session: Arc<dyn Session>, codec: C, protocol: u16, roles: RolePair) -> Self {
        Self {
            session,
            codec,
            protocol,
            roles,
        }
    }

    pub fn protocol(&self) -> u16 {
        self.protocol
    }

    pub fn roles(&self) -> RolePair {
        self.roles
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    pub fn session(&self) -> &Arc<dyn Session> {
        &self.session
    }

    /// Encode and send one message; returns the id the session assigned
    pub async fn send<T>(
        &self,
        message_type: u16,
        correlation_id: u64,
        flags: MessageFlags,
        body: &T,
    ) -> ExchangeResult<u64>
    where
        T: Serialize + Sync,
    {
        self.send_checked(
            message_type,
            correlation_id,
            flags,
            body,
            HeaderValidator::validate_flags,
        )
        .await
    }

    async fn send_checked<T>(
        &self,
        message_type: u16,
        correlation_id: u64,
        flags: MessageFlags,
        body: &T,
        validate: fn(&MessageHeader) -> ExchangeResult<()>,
    ) -> ExchangeResult<u64>
    where
        T: Serialize + Sync,
    {
        let header = self
            .session
            .create_header(self.protocol, message_type, correlation_id, flags);
        validate(&header)?;

        let bytes = self.codec.encode(body)?;
        let message_id = self.session.send_message(header, bytes).await?;

        trace!(
            session = self.session.session_id(),
            message = message_name(self.protocol, message_type),
            message_id,
            correlation_id,
            flags = flags.bits(),
            "sent"
        );

        Ok(message_id)
    }

    /// Send a message that starts an exchange. `flags` is normally
    /// `FINAL_PART`: the request is complete in itself.
    pub async fn send_request<T>(
        &self,
        message_type: u16,
        body: &T,
        flags: MessageFlags,
    ) -> ExchangeResult<u64>
    where
        T: Serialize + Sync,
    {
        self.send_checked(
            message_type,
            NO_CORRELATION,
            flags,
            body,
            HeaderValidator::validate_request,
        )
        .await
    }

    /// Send one message answering the message `correlation_id`
    pub async fn send_response<T>(
        &self,
        message_type: u16,
        correlation_id: u64,
        flags: MessageFlags,
        body: &T,
    ) -> ExchangeResult<u64>
    where
        T: Serialize + Sync,
    {
        self.send_checked(
            message_type,
            correlation_id,
            flags,
            body,
            HeaderValidator::validate_response,
        )
        .await
    }

    /// Answer `request` with `items`, one envelope per item.
    ///
    /// Every envelope carries `request.message_id` as correlation id. All
    /// but the last are `MULTI_PART`, the last is `FINAL_PART`. An empty
    /// result set is answered by a single `NO_DATA` acknowledge instead.
    /// Returns the id of the last envelope sent.
    ///
    /// A send failure stops the sequence; fragments already sent stay sent
    /// and the receiver never sees a `FINAL_PART` for this request.
    pub async fn respond<I, B, F>(
        &self,
        request: &MessageHeader,
        message_type: u16,
        items: Vec<I>,
        to_body: F,
    ) -> ExchangeResult<u64>
    where
        I: Send,
        B: Serialize + Send + Sync,
        F: Fn(I) -> B + Send + Sync,
    {
        let total = items.len();
        if total == 0 {
            debug!(
                message = message_name(self.protocol, message_type),
                correlation_id = request.message_id,
                "empty result set"
            );
            return self.acknowledge(request.message_id, MessageFlags::NO_DATA).await;
        }

        let mut message_id = 0;

        for (index, item) in items.into_iter().enumerate() {
            let flags = MessageFlags::for_fragment(index, total);
            let body = to_body(item);

            message_id = self
                .send_response(message_type, request.message_id, flags, &body)
                .await
                .map_err(|e| self.fragment_error(e, request, index, total))?;
        }

        debug!(
            message = message_name(self.protocol, message_type),
            correlation_id = request.message_id,
            fragments = total,
            last_message_id = message_id,
            "responded"
        );

        Ok(message_id)
    }

    /// Send an `Acknowledge` in this handler's protocol
    pub async fn acknowledge(&self, correlation_id: u64, flags: MessageFlags) -> ExchangeResult<u64> {
        self.send_response(
            core_messages::ACKNOWLEDGE,
            correlation_id,
            flags,
            &Acknowledge::default(),
        )
        .await
    }

    /// Report `error` to the sender of message `correlation_id`
    pub async fn protocol_exception(
        &self,
        correlation_id: u64,
        error: &ExchangeError,
    ) -> ExchangeResult<u64> {
        let body = ProtocolException {
            error_code: error.code as u32,
            error_message: error.message.clone(),
        };
        self.send_response(
            core_messages::PROTOCOL_EXCEPTION,
            correlation_id,
            MessageFlags::FINAL_PART,
            &body,
        )
        .await
    }

    fn fragment_error(
        &self,
        error: ExchangeError,
        request: &MessageHeader,
        index: usize,
        total: usize,
    ) -> ExchangeError {
        warn!(
            correlation_id = request.message_id,
            fragment = index,
            total,
            roles = %self.roles,
            error = %error,
            "response truncated"
        );
        ErrorBuilder::new(error.code)
            .message(error.message)
            .with_data("correlation_id", request.message_id)
            .with_fragment(index, total)
            .build()
    }
}

impl<C: PayloadCodec> std::fmt::Debug for Responder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("session", &self.session.session_id())
            .field("codec", &self.codec.name())
            .field("protocol", &self.protocol)
            .field("roles", &self.roles)
            .finish()
    }
}
