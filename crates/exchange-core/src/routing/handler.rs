use crate::codec::{BincodeCodec, PayloadCodec};
use crate::error::ExchangeError;
use crate::protocol::MessageHeader;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::marker::PhantomData;

pub type HandlerResult<T> = Result<T, ExchangeError>;

/// Routine run for one registered message type
#[async_trait]
pub trait MessageRoutine: Send + Sync + 'static {
    /// The body this message type carries
    type Body: DeserializeOwned + Send + 'static;

    async fn handle(&self, header: MessageHeader, body: Self::Body) -> HandlerResult<()>;

    /// Message name (for debugging/logging)
    fn message_name(&self) -> &'static str;
}

/// Routine working on the raw body, as stored in a dispatch table
#[async_trait]
pub trait ErasedRoutine: Send + Sync + 'static {
    /// Decode `raw_body` and run the routine
    async fn handle_raw(&self, header: MessageHeader, raw_body: &[u8]) -> HandlerResult<()>;

    fn message_name(&self) -> &'static str;
}

/// Wrapper to make any MessageRoutine into an ErasedRoutine
pub struct RoutineWrapper<R: MessageRoutine, C: PayloadCodec = BincodeCodec> {
    routine: R,
    codec: C,
}

impl<R: MessageRoutine> RoutineWrapper<R> {
    pub fn new(routine: R) -> Self {
        Self {
            routine,
            codec: BincodeCodec::new(),
        }
    }
}

impl<R: MessageRoutine, C: PayloadCodec> RoutineWrapper<R, C> {
    pub fn with_codec(routine: R, codec: C) -> Self {
        Self { routine, codec }
    }
}

#[async_trait]
impl<R: MessageRoutine, C: PayloadCodec> ErasedRoutine for RoutineWrapper<R, C> {
    async fn handle_raw(&self, header: MessageHeader, raw_body: &[u8]) -> HandlerResult<()> {
        let body: R::Body = self.codec.decode(raw_body).map_err(|e| {
            ExchangeError::decode_failure(format!(
                "{} body (message {}): {}",
                self.routine.message_name(),
                header.message_id,
                e.message
            ))
        })?;

        self.routine.handle(header, body).await
    }

    fn message_name(&self) -> &'static str {
        self.routine.message_name()
    }
}

/// Routine backed by an async closure
pub struct FnRoutine<B, F> {
    name: &'static str,
    f: F,
    _body: PhantomData<fn() -> B>,
}

impl<B, F> FnRoutine<B, F> {
    pub fn new(name: &'static str, f: F) -> Self {
        Self {
            name,
            f,
            _body: PhantomData,
        }
    }
}

#[async_trait]
impl<B, F, Fut> MessageRoutine for FnRoutine<B, F>
where
    B: DeserializeOwned + Send + 'static,
    F: Fn(MessageHeader, B) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult<()>> + Send + 'static,
{
    type Body = B;

    async fn handle(&self, header: MessageHeader, body: B) -> HandlerResult<()> {
        (self.f)(header, body).await
    }

    fn message_name(&self) -> &'static str {
        self.name
    }
}
