use crate::codec::{BincodeCodec, PayloadCodec};
use crate::error::ExchangeResult;
use crate::handlers::base::{HandlerBuilder, HandlerCore};
use crate::handlers::ProtocolHandler;
use crate::protocol::{
    protocols, store_messages, DataObject, DeleteObject, GetObject, MessageFlags, MessageHeader,
    Object, PutObject, Role, RolePair, Uri,
};
use crate::routing::{
    ContextHook, DispatchOutcome, DispatchTableBuilder, HandlerResult, MessageDispatcher,
    MessageRoutine, NotificationGate, ProcessingContext,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, trace};

struct StoreCustomerState<C: PayloadCodec> {
    core: Arc<HandlerCore<C>>,
    on_object: NotificationGate<Object>,
}

/// Customer side of the store protocol: reads, writes and deletes objects
pub struct StoreCustomer<C: PayloadCodec = BincodeCodec> {
    state: Arc<StoreCustomerState<C>>,
    dispatcher: MessageDispatcher,
}

impl<C: PayloadCodec> StoreCustomer<C> {
    pub fn new(builder: &HandlerBuilder<C>) -> ExchangeResult<Self> {
        let core = builder.core(protocols::STORE, Role::Customer);
        let state = Arc::new(StoreCustomerState {
            core: Arc::clone(&core),
            on_object: NotificationGate::new("object"),
        });

        let table = DispatchTableBuilder::new(protocols::STORE).with_routine(
            store_messages::OBJECT,
            core.wrap(ObjectRoutine {
                state: Arc::clone(&state),
            }),
        );
        let dispatcher = HandlerCore::build_dispatcher(&core, table)?;

        Ok(Self { state, dispatcher })
    }

    pub fn core(&self) -> &HandlerCore<C> {
        &self.state.core
    }

    /// Observers see one notification per received object
    pub fn on_object(&self) -> &NotificationGate<Object> {
        &self.state.on_object
    }

    pub async fn get_object(&self, uri: impl Into<Uri>) -> ExchangeResult<u64> {
        self.get_object_with_flags(uri, MessageFlags::FINAL_PART)
            .await
    }

    pub async fn get_object_with_flags(
        &self,
        uri: impl Into<Uri>,
        flags: MessageFlags,
    ) -> ExchangeResult<u64> {
        let request = GetObject { uri: uri.into() };
        self.send(store_messages::GET_OBJECT, &request, flags).await
    }

    pub async fn put_object(&self, data_object: DataObject) -> ExchangeResult<u64> {
        self.put_object_with_flags(data_object, MessageFlags::FINAL_PART)
            .await
    }

    /// Add `MessageFlags::ACKNOWLEDGE` to have the store confirm the write
    pub async fn put_object_with_flags(
        &self,
        data_object: DataObject,
        flags: MessageFlags,
    ) -> ExchangeResult<u64> {
        let request = PutObject { data_object };
        self.send(store_messages::PUT_OBJECT, &request, flags).await
    }

    pub async fn delete_object(&self, uri: impl Into<Uri>) -> ExchangeResult<u64> {
        self.delete_object_with_flags(uri, MessageFlags::FINAL_PART)
            .await
    }

    pub async fn delete_object_with_flags(
        &self,
        uri: impl Into<Uri>,
        flags: MessageFlags,
    ) -> ExchangeResult<u64> {
        let request = DeleteObject { uri: uri.into() };
        self.send(store_messages::DELETE_OBJECT, &request, flags)
            .await
    }

    async fn send<T>(&self, message_type: u16, body: &T, flags: MessageFlags) -> ExchangeResult<u64>
    where
        T: serde::Serialize + Sync,
    {
        self.state
            .core
            .responder()
            .send_request(message_type, body, flags)
            .await
    }
}

struct ObjectRoutine<C: PayloadCodec> {
    state: Arc<StoreCustomerState<C>>,
}

#[async_trait]
impl<C: PayloadCodec> MessageRoutine for ObjectRoutine<C> {
    type Body = Object;

    async fn handle(&self, header: MessageHeader, body: Object) -> HandlerResult<()> {
        trace!(
            uri = %body.data_object.uri().as_str(),
            correlation_id = header.correlation_id,
            last = header.is_final(),
            "object received"
        );
        let state = &self.state;
        state.on_object.notify(header, body, (), state.core.roles());
        Ok(())
    }

    fn message_name(&self) -> &'static str {
        "OBJECT"
    }
}

#[async_trait]
impl<C: PayloadCodec> ProtocolHandler for StoreCustomer<C> {
    fn protocol(&self) -> u16 {
        protocols::STORE
    }

    fn roles(&self) -> RolePair {
        self.state.core.roles()
    }

    async fn dispatch(
        &self,
        header: &MessageHeader,
        raw_body: &[u8],
    ) -> ExchangeResult<DispatchOutcome> {
        self.dispatcher.dispatch(header, raw_body).await
    }
}

/// Context observers of `GetObject` fill with the objects to return
pub type GetObjectContext = ProcessingContext<GetObject, Vec<DataObject>>;

struct StoreStoreState<C: PayloadCodec> {
    core: Arc<HandlerCore<C>>,
    on_get_object: NotificationGate<GetObject, Vec<DataObject>>,
    post_process: Option<ContextHook<GetObject, Vec<DataObject>>>,
    on_put_object: NotificationGate<PutObject>,
    on_delete_object: NotificationGate<DeleteObject>,
}

/// Store side of the store protocol.
///
/// Objects are held by the application: observers of `on_get_object` supply
/// them, observers of `on_put_object` and `on_delete_object` apply changes.
pub struct StoreStore<C: PayloadCodec = BincodeCodec> {
    state: Arc<StoreStoreState<C>>,
    dispatcher: MessageDispatcher,
}

impl<C: PayloadCodec> StoreStore<C> {
    pub fn new(builder: &HandlerBuilder<C>) -> ExchangeResult<Self> {
        Self::build(builder, None)
    }

    /// Store whose own `hook` runs after the observers of every `GetObject`,
    /// before the reply is decided
    pub fn with_post_process<F>(builder: &HandlerBuilder<C>, hook: F) -> ExchangeResult<Self>
    where
        F: Fn(&mut GetObjectContext) + Send + Sync + 'static,
    {
        Self::build(builder, Some(Box::new(hook)))
    }

    fn build(
        builder: &HandlerBuilder<C>,
        post_process: Option<ContextHook<GetObject, Vec<DataObject>>>,
    ) -> ExchangeResult<Self> {
        let core = builder.core(protocols::STORE, Role::Store);
        let state = Arc::new(StoreStoreState {
            core: Arc::clone(&core),
            on_get_object: NotificationGate::new("get_object"),
            post_process,
            on_put_object: NotificationGate::new("put_object"),
            on_delete_object: NotificationGate::new("delete_object"),
        });

        let table = DispatchTableBuilder::new(protocols::STORE)
            .with_routine(
                store_messages::GET_OBJECT,
                core.wrap(GetObjectRoutine {
                    state: Arc::clone(&state),
                }),
            )
            .with_routine(
                store_messages::PUT_OBJECT,
                core.wrap(PutObjectRoutine {
                    state: Arc::clone(&state),
                }),
            )
            .with_routine(
                store_messages::DELETE_OBJECT,
                core.wrap(DeleteObjectRoutine {
                    state: Arc::clone(&state),
                }),
            );
        let dispatcher = HandlerCore::build_dispatcher(&core, table)?;

        Ok(Self { state, dispatcher })
    }

    pub fn core(&self) -> &HandlerCore<C> {
        &self.state.core
    }

    pub fn on_get_object(&self) -> &NotificationGate<GetObject, Vec<DataObject>> {
        &self.state.on_get_object
    }

    pub fn on_put_object(&self) -> &NotificationGate<PutObject> {
        &self.state.on_put_object
    }

    pub fn on_delete_object(&self) -> &NotificationGate<DeleteObject> {
        &self.state.on_delete_object
    }

    /// Send `objects` as the answer to `request`; returns the id of the last
    /// message sent
    pub async fn object(
        &self,
        request: &MessageHeader,
        objects: Vec<DataObject>,
    ) -> ExchangeResult<u64> {
        self.state.object(request, objects).await
    }
}

impl<C: PayloadCodec> StoreStoreState<C> {
    async fn object(&self, request: &MessageHeader, objects: Vec<DataObject>) -> ExchangeResult<u64> {
        self.core
            .responder()
            .respond(request, store_messages::OBJECT, objects, |data_object| {
                Object { data_object }
            })
            .await
    }
}

struct GetObjectRoutine<C: PayloadCodec> {
    state: Arc<StoreStoreState<C>>,
}

#[async_trait]
impl<C: PayloadCodec> MessageRoutine for GetObjectRoutine<C> {
    type Body = GetObject;

    async fn handle(&self, header: MessageHeader, body: GetObject) -> HandlerResult<()> {
        let state = &self.state;
        let context = state.on_get_object.notify_with(
            header,
            body,
            Vec::new(),
            state.core.roles(),
            state.post_process.as_ref(),
        );

        if context.is_cancelled() {
            debug!(
                uri = %context.body.uri.as_str(),
                message_id = header.message_id,
                "get_object cancelled, no reply"
            );
            return Ok(());
        }

        state.object(&header, context.accumulator).await?;
        Ok(())
    }

    fn message_name(&self) -> &'static str {
        "GET_OBJECT"
    }
}

struct PutObjectRoutine<C: PayloadCodec> {
    state: Arc<StoreStoreState<C>>,
}

#[async_trait]
impl<C: PayloadCodec> MessageRoutine for PutObjectRoutine<C> {
    type Body = PutObject;

    async fn handle(&self, header: MessageHeader, body: PutObject) -> HandlerResult<()> {
        let state = &self.state;
        let context = state
            .on_put_object
            .notify(header, body, (), state.core.roles());
        debug!(
            uri = %context.body.data_object.uri().as_str(),
            cancelled = context.is_cancelled(),
            "put_object"
        );
        state
            .core
            .acknowledge_if_requested(&header, context.is_cancelled())
            .await?;
        Ok(())
    }

    fn message_name(&self) -> &'static str {
        "PUT_OBJECT"
    }
}

struct DeleteObjectRoutine<C: PayloadCodec> {
    state: Arc<StoreStoreState<C>>,
}

#[async_trait]
impl<C: PayloadCodec> MessageRoutine for DeleteObjectRoutine<C> {
    type Body = DeleteObject;

    async fn handle(&self, header: MessageHeader, body: DeleteObject) -> HandlerResult<()> {
        let state = &self.state;
        let context = state
            .on_delete_object
            .notify(header, body, (), state.core.roles());
        debug!(
            uri = %context.body.uri.as_str(),
            cancelled = context.is_cancelled(),
            "delete_object"
        );
        state
            .core
            .acknowledge_if_requested(&header, context.is_cancelled())
            .await?;
        Ok(())
    }

    fn message_name(&self) -> &'static str {
        "DELETE_OBJECT"
    }
}

#[async_trait]
impl<C: PayloadCodec> ProtocolHandler for StoreStore<C> {
    fn protocol(&self) -> u16 {
        protocols::STORE
    }

    fn roles(&self) -> RolePair {
        self.state.core.roles()
    }

    async fn dispatch(
        &self,
        header: &MessageHeader,
        raw_body: &[u8],
    ) -> ExchangeResult<DispatchOutcome> {
        self.dispatcher.dispatch(header, raw_body).await
    }
}
