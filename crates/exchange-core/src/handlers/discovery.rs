use crate::codec::{BincodeCodec, PayloadCodec};
use crate::error::ExchangeResult;
use crate::handlers::base::{HandlerBuilder, HandlerCore};
use crate::handlers::ProtocolHandler;
use crate::protocol::{
    discovery_messages, protocols, GetResources, GetResourcesResponse, MessageFlags,
    MessageHeader, Resource, Role, RolePair, Uri,
};
use crate::routing::{
    ContextHook, DispatchOutcome, DispatchTableBuilder, HandlerResult, MessageDispatcher,
    MessageRoutine, NotificationGate, ProcessingContext,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, trace};

/// Context observers of `GetResources` fill with the resources to return
pub type GetResourcesContext = ProcessingContext<GetResources, Vec<Resource>>;

struct DiscoveryStoreState<C: PayloadCodec> {
    core: Arc<HandlerCore<C>>,
    on_get_resources: NotificationGate<GetResources, Vec<Resource>>,
    post_process: Option<ContextHook<GetResources, Vec<Resource>>>,
}

/// Store side of the discovery protocol.
///
/// Answers every `GetResources` with the resources its observers collected,
/// one `GetResourcesResponse` per resource, unless an observer cancelled.
pub struct DiscoveryStore<C: PayloadCodec = BincodeCodec> {
    state: Arc<DiscoveryStoreState<C>>,
    dispatcher: MessageDispatcher,
}

impl<C: PayloadCodec> DiscoveryStore<C> {
    pub fn new(builder: &HandlerBuilder<C>) -> ExchangeResult<Self> {
        Self::build(builder, None)
    }

    /// Store whose own `hook` runs after the observers of every
    /// `GetResources`, before the reply is decided
    pub fn with_post_process<F>(builder: &HandlerBuilder<C>, hook: F) -> ExchangeResult<Self>
    where
        F: Fn(&mut GetResourcesContext) + Send + Sync + 'static,
    {
        Self::build(builder, Some(Box::new(hook)))
    }

    fn build(
        builder: &HandlerBuilder<C>,
        post_process: Option<ContextHook<GetResources, Vec<Resource>>>,
    ) -> ExchangeResult<Self> {
        let core = builder.core(protocols::DISCOVERY, Role::Store);
        let state = Arc::new(DiscoveryStoreState {
            core: Arc::clone(&core),
            on_get_resources: NotificationGate::new("get_resources"),
            post_process,
        });

        let table = DispatchTableBuilder::new(protocols::DISCOVERY).with_routine(
            discovery_messages::GET_RESOURCES,
            core.wrap(GetResourcesRoutine {
                state: Arc::clone(&state),
            }),
        );
        let dispatcher = HandlerCore::build_dispatcher(&core, table)?;

        Ok(Self { state, dispatcher })
    }

    pub fn core(&self) -> &HandlerCore<C> {
        &self.state.core
    }

    pub fn on_get_resources(&self) -> &NotificationGate<GetResources, Vec<Resource>> {
        &self.state.on_get_resources
    }

    /// Send `resources` as the answer to `request`; returns the id of the
    /// last message sent
    pub async fn get_resources_response(
        &self,
        request: &MessageHeader,
        resources: Vec<Resource>,
    ) -> ExchangeResult<u64> {
        self.state.get_resources_response(request, resources).await
    }
}

impl<C: PayloadCodec> DiscoveryStoreState<C> {
    async fn get_resources_response(
        &self,
        request: &MessageHeader,
        resources: Vec<Resource>,
    ) -> ExchangeResult<u64> {
        self.core
            .responder()
            .respond(
                request,
                discovery_messages::GET_RESOURCES_RESPONSE,
                resources,
                |resource| GetResourcesResponse { resource },
            )
            .await
    }
}

struct GetResourcesRoutine<C: PayloadCodec> {
    state: Arc<DiscoveryStoreState<C>>,
}

#[async_trait]
impl<C: PayloadCodec> MessageRoutine for GetResourcesRoutine<C> {
    type Body = GetResources;

    async fn handle(&self, header: MessageHeader, body: GetResources) -> HandlerResult<()> {
        let state = &self.state;
        let context = state.on_get_resources.notify_with(
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
                "get_resources cancelled, no reply"
            );
            return Ok(());
        }

        state
            .get_resources_response(&header, context.accumulator)
            .await?;
        Ok(())
    }

    fn message_name(&self) -> &'static str {
        "GET_RESOURCES"
    }
}

#[async_trait]
impl<C: PayloadCodec> ProtocolHandler for DiscoveryStore<C> {
    fn protocol(&self) -> u16 {
        protocols::DISCOVERY
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

struct DiscoveryCustomerState<C: PayloadCodec> {
    core: Arc<HandlerCore<C>>,
    on_get_resources_response: NotificationGate<GetResourcesResponse>,
}

/// Customer side of the discovery protocol
pub struct DiscoveryCustomer<C: PayloadCodec = BincodeCodec> {
    state: Arc<DiscoveryCustomerState<C>>,
    dispatcher: MessageDispatcher,
}

impl<C: PayloadCodec> DiscoveryCustomer<C> {
    pub fn new(builder: &HandlerBuilder<C>) -> ExchangeResult<Self> {
        let core = builder.core(protocols::DISCOVERY, Role::Customer);
        let state = Arc::new(DiscoveryCustomerState {
            core: Arc::clone(&core),
            on_get_resources_response: NotificationGate::new("get_resources_response"),
        });

        let table = DispatchTableBuilder::new(protocols::DISCOVERY).with_routine(
            discovery_messages::GET_RESOURCES_RESPONSE,
            core.wrap(GetResourcesResponseRoutine {
                state: Arc::clone(&state),
            }),
        );
        let dispatcher = HandlerCore::build_dispatcher(&core, table)?;

        Ok(Self { state, dispatcher })
    }

    pub fn core(&self) -> &HandlerCore<C> {
        &self.state.core
    }

    /// Observers see one notification per received resource
    pub fn on_get_resources_response(&self) -> &NotificationGate<GetResourcesResponse> {
        &self.state.on_get_resources_response
    }

    /// Ask the store for the resources under `uri`
    pub async fn get_resources(&self, uri: impl Into<Uri>) -> ExchangeResult<u64> {
        self.get_resources_with_flags(uri, MessageFlags::FINAL_PART)
            .await
    }

    pub async fn get_resources_with_flags(
        &self,
        uri: impl Into<Uri>,
        flags: MessageFlags,
    ) -> ExchangeResult<u64> {
        let request = GetResources { uri: uri.into() };
        self.state
            .core
            .responder()
            .send_request(discovery_messages::GET_RESOURCES, &request, flags)
            .await
    }
}

struct GetResourcesResponseRoutine<C: PayloadCodec> {
    state: Arc<DiscoveryCustomerState<C>>,
}

#[async_trait]
impl<C: PayloadCodec> MessageRoutine for GetResourcesResponseRoutine<C> {
    type Body = GetResourcesResponse;

    async fn handle(&self, header: MessageHeader, body: GetResourcesResponse) -> HandlerResult<()> {
        let state = &self.state;
        state
            .on_get_resources_response
            .notify(header, body, (), state.core.roles());
        trace!(
            correlation_id = header.correlation_id,
            last = header.is_final(),
            "resource received"
        );
        Ok(())
    }

    fn message_name(&self) -> &'static str {
        "GET_RESOURCES_RESPONSE"
    }
}

#[async_trait]
impl<C: PayloadCodec> ProtocolHandler for DiscoveryCustomer<C> {
    fn protocol(&self) -> u16 {
        protocols::DISCOVERY
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
