use crate::protocol::{MessageHeader, RolePair};
use crate::routing::context::ProcessingContext;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::trace;

/// Callback run against the processing context of one inbound message
pub type Observer<B, A> = Arc<dyn Fn(&mut ProcessingContext<B, A>) + Send + Sync>;

/// Handler-internal step run after every observer, whether or not the
/// context was cancelled
pub type ContextHook<B, A> = Box<dyn Fn(&mut ProcessingContext<B, A>) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Subscribable notification point for one inbound message type.
///
/// Every observer runs, in subscription order, on every notification.
/// Cancelling the context does not stop the remaining observers; it only
/// tells the handler to skip its reply.
pub struct NotificationGate<B, A = ()> {
    name: &'static str,
    observers: RwLock<Vec<(SubscriptionId, Observer<B, A>)>>,
    next_id: AtomicU64,
}

impl<B, A> NotificationGate<B, A> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            observers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&mut ProcessingContext<B, A>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push((id, Arc::new(observer)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self
            .observers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Build a fresh context and run every observer against it
    pub fn notify(
        &self,
        header: MessageHeader,
        body: B,
        accumulator: A,
        roles: RolePair,
    ) -> ProcessingContext<B, A> {
        let mut context = ProcessingContext::new(header, body, accumulator, roles);

        // Snapshot so observers may subscribe or unsubscribe while running
        let observers: Vec<Observer<B, A>> = self
            .observers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in &observers {
            observer(&mut context);
        }

        trace!(
            gate = self.name,
            observers = observers.len(),
            cancelled = context.is_cancelled(),
            message_id = header.message_id,
            "notified"
        );

        context
    }

    /// `notify`, then the handler's own post-processing step
    pub fn notify_with(
        &self,
        header: MessageHeader,
        body: B,
        accumulator: A,
        roles: RolePair,
        post_process: Option<&ContextHook<B, A>>,
    ) -> ProcessingContext<B, A> {
        let mut context = self.notify(header, body, accumulator, roles);
        if let Some(hook) = post_process {
            hook(&mut context);
        }
        context
    }
}

impl<B, A> std::fmt::Debug for NotificationGate<B, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationGate")
            .field("name", &self.name)
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{MessageFlags, Role};
    use std::sync::Mutex;

    fn header() -> MessageHeader {
        let mut header = MessageHeader::new(3, 1, 0, MessageFlags::FINAL_PART);
        header.message_id = 42;
        header
    }

    #[test]
    fn without_observers_context_keeps_defaults() {
        let gate: NotificationGate<&str, Vec<u32>> = NotificationGate::new("test");
        let context = gate.notify(header(), "body", Vec::new(), RolePair::playing(Role::Store));

        assert!(context.accumulator.is_empty());
        assert!(!context.is_cancelled());
        assert_eq!(context.header.message_id, 42);
    }

    #[test]
    fn observers_run_in_order_even_after_cancel() {
        let gate: NotificationGate<(), Vec<u32>> = NotificationGate::new("test");
        let calls = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&calls);
        gate.subscribe(move |ctx| {
            log.lock().unwrap().push("first");
            ctx.push(1);
            ctx.cancel();
        });
        let log = Arc::clone(&calls);
        gate.subscribe(move |ctx| {
            log.lock().unwrap().push("second");
            ctx.push(2);
        });

        let context = gate.notify(header(), (), Vec::new(), RolePair::playing(Role::Store));

        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(context.accumulator, vec![1, 2]);
        assert!(context.is_cancelled());
    }

    #[test]
    fn observer_can_replace_accumulator() {
        let gate: NotificationGate<(), Vec<u32>> = NotificationGate::new("test");
        gate.subscribe(|ctx| ctx.push(7));
        gate.subscribe(|ctx| {
            let previous = ctx.replace(vec![9, 9]);
            assert_eq!(previous, vec![7]);
        });

        let context = gate.notify(header(), (), Vec::new(), RolePair::playing(Role::Store));
        assert_eq!(context.accumulator, vec![9, 9]);
    }

    #[test]
    fn post_process_runs_after_cancelling_observer() {
        let gate: NotificationGate<(), Vec<u32>> = NotificationGate::new("test");
        gate.subscribe(|ctx| {
            ctx.push(1);
            ctx.cancel();
        });
        let hook: ContextHook<(), Vec<u32>> =
            Box::new(|ctx: &mut ProcessingContext<(), Vec<u32>>| ctx.push(2));

        let context = gate.notify_with(
            header(),
            (),
            Vec::new(),
            RolePair::playing(Role::Store),
            Some(&hook),
        );

        assert_eq!(context.accumulator, vec![1, 2]);
        assert!(context.is_cancelled());
    }

    #[test]
    fn unsubscribed_observer_no_longer_runs() {
        let gate: NotificationGate<(), u32> = NotificationGate::new("test");
        let id = gate.subscribe(|ctx| ctx.accumulator += 1);
        gate.subscribe(|ctx| ctx.accumulator += 10);

        assert!(gate.unsubscribe(id));
        assert!(!gate.unsubscribe(id));
        assert_eq!(gate.observer_count(), 1);

        let context = gate.notify(header(), (), 0, RolePair::playing(Role::Customer));
        assert_eq!(context.accumulator, 10);
    }
}
