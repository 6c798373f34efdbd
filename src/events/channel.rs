use std::sync::{Arc, RwLock};

use tokio::{runtime::Runtime, sync::broadcast};
use tracing::trace;

use crate::{
    ShareLock,
    common::{BroadcastQueue, Shutdown},
    events::{EditorEvent, Notification},
};

macro_rules! dispatch_event {
    ($handles:expr, $item:expr) => {
        let handlers = $handles.read().unwrap();
        for handle in handlers.iter() {
            (handle)($item);
        }
    };
}

const EVENT_QUEUE_SIZE: usize = 1024;

pub type EventHandle = Arc<dyn Fn(&EditorEvent) + Send + Sync>;
pub type NotificationHandle = Arc<dyn Fn(&Notification) + Send + Sync>;

/// Event bus shared by the viewport, the graph model and the editor.
///
/// `emit` never blocks and never fails: with nobody subscribed the event is dropped.
#[derive(Clone)]
pub struct Channel {
    event_queue: Arc<BroadcastQueue<EditorEvent>>,

    events: ShareLock<Vec<EventHandle>>,
    notifications: ShareLock<Vec<NotificationHandle>>,

    shutdown: Arc<Shutdown>,
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel {
    pub fn new() -> Self {
        Self {
            event_queue: BroadcastQueue::new(EVENT_QUEUE_SIZE),
            events: Arc::new(RwLock::new(Vec::new())),
            notifications: Arc::new(RwLock::new(Vec::new())),
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    pub fn emit(
        &self,
        event: EditorEvent,
    ) {
        trace!("channel::emit({:?})", event);
        let _ = self.event_queue.send(event);
    }

    pub fn notify(
        &self,
        notification: Notification,
    ) {
        self.emit(EditorEvent::Notification(notification));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EditorEvent> {
        self.event_queue.subscribe()
    }

    /// Register a handler called for every event once `listen` runs.
    pub fn on_event(
        &self,
        f: impl Fn(&EditorEvent) + Send + Sync + 'static,
    ) {
        self.events.write().unwrap().push(Arc::new(f));
    }

    /// Register a handler called for every notification once `listen` runs.
    pub fn on_notification(
        &self,
        f: impl Fn(&Notification) + Send + Sync + 'static,
    ) {
        self.notifications.write().unwrap().push(Arc::new(f));
    }

    pub(crate) fn listen(
        &self,
        runtime: &Runtime,
    ) {
        let mut event_queue = self.event_queue.subscribe();
        let events = self.events.clone();
        let notifications = self.notifications.clone();

        let shutdown = self.shutdown.clone();
        runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    received = event_queue.recv() => match received {
                        Ok(e) => {
                            dispatch_event!(events, &e);
                            if let EditorEvent::Notification(n) = &e {
                                dispatch_event!(notifications, n);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => continue,
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        });
    }

    pub(crate) fn shutdown(&self) {
        self.shutdown.shutdown();
    }
}
