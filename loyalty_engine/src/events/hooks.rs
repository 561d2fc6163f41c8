use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{AccrualAppliedEvent, EventHandler, EventProducer, Handler, SyncErrorEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub accrual_applied_producer: Vec<EventProducer<AccrualAppliedEvent>>,
    pub sync_error_producer: Vec<EventProducer<SyncErrorEvent>>,
}

pub struct EventHandlers {
    pub on_accrual_applied: Option<EventHandler<AccrualAppliedEvent>>,
    pub on_sync_error: Option<EventHandler<SyncErrorEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_accrual_applied = hooks.on_accrual_applied.map(|f| EventHandler::new(buffer_size, f));
        let on_sync_error = hooks.on_sync_error.map(|f| EventHandler::new(buffer_size, f));
        Self { on_accrual_applied, on_sync_error }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_accrual_applied {
            result.accrual_applied_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_sync_error {
            result.sync_error_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_accrual_applied {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_sync_error {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_accrual_applied: Option<Handler<AccrualAppliedEvent>>,
    pub on_sync_error: Option<Handler<SyncErrorEvent>>,
}

impl EventHooks {
    pub fn on_accrual_applied<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(AccrualAppliedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_accrual_applied = Some(Arc::new(f));
        self
    }

    pub fn on_sync_error<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(SyncErrorEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_sync_error = Some(Arc::new(f));
        self
    }
}

impl EventProducers {
    pub fn publish_accrual_applied(&self, event: AccrualAppliedEvent) {
        for producer in &self.accrual_applied_producer {
            producer.try_publish_event(event.clone());
        }
    }

    pub fn publish_sync_error(&self, event: SyncErrorEvent) {
        for producer in &self.sync_error_producer {
            producer.try_publish_event(event.clone());
        }
    }
}
