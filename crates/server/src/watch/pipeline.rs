// crates/server/src/watch/pipeline.rs
//! Per-event processing: persist, then broadcast, then alert.
//!
//! Steps are isolated. A failed insert is logged and the event still goes
//! out to subscribers; alerts run on their own tasks.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use watchtower_core::ChangeEvent;
use watchtower_db::Database;

use crate::fanout::Fanout;
use crate::mailer::{MailMessage, Mailer};

#[derive(Clone)]
pub struct EventPipeline {
    db: Database,
    fanout: Arc<Fanout>,
    mailer: Arc<dyn Mailer>,
}

impl EventPipeline {
    pub fn new(db: Database, fanout: Arc<Fanout>, mailer: Arc<dyn Mailer>) -> Self {
        Self { db, fanout, mailer }
    }

    /// Handle one event. Returns the alert task so callers can wait on it.
    pub async fn process(&self, event: ChangeEvent, recipient: &str) -> JoinHandle<()> {
        if let Err(e) = self.db.append_change_event(&event).await {
            error!(path = %event.path, error = %e, "failed to persist change event");
        }

        let delivered = self.fanout.broadcast(&event);
        debug!(path = %event.path, kind = %event.change_kind, delivered, "change broadcast");

        let mailer = self.mailer.clone();
        let message = MailMessage::alert(recipient, &event);
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&message).await {
                warn!(to = %message.to, error = %e, "failed to send change alert");
            }
        })
    }

    /// Consume `rx` until every sender is gone.
    pub fn spawn(
        self,
        mut rx: mpsc::UnboundedReceiver<ChangeEvent>,
        recipient: String,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                self.process(event, &recipient).await;
            }
            debug!(recipient = %recipient, "event pipeline drained");
        })
    }
}
