//! The default notification sink for the server binary.
//!
//! Delivery mechanics are outside this service; until a real dispatcher is
//! wired in, events are emitted as structured log lines.

use std::convert::Infallible;

use marque_core::notify::{NotificationEvent, NotificationSink};
use uuid::Uuid;

/// Logs every notification at INFO and never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
  type Error = Infallible;

  async fn notify(
    &self,
    recipient: Uuid,
    actor: Uuid,
    event: NotificationEvent,
  ) -> Result<(), Infallible> {
    tracing::info!(%recipient, %actor, ?event, "notification");
    Ok(())
  }
}
