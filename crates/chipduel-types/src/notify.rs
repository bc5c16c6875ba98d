//! Notification seam.
//!
//! The delivery collaborator (push/chat) is fire-and-forgotten: the core
//! hands it an event and moves on. Implementations must not block and must
//! swallow their own delivery failures.

use crate::NotificationEvent;

/// Receives engine events for out-of-band delivery.
pub trait Notifier {
    fn notify(&self, event: &NotificationEvent);
}

/// Drops every event. For compositions without a delivery collaborator.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&self, _event: &NotificationEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DuelId;

    #[test]
    fn null_notifier_accepts_everything() {
        NullNotifier.notify(&NotificationEvent::SeriesCompleted {
            duel_id: DuelId::new(),
            winner: None,
        });
    }
}
