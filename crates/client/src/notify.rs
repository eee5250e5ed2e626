use portal_core::{Notification, NotificationId, Severity};

/// In-memory queue of user-facing notifications, oldest first. Ids are
/// never reused within one queue, so dismissing an entry cannot remove
/// a notification that arrived later under a recycled id.
#[derive(Debug, Default)]
pub struct NotificationCenter {
    entries: Vec<Notification>,
    next_id: NotificationId,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
        severity: Severity,
    ) -> NotificationId {
        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(Notification {
            id,
            title: title.into(),
            body: body.into(),
            severity,
        });
        id
    }

    /// Removes the notification with the given id. Unknown ids are
    /// ignored so double-dismissal is harmless.
    pub fn dismiss(&mut self, id: NotificationId) {
        self.entries.retain(|entry| entry.id != id);
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
