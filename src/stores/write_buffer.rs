/// Bookkeeping for a document that is edited locally and written back with
/// a conditional update.
///
/// At most one write is in flight per document. Edits made while a write is
/// in flight are folded into the next one, which goes out with the token
/// returned by the previous write.
#[derive(Debug, Default)]
pub(crate) struct WriteBuffer {
    dirty: bool,
    in_flight: bool,
    messages: Vec<String>,
}

impl WriteBuffer {
    /// Record a local edit, with the message to show once it is persisted.
    pub fn mark(&mut self, message: Option<String>) {
        self.dirty = true;
        self.messages.extend(message);
    }

    /// Start a write if there is something to write and nothing in flight.
    /// Returns the messages that belong to this write.
    pub fn begin(&mut self) -> Option<Vec<String>> {
        if !self.dirty || self.in_flight {
            return None;
        }
        self.dirty = false;
        self.in_flight = true;
        Some(std::mem::take(&mut self.messages))
    }

    pub fn finish(&mut self) {
        self.in_flight = false;
    }

    /// Forget unsaved edits and any write in flight.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }
}
