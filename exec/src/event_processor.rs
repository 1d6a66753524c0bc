use recall_protocol::protocol::Event;

/// Formats the notification stream for stdout.
pub(crate) trait EventProcessor {
    fn process_event(&mut self, event: &Event);
}
