use recall_protocol::protocol::Event;

use crate::event_processor::EventProcessor;

/// Prints every event as one JSON line, suitable for piping.
pub(crate) struct EventProcessorWithJsonOutput;

impl EventProcessor for EventProcessorWithJsonOutput {
    fn process_event(&mut self, event: &Event) {
        if let Ok(line) = serde_json::to_string(event) {
            println!("{line}");
        }
    }
}
