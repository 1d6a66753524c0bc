use owo_colors::OwoColorize;
use owo_colors::Style;
use recall_protocol::HistoryRecord;
use recall_protocol::protocol::Event;
use recall_protocol::protocol::EventMsg;

use crate::event_processor::EventProcessor;

pub(crate) struct EventProcessorWithHumanOutput {
    bold: Style,
    dimmed: Style,
}

impl EventProcessorWithHumanOutput {
    pub(crate) fn create_with_ansi(with_ansi: bool) -> Self {
        if with_ansi {
            Self {
                bold: Style::new().bold(),
                dimmed: Style::new().dimmed(),
            }
        } else {
            Self {
                bold: Style::new(),
                dimmed: Style::new(),
            }
        }
    }

    fn print_record(&self, record: &HistoryRecord) {
        let title = record.display_title().unwrap_or("(untitled)");
        let marker = if record.is_bookmarked() { " *" } else { "" };
        println!(
            "  {} {} {}{marker}",
            format_time(record.time).style(self.dimmed),
            title.style(self.bold),
            record.url.style(self.dimmed),
        );
    }
}

impl EventProcessor for EventProcessorWithHumanOutput {
    fn process_event(&mut self, event: &Event) {
        match &event.msg {
            EventMsg::FeedConfigured(configured) => {
                println!(
                    "{}",
                    format!("feed session {}", configured.feed_id).style(self.dimmed)
                );
            }
            EventMsg::Reset(reset) => {
                println!(
                    "{} ({} records)",
                    "reset".style(self.bold),
                    reset.records.len()
                );
                for record in &reset.records {
                    self.print_record(record);
                }
            }
            EventMsg::Add(add) => {
                println!("{}", "add".style(self.bold));
                self.print_record(&add.record);
            }
            EventMsg::Change(change) => {
                println!("{}", "change".style(self.bold));
                self.print_record(&change.record);
            }
            EventMsg::Remove(remove) => {
                println!("{} {}", "remove".style(self.bold), remove.record.url);
            }
            EventMsg::RecordsResponse(response) => {
                println!(
                    "{} ({} records)",
                    "records".style(self.bold),
                    response.records.len()
                );
                for record in &response.records {
                    self.print_record(record);
                }
            }
            EventMsg::Error(error) => {
                println!("ERROR: {}", error.message);
            }
            EventMsg::ShutdownComplete => {
                println!("{}", "shutdown complete".style(self.dimmed));
            }
        }
    }
}

fn format_time(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}
