//! Server-sent events decoding
//!
//! Incremental `text/event-stream` parser. Feed it text as it arrives and it
//! hands back every event completed by a blank line.

/// A parsed SSE event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Event type (from "event:", defaults to "message")
    pub event: String,
    /// Event data ("data:" lines joined with newlines)
    pub data: String,
    /// Last event ID (from "id:")
    pub id: Option<String>,
}

impl Default for SseEvent {
    fn default() -> Self {
        Self {
            event: "message".to_string(),
            data: String::new(),
            id: None,
        }
    }
}

/// Parser state for one event stream
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
    current: SseEvent,
    has_data: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    fn process_line(&mut self, line: &str) {
        if line.starts_with(':') {
            return;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.current.event = value.to_string(),
            "data" => {
                self.current.data.push_str(value);
                self.current.data.push('\n');
                self.has_data = true;
            }
            "id" => self.current.id = Some(value.to_string()),
            _ => {}
        }
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        if !self.has_data {
            self.current = SseEvent::default();
            return None;
        }
        let mut event = std::mem::take(&mut self.current);
        if event.data.ends_with('\n') {
            event.data.pop();
        }
        if event.event.is_empty() {
            event.event = "message".to_string();
        }
        self.has_data = false;
        Some(event)
    }

    /// Feed text and collect completed events
    pub fn feed(&mut self, data: &str) -> Vec<SseEvent> {
        self.buffer.push_str(data);
        let mut events = Vec::new();

        let buffer = std::mem::take(&mut self.buffer);
        let mut rest = buffer.as_str();
        while let Some(pos) = rest.find('\n') {
            let line = rest[..pos].strip_suffix('\r').unwrap_or(&rest[..pos]);
            if line.is_empty() {
                events.extend(self.dispatch());
            } else {
                self.process_line(line);
            }
            rest = &rest[pos + 1..];
        }
        self.buffer = rest.to_string();
        events
    }

    /// Whether a partial line or event is buffered
    pub fn has_pending(&self) -> bool {
        !self.buffer.is_empty() || self.has_data
    }

    /// Emit the last event if the stream ended without a blank line
    pub fn flush(&mut self) -> Option<SseEvent> {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.process_line(line.trim_end_matches('\r'));
        }
        self.dispatch()
    }
}
