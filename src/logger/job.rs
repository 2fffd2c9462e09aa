//! Units of work with timing and completion events.

use std::fmt;
use std::time::{Duration, Instant};

use crate::field::{self, Field};
use crate::level::Level;
use crate::logger::handle::LoggerHandle;

/// Outcome reported by [`Job::complete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionStatus {
    Success,
    ValidationError,
    Panic,
    Error,
    Junk,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Success => "success",
            CompletionStatus::ValidationError => "validation_error",
            CompletionStatus::Panic => "panic",
            CompletionStatus::Error => "error",
            CompletionStatus::Junk => "junk",
        }
    }

    fn level(&self) -> Level {
        match self {
            CompletionStatus::Error | CompletionStatus::ValidationError | CompletionStatus::Panic => Level::Error,
            CompletionStatus::Junk => Level::Warn,
            CompletionStatus::Success => Level::Info,
        }
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named unit of work. Every record it emits carries `job`, the job's own
/// key/values, and the call's key/values (which win on key collisions).
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub start: Instant,
    pub key_values: Vec<Field>,
    logger: LoggerHandle,
}

impl Job {
    pub fn new(name: impl Into<String>, logger: LoggerHandle) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            key_values: Vec::new(),
            logger,
        }
    }

    /// Attach a key/value to every later record of this job.
    pub fn key_value(mut self, field: Field) -> Self {
        self.key_values.retain(|f| f.key != field.key);
        self.key_values.push(field);
        self
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    #[track_caller]
    pub fn event(&self, event: &str) {
        self.event_kv(event, Vec::new());
    }

    #[track_caller]
    pub fn event_kv(&self, event: &str, kvs: Vec<Field>) {
        self.emit(Level::Info, event, vec![field::string("event", event.to_string())], kvs);
    }

    /// Log `err` at error and hand it back.
    #[track_caller]
    pub fn event_err<E: std::error::Error + 'static>(&self, event: &str, err: E) -> E {
        self.emit(
            Level::Error,
            event,
            vec![field::string("event", event.to_string()), field::error(&err)],
            Vec::new(),
        );
        err
    }

    #[track_caller]
    pub fn timing(&self, event: &str, duration: Duration) {
        self.emit(
            Level::Info,
            event,
            vec![field::string("event", event.to_string()), field::duration("duration", duration)],
            Vec::new(),
        );
    }

    #[track_caller]
    pub fn gauge(&self, event: &str, value: f64) {
        self.emit(
            Level::Info,
            event,
            vec![field::string("event", event.to_string()), field::float("gauge", value)],
            Vec::new(),
        );
    }

    #[track_caller]
    pub fn complete(&self, status: CompletionStatus) {
        self.complete_kv(status, Vec::new());
    }

    #[track_caller]
    pub fn complete_kv(&self, status: CompletionStatus, kvs: Vec<Field>) {
        let fixed = vec![
            field::string("status", status.as_str()),
            field::duration("duration", self.elapsed()),
        ];
        self.emit(status.level(), "complete", fixed, kvs);
    }

    /// Complete with [`CompletionStatus::Error`] and hand `err` back.
    #[track_caller]
    pub fn complete_err<E: std::error::Error + 'static>(&self, err: E) -> E {
        self.complete_kv(CompletionStatus::Error, vec![field::error(&err)]);
        err
    }

    #[track_caller]
    fn emit(&self, level: Level, message: &str, fixed: Vec<Field>, kvs: Vec<Field>) {
        if !self.logger.enabled(level) {
            return;
        }
        let mut fields = Vec::with_capacity(1 + fixed.len() + self.key_values.len() + kvs.len());
        fields.push(field::string("job", self.name.clone()));
        fields.extend(fixed);
        fields.extend(
            self.key_values
                .iter()
                .filter(|kv| !kvs.iter().any(|f| f.key == kv.key))
                .cloned(),
        );
        fields.extend(kvs);
        self.logger.log(level, message, &fields);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Weak};

    use super::*;
    use crate::appender::{Appender, AppenderSet, MemoryWriter, WriteSyncer};
    use crate::encoder::JsonEncoder;
    use crate::logger::Backend;
    use crate::routing::{NodePolicy, RoutingNode};

    fn job(level: Level) -> (Job, Arc<MemoryWriter>) {
        let writer = Arc::new(MemoryWriter::new());
        let sink: Arc<dyn WriteSyncer> = writer.clone();
        let set = AppenderSet::new([Appender::new("MEM", sink, Arc::new(JsonEncoder::new()))]);
        let policy = NodePolicy {
            appender_levels: [("MEM", level)].into_iter().collect(),
            ..NodePolicy::default()
        };
        let node = Arc::new(RoutingNode::new("jobs", Arc::new(policy), true));
        let backend = Backend::bind(node.name_arc(), &node.policy(), &set);
        let handle = LoggerHandle::new(node, backend, Weak::new());
        (Job::new("import_users", handle), writer)
    }

    fn parse(line: &str) -> serde_json::Value {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_event_carries_job_fields() {
        let (job, writer) = job(Level::Info);
        let job = job.key_value(field::string("table", "users"));
        job.event_kv("fetch", vec![field::string("table", "accounts"), field::int("rows", 3)]);

        let record = parse(&writer.lines()[0]);
        assert_eq!(record["job"], "import_users");
        assert_eq!(record["event"], "fetch");
        assert_eq!(record["table"], "accounts");
        assert_eq!(record["rows"], 3);
        assert_eq!(record["level"], "info");
    }

    #[test]
    fn test_completion_levels() {
        let (job, writer) = job(Level::Warn);
        job.complete(CompletionStatus::Success);
        job.complete(CompletionStatus::Junk);
        job.complete(CompletionStatus::ValidationError);

        let lines = writer.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(parse(&lines[0])["status"], "junk");
        assert_eq!(parse(&lines[0])["level"], "warn");
        assert_eq!(parse(&lines[1])["level"], "error");
        assert!(parse(&lines[1])["duration"].is_number());
    }

    #[test]
    fn test_errors_are_returned() {
        let (job, writer) = job(Level::Info);
        let err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = job.event_err("write", err);
        assert_eq!(err.to_string(), "disk full");
        let err = job.complete_err(err);
        assert_eq!(err.kind(), std::io::ErrorKind::Other);

        let lines = writer.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(parse(&lines[0])["error"], "disk full");
        assert_eq!(parse(&lines[1])["status"], "error");
    }

    #[test]
    fn test_timing_and_gauge() {
        let (job, writer) = job(Level::Debug);
        job.timing("query", Duration::from_millis(1500));
        job.gauge("queue_depth", 7.5);

        let lines = writer.lines();
        assert_eq!(parse(&lines[0])["duration"], 1.5);
        assert_eq!(parse(&lines[1])["gauge"], 7.5);
    }
}
