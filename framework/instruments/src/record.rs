use std::time::{Duration, Instant};

/// Where a measurement was taken: the scenario a virtual user belongs to and the groups it was
/// inside when the measurement was recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Tags {
    pub scenario: String,
    pub group_path: Vec<String>,
}

impl Tags {
    pub fn new(scenario: impl Into<String>) -> Self {
        Self {
            scenario: scenario.into(),
            group_path: Vec::new(),
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group_path.push(group.into());
        self
    }

    /// `::` separated group path, empty for the root group.
    pub fn group(&self) -> String {
        self.group_path
            .iter()
            .fold(String::new(), |acc, g| format!("{acc}::{g}"))
    }
}

/// A single timed request against the system under test.
#[derive(Debug, Clone)]
pub struct OperationRecord {
    pub operation_id: String,
    pub tags: Tags,
    started: Instant,
    pub elapsed: Option<Duration>,
    pub is_error: bool,
    pub status: Option<u16>,
    pub bytes_sent: u64,
    pub bytes_received: u64,
}

impl OperationRecord {
    /// Start timing an operation now.
    pub fn new(operation_id: impl Into<String>, tags: Tags) -> Self {
        Self {
            operation_id: operation_id.into(),
            tags,
            started: Instant::now(),
            elapsed: None,
            is_error: false,
            status: None,
            bytes_sent: 0,
            bytes_received: 0,
        }
    }

    pub fn with_bytes_sent(mut self, bytes: u64) -> Self {
        self.bytes_sent = bytes;
        self
    }

    /// Stop the timer. A request is failed if it got no status or a status outside 200-399.
    pub fn finish(&mut self, status: Option<u16>, bytes_received: u64) {
        self.elapsed = Some(self.started.elapsed());
        self.status = status;
        self.bytes_received = bytes_received;
        self.is_error = !matches!(status, Some(200..=399));
    }

    pub fn duration(&self) -> Option<Duration> {
        self.elapsed
    }

    #[cfg(test)]
    pub(crate) fn completed(
        operation_id: &str,
        tags: Tags,
        elapsed: Duration,
        status: Option<u16>,
    ) -> Self {
        let mut record = Self::new(operation_id, tags);
        record.finish(status, 0);
        record.elapsed = Some(elapsed);
        record
    }
}

/// Outcome of one labelled assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRecord {
    pub name: String,
    pub tags: Tags,
    pub passed: bool,
}

/// One run of a scenario's entry point by a virtual user.
#[derive(Debug, Clone)]
pub struct IterationRecord {
    pub scenario: String,
    pub elapsed: Duration,
    /// Set when the iteration returned an error instead of running to completion
    pub interrupted: bool,
}

/// Time spent inside one group of an iteration.
#[derive(Debug, Clone)]
pub struct GroupRecord {
    pub tags: Tags,
    pub elapsed: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_status_is_an_error() {
        let mut record = OperationRecord::new("POST /api/users", Tags::new("post"));
        record.finish(Some(500), 10);
        assert!(record.is_error);

        let mut record = OperationRecord::new("POST /api/users", Tags::new("post"));
        record.finish(Some(201), 10);
        assert!(!record.is_error);
        assert!(record.duration().is_some());
    }

    #[test]
    fn missing_status_is_an_error() {
        let mut record = OperationRecord::new("PUT /api/users/2", Tags::new("put"));
        record.finish(None, 0);
        assert!(record.is_error);
    }

    #[test]
    fn group_path_is_joined() {
        let tags = Tags::new("default").with_group("a").with_group("b");
        assert_eq!("::a::b", tags.group());
        assert_eq!("", Tags::new("default").group());
    }
}
