use std::fmt;

use bytes::Bytes;

use crate::records::{Record, RecordHeader};

/// Identifies exactly one record on the broker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordCoordinates {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

impl fmt::Display for RecordCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}@{}", self.topic, self.partition, self.offset)
    }
}

/// A single record, addressed by topic and partition, handed to the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaMessage {
    topic: String,
    partition: i32,
    offset: i64,
    key: Option<Bytes>,
    content: Bytes,
    headers: Vec<RecordHeader>,
}

impl KafkaMessage {
    pub fn new(
        topic: impl Into<String>,
        partition: i32,
        offset: i64,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            key: None,
            content: content.into(),
            headers: Vec::new(),
        }
    }

    /// A message for a decoded record. A null value becomes empty content.
    pub fn from_record(topic: &str, partition: i32, record: Record) -> Self {
        Self {
            topic: topic.to_string(),
            partition,
            offset: record.offset,
            key: record.key,
            content: record.value.unwrap_or_default(),
            headers: record.headers,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn partition(&self) -> i32 {
        self.partition
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn key(&self) -> Option<&Bytes> {
        self.key.as_ref()
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn headers(&self) -> &[RecordHeader] {
        &self.headers
    }

    pub fn coordinates(&self) -> RecordCoordinates {
        RecordCoordinates {
            topic: self.topic.clone(),
            partition: self.partition,
            offset: self.offset,
        }
    }

    /// Value of the last header named `name`.
    pub fn header(&self, name: &str) -> Option<&Bytes> {
        self.headers
            .iter()
            .rev()
            .find(|header| header.key == name)
            .and_then(|header| header.value.as_ref())
    }

    pub fn put_header(&mut self, name: impl Into<String>, value: impl Into<Bytes>) {
        self.headers.push(RecordHeader::new(name, value));
    }

    /// Back to a record, e.g. to re-encode a partition's record set.
    pub fn into_record(self) -> Record {
        Record {
            offset: self.offset,
            key: self.key,
            value: Some(self.content),
            headers: self.headers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_header_appends_and_last_wins() {
        let mut message = KafkaMessage::new("orders", 1, 42, Bytes::from_static(b"{}"));
        assert!(message.header("X-Invalid").is_none());
        message.put_header("X-Invalid", Bytes::from_static(b"first"));
        message.put_header("X-Invalid", Bytes::from_static(b"second"));
        assert_eq!(message.headers().len(), 2);
        assert_eq!(message.header("X-Invalid").unwrap().as_ref(), b"second");
    }

    #[test]
    fn coordinates_display() {
        let message = KafkaMessage::new("orders", 1, 42, Bytes::new());
        assert_eq!(message.coordinates().to_string(), "orders-1@42");
    }

    #[test]
    fn null_record_value_becomes_empty_content() {
        let record = Record {
            offset: 3,
            key: Some(Bytes::from_static(b"k")),
            value: None,
            headers: Vec::new(),
        };
        let message = KafkaMessage::from_record("orders", 0, record);
        assert!(message.content().is_empty());
        assert_eq!(message.key().unwrap().as_ref(), b"k");
        assert_eq!(message.into_record().offset, 3);
    }
}
