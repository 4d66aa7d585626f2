use std::collections::BTreeMap;

use bytes::Bytes;
use jsonguard_kafka::KafkaMessage;

/// A message flowing through a message-oriented HTTP phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    id: Option<String>,
    content: Bytes,
    headers: BTreeMap<String, String>,
    attributes: BTreeMap<String, String>,
}

impl Message {
    pub fn new(content: impl Into<Bytes>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

/// Attributes of one message exposed to template evaluation.
///
/// Names are prefixed with `message.`: `message.id`, `message.topic`,
/// `message.header.<name>`, `message.attribute.<name>` and so on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageNamespace {
    entries: BTreeMap<String, String>,
}

impl MessageNamespace {
    pub fn for_message(message: &Message) -> Self {
        let mut namespace = Self::default();
        if let Some(id) = message.id() {
            namespace.insert("message.id".to_string(), id);
        }
        for (name, value) in message.headers() {
            namespace.insert(format!("message.header.{name}"), value);
        }
        for (name, value) in message.attributes() {
            namespace.insert(format!("message.attribute.{name}"), value);
        }
        namespace
    }

    /// Header values that are not UTF-8 are converted lossily.
    pub fn for_kafka(message: &KafkaMessage) -> Self {
        let mut namespace = Self::default();
        namespace.insert("message.topic".to_string(), message.topic());
        let partition = message.partition().to_string();
        let offset = message.offset().to_string();
        namespace.insert("message.partition".to_string(), &partition);
        namespace.insert("message.offset".to_string(), &offset);
        if let Some(key) = message.key() {
            namespace.insert("message.key".to_string(), &String::from_utf8_lossy(key));
        }
        for header in message.headers() {
            let value = header
                .value
                .as_ref()
                .map(|value| String::from_utf8_lossy(value).into_owned())
                .unwrap_or_default();
            namespace.insert(format!("message.header.{}", header.key), &value);
        }
        namespace
    }

    fn insert(&mut self, name: String, value: &str) {
        self.entries.insert(name, value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}
