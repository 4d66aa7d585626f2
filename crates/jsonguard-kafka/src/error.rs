/// Errors that can occur while encoding or decoding record sets.
#[derive(Debug, thiserror::Error)]
pub enum KafkaError {
    /// The record set ended in the middle of a record.
    #[error("truncated record set (needed {needed} bytes, {available} available)")]
    Truncated { needed: usize, available: usize },

    /// A length field was negative where only null (-1) is allowed.
    #[error("invalid length {length} for {field}")]
    InvalidLength { field: &'static str, length: i32 },

    /// A field exceeds what the wire format can carry.
    #[error("{field} too large ({size} bytes, max {max})")]
    FieldTooLarge {
        field: &'static str,
        size: usize,
        max: usize,
    },

    /// A record header key is not UTF-8.
    #[error("record header key is not valid UTF-8")]
    InvalidHeaderKey,
}

pub type Result<T> = std::result::Result<T, KafkaError>;
