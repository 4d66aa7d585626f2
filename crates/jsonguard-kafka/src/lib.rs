//! Kafka wire model used by the jsonguard broker surfaces.
//!
//! Only what the policy reads or rewrites is modelled: produce requests and
//! responses, fetch responses, encoded record sets and protocol error codes.

pub mod error;
pub mod error_code;
pub mod fetch;
pub mod message;
pub mod produce;
pub mod records;

pub use error::{KafkaError, Result};
pub use error_code::ErrorCode;
pub use fetch::{FetchResponse, FetchableTopicResponse, PartitionData};
pub use message::{KafkaMessage, RecordCoordinates};
pub use produce::{
    PartitionProduceData, PartitionProduceResponse, ProduceRequest, ProduceResponse,
    TopicProduceData, TopicProduceResponse,
};
pub use records::{decode_record, encode_record, MemoryRecords, Record, RecordHeader};
