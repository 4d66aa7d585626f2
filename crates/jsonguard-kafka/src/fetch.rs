use crate::error::Result;
use crate::error_code::ErrorCode;
use crate::message::KafkaMessage;
use crate::records::MemoryRecords;

/// Fetched data for one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionData {
    pub partition_index: i32,
    pub error_code: ErrorCode,
    pub high_watermark: i64,
    pub records: MemoryRecords,
}

impl PartitionData {
    pub fn new(partition_index: i32, records: MemoryRecords) -> Self {
        Self {
            partition_index,
            error_code: ErrorCode::NONE,
            high_watermark: -1,
            records,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchableTopicResponse {
    pub topic: String,
    pub partitions: Vec<PartitionData>,
}

/// A fetch response on its way from the broker to a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub throttle_time_ms: i32,
    pub error_code: ErrorCode,
    pub session_id: i32,
    pub responses: Vec<FetchableTopicResponse>,
}

impl FetchResponse {
    pub fn new(responses: Vec<FetchableTopicResponse>) -> Self {
        Self {
            throttle_time_ms: 0,
            error_code: ErrorCode::NONE,
            session_id: 0,
            responses,
        }
    }

    pub fn partition(&self, topic: &str, index: i32) -> Option<&PartitionData> {
        self.responses
            .iter()
            .filter(|response| response.topic == topic)
            .flat_map(|response| response.partitions.iter())
            .find(|partition| partition.partition_index == index)
    }

    pub fn partition_mut(&mut self, topic: &str, index: i32) -> Option<&mut PartitionData> {
        self.responses
            .iter_mut()
            .filter(|response| response.topic == topic)
            .flat_map(|response| response.partitions.iter_mut())
            .find(|partition| partition.partition_index == index)
    }

    /// Decode every fetched record into messages.
    pub fn messages(&self) -> Result<Vec<KafkaMessage>> {
        let mut messages = Vec::new();
        for response in &self.responses {
            for partition in &response.partitions {
                for record in partition.records.records()? {
                    messages.push(KafkaMessage::from_record(
                        &response.topic,
                        partition.partition_index,
                        record,
                    ));
                }
            }
        }
        Ok(messages)
    }
}
