use crate::error::Result;
use crate::error_code::ErrorCode;
use crate::message::KafkaMessage;
use crate::records::MemoryRecords;

/// Records a client sends for one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionProduceData {
    pub index: i32,
    pub records: MemoryRecords,
}

/// Records a client sends for one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicProduceData {
    pub name: String,
    pub partition_data: Vec<PartitionProduceData>,
}

/// A produce request as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProduceRequest {
    pub acks: i16,
    pub timeout_ms: i32,
    pub topic_data: Vec<TopicProduceData>,
}

impl ProduceRequest {
    pub fn new(topic_data: Vec<TopicProduceData>) -> Self {
        Self {
            acks: -1,
            timeout_ms: 30_000,
            topic_data,
        }
    }

    /// Build a response failing every partition of this request with `code`.
    pub fn error_response(
        &self,
        throttle_time_ms: i32,
        code: ErrorCode,
        message: Option<&str>,
    ) -> ProduceResponse {
        let responses = self
            .topic_data
            .iter()
            .map(|topic| TopicProduceResponse {
                name: topic.name.clone(),
                partition_responses: topic
                    .partition_data
                    .iter()
                    .map(|partition| PartitionProduceResponse {
                        index: partition.index,
                        error_code: code,
                        error_message: message.map(str::to_string),
                        base_offset: -1,
                    })
                    .collect(),
            })
            .collect();

        ProduceResponse {
            throttle_time_ms,
            responses,
        }
    }

    /// Decode every record of the request into messages.
    pub fn messages(&self) -> Result<Vec<KafkaMessage>> {
        let mut messages = Vec::new();
        for topic in &self.topic_data {
            for partition in &topic.partition_data {
                for record in partition.records.records()? {
                    messages.push(KafkaMessage::from_record(
                        &topic.name,
                        partition.index,
                        record,
                    ));
                }
            }
        }
        Ok(messages)
    }
}

/// Broker answer for one partition of a produce request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionProduceResponse {
    pub index: i32,
    pub error_code: ErrorCode,
    pub error_message: Option<String>,
    pub base_offset: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicProduceResponse {
    pub name: String,
    pub partition_responses: Vec<PartitionProduceResponse>,
}

/// A produce response, either from the broker or synthesized by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProduceResponse {
    pub throttle_time_ms: i32,
    pub responses: Vec<TopicProduceResponse>,
}

impl ProduceResponse {
    pub fn partition(&self, topic: &str, index: i32) -> Option<&PartitionProduceResponse> {
        self.responses
            .iter()
            .filter(|response| response.name == topic)
            .flat_map(|response| response.partition_responses.iter())
            .find(|partition| partition.index == index)
    }

    /// Every partition response paired with its topic name.
    pub fn partitions_mut(
        &mut self,
    ) -> impl Iterator<Item = (&str, &mut PartitionProduceResponse)> + '_ {
        self.responses.iter_mut().flat_map(|response| {
            let TopicProduceResponse {
                name,
                partition_responses,
            } = response;
            let name: &str = name;
            partition_responses
                .iter_mut()
                .map(move |partition| (name, partition))
        })
    }
}
