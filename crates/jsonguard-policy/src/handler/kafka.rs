use jsonguard_kafka::{
    ErrorCode, FetchResponse, KafkaMessage, MemoryRecords, ProduceRequest, ProduceResponse,
    RecordCoordinates,
};

use crate::config::{
    PublishErrorHandling, PublishStrategy, SubscribeErrorHandling, SubscribeStrategy,
};
use crate::error::{PolicyError, Result};

const DEFAULT_THROTTLE_TIME_MS: i32 = 0;
const SIBLING_PARTITION_MESSAGE: &str = "Another partition contains invalid record(s)";

/// Reaction to a rejected record in a produce request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishHandler {
    /// Fail the whole request, pointing at the offending partition.
    FailWithInvalidRecord,
}

impl PublishHandler {
    pub fn from_config(config: &PublishErrorHandling) -> Self {
        match config.strategy {
            PublishStrategy::FailWithInvalidRecord => Self::FailWithInvalidRecord,
        }
    }

    /// Response the produce request is interrupted with.
    pub fn on_error(
        &self,
        request: &ProduceRequest,
        failed: &RecordCoordinates,
    ) -> ProduceResponse {
        match self {
            Self::FailWithInvalidRecord => {
                let message = format!(
                    "Partition contains invalid record(s) at offset: {}",
                    failed.offset
                );
                let mut response = request.error_response(
                    DEFAULT_THROTTLE_TIME_MS,
                    ErrorCode::INVALID_RECORD,
                    Some(&message),
                );
                for (topic, partition) in response.partitions_mut() {
                    if topic != failed.topic || partition.index != failed.partition {
                        partition.error_message = Some(SIBLING_PARTITION_MESSAGE.to_string());
                    }
                }
                response
            }
        }
    }
}

/// What the subscribe phase does after a handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeAction {
    /// Stop and hand the mutated fetch response back to the client.
    Interrupt,
    /// Keep delivering the record.
    Continue,
}

/// Reaction to a rejected record in a fetch response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscribeHandler {
    /// Flag the partition as corrupt and drop its records.
    InvalidatePartition,
    /// Deliver the record with a marker header.
    AddRecordHeader { header_name: String },
}

impl SubscribeHandler {
    pub fn from_config(config: &SubscribeErrorHandling) -> Result<Self> {
        match config.strategy {
            SubscribeStrategy::InvalidatePartition => Ok(Self::InvalidatePartition),
            SubscribeStrategy::AddRecordHeader => {
                let header_name = config
                    .header_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        PolicyError::Configuration(
                            "ADD_RECORD_HEADER requires a headerName".to_string(),
                        )
                    })?;
                Ok(Self::AddRecordHeader {
                    header_name: header_name.to_string(),
                })
            }
        }
    }

    /// Apply the strategy to `response` or `message`.
    ///
    /// `detail` becomes the header value for [`SubscribeHandler::AddRecordHeader`].
    pub fn on_error(
        &self,
        response: &mut FetchResponse,
        message: &mut KafkaMessage,
        detail: &str,
    ) -> SubscribeAction {
        match self {
            Self::InvalidatePartition => {
                response.error_code = ErrorCode::CORRUPT_MESSAGE;
                if let Some(partition) =
                    response.partition_mut(message.topic(), message.partition())
                {
                    partition.error_code = ErrorCode::CORRUPT_MESSAGE;
                    partition.records = MemoryRecords::EMPTY;
                }
                SubscribeAction::Interrupt
            }
            Self::AddRecordHeader { header_name } => {
                message.put_header(header_name.clone(), detail.to_string());
                SubscribeAction::Continue
            }
        }
    }
}
