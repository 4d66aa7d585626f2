use std::fmt;

use crate::failure::FailureKind;

/// HTTP-facing phases and the failure each one reports.
///
/// | Phase | Status | Payload key | Format key |
/// |---|---|---|---|
/// | Request | 400 | `JSON_INVALID_PAYLOAD` | `JSON_INVALID_FORMAT` |
/// | Response | 500 | `JSON_INVALID_RESPONSE_PAYLOAD` | `JSON_INVALID_RESPONSE_FORMAT` |
/// | MessageRequest | 400 | `JSON_INVALID_MESSAGE_REQUEST_PAYLOAD` | `JSON_INVALID_MESSAGE_REQUEST_FORMAT` |
/// | MessageResponse | 400 | `JSON_INVALID_MESSAGE_RESPONSE_PAYLOAD` | `JSON_INVALID_MESSAGE_RESPONSE_FORMAT` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpPhase {
    Request,
    Response,
    MessageRequest,
    MessageResponse,
}

impl HttpPhase {
    pub fn status_code(self) -> u16 {
        match self {
            Self::Response => 500,
            Self::Request | Self::MessageRequest | Self::MessageResponse => 400,
        }
    }

    pub fn payload_key(self) -> &'static str {
        match self {
            Self::Request => "JSON_INVALID_PAYLOAD",
            Self::Response => "JSON_INVALID_RESPONSE_PAYLOAD",
            Self::MessageRequest => "JSON_INVALID_MESSAGE_REQUEST_PAYLOAD",
            Self::MessageResponse => "JSON_INVALID_MESSAGE_RESPONSE_PAYLOAD",
        }
    }

    pub fn format_key(self) -> &'static str {
        match self {
            Self::Request => "JSON_INVALID_FORMAT",
            Self::Response => "JSON_INVALID_RESPONSE_FORMAT",
            Self::MessageRequest => "JSON_INVALID_MESSAGE_REQUEST_FORMAT",
            Self::MessageResponse => "JSON_INVALID_MESSAGE_RESPONSE_FORMAT",
        }
    }

    pub fn key(self, kind: FailureKind) -> &'static str {
        match kind {
            FailureKind::Payload => self.payload_key(),
            FailureKind::Format => self.format_key(),
        }
    }

    /// Whether straight-respond mode lets failures through in this phase.
    ///
    /// Client requests are always enforced.
    pub fn allows_straight_respond(self) -> bool {
        !matches!(self, Self::Request)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Request => "request",
            Self::Response => "response",
            Self::MessageRequest => "message_request",
            Self::MessageResponse => "message_response",
        }
    }
}

impl fmt::Display for HttpPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [HttpPhase; 4] = [
        HttpPhase::Request,
        HttpPhase::Response,
        HttpPhase::MessageRequest,
        HttpPhase::MessageResponse,
    ];

    #[test]
    fn keys_are_distinct_per_phase() {
        let mut keys: Vec<&str> = ALL
            .iter()
            .flat_map(|phase| [phase.payload_key(), phase.format_key()])
            .collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 8);
    }

    #[test]
    fn response_keys_match_their_kind() {
        assert_eq!(
            HttpPhase::Response.key(FailureKind::Payload),
            "JSON_INVALID_RESPONSE_PAYLOAD"
        );
        assert_eq!(
            HttpPhase::Response.key(FailureKind::Format),
            "JSON_INVALID_RESPONSE_FORMAT"
        );
    }

    #[test]
    fn only_plain_response_fails_with_500() {
        for phase in ALL {
            let expected = if phase == HttpPhase::Response { 500 } else { 400 };
            assert_eq!(phase.status_code(), expected, "{phase}");
        }
        assert!(!HttpPhase::Request.allows_straight_respond());
        assert!(HttpPhase::MessageResponse.allows_straight_respond());
    }
}
