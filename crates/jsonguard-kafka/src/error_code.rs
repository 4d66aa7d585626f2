use std::fmt;

/// A Kafka protocol error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ErrorCode(i16);

impl ErrorCode {
    pub const NONE: Self = Self(0);
    /// Message contents do not match their CRC or schema.
    pub const CORRUPT_MESSAGE: Self = Self(2);
    /// The broker refused a record it considers invalid.
    pub const INVALID_RECORD: Self = Self(87);

    pub const fn from_code(code: i16) -> Self {
        Self(code)
    }

    pub const fn code(self) -> i16 {
        self.0
    }

    pub fn is_error(self) -> bool {
        self != Self::NONE
    }

    /// Protocol name, when the code is one this crate knows.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::NONE => Some("NONE"),
            Self::CORRUPT_MESSAGE => Some("CORRUPT_MESSAGE"),
            Self::INVALID_RECORD => Some("INVALID_RECORD"),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "UNKNOWN ({})", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(ErrorCode::NONE.code(), 0);
        assert_eq!(ErrorCode::CORRUPT_MESSAGE.code(), 2);
        assert_eq!(ErrorCode::INVALID_RECORD.code(), 87);
        assert!(!ErrorCode::default().is_error());
        assert!(ErrorCode::INVALID_RECORD.is_error());
    }

    #[test]
    fn display_names_unknown_codes() {
        assert_eq!(
            ErrorCode::CORRUPT_MESSAGE.to_string(),
            "CORRUPT_MESSAGE (2)"
        );
        assert_eq!(ErrorCode::from_code(99).to_string(), "UNKNOWN (99)");
    }
}
