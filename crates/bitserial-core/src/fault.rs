use thiserror::Error;

/// Stable execution fault taxonomy.
///
/// Malformed programs never fault: every opcode decodes and every address
/// wraps. Only the console transport can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum FaultCode {
    /// Writing a byte to the console output stream failed.
    #[error("console output stream failed")]
    ConsoleWriteFailed = 0x01,
    /// Reading a byte from the console input stream failed.
    #[error("console input stream failed")]
    ConsoleReadFailed = 0x02,
}

impl FaultCode {
    /// Converts a fault code to its stable byte value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable byte value back into a fault code.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::ConsoleWriteFailed),
            0x02 => Some(Self::ConsoleReadFailed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FaultCode;

    #[test]
    fn stable_code_roundtrip_is_bijective_for_defined_values() {
        for code in 0x01u8..=0x02 {
            let fault = FaultCode::from_u8(code).expect("defined taxonomy code");
            assert_eq!(fault.as_u8(), code);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(FaultCode::from_u8(0x00).is_none());
        assert!(FaultCode::from_u8(0xFF).is_none());
    }

    #[test]
    fn display_names_the_failing_stream() {
        assert_eq!(
            FaultCode::ConsoleWriteFailed.to_string(),
            "console output stream failed"
        );
        assert_eq!(
            FaultCode::ConsoleReadFailed.to_string(),
            "console input stream failed"
        );
    }
}
