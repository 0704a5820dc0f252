// Licensed under the Apache-2.0 license

//! Kit Protocol error types

use core::fmt;

pub type ParseResult<T> = Result<T, ParseError>;

/// Failures while turning a `K[V]` token string into a command.
///
/// Any of these aborts the whole message; no partially parsed command is
/// ever handed to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Message longer than the transport buffer
    MessageTooLong(usize),

    /// Text remains but no `[` follows it
    MissingOpenBracket { offset: usize },

    /// `[` without a matching `]`
    MissingCloseBracket { offset: usize },

    /// `[` with nothing in front of it
    EmptyTag { offset: usize },

    /// Tag character outside `g c s l d`
    UnknownTag(u8),

    /// Odd number of digits or a non-hex character
    InvalidHex { tag: u8 },

    /// Decoded value has the wrong number of bytes for its tag
    FieldLength { tag: u8, bytes: usize },

    /// `l` token asks for more words than the DMA buffers hold
    WordCountTooLarge(u32),

    /// `d` token without a preceding non-zero `l`
    DataBeforeLength,

    /// `d` token byte count is not `l * 4`
    DataLengthMismatch { expected: usize, actual: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MessageTooLong(len) => write!(f, "Message too long: {} bytes", len),
            ParseError::MissingOpenBracket { offset } => {
                write!(f, "Missing '[' after offset {}", offset)
            }
            ParseError::MissingCloseBracket { offset } => {
                write!(f, "Missing ']' for '[' at offset {}", offset)
            }
            ParseError::EmptyTag { offset } => write!(f, "Empty token tag at offset {}", offset),
            ParseError::UnknownTag(tag) => write!(f, "Unknown token tag '{}'", *tag as char),
            ParseError::InvalidHex { tag } => {
                write!(f, "Invalid hex parameter for token '{}'", *tag as char)
            }
            ParseError::FieldLength { tag, bytes } => write!(
                f,
                "Token '{}' has invalid length ({} bytes)",
                *tag as char, bytes
            ),
            ParseError::WordCountTooLarge(words) => {
                write!(f, "Data word count {} exceeds buffer capacity", words)
            }
            ParseError::DataBeforeLength => write!(f, "Data token before length token"),
            ParseError::DataLengthMismatch { expected, actual } => write!(
                f,
                "Data length mismatch (#data {} != #length {})",
                actual, expected
            ),
        }
    }
}

/// Failures while assembling a message from HID reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// A complete message is still waiting to be drained
    MessagePending,

    /// Delimiter not seen before the buffer filled; the partial message is dropped
    Overflow,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::MessagePending => write!(f, "Previous message not yet released"),
            FrameError::Overflow => write!(f, "Message buffer overflow"),
        }
    }
}
