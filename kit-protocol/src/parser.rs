// Licensed under the Apache-2.0 license

//! Kit Protocol token parser
//!
//! A command is a concatenation of `K[V]` tokens where `K` selects the field
//! and `V` is hex text:
//!
//! | tag | field             | decoded bytes |
//! |-----|-------------------|---------------|
//! | `g` | command group     | 1             |
//! | `c` | command id        | 1             |
//! | `s` | slot number       | 1             |
//! | `l` | data word count   | 1..=4, big-endian |
//! | `d` | payload           | exactly `l * 4` |
//!
//! Only the first character of a tag is significant. Tokens may appear in
//! any order except that `d` must follow `l`. The final word count must match
//! the words decoded from `d`; a bare `l`, or an `l` repeated after `d`, is a
//! length mismatch.

use core::fmt;

use crate::command::CommandHeader;
use crate::config::MAX_MESSAGE_LEN;
use crate::error::{ParseError, ParseResult};
use hsm_mbox_common::{CommandGroup, BYTES_PER_WORD};
use log::debug;
use zerocopy::IntoBytes;

const TOKEN_OPEN: u8 = b'[';
const TOKEN_CLOSE: u8 = b']';

/// Largest `l` value, in decoded bytes.
const WORD_COUNT_MAX_BYTES: usize = 4;

/// Parse a Kit Protocol message into a header, decoding any payload into `input`.
///
/// `input` may be written even if a later token fails; the returned header
/// is the only thing that makes its contents meaningful.
pub fn parse_tokens(text: &[u8], input: &mut [u32]) -> ParseResult<CommandHeader> {
    if text.len() > MAX_MESSAGE_LEN {
        return Err(ParseError::MessageTooLong(text.len()));
    }

    let mut header = CommandHeader::default();
    let mut decoded_words = 0;
    let mut pos = 0;

    while pos < text.len() {
        let rest = &text[pos..];
        let open = rest
            .iter()
            .position(|&b| b == TOKEN_OPEN)
            .ok_or(ParseError::MissingOpenBracket { offset: pos })?;
        let close = rest[open + 1..]
            .iter()
            .position(|&b| b == TOKEN_CLOSE)
            .map(|i| open + 1 + i)
            .ok_or(ParseError::MissingCloseBracket { offset: pos + open })?;

        let tag = &rest[..open];
        let value = &rest[open + 1..close];
        let kind = *tag.first().ok_or(ParseError::EmptyTag { offset: pos })?;

        match kind {
            b'g' => header.group = CommandGroup::from(decode_byte(kind, value)?),
            b'c' => header.command = decode_byte(kind, value)?,
            b's' => header.slot_number = decode_byte(kind, value)?,
            b'l' => header.data_word_count = decode_word_count(value, input.len())?,
            b'd' => {
                decoded_words = decode_data(value, header.data_word_count as usize, input)?
            }
            other => return Err(ParseError::UnknownTag(other)),
        }

        if kind != b'd' {
            debug!(
                "HSM Token {} = {}",
                core::str::from_utf8(tag).unwrap_or("?"),
                core::str::from_utf8(value).unwrap_or("?")
            );
        }

        pos += close + 1;
    }

    let expected = header.data_word_count as usize;
    if decoded_words != expected {
        return Err(ParseError::DataLengthMismatch {
            expected: expected * BYTES_PER_WORD,
            actual: decoded_words * BYTES_PER_WORD,
        });
    }

    Ok(header)
}

fn check_hex(tag: u8, value: &[u8]) -> ParseResult<usize> {
    if value.len() % 2 != 0 {
        return Err(ParseError::InvalidHex { tag });
    }
    Ok(value.len() / 2)
}

fn decode_byte(tag: u8, value: &[u8]) -> ParseResult<u8> {
    let bytes = check_hex(tag, value)?;
    if bytes != 1 {
        return Err(ParseError::FieldLength { tag, bytes });
    }
    let mut out = [0u8; 1];
    hex::decode_to_slice(value, &mut out).map_err(|_| ParseError::InvalidHex { tag })?;
    Ok(out[0])
}

fn decode_word_count(value: &[u8], capacity: usize) -> ParseResult<u16> {
    let bytes = check_hex(b'l', value)?;
    if bytes == 0 || bytes > WORD_COUNT_MAX_BYTES {
        return Err(ParseError::FieldLength { tag: b'l', bytes });
    }

    let mut out = [0u8; WORD_COUNT_MAX_BYTES];
    hex::decode_to_slice(value, &mut out[WORD_COUNT_MAX_BYTES - bytes..])
        .map_err(|_| ParseError::InvalidHex { tag: b'l' })?;
    let words = u32::from_be_bytes(out);

    if words as usize > capacity {
        return Err(ParseError::WordCountTooLarge(words));
    }
    u16::try_from(words).map_err(|_| ParseError::WordCountTooLarge(words))
}

/// Decode a payload of exactly `words` words. Returns the number decoded.
fn decode_data(value: &[u8], words: usize, input: &mut [u32]) -> ParseResult<usize> {
    if words == 0 {
        return Err(ParseError::DataBeforeLength);
    }
    let actual = check_hex(b'd', value)?;
    let expected = words * BYTES_PER_WORD;
    if actual != expected {
        return Err(ParseError::DataLengthMismatch { expected, actual });
    }

    let dest = input
        .get_mut(..words)
        .ok_or(ParseError::WordCountTooLarge(words as u32))?;
    hex::decode_to_slice(value, dest.as_mut_bytes())
        .map_err(|_| ParseError::InvalidHex { tag: b'd' })?;
    Ok(words)
}

/// Encode a command in the canonical token order `g c s l d`.
///
/// The `l` and `d` tokens are only written when `data` is non-empty.
pub fn write_command<W: fmt::Write>(
    out: &mut W,
    header: &CommandHeader,
    data: &[u8],
) -> fmt::Result {
    write!(
        out,
        "g[{:02X}]c[{:02X}]s[{:02X}]",
        header.group as u8,
        header.command,
        header.slot_number
    )?;
    if !data.is_empty() {
        write!(out, "l[{:08X}]d[", header.data_word_count)?;
        for byte in data {
            write!(out, "{:02X}", byte)?;
        }
        out.write_char(']')?;
    }
    Ok(())
}
