// Licensed under the Apache-2.0 license

//! Command context and command/response views
//!
//! One [`CommandContext`] owns the DMA word buffers and the response buffer
//! for the whole process. Parsing borrows it mutably and the resulting
//! [`ParsedCommand`] carries that borrow into dispatch, whose
//! [`CommandResponse`] in turn borrows the response bytes. A second command
//! therefore cannot be parsed while the previous response is still alive.

use crate::config::{MAX_DATA_WORDS, MAX_RESPONSE_BYTES};
use crate::error::ParseResult;
use crate::parser::parse_tokens;
use hsm_mbox_common::{CmdResultCode, CommandGroup, KitStatus, VsmCommand};
use zerocopy::IntoBytes;

/// Scalar fields of a parsed Kit Protocol command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHeader {
    pub group: CommandGroup,
    pub command: u8,
    pub slot_number: u8,
    pub data_word_count: u16,
}

impl Default for CommandHeader {
    fn default() -> Self {
        Self {
            group: CommandGroup::Invalid,
            command: VsmCommand::INVALID,
            slot_number: 0,
            data_word_count: 0,
        }
    }
}

/// Buffers reused across command cycles.
pub struct CommandContext {
    input: [u32; MAX_DATA_WORDS],
    output: [u32; MAX_DATA_WORDS],
    response: [u8; MAX_RESPONSE_BYTES],
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandContext {
    pub const fn new() -> Self {
        Self {
            input: [0; MAX_DATA_WORDS],
            output: [0; MAX_DATA_WORDS],
            response: [0; MAX_RESPONSE_BYTES],
        }
    }

    /// Fill the DMA buffers with a recognizable byte ramp so stale data is
    /// easy to spot in a memory dump.
    pub fn prime_buffers(&mut self) {
        for buf in [&mut self.input, &mut self.output] {
            for (i, byte) in buf.as_mut_bytes().iter_mut().enumerate() {
                *byte = (i % 0xFF) as u8;
            }
        }
    }

    /// Parse `text` into this context, starting a new command cycle.
    ///
    /// On failure nothing is handed on and the output and response buffers
    /// are left as they were.
    pub fn parse(&mut self, text: &[u8]) -> ParseResult<ParsedCommand<'_>> {
        let header = parse_tokens(text, &mut self.input)?;
        Ok(ParsedCommand {
            header,
            context: self,
        })
    }

    pub fn output_words(&self) -> &[u32] {
        &self.output
    }

    pub fn response_bytes(&self) -> &[u8] {
        &self.response
    }
}

/// A validated command bound to the context it was parsed into.
pub struct ParsedCommand<'a> {
    header: CommandHeader,
    context: &'a mut CommandContext,
}

impl<'a> ParsedCommand<'a> {
    pub fn header(&self) -> &CommandHeader {
        &self.header
    }

    pub fn group(&self) -> CommandGroup {
        self.header.group
    }

    pub fn command(&self) -> u8 {
        self.header.command
    }

    pub fn slot_number(&self) -> u8 {
        self.header.slot_number
    }

    pub fn data_word_count(&self) -> u16 {
        self.header.data_word_count
    }

    /// Payload words decoded from the `d` token.
    pub fn input_words(&self) -> &[u32] {
        &self.context.input[..self.header.data_word_count as usize]
    }

    pub fn input_bytes(&self) -> &[u8] {
        self.input_words().as_bytes()
    }

    pub(crate) fn into_parts(self) -> (Operands<'a>, &'a mut [u8]) {
        let context = self.context;
        let words = self.header.data_word_count as usize;
        (
            Operands {
                header: self.header,
                input: &context.input[..words],
                output: &mut context.output,
            },
            &mut context.response,
        )
    }
}

/// What a command handler works on.
pub struct Operands<'a> {
    pub header: CommandHeader,
    pub input: &'a [u32],
    pub output: &'a mut [u32],
}

/// Outcome of one dispatch.
///
/// `status` is the coarse transport status. `result_code` is the detailed
/// HSM code, present whenever the HSM was actually called.
#[derive(Debug, PartialEq, Eq)]
pub struct CommandResponse<'a> {
    pub status: KitStatus,
    pub result_code: Option<CmdResultCode>,
    bytes: &'a [u8],
}

impl<'a> CommandResponse<'a> {
    pub(crate) fn new(
        status: KitStatus,
        result_code: Option<CmdResultCode>,
        bytes: &'a [u8],
    ) -> Self {
        Self {
            status,
            result_code,
            bytes,
        }
    }

    pub(crate) fn status_only(status: KitStatus) -> Self {
        Self::new(status, None, &[])
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn len(&self) -> u16 {
        self.bytes.len() as u16
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
