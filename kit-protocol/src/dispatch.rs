// Licensed under the Apache-2.0 license

//! Command dispatch
//!
//! Routes a parsed command to its VSM handler and folds the HSM result code
//! into the Kit Protocol status. Every handler writes a little-endian response
//! that starts with the HSM result code:
//!
//! | command        | response                                         |
//! |----------------|--------------------------------------------------|
//! | INPUT_DATA     | `[rc]`                                           |
//! | OUTPUT_DATA    | `[rc][payload bytes][payload]`                   |
//! | DELETE_SLOT    | `[rc]`                                           |
//! | GET_SLOT_INFO  | `[rc][slot size][meta0][meta1][meta2][meta3]`    |

use crate::command::{CommandHeader, CommandResponse, Operands, ParsedCommand};
use crate::config::KitConfig;
use crate::hsm::{HsmDevice, VsInput};
use hsm_mbox_common::{
    is_reserved_slot, CmdResultCode, CommandGroup, KitStatus, VsMetaData, VsSlotType, VsmCommand,
    BYTES_PER_WORD, VSS_META_WORDS,
};
use log::{error, info, warn};
use zerocopy::IntoBytes;

/// A write must carry more than the metadata block's worth of words.
pub const MIN_INPUT_DATA_WORDS: usize = VSS_META_WORDS + 2;

/// Handler output: the HSM result code and the number of response bytes written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handled {
    pub result_code: CmdResultCode,
    pub len: usize,
}

/// Type alias for command handler function
pub type CommandHandlerFn =
    fn(&mut dyn HsmDevice, &mut Operands<'_>, &mut [u8]) -> Result<Handled, KitStatus>;

/// Get the handler for a (group, command) pair.
///
/// # Returns
/// * `Some(handler)` - The handler function for the command
/// * `None` - If the pair is not routable
pub fn get_command_handler(group: CommandGroup, command: u8) -> Option<CommandHandlerFn> {
    if group != CommandGroup::Vsm {
        return None;
    }
    match VsmCommand::from(command) {
        VsmCommand::InputData => Some(write_slot),
        VsmCommand::OutputData => Some(read_slot),
        VsmCommand::DeleteSlot => Some(delete_slot),
        VsmCommand::GetSlotInfo => Some(slot_info),
        VsmCommand::Unknown(_) => None,
    }
}

/// Name used in log messages.
pub fn get_command_name(group: CommandGroup, command: u8) -> Option<&'static str> {
    if group != CommandGroup::Vsm {
        return None;
    }
    match VsmCommand::from(command) {
        VsmCommand::InputData => Some("VSM_INPUT_DATA"),
        VsmCommand::OutputData => Some("VSM_OUTPUT_DATA"),
        VsmCommand::DeleteSlot => Some("VSM_DELETE_SLOT"),
        VsmCommand::GetSlotInfo => Some("VSM_GET_SLOT_INFO"),
        VsmCommand::Unknown(_) => None,
    }
}

/// Routes parsed commands to the HSM.
///
/// Holds no per-command state; the buffers travel in the [`ParsedCommand`].
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    config: KitConfig,
}

impl Dispatcher {
    pub fn new(config: KitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KitConfig {
        &self.config
    }

    /// Execute `cmd` against `hsm`.
    ///
    /// The caller is responsible for checking that the HSM is ready.
    pub fn dispatch<'a>(
        &self,
        hsm: &mut dyn HsmDevice,
        cmd: ParsedCommand<'a>,
    ) -> CommandResponse<'a> {
        let (mut operands, response) = cmd.into_parts();
        let header = operands.header;

        let (Some(handler), Some(name)) = (
            get_command_handler(header.group, header.command),
            get_command_name(header.group, header.command),
        ) else {
            warn!(
                "HSM command not valid: group {:#04x} command {:#04x}",
                header.group as u8, header.command
            );
            return CommandResponse::status_only(KitStatus::CommandNotValid);
        };

        info!("{} COMMAND", name);

        if let Err(status) = self.check_preconditions(&header) {
            warn!("{} rejected: {}", name, status);
            return CommandResponse::status_only(status);
        }

        match handler(hsm, &mut operands, response) {
            Ok(handled) => {
                let status = if handled.result_code.is_ok() {
                    KitStatus::Success
                } else {
                    error!("{} failed: {}", name, handled.result_code);
                    KitStatus::ExecutionError
                };
                let response: &'a [u8] = response;
                CommandResponse::new(status, Some(handled.result_code), &response[..handled.len])
            }
            Err(status) => {
                error!("{} failed: {}", name, status);
                CommandResponse::status_only(status)
            }
        }
    }

    fn check_preconditions(&self, header: &CommandHeader) -> Result<(), KitStatus> {
        let command = VsmCommand::from(header.command);

        if command == VsmCommand::InputData
            && (header.data_word_count as usize) < MIN_INPUT_DATA_WORDS
        {
            warn!(
                "Data word count {} below minimum {}",
                header.data_word_count, MIN_INPUT_DATA_WORDS
            );
            return Err(KitStatus::InvalidParam);
        }

        if self.config.reject_reserved_slots
            && matches!(command, VsmCommand::InputData | VsmCommand::DeleteSlot)
            && is_reserved_slot(header.slot_number)
        {
            warn!("Slot {} is reserved", header.slot_number);
            return Err(KitStatus::InvalidParam);
        }

        Ok(())
    }
}

fn put_word(response: &mut [u8], index: usize, value: u32) -> Result<(), KitStatus> {
    let offset = index * BYTES_PER_WORD;
    response
        .get_mut(offset..offset + BYTES_PER_WORD)
        .ok_or(KitStatus::BufferTooSmall)?
        .copy_from_slice(&value.to_le_bytes());
    Ok(())
}

fn write_slot(
    hsm: &mut dyn HsmDevice,
    operands: &mut Operands<'_>,
    response: &mut [u8],
) -> Result<Handled, KitStatus> {
    let words = operands.input.len();
    let input = VsInput {
        meta: VsMetaData::raw((words * BYTES_PER_WORD) as u32),
        data: operands.input,
    };

    let rsp = hsm.vsm_input_data(operands.header.slot_number, &input);
    put_word(response, 0, rsp.result_code.into())?;
    Ok(Handled {
        result_code: rsp.result_code,
        len: BYTES_PER_WORD,
    })
}

fn read_slot(
    hsm: &mut dyn HsmDevice,
    operands: &mut Operands<'_>,
    response: &mut [u8],
) -> Result<Handled, KitStatus> {
    let slot = operands.header.slot_number;

    let mut meta = VsMetaData::default();
    let info = hsm.vsm_get_slot_info(slot, &mut meta);
    if info.result_code == CmdResultCode::E_VSEMPTY {
        warn!("HSM slot {} is empty", slot);
        put_word(response, 0, info.result_code.into())?;
        put_word(response, 1, 0)?;
        return Ok(Handled {
            result_code: info.result_code,
            len: 2 * BYTES_PER_WORD,
        });
    }
    if !info.result_code.is_ok() {
        // The output command still runs; its result code is the one reported.
        warn!("Slot info for slot {} failed: {}", slot, info.result_code);
    }

    let slot_size = info.result_words().first().copied().unwrap_or(0);
    let requested = match meta.vs_header.slot_type() {
        VsSlotType::Raw => {
            if meta.data_specific != slot_size {
                warn!(
                    "Raw meta bytes ({:#x}) != slot size bytes ({:#x})",
                    meta.data_specific, slot_size
                );
            }
            meta.data_specific as usize / BYTES_PER_WORD + VSS_META_WORDS
        }
        _ => slot_size as usize / BYTES_PER_WORD,
    };
    let requested = requested.min(operands.output.len());

    let rsp = hsm.vsm_output_data(slot, requested, operands.output);
    let words = if rsp.result_code.is_ok() {
        rsp.result_words()
            .first()
            .map_or(0, |&w| w as usize)
            .min(requested)
    } else {
        0
    };

    let payload = operands.output[..words].as_bytes();
    let header_len = 2 * BYTES_PER_WORD;
    response
        .get_mut(header_len..header_len + payload.len())
        .ok_or(KitStatus::BufferTooSmall)?
        .copy_from_slice(payload);
    put_word(response, 0, rsp.result_code.into())?;
    put_word(response, 1, payload.len() as u32)?;

    Ok(Handled {
        result_code: rsp.result_code,
        len: header_len + payload.len(),
    })
}

fn delete_slot(
    hsm: &mut dyn HsmDevice,
    operands: &mut Operands<'_>,
    response: &mut [u8],
) -> Result<Handled, KitStatus> {
    let rsp = hsm.vsm_delete_slot(operands.header.slot_number);
    put_word(response, 0, rsp.result_code.into())?;
    Ok(Handled {
        result_code: rsp.result_code,
        len: BYTES_PER_WORD,
    })
}

fn slot_info(
    hsm: &mut dyn HsmDevice,
    operands: &mut Operands<'_>,
    response: &mut [u8],
) -> Result<Handled, KitStatus> {
    let mut meta = VsMetaData::default();
    let rsp = hsm.vsm_get_slot_info(operands.header.slot_number, &mut meta);
    let slot_size = match rsp.result_words() {
        [size] => *size,
        _ => 0,
    };

    put_word(response, 0, rsp.result_code.into())?;
    put_word(response, 1, slot_size)?;
    for (i, word) in meta.to_words().into_iter().enumerate() {
        put_word(response, 2 + i, word)?;
    }

    Ok(Handled {
        result_code: rsp.result_code,
        len: (2 + VSS_META_WORDS) * BYTES_PER_WORD,
    })
}
