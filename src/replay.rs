//! Command log encoding and deterministic replay.

// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc64fast::Digest;
use std::io::Cursor;

use crate::config::{KernelConfig, LOG_MAGIC, LOG_VERSION, STAKE_SLOTS};
use crate::error::{KernelError, Result};
use crate::state::command::Command;
use crate::state::kernel::VotePowerKernel;
use crate::verify::kernel_state_hash;

/// Log header (20 bytes)
/// [Magic: 4][Version: u32][StakeSlots: u32][CommandCount: u64]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogHeader {
    pub version: u32,
    pub stake_slots: u32,
    pub command_count: u64,
}

impl LogHeader {
    pub const SIZE: usize = 20;

    pub fn read(buf: &[u8]) -> Result<(Self, &[u8])> {
        if buf.len() < Self::SIZE {
            return Err(KernelError::InvalidLog("truncated header"));
        }
        if &buf[0..4] != LOG_MAGIC {
            return Err(KernelError::InvalidLog("bad magic"));
        }

        let mut cursor = Cursor::new(&buf[4..Self::SIZE]);
        let header = Self {
            version: read_u32(&mut cursor)?,
            stake_slots: read_u32(&mut cursor)?,
            command_count: cursor
                .read_u64::<LittleEndian>()
                .map_err(|_| KernelError::InvalidLog("truncated header"))?,
        };
        Ok((header, &buf[Self::SIZE..]))
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(LOG_MAGIC);
        // Writes into a Vec cannot fail.
        let _ = out.write_u32::<LittleEndian>(self.version);
        let _ = out.write_u32::<LittleEndian>(self.stake_slots);
        let _ = out.write_u64::<LittleEndian>(self.command_count);
    }
}

fn read_u32(cursor: &mut Cursor<&[u8]>) -> Result<u32> {
    cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| KernelError::InvalidLog("truncated header"))
}

fn checksum(body: &[u8]) -> u64 {
    let mut digest = Digest::new();
    digest.write(body);
    digest.sum64()
}

/// Encodes `commands` as `[Header][bincode Command...][CRC64: u64]`.
pub fn encode_log(commands: &[Command]) -> Result<Vec<u8>> {
    let config = bincode::config::standard();
    let mut body = Vec::new();
    for cmd in commands {
        let bytes = bincode::serde::encode_to_vec(cmd, config)
            .map_err(|e| KernelError::Decode(e.to_string()))?;
        body.extend_from_slice(&bytes);
    }

    let mut out = Vec::with_capacity(LogHeader::SIZE + body.len() + 8);
    LogHeader {
        version: LOG_VERSION,
        stake_slots: STAKE_SLOTS as u32,
        command_count: commands.len() as u64,
    }
    .write(&mut out);
    out.extend_from_slice(&body);
    let _ = out.write_u64::<LittleEndian>(checksum(&body));
    Ok(out)
}

/// Validates header and checksum, then decodes every command.
pub fn decode_log(bytes: &[u8]) -> Result<(LogHeader, Vec<Command>)> {
    let (header, rest) = LogHeader::read(bytes)?;
    if header.version != LOG_VERSION {
        return Err(KernelError::InvalidLog("unsupported version"));
    }
    if header.stake_slots != STAKE_SLOTS as u32 {
        return Err(KernelError::InvalidLog("stake slot capacity mismatch"));
    }
    if rest.len() < 8 {
        return Err(KernelError::InvalidLog("missing checksum"));
    }

    let (body, trailer) = rest.split_at(rest.len() - 8);
    let expected = u64::from_le_bytes([
        trailer[0], trailer[1], trailer[2], trailer[3], trailer[4], trailer[5], trailer[6], trailer[7],
    ]);
    let found = checksum(body);
    if expected != found {
        return Err(KernelError::ChecksumMismatch { expected, found });
    }

    let config = bincode::config::standard();
    let mut commands = Vec::new();
    let mut slice = body;
    while !slice.is_empty() {
        let (cmd, read): (Command, usize) = bincode::serde::decode_from_slice(slice, config)
            .map_err(|e| KernelError::Decode(e.to_string()))?;
        commands.push(cmd);
        slice = &slice[read..];
    }

    if commands.len() as u64 != header.command_count {
        return Err(KernelError::InvalidLog("command count mismatch"));
    }
    Ok((header, commands))
}

/// Applies `commands` to a fresh kernel, stopping at the first failure.
pub fn replay(commands: &[Command], config: KernelConfig) -> Result<VotePowerKernel> {
    let mut state = VotePowerKernel::new(config);
    for (i, cmd) in commands.iter().enumerate() {
        if let Err(e) = state.apply(cmd) {
            tracing::error!(index = i, command = cmd.command_type(), error = %e, "replay failed");
            return Err(e);
        }
    }
    tracing::debug!(commands = commands.len(), position = state.position(), "replay complete");
    Ok(state)
}

/// Replays an encoded log from empty state and returns the final state hash.
pub fn replay_and_hash(log_bytes: &[u8]) -> Result<[u8; 32]> {
    let (_, commands) = decode_log(log_bytes)?;
    let state = replay(&commands, KernelConfig::default())?;
    Ok(kernel_state_hash(&state))
}
