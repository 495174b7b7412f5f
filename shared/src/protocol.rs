//! Binary wire protocol between server and clients.
//!
//! Every message payload starts with a fixed-width big-endian `u16` command
//! code followed by code-specific fields; all multi-byte integers are
//! big-endian. On the wire each payload is additionally prefixed with a
//! `u32` length so messages survive fragmented or coalesced stream reads.
//! Decoding never panics: short payloads and unknown codes come back as
//! [`ProtocolError`] and the caller drops the message.

use thiserror::Error;

pub const CHANGE_GRID_SIZE: u16 = 0;
pub const CHANGE_GRID_UPDATE_RATE: u16 = 1;
pub const RESET_GRID: u16 = 2;
pub const CHANGE_SURVIVAL_INTERVAL: u16 = 3;
pub const GRID_SNAPSHOT: u16 = 4;
pub const GRID_INITIALIZATION: u16 = 5;
pub const GRID_SET_CELL: u16 = 6;

/// Upper bound on a single framed payload. The largest legal message is an
/// INIT for a 100x100 grid, well under this.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("message too short, {missing} more byte(s) required")]
    Truncated { missing: usize },
    #[error("unknown command code {0}")]
    UnknownCode(u16),
    #[error("frame of {0} bytes exceeds the {MAX_FRAME_LEN} byte limit")]
    FrameTooLarge(usize),
}

/// Full-state payload sent to a client immediately after accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitState {
    pub size: u16,
    pub update_rate_ms: u32,
    pub survival_min: u16,
    pub survival_max: u16,
    pub spawn_percent: u16,
    pub cycle: u32,
    pub snapshot: Vec<u8>,
}

/// A decoded protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ChangeSize(u16),
    ChangeRate(u32),
    Reset(u16),
    ChangeSurvival(u16, u16),
    Snapshot(Vec<u8>),
    Init(InitState),
    SetCell(u32),
}

impl Command {
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Command::ChangeSize(size) => {
                put_u16(&mut out, CHANGE_GRID_SIZE);
                put_u16(&mut out, *size);
            }
            Command::ChangeRate(ms) => {
                put_u16(&mut out, CHANGE_GRID_UPDATE_RATE);
                put_u32(&mut out, *ms);
            }
            Command::Reset(percent) => {
                put_u16(&mut out, RESET_GRID);
                put_u16(&mut out, *percent);
            }
            Command::ChangeSurvival(min, max) => {
                put_u16(&mut out, CHANGE_SURVIVAL_INTERVAL);
                put_u16(&mut out, *min);
                put_u16(&mut out, *max);
            }
            Command::Snapshot(bits) => {
                put_u16(&mut out, GRID_SNAPSHOT);
                out.extend_from_slice(bits);
            }
            Command::Init(init) => {
                put_u16(&mut out, GRID_INITIALIZATION);
                put_u16(&mut out, init.size);
                put_u32(&mut out, init.update_rate_ms);
                put_u16(&mut out, init.survival_min);
                put_u16(&mut out, init.survival_max);
                put_u16(&mut out, init.spawn_percent);
                put_u32(&mut out, init.cycle);
                out.extend_from_slice(&init.snapshot);
            }
            Command::SetCell(index) => {
                put_u16(&mut out, GRID_SET_CELL);
                put_u32(&mut out, *index);
            }
        }
        out
    }

    pub fn decode(payload: &[u8]) -> Result<Command, ProtocolError> {
        let mut reader = Reader::new(payload);
        let code = reader.read_u16()?;

        match code {
            CHANGE_GRID_SIZE => Ok(Command::ChangeSize(reader.read_u16()?)),
            CHANGE_GRID_UPDATE_RATE => Ok(Command::ChangeRate(reader.read_u32()?)),
            RESET_GRID => Ok(Command::Reset(reader.read_u16()?)),
            CHANGE_SURVIVAL_INTERVAL => {
                let min = reader.read_u16()?;
                let max = reader.read_u16()?;
                Ok(Command::ChangeSurvival(min, max))
            }
            GRID_SNAPSHOT => Ok(Command::Snapshot(reader.rest().to_vec())),
            GRID_INITIALIZATION => {
                let size = reader.read_u16()?;
                let update_rate_ms = reader.read_u32()?;
                let survival_min = reader.read_u16()?;
                let survival_max = reader.read_u16()?;
                let spawn_percent = reader.read_u16()?;
                let cycle = reader.read_u32()?;
                Ok(Command::Init(InitState {
                    size,
                    update_rate_ms,
                    survival_min,
                    survival_max,
                    spawn_percent,
                    cycle,
                    snapshot: reader.rest().to_vec(),
                }))
            }
            GRID_SET_CELL => Ok(Command::SetCell(reader.read_u32()?)),
            other => Err(ProtocolError::UnknownCode(other)),
        }
    }
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

/// Cursor over a received payload that reports how many bytes were missing
/// instead of panicking on short input.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.buf.len() - self.pos < n {
            return Err(ProtocolError::Truncated {
                missing: n - (self.buf.len() - self.pos),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u16(&mut self) -> Result<u16, ProtocolError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }
}

/// Prepends the big-endian `u32` length header to a payload.
pub fn frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Reassembles length-prefixed payloads from a stream of reads that may be
/// fragmented or coalesced arbitrarily.
#[derive(Default)]
pub struct FrameAccumulator {
    buf: Vec<u8>,
}

impl FrameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pops the next complete payload, or `Ok(None)` until more bytes
    /// arrive. An oversized length header poisons the stream and the
    /// connection should be closed.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        if self.buf.len() < 4 {
            return Ok(None);
        }
        let len = u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;
        if len > MAX_FRAME_LEN {
            return Err(ProtocolError::FrameTooLarge(len));
        }
        if self.buf.len() < 4 + len {
            return Ok(None);
        }
        let payload = self.buf[4..4 + len].to_vec();
        self.buf.drain(..4 + len);
        Ok(Some(payload))
    }
}
