//! AMR-NB storage format (RFC 4867, section 5)
//!
//! A file is the magic `#!AMR\n` followed by frames. Each frame is a
//! table-of-contents byte `0 FT(4) Q 00` and a payload whose size depends
//! on the frame type.

use thiserror::Error;

/// File header of single-channel AMR-NB
pub const MAGIC: &[u8] = b"#!AMR\n";

/// PCM samples per frame (20 ms at 8 kHz)
pub const SAMPLES_PER_FRAME: usize = 160;

/// Sample rate of narrowband speech
pub const SAMPLE_RATE: u32 = 8000;

/// Frame types carried in the TOC byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    Mr475,
    Mr515,
    Mr59,
    Mr67,
    Mr74,
    Mr795,
    Mr102,
    Mr122,
    /// Comfort noise
    Sid,
    NoData,
}

impl FrameType {
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Mr475),
            1 => Some(Self::Mr515),
            2 => Some(Self::Mr59),
            3 => Some(Self::Mr67),
            4 => Some(Self::Mr74),
            5 => Some(Self::Mr795),
            6 => Some(Self::Mr102),
            7 => Some(Self::Mr122),
            8 => Some(Self::Sid),
            15 => Some(Self::NoData),
            _ => None,
        }
    }

    pub const fn index(&self) -> u8 {
        match self {
            Self::Mr475 => 0,
            Self::Mr515 => 1,
            Self::Mr59 => 2,
            Self::Mr67 => 3,
            Self::Mr74 => 4,
            Self::Mr795 => 5,
            Self::Mr102 => 6,
            Self::Mr122 => 7,
            Self::Sid => 8,
            Self::NoData => 15,
        }
    }

    /// Payload bytes following the TOC byte
    pub const fn payload_size(&self) -> usize {
        match self {
            Self::Mr475 => 12,
            Self::Mr515 => 13,
            Self::Mr59 => 15,
            Self::Mr67 => 17,
            Self::Mr74 => 19,
            Self::Mr795 => 20,
            Self::Mr102 => 26,
            Self::Mr122 => 31,
            Self::Sid => 5,
            Self::NoData => 0,
        }
    }

    /// TOC byte with the quality bit set
    pub const fn toc(&self) -> u8 {
        (self.index() << 3) | 0x04
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmrError {
    #[error("missing #!AMR header")]
    BadMagic,

    #[error("reserved frame type {index} at byte {offset}")]
    ReservedFrameType { index: u8, offset: usize },

    #[error("truncated frame at byte {offset}")]
    Truncated { offset: usize },
}

/// One stored frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmrFrame<'a> {
    pub frame_type: FrameType,
    pub good_quality: bool,
    pub payload: &'a [u8],
}

/// Split an AMR file into frames
pub fn parse_frames(data: &[u8]) -> Result<Vec<AmrFrame<'_>>, AmrError> {
    let body = data.strip_prefix(MAGIC).ok_or(AmrError::BadMagic)?;
    let mut frames = Vec::with_capacity(body.len() / 32);
    let mut offset = 0;

    while offset < body.len() {
        let toc = body[offset];
        let index = (toc >> 3) & 0x0F;
        let frame_type = FrameType::from_index(index).ok_or(AmrError::ReservedFrameType {
            index,
            offset: offset + MAGIC.len(),
        })?;

        let start = offset + 1;
        let end = start + frame_type.payload_size();
        let payload = body.get(start..end).ok_or(AmrError::Truncated {
            offset: offset + MAGIC.len(),
        })?;

        frames.push(AmrFrame {
            frame_type,
            good_quality: toc & 0x04 != 0,
            payload,
        });
        offset = end;
    }

    Ok(frames)
}

/// Accumulates frames into an AMR file image
#[derive(Debug)]
pub struct AmrWriter {
    bytes: Vec<u8>,
}

impl AmrWriter {
    pub fn new() -> Self {
        Self {
            bytes: MAGIC.to_vec(),
        }
    }

    pub fn push(&mut self, frame_type: FrameType, payload: &[u8]) {
        debug_assert_eq!(payload.len(), frame_type.payload_size());
        self.bytes.push(frame_type.toc());
        self.bytes.extend_from_slice(payload);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl Default for AmrWriter {
    fn default() -> Self {
        Self::new()
    }
}
