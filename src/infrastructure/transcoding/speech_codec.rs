//! Speech frame codecs for the AMR container
//!
//! [`SpeechCodec`] turns 20 ms of 8 kHz PCM into one frame payload and back.
//! The bundled [`AdpcmSpeechCodec`] fills MR122-sized payloads with
//! half-rate 3-bit ADPCM; it is not bit-compatible with the 3GPP codec.
//! Its last payload byte is a signature whose low nibble is set. A real
//! MR122 frame pads those four bits with zeros, so AMR-NB files from other
//! encoders are rejected instead of decoded as noise.

use thiserror::Error;

use super::amr::{FrameType, SAMPLES_PER_FRAME};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("frame type {0:?} not supported by this codec")]
    UnsupportedMode(FrameType),

    #[error("payload of {actual} bytes, expected {expected}")]
    PayloadSize { expected: usize, actual: usize },

    #[error("frame was not written by this codec (foreign AMR-NB stream)")]
    ForeignFrame,
}

/// Per-stream frame codec. State carries across frames of one stream.
pub trait SpeechCodec: Send {
    /// Frame type produced by `encode`
    fn frame_type(&self) -> FrameType;

    fn encode(&mut self, pcm: &[i16; SAMPLES_PER_FRAME]) -> Vec<u8>;

    fn decode(
        &mut self,
        frame_type: FrameType,
        payload: &[u8],
    ) -> Result<[i16; SAMPLES_PER_FRAME], CodecError>;
}

const STEP_TABLE: [i32; 89] = [
    7, 8, 9, 10, 11, 12, 13, 14, 16, 17, 19, 21, 23, 25, 28, 31, 34, 37, 41, 45, 50, 55, 60, 66,
    73, 80, 88, 97, 107, 118, 130, 143, 157, 173, 190, 209, 230, 253, 279, 307, 337, 371, 408,
    449, 494, 544, 598, 658, 724, 796, 876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066,
    2272, 2499, 2749, 3024, 3327, 3660, 4026, 4428, 4871, 5358, 5894, 6484, 7132, 7845, 8630,
    9493, 10442, 11487, 12635, 13899, 15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794,
    32767,
];

/// Step index change for each 2-bit magnitude
const INDEX_ADJUST: [i32; 4] = [-1, -1, 1, 2];

const SIGN_BIT: u8 = 0b100;
const CODE_BITS: usize = 3;
const HALF_RATE_SAMPLES: usize = SAMPLES_PER_FRAME / 2;

/// Trailing payload byte of every frame this codec writes
const FRAME_SIGNATURE: u8 = 0x5A;

/// Adaptive predictor shared by encoder and decoder
#[derive(Debug, Default, Clone, Copy)]
struct AdpcmState {
    predictor: i32,
    index: usize,
}

impl AdpcmState {
    fn encode(&mut self, sample: i16) -> u8 {
        let step = STEP_TABLE[self.index];
        let mut diff = i32::from(sample) - self.predictor;
        let mut code = 0u8;
        if diff < 0 {
            code |= SIGN_BIT;
            diff = -diff;
        }
        if diff >= step {
            code |= 0b10;
            diff -= step;
        }
        if diff >= step >> 1 {
            code |= 0b01;
        }

        self.decode(code);
        code
    }

    fn decode(&mut self, code: u8) -> i16 {
        let step = STEP_TABLE[self.index];
        let mut delta = step >> 2;
        if code & 0b10 != 0 {
            delta += step;
        }
        if code & 0b01 != 0 {
            delta += step >> 1;
        }
        if code & SIGN_BIT != 0 {
            delta = -delta;
        }

        self.predictor = (self.predictor + delta).clamp(i16::MIN as i32, i16::MAX as i32);
        let index = self.index as i32 + INDEX_ADJUST[usize::from(code & 0b11)];
        self.index = index.clamp(0, STEP_TABLE.len() as i32 - 1) as usize;
        self.predictor as i16
    }
}

/// Half-rate 3-bit ADPCM in MR122-sized frames
#[derive(Debug, Default)]
pub struct AdpcmSpeechCodec {
    encoder: AdpcmState,
    decoder: AdpcmState,
    /// Last decoded half-rate sample, for interpolation across frames
    previous: i16,
}

impl AdpcmSpeechCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpeechCodec for AdpcmSpeechCodec {
    fn frame_type(&self) -> FrameType {
        FrameType::Mr122
    }

    fn encode(&mut self, pcm: &[i16; SAMPLES_PER_FRAME]) -> Vec<u8> {
        let mut bits = BitWriter::with_capacity(FrameType::Mr122.payload_size());
        for pair in pcm.chunks_exact(2) {
            let mid = ((i32::from(pair[0]) + i32::from(pair[1])) / 2) as i16;
            bits.push(self.encoder.encode(mid), CODE_BITS);
        }
        bits.push(FRAME_SIGNATURE, 8);
        bits.finish(FrameType::Mr122.payload_size())
    }

    fn decode(
        &mut self,
        frame_type: FrameType,
        payload: &[u8],
    ) -> Result<[i16; SAMPLES_PER_FRAME], CodecError> {
        if frame_type != FrameType::Mr122 {
            return Err(CodecError::UnsupportedMode(frame_type));
        }
        if payload.len() != frame_type.payload_size() {
            return Err(CodecError::PayloadSize {
                expected: frame_type.payload_size(),
                actual: payload.len(),
            });
        }
        if payload.last() != Some(&FRAME_SIGNATURE) {
            return Err(CodecError::ForeignFrame);
        }

        let mut pcm = [0i16; SAMPLES_PER_FRAME];
        let mut bits = BitReader::new(payload);
        for k in 0..HALF_RATE_SAMPLES {
            let sample = self.decoder.decode(bits.take(CODE_BITS));
            let between = (i32::from(self.previous) + i32::from(sample)) / 2;
            pcm[2 * k] = between as i16;
            pcm[2 * k + 1] = sample;
            self.previous = sample;
        }
        Ok(pcm)
    }
}

/// MSB-first bit packer
struct BitWriter {
    bytes: Vec<u8>,
    acc: u32,
    filled: usize,
}

impl BitWriter {
    fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            acc: 0,
            filled: 0,
        }
    }

    fn push(&mut self, value: u8, width: usize) {
        self.acc = (self.acc << width) | u32::from(value);
        self.filled += width;
        while self.filled >= 8 {
            self.filled -= 8;
            self.bytes.push((self.acc >> self.filled) as u8);
        }
        self.acc &= (1 << self.filled) - 1;
    }

    /// Flush and zero-pad to `len` bytes
    fn finish(mut self, len: usize) -> Vec<u8> {
        if self.filled > 0 {
            self.bytes.push((self.acc << (8 - self.filled)) as u8);
        }
        self.bytes.resize(len, 0);
        self.bytes
    }
}

struct BitReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn take(&mut self, width: usize) -> u8 {
        let mut value = 0u8;
        for _ in 0..width {
            let byte = self.bytes.get(self.position / 8).copied().unwrap_or(0);
            let bit = (byte >> (7 - self.position % 8)) & 1;
            value = (value << 1) | bit;
            self.position += 1;
        }
        value
    }
}
