//! Playback output route

use std::fmt;

/// Where playback is heard. Wire codes follow the bridge API: 1 and 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputRoute {
    /// Handset earpiece, or a headset on desktop hosts
    Earpiece,
    /// Loudspeaker, i.e. the default output device
    #[default]
    Speaker,
}

impl OutputRoute {
    pub const fn code(&self) -> u8 {
        match self {
            Self::Earpiece => 1,
            Self::Speaker => 2,
        }
    }

    pub fn from_code(code: f64) -> Option<Self> {
        match code {
            c if c == 1.0 => Some(Self::Earpiece),
            c if c == 2.0 => Some(Self::Speaker),
            _ => None,
        }
    }
}

impl fmt::Display for OutputRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Earpiece => write!(f, "earpiece"),
            Self::Speaker => write!(f, "speaker"),
        }
    }
}
