//! Stream slot selection.

use std::{fmt, str::FromStr};

use crate::{
    error::Error,
    layout::{MAX_STREAMS, RegisterLayout},
};

/// Bit set of active stream slots; bit `k` selects slot `k`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamMask(u8);

impl StreamMask {
    pub const NONE: StreamMask = StreamMask(0);
    pub const ALL: StreamMask = StreamMask((1 << MAX_STREAMS) - 1);

    pub fn new(bits: u32) -> Result<Self, Error> {
        if bits > Self::ALL.0 as u32 {
            return Err(Error::InvalidStreamMask(bits));
        }
        Ok(Self(bits as u8))
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Adds `slot` to the set.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is not below [`MAX_STREAMS`].
    pub const fn with(self, slot: usize) -> Self {
        assert!(slot < MAX_STREAMS, "no such stream slot");
        Self(self.0 | 1 << slot)
    }

    pub const fn contains(self, slot: usize) -> bool {
        slot < MAX_STREAMS && self.0 & (1 << slot) != 0
    }

    /// Samples emitted per tick.
    pub const fn factor(self) -> u32 {
        self.0.count_ones()
    }

    /// Active slots in ascending order.
    pub fn slots(self) -> impl Iterator<Item = usize> {
        (0..MAX_STREAMS).filter(move |&slot| self.contains(slot))
    }
}

impl fmt::Display for StreamMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#07b}", self.0)
    }
}

impl FromStr for StreamMask {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bits = parse_u32(s).ok_or_else(|| Error::InvalidNumber(s.to_owned()))?;
        Self::new(bits)
    }
}

/// Parses a `0x`, `0b` or decimal integer literal.
pub fn parse_u32(s: &str) -> Option<u32> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        u32::from_str_radix(bin, 2).ok()
    } else {
        s.parse().ok()
    }
}

/// Data register offsets of the active slots, in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveStreams {
    offsets: Vec<usize>,
}

impl ActiveStreams {
    pub fn select(mask: StreamMask, layout: &RegisterLayout) -> Self {
        Self {
            offsets: mask.slots().map(|slot| layout.data[slot]).collect(),
        }
    }

    pub fn factor(&self) -> u32 {
        self.offsets.len() as u32
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }
}
