//! In-memory stand-in for the acquisition peripheral.
//!
//! Data registers can be preloaded with a queue of values that successive
//! reads pop, the way the hardware FIFO drains. Every access is recorded in
//! order with a timestamp.

use std::{
    collections::{HashMap, VecDeque},
    time::Instant,
};

use crate::region::Registers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Read { offset: usize, value: u32 },
    Write { offset: usize, value: u32, at: Instant },
}

#[derive(Debug, Default)]
pub struct SimulatedDevice {
    len: usize,
    registers: HashMap<usize, u32>,
    queued: HashMap<usize, VecDeque<u32>>,
    accesses: Vec<Access>,
}

impl SimulatedDevice {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            ..Default::default()
        }
    }

    /// Queues values returned by successive reads of `offset`. Once drained
    /// the register reads as its last written value (or 0).
    pub fn with_samples(mut self, offset: usize, values: impl IntoIterator<Item = u32>) -> Self {
        self.queued.entry(offset).or_default().extend(values);
        self
    }

    /// Current register value, without recording an access.
    pub fn register(&self, offset: usize) -> u32 {
        self.registers.get(&offset).copied().unwrap_or(0)
    }

    pub fn accesses(&self) -> &[Access] {
        &self.accesses
    }

    pub fn reads(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.accesses.iter().filter_map(|access| match *access {
            Access::Read { offset, value } => Some((offset, value)),
            Access::Write { .. } => None,
        })
    }

    pub fn writes(&self) -> impl Iterator<Item = (usize, u32, Instant)> + '_ {
        self.accesses.iter().filter_map(|access| match *access {
            Access::Write { offset, value, at } => Some((offset, value, at)),
            Access::Read { .. } => None,
        })
    }

    fn check(&self, offset: usize) {
        assert!(
            offset % 4 == 0 && offset + 4 <= self.len,
            "register offset {offset:#x} outside the {:#x} byte window",
            self.len
        );
    }
}

impl Registers for SimulatedDevice {
    fn window_len(&self) -> usize {
        self.len
    }

    fn read_u32(&mut self, offset: usize) -> u32 {
        self.check(offset);
        let value = match self.queued.get_mut(&offset).and_then(VecDeque::pop_front) {
            Some(value) => value,
            None => self.register(offset),
        };
        self.accesses.push(Access::Read { offset, value });
        value
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        self.check(offset);
        self.registers.insert(offset, value);
        self.accesses.push(Access::Write {
            offset,
            value,
            at: Instant::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_reads_drain_in_order() {
        let mut dev = SimulatedDevice::new(64).with_samples(0x28, [7, 8]);
        dev.write_u32(0x28, 1);
        assert_eq!(dev.read_u32(0x28), 7);
        assert_eq!(dev.read_u32(0x28), 8);
        assert_eq!(dev.read_u32(0x28), 1);
        assert_eq!(dev.read_u32(0x2C), 0);
        assert_eq!(dev.reads().count(), 4);
        assert_eq!(dev.writes().count(), 1);
    }

    #[test]
    #[should_panic(expected = "outside the")]
    fn bounds_match_the_real_region() {
        SimulatedDevice::new(64).read_u32(64);
    }
}
