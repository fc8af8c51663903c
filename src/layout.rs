//! Register tables of the acquisition peripheral.
//!
//! Offsets are byte offsets into a mapped window. Each table is checked
//! against its window size at compile time, so every offset the core touches
//! is known to be in range before a single register is accessed.

/// Size of every mapped window.
pub const MAP_SIZE: usize = 262_144;

/// Number of physical data registers (stream slots).
pub const MAX_STREAMS: usize = 5;

/// Number of block-memory banks readable with a plain fetch.
pub const BANKS: u8 = 5;

/// Control register bit patterns
pub mod control {
    /// Start acquisition without waiting for an external trigger
    pub const START: u32 = 1 << 1;
    /// Force a hardware reset of the FIFO
    pub const RESET: u32 = 1 << 2;
}

/// FIFO output enable register values
pub mod enable {
    pub const OFF: u32 = 0;
    pub const ON: u32 = 1;
}

/// Register map of one device variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterLayout {
    pub name: &'static str,
    /// Physical base address of the window
    pub base: u64,
    /// Window length in bytes
    pub len: usize,
    pub control: usize,
    pub enable: usize,
    /// Data registers, slot 0 first
    pub data: [usize; MAX_STREAMS],
    /// Register fed by `write-file`
    pub write_data: usize,
}

impl RegisterLayout {
    /// Whether every register of the table lies inside the window.
    pub const fn fits(&self) -> bool {
        let mut i = 0;
        while i < MAX_STREAMS {
            if !fits(self.data[i], self.len) {
                return false;
            }
            i += 1;
        }
        fits(self.control, self.len) && fits(self.enable, self.len) && fits(self.write_data, self.len)
    }
}

const fn fits(offset: usize, len: usize) -> bool {
    offset % 4 == 0 && offset + 4 <= len
}

/// FIFO acquisition core.
pub const ACQUISITION: RegisterLayout = RegisterLayout {
    name: "fifo-acquisition",
    base: 0x4000_0000,
    len: MAP_SIZE,
    control: 0x00,
    enable: 0x24,
    data: [0x28, 0x2C, 0x30, 0x34, 0x38],
    write_data: 0x34,
};

const _: () = assert!(ACQUISITION.fits());

/// Physical base of a block-memory bank, `None` past the last bank.
pub const fn bank_base(bank: u8) -> Option<u64> {
    if bank < BANKS {
        Some(0x4200_0000 + bank as u64 * 0x0100_0000)
    } else {
        None
    }
}
