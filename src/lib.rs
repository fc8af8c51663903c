//! FIFO acquisition for a memory-mapped FPGA peripheral.
//!
//! A run maps the device window ([`region`]), resets and arms the hardware
//! FIFO ([`fifo`]), reads the selected data registers tick by tick
//! ([`streams`], [`acquisition`]) and hands every sample to a [`sink`].

pub mod acquisition;
pub mod block;
pub mod error;
pub mod fifo;
pub mod layout;
pub mod region;
pub mod sim;
pub mod sink;
pub mod streams;

pub use error::Error;
