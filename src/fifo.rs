//! FIFO reset/arm sequencing.

use std::{
    ops::{Deref, DerefMut},
    thread,
    time::Duration,
};

use log::debug;

use crate::{
    layout::{RegisterLayout, control, enable},
    region::Registers,
};

/// Minimum quiescence after a FIFO reset before output may be re-enabled.
/// The device gives no completion signal, so this is a plain sleep.
pub const SETTLE_DELAY: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy)]
pub struct FifoController {
    control: usize,
    enable: usize,
}

impl FifoController {
    pub fn new(layout: &RegisterLayout) -> Self {
        Self {
            control: layout.control,
            enable: layout.enable,
        }
    }

    /// Disables, resets and re-enables the FIFO, optionally starting it.
    ///
    /// The returned guard gives access to the registers while armed and
    /// disables the FIFO again when dropped, whatever happened in between.
    pub fn reset_and_arm<'r, R: Registers + ?Sized>(
        &self,
        regs: &'r mut R,
        start_immediately: bool,
    ) -> ArmedFifo<'r, R> {
        regs.write_u32(self.enable, enable::OFF);
        debug!("FIFO disabled");
        regs.write_u32(self.control, control::RESET);
        debug!("FIFO reset");
        thread::sleep(SETTLE_DELAY);
        regs.write_u32(self.enable, enable::ON);
        debug!("FIFO enabled");
        if start_immediately {
            regs.write_u32(self.control, control::START);
            debug!("acquisition started");
        }

        ArmedFifo {
            regs,
            enable: self.enable,
        }
    }
}

/// Registers of a device whose FIFO is enabled.
pub struct ArmedFifo<'r, R: Registers + ?Sized> {
    regs: &'r mut R,
    enable: usize,
}

impl<R: Registers + ?Sized> Deref for ArmedFifo<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        &*self.regs
    }
}

impl<R: Registers + ?Sized> DerefMut for ArmedFifo<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut *self.regs
    }
}

impl<R: Registers + ?Sized> Drop for ArmedFifo<'_, R> {
    fn drop(&mut self) {
        self.regs.write_u32(self.enable, enable::OFF);
        debug!("FIFO disabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        layout::ACQUISITION,
        sim::{Access, SimulatedDevice},
    };

    fn writes(dev: &SimulatedDevice) -> Vec<(usize, u32)> {
        dev.writes().map(|(offset, value, _)| (offset, value)).collect()
    }

    #[test]
    fn arm_sequence() {
        let mut dev = SimulatedDevice::new(ACQUISITION.len);
        let fifo = FifoController::new(&ACQUISITION);

        drop(fifo.reset_and_arm(&mut dev, false));

        assert_eq!(
            writes(&dev),
            [
                (0x24, 0),
                (0x00, control::RESET),
                (0x24, 1),
                (0x24, 0),
            ]
        );
    }

    #[test]
    fn start_immediately_writes_start_after_enable() {
        let mut dev = SimulatedDevice::new(ACQUISITION.len);
        let fifo = FifoController::new(&ACQUISITION);

        {
            let armed = fifo.reset_and_arm(&mut dev, true);
            assert_eq!(armed.accesses().len(), 4);
        }

        assert_eq!(
            writes(&dev),
            [
                (0x24, 0),
                (0x00, 0b100),
                (0x24, 1),
                (0x00, 0b010),
                (0x24, 0),
            ]
        );
    }

    #[test]
    fn enable_waits_for_settle_delay() {
        let mut dev = SimulatedDevice::new(ACQUISITION.len);
        drop(FifoController::new(&ACQUISITION).reset_and_arm(&mut dev, false));

        let times: Vec<_> = dev.writes().map(|(_, _, at)| at).collect();
        assert!(times[2].duration_since(times[1]) >= SETTLE_DELAY);
    }

    #[test]
    fn teardown_runs_when_armed_scope_unwinds() {
        let mut dev = SimulatedDevice::new(ACQUISITION.len);
        let fifo = FifoController::new(&ACQUISITION);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _armed = fifo.reset_and_arm(&mut dev, false);
            panic!("sampling failed");
        }));
        assert!(result.is_err());

        let last = dev.accesses().last().cloned();
        assert!(matches!(last, Some(Access::Write { offset: 0x24, value: 0, .. })));
    }
}
