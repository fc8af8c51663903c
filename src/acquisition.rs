//! The sampling loop.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, Instant},
};

use log::info;

use crate::{
    error::Error,
    fifo::FifoController,
    layout::RegisterLayout,
    region::Registers,
    sink::{OutputMode, Sink},
    streams::{ActiveStreams, StreamMask},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquisitionConfig {
    /// Sampling ticks; each tick reads every active slot once
    pub ticks: u64,
    pub mask: StreamMask,
    pub output: OutputMode,
    pub start_immediately: bool,
    /// Time the sampling loop and report it
    pub timing: bool,
}

impl AcquisitionConfig {
    /// Samples the run will emit.
    pub fn expected_samples(&self) -> Result<u64, Error> {
        let per_tick = self.mask.factor();
        self.ticks
            .checked_mul(u64::from(per_tick))
            .ok_or(Error::SampleCountOverflow {
                ticks: self.ticks,
                per_tick,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub ticks: u64,
    pub samples: u64,
    /// Wall time of the sampling loop alone, when timing was requested
    pub elapsed: Option<Duration>,
}

impl RunReport {
    pub fn per_tick(&self) -> Option<Duration> {
        let elapsed = self.elapsed?;
        if self.ticks == 0 {
            return Some(Duration::ZERO);
        }
        Some(Duration::from_secs_f64(elapsed.as_secs_f64() / self.ticks as f64))
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.elapsed, self.per_tick()) {
            (Some(elapsed), Some(per_tick)) => write!(
                f,
                "Execution time: {:.3} ms\nTime per read: {:.3} us",
                elapsed.as_secs_f64() * 1e3,
                per_tick.as_secs_f64() * 1e6
            ),
            _ => write!(f, "{} samples in {} ticks", self.samples, self.ticks),
        }
    }
}

/// Reads `ticks` rounds of the active data registers into `sink`.
///
/// Within a tick the registers are read in `streams` order, so the sink sees
/// tick 0 slot-ascending, then tick 1, and so on. `recorded` counts finished
/// ticks for an observer.
pub fn sample<R: Registers + ?Sized>(
    regs: &mut R,
    streams: &ActiveStreams,
    ticks: u64,
    sink: &mut dyn Sink,
    recorded: &AtomicU64,
) -> Result<u64, Error> {
    let mut emitted = 0;
    for _ in 0..ticks {
        for &offset in streams.offsets() {
            sink.accept(regs.read_u32(offset))?;
            emitted += 1;
        }
        recorded.fetch_add(1, Ordering::Relaxed);
    }
    Ok(emitted)
}

/// Runs one complete acquisition: reset and arm the FIFO, sample, disable
/// the FIFO, then commit the sink.
///
/// `sampled` receives the report as soon as the sampling loop completes,
/// before the FIFO is disabled and the sink committed. The FIFO is disabled
/// on every path out of the sampling loop. On error the sink's partial
/// output is discarded.
pub fn acquire<R: Registers + ?Sized>(
    regs: &mut R,
    layout: &RegisterLayout,
    config: &AcquisitionConfig,
    sink: &mut dyn Sink,
    recorded: &AtomicU64,
    sampled: impl FnOnce(&RunReport),
) -> Result<RunReport, Error> {
    let streams = ActiveStreams::select(config.mask, layout);
    let fifo = FifoController::new(layout);
    info!(
        "acquiring {} ticks of streams {} ({} per tick) to {}",
        config.ticks,
        config.mask,
        streams.factor(),
        config.output
    );

    let result = {
        let mut armed = fifo.reset_and_arm(regs, config.start_immediately);
        let start = config.timing.then(Instant::now);
        let result = sample(&mut *armed, &streams, config.ticks, sink, recorded);
        let elapsed = start.map(|start| start.elapsed());
        result.map(|samples| {
            let report = RunReport {
                ticks: config.ticks,
                samples,
                elapsed,
            };
            sampled(&report);
            report
        })
    };

    match result.and_then(|report| sink.finalize().map(|()| report)) {
        Ok(report) => {
            info!("acquired {} samples", report.samples);
            Ok(report)
        }
        Err(e) => {
            sink.discard();
            Err(e)
        }
    }
}
