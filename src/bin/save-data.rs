use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use rp_fifo_capture::{
    Error,
    acquisition::{AcquisitionConfig, acquire},
    layout::ACQUISITION,
    region::{DEV_MEM, DeviceRegion},
    sink::{self, OutputMode},
    streams::StreamMask,
};
use status_line::StatusLine;
use std::{
    fmt::Display,
    path::PathBuf,
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use thread_priority::{ThreadPriority, set_current_thread_priority};

fn cli() -> Command {
    Command::new("save-data")
        .about("Reset the acquisition FIFO and capture up to five data streams")
        .arg(
            Arg::new("samples")
                .short('n')
                .long("samples")
                .value_parser(value_parser!(u64))
                .help("Number of sampling ticks"),
        )
        .arg(
            Arg::new("type")
                .short('t')
                .long("type")
                .value_parser(|s: &str| s.parse::<OutputMode>())
                .default_value("file")
                .help("Output: console (0), memory then file (1) or file stream (2)"),
        )
        .arg(stream_flag("p", 'p', "Capture stream 0"))
        .arg(stream_flag("s", 's', "Capture stream 1"))
        .arg(stream_flag("d", 'd', "Capture stream 2"))
        .arg(
            Arg::new("streams")
                .long("streams")
                .value_parser(|s: &str| s.parse::<StreamMask>())
                .help("Bit mask of streams to capture (0b00000-0b11111), combined with -p/-s/-d"),
        )
        .arg(
            Arg::new("start")
                .short('b')
                .long("start")
                .action(ArgAction::SetTrue)
                .help("Start acquisition immediately after enabling the FIFO"),
        )
        .arg(
            Arg::new("debug")
                .short('f')
                .long("debug")
                .action(ArgAction::SetTrue)
                .help("Report sampling time"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(value_parser!(PathBuf))
                .default_value("SavedData.bin")
                .help("Output file"),
        )
        .arg(
            Arg::new("device")
                .long("device")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEV_MEM)
                .help("Physical memory device"),
        )
        .arg(
            Arg::new("progress")
                .long("progress")
                .action(ArgAction::SetTrue)
                .help("Show a status line while sampling"),
        )
        .arg(
            Arg::new("priority")
                .long("priority")
                .action(ArgAction::SetTrue)
                .help("Raise the sampling thread to maximum priority"),
        )
}

fn stream_flag(id: &'static str, short: char, help: &'static str) -> Arg {
    Arg::new(id).short(short).action(ArgAction::SetTrue).help(help)
}

fn stream_mask(matches: &ArgMatches) -> StreamMask {
    let mut mask = matches
        .get_one::<StreamMask>("streams")
        .copied()
        .unwrap_or_default();
    for (slot, id) in ["p", "s", "d"].into_iter().enumerate() {
        if matches.get_flag(id) {
            mask = mask.with(slot);
        }
    }
    mask
}

#[derive(Clone)]
struct Progress {
    recorded: Arc<AtomicU64>,
    total: u64,
}

impl Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let recorded = self.recorded.load(Ordering::Relaxed);
        write!(
            f,
            "Sampled: {} / {} ticks ({:.01}%)",
            recorded,
            self.total,
            recorded as f64 * 100.0 / self.total.max(1) as f64
        )
    }
}

fn run(matches: &ArgMatches, ticks: u64) -> Result<(), Error> {
    let config = AcquisitionConfig {
        ticks,
        mask: stream_mask(matches),
        output: *matches.get_one::<OutputMode>("type").unwrap(),
        start_immediately: matches.get_flag("start"),
        timing: matches.get_flag("debug"),
    };
    let output = matches.get_one::<PathBuf>("output").unwrap();
    let device = matches.get_one::<PathBuf>("device").unwrap();

    let expected = config.expected_samples()?;
    let mut region = DeviceRegion::open(device, ACQUISITION.base, ACQUISITION.len)?;
    let mut sink = sink::open(config.output, output, expected)?;

    if matches.get_flag("priority") {
        if let Err(e) = set_current_thread_priority(ThreadPriority::Max) {
            log::warn!("cannot raise thread priority: {e:?}");
        }
    }

    let recorded = Arc::new(AtomicU64::new(0));
    let status = matches.get_flag("progress").then(|| {
        StatusLine::new(Progress {
            recorded: recorded.clone(),
            total: config.ticks,
        })
    });

    acquire(&mut region, &ACQUISITION, &config, sink.as_mut(), &recorded, |report| {
        drop(status);
        if config.timing {
            println!("{report}");
        }
    })?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let matches = cli().get_matches();
    let Some(&ticks) = matches.get_one::<u64>("samples") else {
        println!("You must supply the number of samples with -n!");
        return ExitCode::SUCCESS;
    };

    match run(&matches, ticks) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("save-data: {e}");
            e.exit_code()
        }
    }
}
