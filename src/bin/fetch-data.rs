use clap::{Arg, ArgMatches, Command, value_parser};
use rp_fifo_capture::{
    Error,
    block::fetch,
    layout::{BANKS, MAP_SIZE, bank_base},
    region::{DEV_MEM, DeviceRegion},
    sink::{self, OutputMode},
};
use std::{path::PathBuf, process::ExitCode};

fn cli() -> Command {
    Command::new("fetch-data")
        .about("Read consecutive words from a block-memory bank")
        .arg(
            Arg::new("count")
                .value_parser(value_parser!(usize))
                .help("Number of words to read"),
        )
        .arg(
            Arg::new("bank")
                .value_parser(value_parser!(u8))
                .default_value("0")
                .help(format!("Memory bank (0-{})", BANKS - 1)),
        )
        .arg(
            Arg::new("type")
                .short('t')
                .long("type")
                .value_parser(|s: &str| s.parse::<OutputMode>())
                .default_value("console")
                .help("Output: console (0), memory then file (1) or file stream (2)"),
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
}

fn run(matches: &ArgMatches, count: usize) -> Result<(), Error> {
    let bank = *matches.get_one::<u8>("bank").unwrap();
    let mode = *matches.get_one::<OutputMode>("type").unwrap();
    let output = matches.get_one::<PathBuf>("output").unwrap();
    let device = matches.get_one::<PathBuf>("device").unwrap();
    let base = bank_base(bank).ok_or(Error::NoSuchBank(bank))?;

    let mut region = DeviceRegion::open(device, base, MAP_SIZE)?;
    let mut sink = sink::open(mode, output, count as u64)?;
    fetch(&mut region, count, sink.as_mut())?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let matches = cli().get_matches();
    let Some(&count) = matches.get_one::<usize>("count") else {
        println!("You must supply at least one argument!");
        return ExitCode::SUCCESS;
    };

    match run(&matches, count) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("fetch-data: {e}");
            e.exit_code()
        }
    }
}
