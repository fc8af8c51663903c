use clap::{Arg, ArgMatches, Command, value_parser};
use rp_fifo_capture::{
    Error,
    block::{load_words, write_all},
    layout::ACQUISITION,
    region::{DEV_MEM, DeviceRegion},
};
use std::{path::PathBuf, process::ExitCode};

fn cli() -> Command {
    Command::new("write-file")
        .about("Feed words from a file into the write-data register")
        .arg(
            Arg::new("count")
                .value_parser(value_parser!(usize))
                .help("Number of words to write"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_parser(value_parser!(PathBuf))
                .default_value("data-to-write.bin")
                .help("Little-endian 32-bit words to write"),
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
    let input = matches.get_one::<PathBuf>("input").unwrap();
    let device = matches.get_one::<PathBuf>("device").unwrap();

    let mut region = DeviceRegion::open(device, ACQUISITION.base, ACQUISITION.len)?;
    let words = load_words(input, count)?;
    write_all(&mut region, ACQUISITION.write_data, &words);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let matches = cli().get_matches();
    let Some(&count) = matches.get_one::<usize>("count") else {
        println!("Need to supply the number of data points to write!");
        return ExitCode::SUCCESS;
    };

    match run(&matches, count) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("write-file: {e}");
            e.exit_code()
        }
    }
}
