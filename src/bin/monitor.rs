use clap::{Arg, ArgMatches, Command, value_parser};
use rp_fifo_capture::{
    Error,
    region::{DEV_MEM, DeviceRegion, Registers},
    streams::parse_u32,
};
use std::{path::PathBuf, process::ExitCode};

const PAGE: u64 = 4096;

fn number(s: &str) -> Result<u32, Error> {
    parse_u32(s).ok_or_else(|| Error::InvalidNumber(s.to_owned()))
}

fn cli() -> Command {
    Command::new("monitor")
        .about("Read or write a single 32-bit register by physical address")
        .arg(
            Arg::new("address")
                .required(true)
                .value_parser(number)
                .help("Physical address (word aligned)"),
        )
        .arg(Arg::new("value").value_parser(number).help("Value to write"))
        .arg(
            Arg::new("device")
                .long("device")
                .value_parser(value_parser!(PathBuf))
                .default_value(DEV_MEM)
                .help("Physical memory device"),
        )
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let address = u64::from(*matches.get_one::<u32>("address").unwrap());
    let device = matches.get_one::<PathBuf>("device").unwrap();
    if address % 4 != 0 {
        return Err(Error::MisalignedAddress(address));
    }

    let base = address - address % PAGE;
    let offset = (address - base) as usize;
    let mut region = DeviceRegion::open(device, base, PAGE as usize)?;

    match matches.get_one::<u32>("value") {
        Some(&value) => region.write_u32(offset, value),
        None => println!("0x{:08x}", region.read_u32(offset)),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let matches = cli().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("monitor: {e}");
            e.exit_code()
        }
    }
}
