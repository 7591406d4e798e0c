use std::{
    collections::VecDeque,
    convert::Infallible,
    env,
    io::{self, Read as _},
    process::ExitCode,
};

use clap::Parser;
use embedded_hal_nb::serial::{ErrorType, Read};
use log::{LevelFilter, Log, Metadata, Record};
use stwbc2_monitor::{Monitor, Telemetry};

#[derive(Parser, Debug)]
#[command(name = "stwbc2-monitor")]
#[command(version)]
#[command(
    about = "Replay a captured STWBC2 serial stream from stdin and print every decoded monitor message.",
    long_about = None,
    after_help = "Diagnostics go to stderr, level from RUST_LOG.\n\nExamples:\n  stwbc2-monitor < capture.bin\n  echo '54 b3 00' | stwbc2-monitor --hex"
)]
struct Cli {
    /// Read whitespace separated hex bytes instead of raw bytes
    #[arg(long)]
    hex: bool,
}

#[derive(Debug, PartialEq)]
enum HexError {
    NotUtf8 { valid_up_to: usize },
    BadToken(String),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger();

    let mut input = Vec::new();
    if let Err(e) = io::stdin().read_to_end(&mut input) {
        eprintln!("error: reading stdin: {}", e);
        return ExitCode::FAILURE;
    }
    let bytes = if cli.hex {
        match parse_hex(&input) {
            Ok(b) => b,
            Err(HexError::NotUtf8 { valid_up_to }) => {
                eprintln!("error: hex input is not valid UTF-8 after byte {}", valid_up_to);
                return ExitCode::FAILURE;
            }
            Err(HexError::BadToken(token)) => {
                eprintln!("error: not a hex byte: {:?}", token);
                return ExitCode::FAILURE;
            }
        }
    } else {
        input
    };

    let mut rx = ReadBuffer::from_iter(bytes.into_iter());
    let mut monitor = Monitor::new();
    loop {
        match monitor.poll(&mut rx) {
            Ok(Some(t)) => print_telemetry(t),
            Ok(None) => {}
            Err(nb::Error::WouldBlock) => break,
            Err(nb::Error::Other(e)) => match e {},
        }
    }
    log::info!("{} monitor messages decoded", monitor.updates());
    ExitCode::SUCCESS
}

fn print_telemetry(t: &Telemetry) {
    println!(
        "state={:?}(0x{:02x}) freq={}Hz ce={} duty={:.2} vbridge={:.3}V prx={:.3}W vin={:.3}V",
        t.charger_state(),
        t.state,
        t.frequency,
        t.control_error,
        t.duty_cycle,
        t.bridge_voltage,
        t.rx_power,
        t.input_voltage
    );
}

fn parse_hex(text: &[u8]) -> Result<Vec<u8>, HexError> {
    let text = std::str::from_utf8(text).map_err(|e| HexError::NotUtf8 {
        valid_up_to: e.valid_up_to(),
    })?;
    text.split_whitespace()
        .map(|tok| {
            let digits = tok.trim_start_matches("0x");
            u8::from_str_radix(digits, 16).map_err(|_| HexError::BadToken(tok.to_string()))
        })
        .collect()
}

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logger() {
    let level = env::var("RUST_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Warn);
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

/// Serial receiver backed by bytes already in memory.
#[derive(Debug)]
struct ReadBuffer(pub VecDeque<u8>);

impl ReadBuffer {
    fn from_iter(data: impl Iterator<Item = u8>) -> ReadBuffer {
        let q = VecDeque::from_iter(data);
        ReadBuffer(q)
    }
}

impl ErrorType for ReadBuffer {
    type Error = Infallible;
}

impl Read for ReadBuffer {
    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.0.pop_front().ok_or(nb::Error::WouldBlock)
    }
}
