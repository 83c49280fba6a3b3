//! Print the 22.10 fixed-point encoding of a number.
//!
//! ```text
//! $ makefixed 1.5
//! 0x00000600
//! ```

use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

use propmap::fixed_bits;

#[derive(Parser, Debug)]
#[command(name = "makefixed", version)]
#[command(about = "Encode a number as 22.10 fixed-point")]
struct Args {
    /// Value to encode
    #[arg(value_parser = parse_finite, allow_negative_numbers = true)]
    value: f64,
}

fn parse_finite(s: &str) -> Result<f64, String> {
    match s.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(_) => Err(format!("'{}' is not a finite number", s)),
        Err(_) => Err(format!("'{}' is not a number", s)),
    }
}

fn main() -> ExitCode {
    match Args::try_parse() {
        Ok(args) => {
            println!("0x{:08x}", fixed_bits(args.value));
            ExitCode::SUCCESS
        }
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            ExitCode::SUCCESS
        }
        Err(e) => {
            let _ = e.print();
            ExitCode::FAILURE
        }
    }
}
