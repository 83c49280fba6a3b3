//! Print a packed bytecode word: `opcode | flags << 10 | value << 18`.
//!
//! ```text
//! $ makeopv 0x2a 1 3
//! 0x000c042a
//! ```

use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;

use propmap::{FLAGS_SHIFT, VALUE_SHIFT, encode_opv};

#[derive(Parser, Debug)]
#[command(name = "makeopv", version)]
#[command(about = "Pack an opcode, flags and value into a bytecode word")]
struct Args {
    /// Opcode (decimal, 0x.., 0o.. or 0b..)
    #[arg(value_parser = parse_c_int)]
    opcode: u32,
    /// Flags
    #[arg(value_parser = parse_c_int)]
    flags: u32,
    /// Value
    #[arg(value_parser = parse_c_int)]
    value: u32,
}

/// Parse an integer literal with an optional `0x`, `0o` or `0b` prefix.
fn parse_c_int(s: &str) -> Result<u32, String> {
    let digits = s.replace('_', "");
    let (radix, body) = match digits.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0x") => (16, &digits[2..]),
        Some("0o") => (8, &digits[2..]),
        Some("0b") => (2, &digits[2..]),
        _ => (10, digits.as_str()),
    };
    if body.is_empty() || body.starts_with(['+', '-']) {
        return Err(format!("'{}' is not a number (e.g. 10, 0x10)", s));
    }
    u32::from_str_radix(body, radix)
        .map_err(|e| format!("'{}' is not a valid 32-bit number: {}", s, e))
}

/// Pack the fields, refusing results that would lose bits.
fn pack(opcode: u32, flags: u32, value: u32) -> Result<u32, String> {
    let wide =
        u64::from(opcode) | (u64::from(flags) << FLAGS_SHIFT) | (u64::from(value) << VALUE_SHIFT);
    if wide > u64::from(u32::MAX) {
        return Err(format!("0x{:x} does not fit in 32 bits", wide));
    }
    Ok(encode_opv(opcode, flags, value))
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
    };

    match pack(args.opcode, args.flags, args.value) {
        Ok(word) => {
            println!("0x{:08x}", word);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
