/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    For the full copyright notice, see the lib.rs file.
*/
//! User-supplied snapshot patch specifications.
//!
//! A poke spec has the form `a[-b[-c]],[^+]v`: write `v` to every address
//! from `a` to `b` in steps of `c`, with `^` selecting XOR and `+` selecting
//! ADD instead of a plain write. A move spec is `src,size,dest`. Integer
//! literals may be decimal, `$`-prefixed or `0x`-prefixed hexadecimal.
use core::fmt;

use crate::snapshot::Snapshot;

/// An error in a user-supplied patch specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    MoveNotEnoughArgs(String),
    MoveInvalidInt(String),
    PokeValueMissing(String),
    PokeInvalidValue(String),
    PokeInvalidRange(String),
    InvalidRegister(String),
    InvalidRegisterValue(String),
    InvalidStateName(String),
    InvalidStateValue(String),
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchError::MoveNotEnoughArgs(spec) => {
                write!(f, "Not enough arguments in move spec: '{}'", spec)
            }
            PatchError::MoveInvalidInt(spec) => {
                write!(f, "Invalid integer in move spec: {}", spec)
            }
            PatchError::PokeValueMissing(spec) => {
                write!(f, "Value missing in poke spec: '{}'", spec)
            }
            PatchError::PokeInvalidValue(spec) => {
                write!(f, "Invalid value in poke spec: '{}'", spec)
            }
            PatchError::PokeInvalidRange(spec) => {
                write!(f, "Invalid address range in poke spec: '{}'", spec)
            }
            PatchError::InvalidRegister(spec) => {
                write!(f, "Invalid register: {}", spec)
            }
            PatchError::InvalidRegisterValue(spec) => {
                write!(f, "Cannot parse register value: {}", spec)
            }
            PatchError::InvalidStateName(spec) => {
                write!(f, "Invalid parameter: {}", spec)
            }
            PatchError::InvalidStateValue(spec) => {
                write!(f, "Cannot parse integer: {}", spec)
            }
        }
    }
}

impl std::error::Error for PatchError {}

/// Parses a decimal, `$hex` or `0xhex` integer literal.
pub fn parse_int(text: &str) -> Option<u32> {
    if let Some(hex) = text.strip_prefix('$') {
        u32::from_str_radix(hex, 16).ok()
    }
    else if let Some(hex) = text.strip_prefix("0x") {
        u32::from_str_radix(hex, 16).ok()
    }
    else {
        text.parse().ok()
    }
}

/// Applies a poke spec `a[-b[-c]],[^+]v` to the snapshot.
pub fn poke(snapshot: &mut Snapshot, spec: &str) -> Result<(), PatchError> {
    let (addr_part, value_part) = spec.split_once(',')
        .ok_or_else(|| PatchError::PokeValueMissing(spec.to_string()))?;
    enum Op { Set, Xor, Add }
    let (op, value_text) = match value_part.as_bytes().first() {
        Some(b'^') => (Op::Xor, &value_part[1..]),
        Some(b'+') => (Op::Add, &value_part[1..]),
        _ => (Op::Set, value_part)
    };
    let value = parse_int(value_text)
        .ok_or_else(|| PatchError::PokeInvalidValue(spec.to_string()))? as u8;
    let mut range = [None; 3];
    for (i, part) in addr_part.splitn(3, '-').enumerate() {
        range[i] = Some(parse_int(part)
            .ok_or_else(|| PatchError::PokeInvalidRange(spec.to_string()))?);
    }
    let first = range[0].unwrap() as usize;
    let last = range[1].map_or(first, |a| a as usize);
    let step = range[2].map_or(1, |s| s as usize);
    if step == 0 {
        return Err(PatchError::PokeInvalidRange(spec.to_string()));
    }
    let mut addr = first;
    while addr <= last {
        let old = snapshot.peek(addr);
        snapshot.poke(addr, match op {
            Op::Set => value,
            Op::Xor => old ^ value,
            Op::Add => old.wrapping_add(value)
        });
        addr += step;
    }
    Ok(())
}

/// Applies a move spec `src,size,dest` to the snapshot.
pub fn move_block(snapshot: &mut Snapshot, spec: &str) -> Result<(), PatchError> {
    let parts: Vec<&str> = spec.splitn(3, ',').collect();
    if parts.len() < 3 {
        return Err(PatchError::MoveNotEnoughArgs(spec.to_string()));
    }
    let mut values = [0usize; 3];
    for (value, part) in values.iter_mut().zip(parts.iter().copied()) {
        *value = parse_int(part)
            .ok_or_else(|| PatchError::MoveInvalidInt(spec.to_string()))? as usize;
    }
    let [src, size, dest] = values;
    snapshot.move_block(src, size, dest);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_literals() {
        assert_eq!(parse_int("16384"), Some(16384));
        assert_eq!(parse_int("$4000"), Some(0x4000));
        assert_eq!(parse_int("0x4000"), Some(0x4000));
        assert_eq!(parse_int("40g0"), None);
        assert_eq!(parse_int(""), None);
    }

    #[test]
    fn poke_single_address() {
        let mut snapshot = Snapshot::new();
        poke(&mut snapshot, "32768,255").unwrap();
        assert_eq!(snapshot.peek(32768), 255);
    }

    #[test]
    fn poke_address_range_with_step() {
        let mut snapshot = Snapshot::new();
        poke(&mut snapshot, "$8000-$8008-4,100").unwrap();
        assert_eq!(snapshot.peek(0x8000), 100);
        assert_eq!(snapshot.peek(0x8004), 100);
        assert_eq!(snapshot.peek(0x8008), 100);
        assert_eq!(snapshot.peek(0x8002), 0);
    }

    #[test]
    fn poke_xor_and_add() {
        let mut snapshot = Snapshot::new();
        snapshot.poke(30000, 0b1010);
        poke(&mut snapshot, "30000,^255").unwrap();
        assert_eq!(snapshot.peek(30000), 0b1111_0101);
        poke(&mut snapshot, "30000,+12").unwrap();
        assert_eq!(snapshot.peek(30000), 0b1111_0101u8.wrapping_add(12));
    }

    #[test]
    fn poke_errors() {
        let mut snapshot = Snapshot::new();
        assert_eq!(poke(&mut snapshot, "30000").unwrap_err().to_string(),
                   "Value missing in poke spec: '30000'");
        assert_eq!(poke(&mut snapshot, "30000,x").unwrap_err().to_string(),
                   "Invalid value in poke spec: '30000,x'");
        assert_eq!(poke(&mut snapshot, "x,1").unwrap_err().to_string(),
                   "Invalid address range in poke spec: 'x,1'");
    }

    #[test]
    fn move_copies_a_block() {
        let mut snapshot = Snapshot::new();
        snapshot.write_block(30000, &[1, 2, 3]);
        move_block(&mut snapshot, "30000,3,40000").unwrap();
        assert_eq!(&snapshot.as_slice()[40000..40003], &[1, 2, 3]);
    }

    #[test]
    fn move_errors() {
        let mut snapshot = Snapshot::new();
        assert_eq!(move_block(&mut snapshot, "1,2").unwrap_err().to_string(),
                   "Not enough arguments in move spec: '1,2'");
        assert_eq!(move_block(&mut snapshot, "1,2,z").unwrap_err().to_string(),
                   "Invalid integer in move spec: 1,2,z");
    }
}
