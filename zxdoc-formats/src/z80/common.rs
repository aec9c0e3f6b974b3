/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    For the full copyright notice, see the lib.rs file.
*/
//! The **Z80** header in its raw byte form, with typed accessors and the
//! register and hardware state patching operations.
use bitflags::bitflags;

use crate::patch::{parse_int, PatchError};

/// The length of a version 1 header.
pub const HEADER_V1_LEN: usize = 30;
/// The extension lengths distinguishing versions 2 and 3.
pub const HEADER_EX_V2_LEN: usize = 23;
pub const HEADER_EX_V3_LEN: usize = 54;
pub const HEADER_EX_V3X_LEN: usize = 55;

/// The version 1 compressed memory terminator.
pub const MEMORY_V1_TERM: &[u8] = &[0, 0xED, 0xED, 0];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Z80Version { V1, V2, V3 }

bitflags! {
    /// Header byte 12.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Flags1: u8 {
        const R_HIGH_BIT     = 0b0000_0001;
        const BORDER_COLOR   = 0b0000_1110;
        const BASIC_SAMROM   = 0b0001_0000;
        const MEM_COMPRESSED = 0b0010_0000;
    }
}

bitflags! {
    /// Header byte 29.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Flags2: u8 {
        const INTR_MODE_MASK   = 0b0000_0011;
        const ISSUE2_EMULATION = 0b0000_0100;
        const DOUBLE_INTERRUPT = 0b0000_1000;
        const VIDEO_SYNC       = 0b0011_0000;
        const JOYSTICK_MODEL   = 0b1100_0000;
    }
}

impl From<u8> for Flags1 {
    fn from(mut byte: u8) -> Self {
        // A version 1 quirk: 255 means flags byte 1.
        if byte == u8::max_value() {
            byte = 1;
        }
        Flags1::from_bits_truncate(byte)
    }
}

impl Flags1 {
    pub fn is_mem_compressed(self) -> bool {
        self.intersects(Flags1::MEM_COMPRESSED)
    }

    pub fn border_color(self) -> u8 {
        (self & Flags1::BORDER_COLOR).bits() >> 1
    }
}

impl Flags2 {
    pub fn interrupt_mode(self) -> u8 {
        (self & Flags2::INTR_MODE_MASK).bits()
    }
}

/// Every name accepted by a register spec, in order.
pub const REGISTER_NAMES: &[&str] = &[
    "^a", "^b", "^bc", "^c", "^d", "^de", "^e", "^f", "^h", "^hl", "^l",
    "a", "b", "bc", "c", "d", "de", "e", "f", "h", "hl",
    "i", "ix", "iy", "l", "pc", "r", "sp",
];

/// Byte offset and width of a register within the version 1 header layout.
/// `pc` moves to the header extension in versions 2 and 3.
fn register_offset(name: &str) -> Option<(usize, usize)> {
    Some(match name {
        "a" => (0, 1),
        "f" => (1, 1),
        "bc" => (2, 2),
        "c" => (2, 1),
        "b" => (3, 1),
        "hl" => (4, 2),
        "l" => (4, 1),
        "h" => (5, 1),
        "pc" => (6, 2),
        "sp" => (8, 2),
        "i" => (10, 1),
        "r" => (11, 1),
        "de" => (13, 2),
        "e" => (13, 1),
        "d" => (14, 1),
        "^bc" => (15, 2),
        "^c" => (15, 1),
        "^b" => (16, 1),
        "^de" => (17, 2),
        "^e" => (17, 1),
        "^d" => (18, 1),
        "^hl" => (19, 2),
        "^l" => (19, 1),
        "^h" => (20, 1),
        "^a" => (21, 1),
        "^f" => (22, 1),
        "iy" => (23, 2),
        "ix" => (25, 2),
        _ => return None
    })
}

/// A **Z80** header kept as raw bytes: 30 of them for version 1, 32 plus the
/// extension for versions 2 and 3.
#[derive(Debug, Clone)]
pub struct Z80Header {
    version: Z80Version,
    data: Vec<u8>,
}

impl Z80Header {
    pub(crate) fn new(version: Z80Version, data: Vec<u8>) -> Self {
        Z80Header { version, data }
    }

    pub fn version(&self) -> Z80Version {
        self.version
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn flags1(&self) -> Flags1 {
        Flags1::from(self.data[12])
    }

    pub(crate) fn set_mem_compressed(&mut self) {
        self.data[12] = (Flags1::from(self.data[12]) | Flags1::MEM_COMPRESSED).bits();
    }

    pub fn flags2(&self) -> Flags2 {
        Flags2::from_bits_truncate(self.data[29])
    }

    pub fn pc(&self) -> u16 {
        let offset = match self.version {
            Z80Version::V1 => 6,
            _ => 32
        };
        u16::from_le_bytes([self.data[offset], self.data[offset + 1]])
    }

    /// Applies a register spec `name=value`. Shadow registers use the `^`
    /// prefix; names are case insensitive.
    pub fn set_register(&mut self, spec: &str) -> Result<(), PatchError> {
        let lowered = spec.to_ascii_lowercase();
        let (name, value_text) = lowered.split_once('=')
            .ok_or_else(|| PatchError::InvalidRegister(spec.to_string()))?;
        let (offset, size) = match (name, self.version) {
            ("pc", Z80Version::V2) | ("pc", Z80Version::V3) => (32, 2),
            _ => register_offset(name)
                .ok_or_else(|| PatchError::InvalidRegister(spec.to_string()))?
        };
        let value = parse_int(value_text)
            .ok_or_else(|| PatchError::InvalidRegisterValue(spec.to_string()))?;
        let [lsb, msb] = (value as u16).to_le_bytes();
        self.data[offset] = lsb;
        if size == 2 {
            self.data[offset + 1] = msb;
        }
        Ok(())
    }

    /// Applies a hardware state spec `name=value`: `border` (screen border
    /// colour), `iff` (interrupt flip-flop) or `im` (interrupt mode).
    pub fn set_state(&mut self, spec: &str) -> Result<(), PatchError> {
        let lowered = spec.to_ascii_lowercase();
        let (name, value_text) = lowered.split_once('=')
            .ok_or_else(|| PatchError::InvalidStateName(spec.to_string()))?;
        let value = parse_int(value_text)
            .ok_or_else(|| PatchError::InvalidStateValue(spec.to_string()))?;
        match name {
            "iff" => {
                self.data[27] = value as u8;
                self.data[28] = value as u8;
            }
            "im" => {
                self.data[29] = self.data[29] & !Flags2::INTR_MODE_MASK.bits()
                              | (value as u8 & Flags2::INTR_MODE_MASK.bits());
            }
            "border" => {
                self.data[12] = self.data[12] & !Flags1::BORDER_COLOR.bits()
                              | ((value as u8 & 7) << 1);
            }
            _ => return Err(PatchError::InvalidStateName(spec.to_string()))
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v1_header() -> Z80Header {
        Z80Header::new(Z80Version::V1, vec![0; HEADER_V1_LEN])
    }

    #[test]
    fn register_specs_set_header_bytes() {
        let mut header = v1_header();
        header.set_register("hl=$8001").unwrap();
        assert_eq!(&header.as_slice()[4..6], &[0x01, 0x80]);
        header.set_register("H=255").unwrap();
        assert_eq!(header.as_slice()[5], 255);
        header.set_register("^de=513").unwrap();
        assert_eq!(&header.as_slice()[17..19], &[1, 2]);
        header.set_register("pc=30000").unwrap();
        assert_eq!(header.pc(), 30000);
    }

    #[test]
    fn pc_lives_in_the_extension_for_v2() {
        let mut header = Z80Header::new(Z80Version::V2,
                                        vec![0; 32 + HEADER_EX_V2_LEN]);
        header.set_register("pc=$1234").unwrap();
        assert_eq!(&header.as_slice()[32..34], &[0x34, 0x12]);
        assert_eq!(header.pc(), 0x1234);
        assert_eq!(header.as_slice()[6], 0);
    }

    #[test]
    fn register_spec_errors() {
        let mut header = v1_header();
        assert_eq!(header.set_register("xy=1").unwrap_err().to_string(),
                   "Invalid register: xy=1");
        assert_eq!(header.set_register("hl").unwrap_err().to_string(),
                   "Invalid register: hl");
        assert_eq!(header.set_register("hl=nope").unwrap_err().to_string(),
                   "Cannot parse register value: hl=nope");
    }

    #[test]
    fn state_specs() {
        let mut header = v1_header();
        header.set_state("border=5").unwrap();
        assert_eq!(header.flags1().border_color(), 5);
        header.set_state("iff=1").unwrap();
        assert_eq!(&header.as_slice()[27..29], &[1, 1]);
        header.set_state("im=2").unwrap();
        assert_eq!(header.flags2().interrupt_mode(), 2);
        assert_eq!(header.set_state("colour=1").unwrap_err().to_string(),
                   "Invalid parameter: colour=1");
        assert_eq!(header.set_state("im=x").unwrap_err().to_string(),
                   "Cannot parse integer: im=x");
    }

    #[test]
    fn flags1_from_255_is_flags_byte_1() {
        assert_eq!(Flags1::from(255), Flags1::R_HIGH_BIT);
    }

    #[test]
    fn register_names_match_the_offset_table() {
        for name in REGISTER_NAMES {
            if *name != "pc" {
                assert!(register_offset(name).is_some(), "missing: {}", name);
            }
        }
        assert_eq!(REGISTER_NAMES.len(), 28);
    }
}
