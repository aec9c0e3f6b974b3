/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    For the full copyright notice, see the lib.rs file.
*/
//! A 64 KiB memory image addressed modulo 65536.
use core::fmt;

pub const MEMORY_SIZE: usize = 0x10000;

/// The full addressable memory of a 48K Spectrum, ROM included.
#[derive(Clone)]
pub struct Memory {
    bytes: Box<[u8]>,
}

impl Default for Memory {
    fn default() -> Self {
        Memory { bytes: vec![0; MEMORY_SIZE].into_boxed_slice() }
    }
}

impl Memory {
    /// Creates a memory image from an initial dump. Bytes beyond 64 KiB are
    /// ignored; a shorter dump leaves the remainder zeroed.
    pub fn from_bytes(dump: &[u8]) -> Self {
        let mut memory = Memory::default();
        let len = dump.len().min(MEMORY_SIZE);
        memory.bytes[..len].copy_from_slice(&dump[..len]);
        memory
    }

    pub fn peek(&self, address: i64) -> u8 {
        self.bytes[address.rem_euclid(MEMORY_SIZE as i64) as usize]
    }

    pub fn poke(&mut self, address: i64, value: u8) {
        self.bytes[address.rem_euclid(MEMORY_SIZE as i64) as usize] = value;
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memory").field("len", &self.bytes.len()).finish()
    }
}

/// Returned when restoring a memory snapshot from an empty stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyStackError;

impl fmt::Display for EmptyStackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cannot pop snapshot when snapshot stack is empty")
    }
}

impl std::error::Error for EmptyStackError {}
