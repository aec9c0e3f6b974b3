/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    For the full copyright notice, see the lib.rs file.
*/
//! The in-memory representation of a 48K snapshot.

/// The size of a single RAM page.
pub const PAGE_SIZE: usize = 0x4000;
/// The full address space, ROM included.
pub const MEMORY_SIZE: usize = 0x10000;

/// A complete 64 KiB memory image.
///
/// Addresses below [`PAGE_SIZE`] are ROM and are never serialized to a
/// snapshot file, but patches may still target them.
#[derive(Clone)]
pub struct Snapshot {
    mem: Box<[u8]>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot { mem: vec![0; MEMORY_SIZE].into_boxed_slice() }
    }
}

impl Snapshot {
    pub fn new() -> Self {
        Snapshot::default()
    }

    /// Creates a snapshot with `ram` placed at `0x4000`. RAM beyond 48 KiB
    /// is ignored; shorter RAM leaves the remainder zeroed.
    pub fn from_ram48(ram: &[u8]) -> Self {
        let mut snapshot = Snapshot::default();
        let len = ram.len().min(MEMORY_SIZE - PAGE_SIZE);
        snapshot.mem[PAGE_SIZE..PAGE_SIZE + len].copy_from_slice(&ram[..len]);
        snapshot
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.mem
    }

    /// The 48 KiB of RAM above the ROM.
    pub fn ram(&self) -> &[u8] {
        &self.mem[PAGE_SIZE..]
    }

    pub fn peek(&self, address: usize) -> u8 {
        self.mem[address % MEMORY_SIZE]
    }

    pub fn poke(&mut self, address: usize, value: u8) {
        self.mem[address % MEMORY_SIZE] = value;
    }

    /// Copies `data` into the image starting at `address`, clamped to the
    /// end of the address space.
    pub fn write_block(&mut self, address: usize, data: &[u8]) {
        let address = address.min(MEMORY_SIZE);
        let len = data.len().min(MEMORY_SIZE - address);
        self.mem[address..address + len].copy_from_slice(&data[..len]);
    }

    /// Moves a block of `size` bytes from `src` to `dest`. Overlapping
    /// ranges copy the original source bytes. Ranges are clamped to the end
    /// of the address space.
    pub fn move_block(&mut self, src: usize, size: usize, dest: usize) {
        let src = src.min(MEMORY_SIZE);
        let size = size.min(MEMORY_SIZE - src);
        let block = self.mem[src..src + size].to_vec();
        self.write_block(dest, &block);
    }
}

impl core::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Snapshot").field("len", &self.mem.len()).finish()
    }
}
