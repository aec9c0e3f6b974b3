/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    For the full copyright notice, see the lib.rs file.
*/
//! The **Z80** snapshot file format, versions 1 to 3, for 48K snapshots.
//!
//! A version 1 file is a 30 byte header followed by the 48 KiB RAM dump,
//! optionally RLE compressed and terminated by `00 ED ED 00`. Versions 2
//! and 3 extend the header (the extension length at offset 30 distinguishes
//! them) and store the RAM as three independently compressed 16 KiB pages.
pub mod common;
mod compress;
mod decompress;
mod loader;
mod saver;

pub use common::{Flags1, Flags2, Z80Header, Z80Version, REGISTER_NAMES};
pub use compress::compress;
pub use decompress::decompress;
pub use loader::load_z80;
pub use saver::save_z80;
