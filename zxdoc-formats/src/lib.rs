/*
    This file is part of ZXDOC, a ZX Spectrum development toolkit.

    ZXDOC is free software: you can redistribute it and/or modify it under
    the terms of the GNU Lesser General Public License as published by the
    Free Software Foundation, either version 3 of the License, or (at your
    option) any later version.

    ZXDOC is distributed in the hope that it will be useful, but WITHOUT ANY
    WARRANTY; without even the implied warranty of MERCHANTABILITY or
    FITNESS FOR A PARTICULAR PURPOSE. See the GNU Lesser General Public
    License for more details.
*/
//! **Z80** snapshot file parsing, writing and patching for 48K ZX Spectrum
//! snapshots.
//!
//! [`z80::load_z80`] and [`z80::save_z80`] read and write version 1, 2 and 3
//! **Z80** files, [`Snapshot`] holds the 64 KiB memory image, and [`patch`]
//! applies user-supplied poke, move, register and hardware state
//! specifications to a snapshot before it is written back.
pub mod patch;
pub mod snapshot;
pub mod z80;

pub use patch::PatchError;
pub use snapshot::Snapshot;
