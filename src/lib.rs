/*
    ZXDOC is a ZX Spectrum development toolkit.

    ZXDOC is free software: you can redistribute it and/or modify it under
    the terms of the GNU Lesser General Public License as published by the
    Free Software Foundation, either version 3 of the License, or (at your
    option) any later version.

    ZXDOC is distributed in the hope that it will be useful, but WITHOUT ANY
    WARRANTY; without even the implied warranty of MERCHANTABILITY or
    FITNESS FOR A PARTICULAR PURPOSE. See the GNU Lesser General Public
    License for more details.
*/
//! The ZXDOC facade crate.
//!
//! Re-exports the documentation macro expansion engine ([`macros`]) and the
//! **Z80** snapshot codec and patching primitives ([`formats`]) that the
//! `snapmod` utility is built from.
pub use zxdoc_formats as formats;
pub use zxdoc_macros as macros;

pub use zxdoc_formats::{PatchError, Snapshot};
pub use zxdoc_macros::{ExpandError, Expander};
