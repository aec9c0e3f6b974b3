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
//! A recursive text-macro expansion engine for ZX Spectrum software documentation.
//!
//! Documentation source may embed `#MACRO` invocations that are expanded to
//! literal text at build time. The engine provides looping and conditional
//! macros (`#FOR`, `#FOREACH`, `#IF`, `#MAP`), integer formatting (`#EVAL`,
//! `#CHR`, `#SPACE`), memory-image introspection and mutation (`#PEEK`,
//! `#POKES`) over a 64 KiB [`Memory`] image, a save/restore snapshot stack
//! (`#PUSHS`/`#POPS`), verbatim blocks (`#HTML`) and user-registered
//! callbacks (`#CALL`).
//!
//! Macro parameters may be bracketed arithmetic expressions and may contain
//! further, recursively expanded macros in any position. See [`Expander`]
//! for the entry point.
pub mod eval;
pub mod expand;
pub mod memory;
mod params;

pub use expand::{CallArg, Expander};
pub use eval::EvalError;
pub use memory::{EmptyStackError, Memory};

use core::fmt;

/// An error reported by [`Expander::expand`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    /// A `#` marker followed by an uppercase name that matches no known macro.
    UnknownMacro(String),
    /// A macro handler rejected its parameter text.
    Macro { name: &'static str, message: String },
}

impl ExpandError {
    pub(crate) fn new(name: &'static str, message: impl Into<String>) -> Self {
        ExpandError::Macro { name, message: message.into() }
    }
}

impl fmt::Display for ExpandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpandError::UnknownMacro(name) => {
                write!(f, "Found unknown macro: #{}", name)
            }
            ExpandError::Macro { name, message } => {
                write!(f, "Error while parsing #{} macro: {}", name, message)
            }
        }
    }
}

impl std::error::Error for ExpandError {}
