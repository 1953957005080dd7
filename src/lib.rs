/*
MIT License

Copyright (c) 2024 Philipp Schuster

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/
//! Library to extract Tar archives on the fly in `no_std` contexts with zero allocations.
//! If you have a standard environment and need full feature support, I recommend the use of
//! <https://crates.io/crates/tar> instead.
//!
//! The archive is pushed into a [`StreamExtractor`] in chunks of any size, e.g. as it arrives
//! from a network socket or a flash driver. Neither the archive nor a single file has to fit
//! into memory: the extractor only holds one 512 byte block. Directories and regular files are
//! reported to an [`ExtractSink`], which decides what to do with them.
//!
//! The crate is simple and only supports "basic" archives in the classic (pre-POSIX) layout.
//! ustar archives can be read as well, but their additional fields are ignored. This includes
//! the ustar name prefix: an entry whose path is longer than 100 characters is reported with
//! the last part of its path only, without an error. Extensions, such as GNU Longname, PAX
//! headers or sparse files, are not supported. The maximum supported file name length is 100
//! characters. Links, device nodes and FIFOs are recognized but abort the
//! extraction.
//!
//! Any error is fatal. Once an archive turned out to be corrupt, or the sink failed, the
//! extractor refuses further input.

#![cfg_attr(not(test), no_std)]
#![deny(rustdoc::all)]
#![allow(rustdoc::missing_doc_code_examples)]
#![deny(clippy::all)]
#![deny(clippy::missing_const_for_fn)]
#![deny(missing_debug_implementations)]

#[cfg_attr(test, macro_use)]
#[cfg(any(test, feature = "std"))]
extern crate std;

/// Each Archive Entry (either Header or Data Block) is a block of 512 bytes.
pub const BLOCKSIZE: usize = 512;
/// Length of the name field of a header.
pub const NAME_LEN: usize = 100;

mod extractor;
mod header;
mod tar_format_types;

pub use extractor::*;
pub use header::*;
pub use tar_format_types::*;

/// Path of an entry as stored in its header: up to [`NAME_LEN`] bytes, NULL
/// terminated if shorter.
pub type EntryPath = TarFormatString<NAME_LEN>;
