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
//! Fixed-width string and number fields as they appear inside a Tar header.

use core::fmt::{Debug, Display, Formatter};
use core::str::{from_utf8, Utf8Error};

/// Base type for strings embedded in a Tar header. The length depends on the
/// context. The content is likely to be ASCII, which is verified by getters,
/// such as [`TarFormatString::as_str`].
///
/// An optionally null terminated string. The contents are either:
/// 1. A fully populated string with no null termination or
/// 2. A partially populated string where the unused bytes are zero.
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct TarFormatString<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> TarFormatString<N> {
    /// Constructor.
    ///
    /// # Panics
    /// Panics of `N` is zero, i.e., the underlying array has no length.
    #[must_use]
    pub const fn new(bytes: [u8; N]) -> Self {
        assert!(N > 0, "array should have at least one element");
        Self { bytes }
    }

    /// True if the is string empty (ignoring NULL bytes).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes[0] == 0
    }

    /// Returns the length of the payload in bytes. This is either the full
    /// capacity `N` or the data until the first NULL byte.
    #[must_use]
    pub fn size(&self) -> usize {
        memchr::memchr(0, &self.bytes).unwrap_or(N)
    }

    /// Returns the payload without terminating or trailing NULL bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[0..self.size()]
    }

    /// Returns a str ref without terminating or intermediate NULL bytes. The
    /// string is truncated at the first NULL byte, in case not the full length
    /// was used.
    ///
    /// # Errors
    /// Returns a [`Utf8Error`] error for invalid strings.
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        from_utf8(self.as_bytes())
    }

    /// Returns the first space-delimited token of the payload. Leading spaces
    /// are skipped. This is necessary to properly parse Tar-style encoded
    /// numbers, as writers pad them with spaces on either side.
    #[must_use]
    pub fn first_token(&self) -> &[u8] {
        let bytes = self.as_bytes().trim_ascii_start();
        let end_index_exclusive = memchr::memchr(b' ', bytes).unwrap_or(bytes.len());
        &bytes[0..end_index_exclusive]
    }
}

impl<const N: usize> Debug for TarFormatString<N> {
    fn fmt(&self, f: &mut Formatter) -> core::fmt::Result {
        write!(
            f,
            "str='{:?}',byte_usage={}/{}",
            self.as_str(),
            self.size(),
            N
        )
    }
}

/// A numeric header field could not be parsed in its radix.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InvalidNumberError;

impl Display for InvalidNumberError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str("header field is not a valid number")
    }
}

impl core::error::Error for InvalidNumberError {}

/// A number with a specified base. Leading and trailing spaces in the string
/// are ignored.
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct TarFormatNumber<const N: usize, const R: u32>(TarFormatString<N>);

impl<const N: usize, const R: u32> TarFormatNumber<N, R> {
    #[must_use]
    pub const fn new(bytes: [u8; N]) -> Self {
        Self(TarFormatString::new(bytes))
    }

    /// Interprets the underlying value as a number of the specified type using
    /// its respective radix. A field without any digits, e.g. one filled with
    /// NULL bytes, is zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying value cannot be parsed as a number
    /// of the specified type and respective radix.
    pub fn as_number<T>(&self) -> Result<T, InvalidNumberError>
    where
        T: num_traits::Num,
    {
        let digits = self.0.first_token();
        if digits.is_empty() {
            return Ok(T::zero());
        }
        let str = from_utf8(digits).map_err(|_| InvalidNumberError)?;
        T::from_str_radix(str, R).map_err(|_| InvalidNumberError)
    }

    /// Returns the underlying [`TarFormatString`].
    #[must_use]
    pub const fn as_inner(&self) -> &TarFormatString<N> {
        &self.0
    }
}

impl<const N: usize, const R: u32> Debug for TarFormatNumber<N, R> {
    fn fmt(&self, f: &mut Formatter) -> core::fmt::Result {
        let raw = from_utf8(self.0.as_bytes());
        match self.as_number::<u64>() {
            Err(e) => write!(f, "{} [{:?}]", e, raw),
            Ok(val) => write!(f, "{} [{:?}]", val, raw),
        }
    }
}

/// An octal number. Leading and trailing spaces in the string are ignored.
pub type TarFormatOctal<const N: usize> = TarFormatNumber<N, 8>;
