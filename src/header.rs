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
//! Header of the classic (pre-POSIX, "v7") Tar format. A Tar-archive is a
//! collection of 512-byte sized blocks. An overview of the Tar-like formats
//! can be found here:
//! <https://www.gnu.org/software/tar/manual/html_node/Formats.html#Formats>
//!
//! Only the fields of the classic layout are interpreted. Newer formats, such
//! as ustar, store their additional fields in the trailing padding of the
//! classic layout, which is covered by the checksum but otherwise ignored.
//! That includes the ustar name prefix, so long ustar paths are truncated to
//! the name field.

#![allow(non_upper_case_globals)]

use crate::{InvalidNumberError, TarFormatOctal, TarFormatString, BLOCKSIZE, NAME_LEN};
use core::fmt::{Debug, Display, Formatter};
use core::mem::{offset_of, size_of};

/// Length of the checksum field.
const CKSUM_LEN: usize = 8;

/// The checksum is computed as if the checksum field itself was filled with
/// spaces: `8 * b' '`.
const CKSUM_BIAS: u32 = CKSUM_LEN as u32 * b' ' as u32;

/// Errors that may happen when parsing the [`ModeFlags`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ModeError {
    ParseInt(InvalidNumberError),
    IllegalMode,
}

/// Wrapper around the UNIX file permissions given in octal ASCII.
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct Mode(TarFormatOctal<8>);

impl Mode {
    /// Parses the [`ModeFlags`] from the mode string.
    pub fn to_flags(self) -> Result<ModeFlags, ModeError> {
        let bits = self.0.as_number::<u64>().map_err(ModeError::ParseInt)?;
        ModeFlags::from_bits(bits).ok_or(ModeError::IllegalMode)
    }
}

impl Debug for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(&self.to_flags(), f)
    }
}

/// Header block of the classic Tar format, as written by Unix V7 tar.
///
/// Each entry is started by such a header, that describes the size, the type
/// and the name. After that, the file content stands in chunks of 512 bytes.
/// The number of bytes can be derived from the file size.
///
/// The layout is fixed and byte exact; the struct has an alignment of one and
/// every bit pattern is a valid value.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(C, packed)]
pub struct RawHeader {
    /// Name. NULL padded, but not necessarily NULL terminated.
    pub name: TarFormatString<NAME_LEN>,
    pub mode: Mode,
    pub uid: TarFormatOctal<8>,
    pub gid: TarFormatOctal<8>,
    // confusing; size is stored as ASCII string
    pub size: TarFormatOctal<12>,
    pub mtime: TarFormatOctal<12>,
    pub cksum: TarFormatOctal<CKSUM_LEN>,
    pub typeflag: TypeFlagRaw,
    pub linkname: TarFormatString<NAME_LEN>,
    // padding => to BLOCKSIZE bytes
    pub _pad: [u8; 255],
}

const _: () = assert!(size_of::<RawHeader>() == BLOCKSIZE);
const _: () = assert!(offset_of!(RawHeader, cksum) == 148);
const _: () = assert!(offset_of!(RawHeader, typeflag) == 156);

impl RawHeader {
    /// Interprets a block as header.
    #[must_use]
    pub const fn from_block(block: &[u8; BLOCKSIZE]) -> &Self {
        // SAFETY: `RawHeader` is `repr(C, packed)`, exactly `BLOCKSIZE` bytes
        // large and only consists of byte arrays.
        unsafe { &*block.as_ptr().cast::<Self>() }
    }

    /// Returns the header as the block it was read from.
    #[must_use]
    pub const fn as_block(&self) -> &[u8; BLOCKSIZE] {
        // SAFETY: See `from_block`.
        unsafe { &*(self as *const Self).cast::<[u8; BLOCKSIZE]>() }
    }

    /// A block whose checksum field starts with a NULL byte is a null record.
    /// The end of an archive is marked by (at least) two of them.
    #[must_use]
    pub const fn is_null_record(&self) -> bool {
        // copy out of the packed struct
        let cksum = self.cksum;
        cksum.as_inner().is_empty()
    }

    /// Computes the checksum of the block: the unsigned sum of all bytes,
    /// with the checksum field counted as spaces.
    #[must_use]
    pub fn compute_checksum(&self) -> u32 {
        let block = self.as_block();
        let cksum_begin = offset_of!(RawHeader, cksum);
        let cksum_end = cksum_begin + CKSUM_LEN;
        block[..cksum_begin]
            .iter()
            .chain(&block[cksum_end..])
            .fold(CKSUM_BIAS, |sum, byte| sum + u32::from(*byte))
    }

    /// Validates the header and extracts the fields needed for extraction.
    ///
    /// # Errors
    /// Returns [`HeaderError::BadChecksum`] if the stored checksum does not
    /// match the contents of the block and [`HeaderError::InvalidSize`] if
    /// the size field is not an octal number.
    pub fn decode(&self) -> Result<Record, HeaderError> {
        if self.is_null_record() {
            return Ok(Record::Null);
        }

        let computed = self.compute_checksum();
        let cksum = self.cksum;
        let stored = cksum.as_number::<u32>().ok();
        if stored != Some(computed) {
            return Err(HeaderError::BadChecksum { computed, stored });
        }

        let size = self.size;
        let size = size
            .as_number::<u64>()
            .map_err(|_| HeaderError::InvalidSize)?;

        Ok(Record::Header(DecodedHeader {
            name: self.name,
            size,
            type_flag: self.typeflag,
        }))
    }
}

/// Decodes a complete block. See [`RawHeader::decode`].
///
/// # Errors
/// See [`RawHeader::decode`].
pub fn decode_block(block: &[u8; BLOCKSIZE]) -> Result<Record, HeaderError> {
    RawHeader::from_block(block).decode()
}

/// Outcome of decoding a valid block.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Record {
    /// A header describing the next entry.
    Header(DecodedHeader),
    /// A padding or end-of-archive block.
    Null,
}

/// The parts of a [`RawHeader`] that drive extraction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DecodedHeader {
    pub name: TarFormatString<NAME_LEN>,
    /// Payload length in bytes.
    pub size: u64,
    pub type_flag: TypeFlagRaw,
}

/// Errors of [`RawHeader::decode`]. Both indicate a corrupt archive.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeaderError {
    /// The checksum of the block doesn't match the stored one. `stored` is
    /// `None` if the checksum field is not an octal number.
    BadChecksum { computed: u32, stored: Option<u32> },
    /// The size field is not an octal number. Stricter than classic tar
    /// readers, which use the leading digits of a field like `"12x"`.
    InvalidSize,
}

impl Display for HeaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BadChecksum {
                computed,
                stored: Some(stored),
            } => write!(
                f,
                "bad header checksum: computed {computed:#o}, stored {stored:#o}"
            ),
            Self::BadChecksum {
                computed,
                stored: None,
            } => write!(
                f,
                "bad header checksum: computed {computed:#o}, stored field is not a number"
            ),
            Self::InvalidSize => f.write_str("header size field is not an octal number"),
        }
    }
}

impl core::error::Error for HeaderError {}

#[derive(Copy, Clone, Debug, PartialOrd, PartialEq, Eq)]
pub struct InvalidTypeFlagError(u8);

impl Display for InvalidTypeFlagError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{:x} is not a valid TypeFlag", self.0))
    }
}

impl core::error::Error for InvalidTypeFlagError {}

#[derive(Copy, Clone, PartialOrd, PartialEq, Eq)]
#[repr(transparent)]
pub struct TypeFlagRaw(u8);

impl TypeFlagRaw {
    #[must_use]
    pub const fn new(byte: u8) -> Self {
        Self(byte)
    }

    /// The byte as stored in the header.
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self.0
    }

    /// Tries to parse the underlying value as [`TypeFlag`]. This fails if the
    /// Tar file is corrupt and the type is invalid.
    pub fn try_to_type_flag(self) -> Result<TypeFlag, InvalidTypeFlagError> {
        TypeFlag::try_from(self)
    }
}

impl Debug for TypeFlagRaw {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        Debug::fmt(&self.try_to_type_flag(), f)
    }
}

/// Describes the kind of payload, that follows after a [`RawHeader`]. Only
/// regular files and directories can be extracted.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum TypeFlag {
    /// Represents a regular file.
    REGTYPE = b'0',
    /// Regular file as written by old versions of tar. Silently recognized as
    /// [`TypeFlag::REGTYPE`].
    AREGTYPE = b'\0',
    /// This flag represents a file linked to another file, of any type, previously archived. Such
    /// files are identified in Unix by each file having the same device and inode number. The
    /// linked-to name is specified in the linkname field with a trailing null.
    LINK = b'1',
    /// This represents a symbolic link to another file. The linked-to name is specified in the
    /// linkname field with a trailing null.
    SYMTYPE = b'2',
    /// Character special file.
    CHRTYPE = b'3',
    /// Block special file.
    BLKTYPE = b'4',
    /// This flag specifies a directory or sub-directory. The directory name in the name field
    /// should end with a slash.
    DIRTYPE = b'5',
    /// This specifies a FIFO special file. Note that the archiving of a FIFO file archives the
    /// existence of this file and not its contents.
    FIFOTYPE = b'6',
}

impl TypeFlag {
    /// Whether we have a regular file.
    #[must_use]
    pub fn is_regular_file(self) -> bool {
        // Equivalent for old archives
        self == Self::AREGTYPE || self == Self::REGTYPE
    }
}

impl TryFrom<TypeFlagRaw> for TypeFlag {
    type Error = InvalidTypeFlagError;

    fn try_from(value: TypeFlagRaw) -> Result<Self, Self::Error> {
        match value.0 {
            b'0' => Ok(Self::REGTYPE),
            b'\0' => Ok(Self::AREGTYPE),
            b'1' => Ok(Self::LINK),
            b'2' => Ok(Self::SYMTYPE),
            b'3' => Ok(Self::CHRTYPE),
            b'4' => Ok(Self::BLKTYPE),
            b'5' => Ok(Self::DIRTYPE),
            b'6' => Ok(Self::FIFOTYPE),
            e => Err(InvalidTypeFlagError(e)),
        }
    }
}

bitflags::bitflags! {
    /// UNIX file permissions in octal format.
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModeFlags: u64 {
        /// Set UID on execution.
        const SetUID = 0o4000;
        /// Set GID on execution.
        const SetGID = 0o2000;
        /// Reserved.
        const TSVTX = 0o1000;
        /// Owner read.
        const OwnerRead = 0o400;
        /// Owner write.
        const OwnerWrite = 0o200;
        /// Owner execute.
        const OwnerExec = 0o100;
        /// Group read.
        const GroupRead = 0o040;
        /// Group write.
        const GroupWrite = 0o020;
        /// Group execute.
        const GroupExec = 0o010;
        /// Others read.
        const OthersRead = 0o004;
        /// Others write.
        const OthersWrite = 0o002;
        /// Others execute.
        const OthersExec = 0o001;
    }
}
