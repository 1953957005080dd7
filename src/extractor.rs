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
//! Module for [`StreamExtractor`].
//!
//! The extractor is a state machine fed with chunks of arbitrary size:
//!
//! ```text
//!              block filled
//!   ┌──────────────────────────────────────────────┐
//!   v                                              │
//! ┌────────────────┐ file ┌──────────┐ complete ┌─────────┐
//! │ AwaitingHeader │ ───> │ FileData │ ───────> │ FilePad │
//! └────────────────┘      └──────────┘          └─────────┘
//!   ^ dir, null │           ^      │
//!   └───────────┘           └──────┘
//! ```
//!
//! Every state can move to [`ExtractState::Error`], which is never left.

use crate::header::{DecodedHeader, HeaderError, RawHeader, Record, TypeFlag, TypeFlagRaw};
use crate::{EntryPath, BLOCKSIZE};
use core::fmt::{Debug, Display, Formatter};

/// Receives the entries of an archive while it streams through a
/// [`StreamExtractor`]. Typical implementations write to a filesystem or
/// compute digests.
///
/// Every method is called synchronously from within
/// [`StreamExtractor::process`] or [`StreamExtractor::finalize`]. Returning an
/// error aborts the whole stream.
pub trait ExtractSink {
    /// Reason why the sink gave up. Opaque to the extractor.
    type Error: Debug;

    /// A regular file header was validated. Payload follows.
    fn on_file_begin(&mut self, path: &EntryPath) -> Result<(), Self::Error>;

    /// A directory header was validated.
    fn on_directory(&mut self, path: &EntryPath) -> Result<(), Self::Error>;

    /// The next consecutive fragment of the current file. All fragments of a
    /// file add up to its declared size. Fragments start at block boundaries,
    /// so they are independent of how the input was chunked.
    fn on_data(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Called exactly once per file passed to [`Self::on_file_begin`], after
    /// its last fragment or when a truncated stream is finalized.
    ///
    /// This is also called if the preceding [`Self::on_data`] failed, so it
    /// must not assume that all fragments were stored successfully.
    fn on_file_end(&mut self) -> Result<(), Self::Error>;
}

impl<S: ExtractSink + ?Sized> ExtractSink for &mut S {
    type Error = S::Error;

    fn on_file_begin(&mut self, path: &EntryPath) -> Result<(), Self::Error> {
        (**self).on_file_begin(path)
    }

    fn on_directory(&mut self, path: &EntryPath) -> Result<(), Self::Error> {
        (**self).on_directory(path)
    }

    fn on_data(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        (**self).on_data(data)
    }

    fn on_file_end(&mut self) -> Result<(), Self::Error> {
        (**self).on_file_end()
    }
}

/// Errors of the [`StreamExtractor`]. All of them are fatal: the extractor
/// refuses any further input afterwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExtractError<E> {
    /// A header block is corrupt.
    Header(HeaderError),
    /// The entry is neither a regular file nor a directory.
    UnsupportedType(TypeFlagRaw),
    /// The [`ExtractSink`] reported an error.
    Sink(E),
    /// The extractor failed before and doesn't accept input anymore.
    Halted,
}

impl<E: Display> Display for ExtractError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Header(e) => Display::fmt(e, f),
            Self::UnsupportedType(flag) => write!(
                f,
                "unsupported entry type {:?} ({:#04x})",
                flag,
                flag.as_byte()
            ),
            Self::Sink(e) => write!(f, "sink failed: {e}"),
            Self::Halted => f.write_str("extractor halted after a previous error"),
        }
    }
}

impl<E: core::error::Error + 'static> core::error::Error for ExtractError<E> {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Header(e) => Some(e),
            Self::Sink(e) => Some(e),
            _ => None,
        }
    }
}

/// State of a [`StreamExtractor`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExtractState {
    /// The next block is a header or a null record.
    AwaitingHeader,
    /// Payload of a regular file is streaming.
    FileData {
        /// Payload bytes not yet received.
        remaining: u64,
    },
    /// The payload is complete; the rest of its last block is padding.
    FilePad,
    /// Terminal.
    Error,
}

/// Staging area that reassembles blocks from fragmented input.
#[derive(Debug, Clone)]
struct BlockBuffer {
    bytes: [u8; BLOCKSIZE],
    len: usize,
}

impl BlockBuffer {
    const fn new() -> Self {
        Self {
            bytes: [0; BLOCKSIZE],
            len: 0,
        }
    }

    /// Copies as many bytes as fit into the free space and returns how many
    /// were taken from `input`.
    fn fill(&mut self, input: &[u8]) -> usize {
        let count = input.len().min(BLOCKSIZE - self.len);
        self.bytes[self.len..self.len + count].copy_from_slice(&input[..count]);
        self.len += count;
        count
    }

    const fn is_full(&self) -> bool {
        self.len == BLOCKSIZE
    }

    const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn filled(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    const fn as_block(&self) -> &[u8; BLOCKSIZE] {
        &self.bytes
    }

    fn reset(&mut self) {
        self.len = 0;
    }
}

/// Extracts a classic Tar archive from a stream of byte chunks without any
/// allocation. Bytes can be pushed in chunks of any size, including single
/// bytes; the sequence of [`ExtractSink`] calls is always the same.
///
/// The extractor needs a fixed amount of memory: one block plus a few
/// counters plus the sink. It can live on the stack or in a `static`.
///
/// ```
/// use tar_stream_extractor::{EntryPath, ExtractSink, StreamExtractor};
///
/// #[derive(Default)]
/// struct CountBytes(u64);
///
/// impl ExtractSink for CountBytes {
///     type Error = ();
///     fn on_file_begin(&mut self, _path: &EntryPath) -> Result<(), ()> { Ok(()) }
///     fn on_directory(&mut self, _path: &EntryPath) -> Result<(), ()> { Ok(()) }
///     fn on_data(&mut self, data: &[u8]) -> Result<(), ()> {
///         self.0 += data.len() as u64;
///         Ok(())
///     }
///     fn on_file_end(&mut self) -> Result<(), ()> { Ok(()) }
/// }
///
/// let mut extractor = StreamExtractor::new(CountBytes::default());
/// // two null records: an empty archive
/// extractor.process(&[0; 1024]).unwrap();
/// extractor.finalize().unwrap();
/// assert_eq!(extractor.into_sink().0, 0);
/// ```
#[derive(Debug, Clone)]
pub struct StreamExtractor<S> {
    block: BlockBuffer,
    state: ExtractState,
    header: Option<DecodedHeader>,
    sink: S,
}

impl<S: ExtractSink> StreamExtractor<S> {
    /// Creates an extractor that expects the first header of an archive.
    pub const fn new(sink: S) -> Self {
        Self {
            block: BlockBuffer::new(),
            state: ExtractState::AwaitingHeader,
            header: None,
            sink,
        }
    }

    /// Consumes the next chunk of the archive. All bytes are consumed; the
    /// state carries over to the next call.
    ///
    /// # Errors
    /// Fails on a corrupt header, an unsupported entry type or a failing
    /// sink. Once failed, every further call fails with
    /// [`ExtractError::Halted`] without touching the sink.
    pub fn process(&mut self, mut input: &[u8]) -> Result<(), ExtractError<S::Error>> {
        if self.is_halted() {
            log::trace!("Ignoring {} bytes, extractor is halted", input.len());
            return Err(ExtractError::Halted);
        }

        while !input.is_empty() {
            let copied = self.block.fill(input);
            input = &input[copied..];
            if let Err(e) = self.advance(copied) {
                self.state = ExtractState::Error;
                return Err(e);
            }
        }
        Ok(())
    }

    /// Ends the stream. If the input stopped in the middle of a file, the
    /// file is closed with [`ExtractSink::on_file_end`]; otherwise nothing
    /// happens. Calling this more than once is harmless.
    ///
    /// # Errors
    /// Fails if the sink fails to close the truncated file.
    pub fn finalize(&mut self) -> Result<(), ExtractError<S::Error>> {
        match self.state {
            ExtractState::FileData { remaining } => {
                log::warn!(
                    "Archive truncated, {} bytes of {:?} are missing",
                    remaining,
                    self.header.map(|h| h.name)
                );
                self.block.reset();
                self.state = ExtractState::AwaitingHeader;
                if let Err(e) = self.sink.on_file_end() {
                    self.state = ExtractState::Error;
                    return Err(ExtractError::Sink(e));
                }
            }
            ExtractState::AwaitingHeader if !self.block.is_empty() => {
                log::warn!("Archive ends inside a header block");
            }
            ExtractState::FilePad => {
                log::debug!("Archive ends inside the padding of the last file");
            }
            _ => {}
        }
        Ok(())
    }

    /// Reacts on the `copied` bytes that were just added to the block.
    fn advance(&mut self, copied: usize) -> Result<(), ExtractError<S::Error>> {
        match self.state {
            ExtractState::AwaitingHeader => {
                if self.block.is_full() {
                    self.on_header_block()?;
                }
            }
            ExtractState::FileData { remaining } => self.on_file_data(remaining, copied)?,
            ExtractState::FilePad => {
                if self.block.is_full() {
                    self.block.reset();
                    self.state = ExtractState::AwaitingHeader;
                }
            }
            // guarded in `process`
            ExtractState::Error => {}
        }
        Ok(())
    }

    fn on_header_block(&mut self) -> Result<(), ExtractError<S::Error>> {
        let record = RawHeader::from_block(self.block.as_block())
            .decode()
            .map_err(|e| {
                log::warn!("Invalid header block: {}", e);
                ExtractError::Header(e)
            })?;
        self.block.reset();

        let hdr = match record {
            Record::Null => {
                log::trace!("Skipping null record");
                return Ok(());
            }
            Record::Header(hdr) => hdr,
        };
        self.header = Some(hdr);

        match hdr.type_flag.try_to_type_flag() {
            Ok(TypeFlag::DIRTYPE) => {
                log::debug!("Directory {:?}", hdr.name);
                self.sink.on_directory(&hdr.name).map_err(ExtractError::Sink)
            }
            Ok(flag) if flag.is_regular_file() => {
                log::debug!("File {:?}, size={}", hdr.name, hdr.size);
                self.sink
                    .on_file_begin(&hdr.name)
                    .map_err(ExtractError::Sink)?;
                if hdr.size == 0 {
                    // no payload blocks follow
                    self.sink.on_file_end().map_err(ExtractError::Sink)
                } else {
                    self.state = ExtractState::FileData {
                        remaining: hdr.size,
                    };
                    Ok(())
                }
            }
            _ => {
                log::warn!(
                    "Found entry {:?} of type={:?}, but only files and directories are supported",
                    hdr.name,
                    hdr.type_flag
                );
                Err(ExtractError::UnsupportedType(hdr.type_flag))
            }
        }
    }

    fn on_file_data(
        &mut self,
        remaining: u64,
        copied: usize,
    ) -> Result<(), ExtractError<S::Error>> {
        // `file_chunk <= copied`, so the cast can't truncate
        let file_chunk = remaining.min(copied as u64) as usize;
        let remaining = remaining - file_chunk as u64;

        if remaining == 0 {
            let pad = copied - file_chunk;
            let payload = &self.block.filled()[..self.block.len - pad];
            log::trace!("Last fragment of {} bytes", payload.len());
            let data_result = self.sink.on_data(payload);
            let end_result = self.sink.on_file_end();
            data_result.and(end_result).map_err(ExtractError::Sink)?;

            if self.block.is_full() {
                self.block.reset();
                self.state = ExtractState::AwaitingHeader;
            } else {
                self.state = ExtractState::FilePad;
            }
        } else {
            self.state = ExtractState::FileData { remaining };
            if self.block.is_full() {
                self.sink
                    .on_data(self.block.filled())
                    .map_err(ExtractError::Sink)?;
                self.block.reset();
            }
        }
        Ok(())
    }

    /// The current state of the state machine.
    pub const fn state(&self) -> ExtractState {
        self.state
    }

    /// True after a fatal error. A new extractor is needed to continue.
    pub const fn is_halted(&self) -> bool {
        matches!(self.state, ExtractState::Error)
    }

    /// The most recently decoded header, if any.
    pub const fn current_header(&self) -> Option<&DecodedHeader> {
        self.header.as_ref()
    }

    /// The sink that receives the entries.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the sink, e.g. to reconfigure it between chunks.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Consumes the extractor and returns the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(feature = "std")]
impl<S> std::io::Write for StreamExtractor<S>
where
    S: ExtractSink,
    S::Error: std::error::Error + Send + Sync + 'static,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.process(buf).map_err(std::io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{
        archive, file_header, header_block, pattern, Event, Recorder, RecorderError,
    };
    use std::vec::Vec;

    fn extract_in_chunks(
        data: &[u8],
        chunk_size: usize,
    ) -> (Recorder, Result<(), ExtractError<RecorderError>>) {
        let mut extractor = StreamExtractor::new(Recorder::default());
        let mut res = Ok(());
        for chunk in data.chunks(chunk_size) {
            res = extractor.process(chunk);
            if res.is_err() {
                break;
            }
        }
        if res.is_ok() {
            res = extractor.finalize();
        }
        (extractor.into_sink(), res)
    }

    fn sample_archive() -> Vec<u8> {
        archive(&[
            (header_block("docs/", b'5', *b"00000000000\0"), Vec::new()),
            (file_header("docs/hello_world.txt", 12), b"Hello World\n".to_vec()),
            (file_header("bye_world_513b.txt", 513), pattern(513)),
            (file_header("empty.txt", 0), Vec::new()),
            (file_header("block_512.bin", 512), pattern(512)),
            (file_header("two_blocks.bin", 1024), pattern(1024)),
        ])
    }

    #[test]
    fn test_sample_archive() {
        let (rec, res) = extract_in_chunks(&sample_archive(), BLOCKSIZE);
        assert_eq!(res, Ok(()));
        assert_eq!(
            rec.events,
            [
                Event::Directory("docs/".into()),
                Event::Begin("docs/hello_world.txt".into()),
                Event::Data(b"Hello World\n".to_vec()),
                Event::End,
                Event::Begin("bye_world_513b.txt".into()),
                Event::Data(pattern(512)),
                Event::Data(pattern(513)[512..].to_vec()),
                Event::End,
                Event::Begin("empty.txt".into()),
                Event::End,
                Event::Begin("block_512.bin".into()),
                Event::Data(pattern(512)),
                Event::End,
                Event::Begin("two_blocks.bin".into()),
                Event::Data(pattern(1024)[..512].to_vec()),
                Event::Data(pattern(1024)[512..].to_vec()),
                Event::End,
            ]
        );
    }

    #[test]
    fn test_chunking_invariance() {
        let data = sample_archive();
        let (expected, res) = extract_in_chunks(&data, data.len());
        assert_eq!(res, Ok(()));
        for chunk_size in [1, 2, 3, 7, 100, 511, 512, 513, 1000, 1024, 4097] {
            let (rec, res) = extract_in_chunks(&data, chunk_size);
            assert_eq!(res, Ok(()), "chunk_size={chunk_size}");
            assert_eq!(rec.events, expected.events, "chunk_size={chunk_size}");
        }
    }

    #[test]
    fn test_empty_chunk() {
        let mut extractor = StreamExtractor::new(Recorder::default());
        assert_eq!(extractor.process(&[]), Ok(()));
        assert_eq!(extractor.state(), ExtractState::AwaitingHeader);
        assert!(extractor.sink().events.is_empty());
    }

    #[test]
    fn test_null_records_are_absorbed() {
        let mut data = archive(&[(file_header("a.txt", 3), b"abc".to_vec())]);
        // two more null records between the entries
        data.extend_from_slice(&archive(&[(file_header("b.txt", 1), b"b".to_vec())]));
        let mut extractor = StreamExtractor::new(Recorder::default());
        extractor.process(&data).unwrap();
        assert_eq!(extractor.state(), ExtractState::AwaitingHeader);
        assert_eq!(
            extractor.sink().events,
            [
                Event::Begin("a.txt".into()),
                Event::Data(b"abc".to_vec()),
                Event::End,
                Event::Begin("b.txt".into()),
                Event::Data(b"b".to_vec()),
                Event::End,
            ]
        );
    }

    #[test]
    fn test_state_transitions() {
        let mut extractor = StreamExtractor::new(Recorder::default());
        extractor.process(&file_header("a.txt", 600)).unwrap();
        assert_eq!(extractor.state(), ExtractState::FileData { remaining: 600 });
        assert_eq!(extractor.current_header().unwrap().size, 600);

        extractor.process(&pattern(512)).unwrap();
        assert_eq!(extractor.state(), ExtractState::FileData { remaining: 88 });

        extractor.process(&pattern(100)).unwrap();
        assert_eq!(extractor.state(), ExtractState::FilePad);

        extractor.process(&[0; 411]).unwrap();
        assert_eq!(extractor.state(), ExtractState::FilePad);
        extractor.process(&[0]).unwrap();
        assert_eq!(extractor.state(), ExtractState::AwaitingHeader);
        assert_eq!(extractor.sink().total_data(), 600);
    }

    #[test]
    fn test_bad_checksum_is_sticky() {
        let mut data = sample_archive();
        // first byte of the second header's name
        data[BLOCKSIZE] ^= 0x01;
        let mut extractor = StreamExtractor::new(Recorder::default());
        assert!(matches!(
            extractor.process(&data),
            Err(ExtractError::Header(HeaderError::BadChecksum { .. }))
        ));
        assert!(extractor.is_halted());
        let events = extractor.sink().events.len();
        assert_eq!(events, 1, "only the directory was reported");

        assert_eq!(extractor.process(&sample_archive()), Err(ExtractError::Halted));
        assert_eq!(extractor.process(&[0]), Err(ExtractError::Halted));
        assert_eq!(extractor.sink().events.len(), events);
    }

    #[test]
    fn test_unsupported_type() {
        let data = archive(&[
            (file_header("a.txt", 1), b"a".to_vec()),
            (header_block("link", b'2', *b"00000000000\0"), Vec::new()),
            (file_header("b.txt", 1), b"b".to_vec()),
        ]);
        let (rec, res) = extract_in_chunks(&data, 7);
        assert_eq!(
            res,
            Err(ExtractError::UnsupportedType(TypeFlagRaw::new(b'2')))
        );
        assert_eq!(
            rec.events,
            [
                Event::Begin("a.txt".into()),
                Event::Data(b"a".to_vec()),
                Event::End,
            ]
        );
    }

    #[test]
    fn test_unknown_type_byte() {
        let data = archive(&[(header_block("x", b'7', *b"00000000000\0"), Vec::new())]);
        let (rec, res) = extract_in_chunks(&data, BLOCKSIZE);
        assert_eq!(
            res,
            Err(ExtractError::UnsupportedType(TypeFlagRaw::new(b'7')))
        );
        assert!(rec.events.is_empty());
    }

    #[test]
    fn test_failing_directory() {
        let mut extractor = StreamExtractor::new(Recorder::failing_on(0));
        let res = extractor.process(&sample_archive());
        assert_eq!(res, Err(ExtractError::Sink(RecorderError)));
        assert!(extractor.is_halted());
        assert_eq!(extractor.sink().events.len(), 1);
    }

    #[test]
    fn test_failing_file_begin() {
        // events: dir, begin <- fails
        let mut extractor = StreamExtractor::new(Recorder::failing_on(1));
        let res = extractor.process(&sample_archive());
        assert_eq!(res, Err(ExtractError::Sink(RecorderError)));
        assert_eq!(
            extractor.sink().events,
            [
                Event::Directory("docs/".into()),
                Event::Begin("docs/hello_world.txt".into()),
            ]
        );
    }

    #[test]
    fn test_failing_data_still_ends_file() {
        // events: dir, begin, data <- fails
        let mut extractor = StreamExtractor::new(Recorder::failing_on(2));
        let res = extractor.process(&sample_archive());
        assert_eq!(res, Err(ExtractError::Sink(RecorderError)));
        assert_eq!(
            extractor.sink().events,
            [
                Event::Directory("docs/".into()),
                Event::Begin("docs/hello_world.txt".into()),
                Event::Data(b"Hello World\n".to_vec()),
                Event::End,
            ]
        );
        assert_eq!(extractor.process(&[0; 512]), Err(ExtractError::Halted));
    }

    #[test]
    fn test_failing_intermediate_data() {
        let data = archive(&[(file_header("big.bin", 2000), pattern(2000))]);
        // begin, data <- fails
        let mut extractor = StreamExtractor::new(Recorder::failing_on(1));
        assert_eq!(extractor.process(&data), Err(ExtractError::Sink(RecorderError)));
        // not the last fragment, so no end
        assert_eq!(extractor.sink().events.len(), 2);
    }

    #[test]
    fn test_failing_file_end_after_last_fragment() {
        let data = archive(&[
            (file_header("a", 3), b"abc".to_vec()),
            (file_header("b", 1), b"b".to_vec()),
        ]);
        // begin, data, end <- fails
        let mut extractor = StreamExtractor::new(Recorder::failing_on(2));
        assert_eq!(extractor.process(&data), Err(ExtractError::Sink(RecorderError)));
        assert_eq!(
            extractor.sink().events,
            [
                Event::Begin("a".into()),
                Event::Data(b"abc".to_vec()),
                Event::End,
            ]
        );
        assert!(extractor.is_halted());
        assert_eq!(extractor.process(&data), Err(ExtractError::Halted));
        assert_eq!(extractor.sink().events.len(), 3);
    }

    #[test]
    fn test_failing_file_end_of_empty_file() {
        let data = archive(&[
            (file_header("empty", 0), Vec::new()),
            (file_header("b", 1), b"b".to_vec()),
        ]);
        // begin, end <- fails
        let mut extractor = StreamExtractor::new(Recorder::failing_on(1));
        assert_eq!(extractor.process(&data), Err(ExtractError::Sink(RecorderError)));
        assert_eq!(
            extractor.sink().events,
            [Event::Begin("empty".into()), Event::End]
        );
        assert!(extractor.is_halted());
        assert_eq!(extractor.process(&data), Err(ExtractError::Halted));
        assert_eq!(extractor.sink().events.len(), 2);
    }

    #[test]
    fn test_failing_file_end_on_finalize() {
        let data = archive(&[(file_header("big.bin", 2000), pattern(2000))]);
        // begin, data, end <- fails
        let mut extractor = StreamExtractor::new(Recorder::failing_on(2));
        extractor.process(&data[..BLOCKSIZE + 700]).unwrap();
        assert_eq!(extractor.finalize(), Err(ExtractError::Sink(RecorderError)));
        assert!(extractor.is_halted());
        assert_eq!(extractor.process(&data), Err(ExtractError::Halted));
        assert_eq!(
            extractor.sink().events,
            [
                Event::Begin("big.bin".into()),
                Event::Data(pattern(512)),
                Event::End,
            ]
        );
    }

    #[test]
    fn test_finalize_truncated_file() {
        let data = archive(&[(file_header("big.bin", 2000), pattern(2000))]);
        let mut extractor = StreamExtractor::new(Recorder::default());
        extractor.process(&data[..BLOCKSIZE + 700]).unwrap();
        extractor.finalize().unwrap();
        assert_eq!(
            extractor.sink().events,
            [
                Event::Begin("big.bin".into()),
                Event::Data(pattern(512)),
                Event::End,
            ]
        );
        // the file is closed exactly once
        extractor.finalize().unwrap();
        assert_eq!(extractor.sink().events.len(), 3);
    }

    #[test]
    fn test_finalize_without_file_is_noop() {
        let mut extractor = StreamExtractor::new(Recorder::default());
        extractor.finalize().unwrap();
        extractor.process(&file_header("a", 0)[..100]).unwrap();
        extractor.finalize().unwrap();
        assert!(extractor.sink().events.is_empty());

        let mut extractor = StreamExtractor::new(Recorder::default());
        extractor.process(&file_header("a", 1)).unwrap();
        extractor.process(b"a").unwrap();
        assert_eq!(extractor.state(), ExtractState::FilePad);
        extractor.finalize().unwrap();
        assert_eq!(extractor.sink().events.len(), 3);
    }

    #[test]
    fn test_borrowed_sink() {
        let mut rec = Recorder::default();
        let mut extractor = StreamExtractor::new(&mut rec);
        extractor.process(&sample_archive()).unwrap();
        extractor.finalize().unwrap();
        assert_eq!(rec.total_data(), 12 + 513 + 512 + 1024);
    }

    #[test]
    fn test_fixed_size() {
        // a block, the last header and a handful of counters
        let size = core::mem::size_of::<StreamExtractor<()>>();
        assert!(size >= BLOCKSIZE);
        assert!(size < 2 * BLOCKSIZE, "size={size}");
    }

    #[test]
    fn test_display_errors() {
        let err: ExtractError<&str> = ExtractError::UnsupportedType(TypeFlagRaw::new(b'2'));
        assert_eq!(
            std::format!("{err}"),
            "unsupported entry type Ok(SYMTYPE) (0x32)"
        );
        let err: ExtractError<&str> = ExtractError::Sink("disk full");
        assert_eq!(std::format!("{err}"), "sink failed: disk full");
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_io_copy() {
        let mut rec = Recorder::default();
        let mut extractor = StreamExtractor::new(&mut rec);
        let data = sample_archive();
        let copied = std::io::copy(&mut data.as_slice(), &mut extractor).unwrap();
        assert_eq!(copied, data.len() as u64);
        assert_eq!(rec.events.len(), 17);
    }
}
