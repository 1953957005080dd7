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
//! Prints the SHA-256 digest and size of every file in a Tar archive. The
//! archive is read in chunks of random size to show that the chunking
//! doesn't matter.
//!
//! `cargo run --example tar_digest --features std -- <archive.tar> [seed]`

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use tar_stream_extractor::{EntryPath, ExtractSink, StreamExtractor};

#[derive(Default)]
struct DigestSink {
    hasher: Sha256,
    size: usize,
}

impl ExtractSink for DigestSink {
    type Error = std::io::Error;

    fn on_file_begin(&mut self, path: &EntryPath) -> Result<(), Self::Error> {
        print!("{} ", String::from_utf8_lossy(path.as_bytes()));
        self.hasher = Sha256::new();
        self.size = 0;
        Ok(())
    }

    fn on_directory(&mut self, path: &EntryPath) -> Result<(), Self::Error> {
        println!("create dir {}", String::from_utf8_lossy(path.as_bytes()));
        Ok(())
    }

    fn on_data(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.hasher.update(data);
        self.size += data.len();
        Ok(())
    }

    fn on_file_end(&mut self) -> Result<(), Self::Error> {
        let digest = std::mem::take(&mut self.hasher).finalize();
        println!("{} (sz {})", hex::encode(digest), self.size);
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // log: not mandatory
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: tar_digest <archive.tar> [seed]");
        std::process::exit(1);
    };
    let mut seed = args.next().map_or(Ok(5612093), |s| s.parse::<u64>())?;

    let mut file = File::open(path)?;
    let mut extractor = StreamExtractor::new(DigestSink::default());
    let mut buffer = [0; 160];
    loop {
        // chunks between 90 and 160 bytes
        seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let chunk_size = 90 + (seed >> 33) as usize % 71;
        let n = file.read(&mut buffer[..chunk_size])?;
        if n == 0 {
            break;
        }
        extractor.process(&buffer[..n])?;
    }
    extractor.finalize()?;
    Ok(())
}
