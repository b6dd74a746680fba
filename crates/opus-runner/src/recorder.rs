//! Binary tick recording.
//!
//! An append-only stream of 40-byte little-endian records:
//! `{timestamp_ns: u64, bid_price: f64, ask_price: f64, bid_qty: f64,
//! ask_qty: f64}`. The format is bit-exact; versioning is by file
//! extension only.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use opus_models::MarketTick;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

/// Appends ticks to a binary file.
pub struct TickRecorder {
    writer: BufWriter<File>,
    records_written: u64,
}

impl TickRecorder {
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            records_written: 0,
        })
    }

    pub fn write_tick(&mut self, tick: &MarketTick) -> io::Result<()> {
        self.writer.write_u64::<LittleEndian>(tick.timestamp_ns)?;
        self.writer.write_f64::<LittleEndian>(tick.bid_price)?;
        self.writer.write_f64::<LittleEndian>(tick.ask_price)?;
        self.writer.write_f64::<LittleEndian>(tick.bid_qty)?;
        self.writer.write_f64::<LittleEndian>(tick.ask_qty)?;
        self.records_written += 1;
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }
}

/// Streams ticks back out of a recorded file.
pub struct TickReader {
    reader: BufReader<File>,
}

impl TickReader {
    pub fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            reader: BufReader::new(File::open(path)?),
        })
    }

    /// Next record, or `None` at a clean end of file. A partial trailing
    /// record surfaces as `UnexpectedEof`.
    pub fn next_tick(&mut self) -> io::Result<Option<MarketTick>> {
        let timestamp_ns = match self.reader.read_u64::<LittleEndian>() {
            Ok(v) => v,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(Some(MarketTick {
            timestamp_ns,
            bid_price: self.reader.read_f64::<LittleEndian>()?,
            ask_price: self.reader.read_f64::<LittleEndian>()?,
            bid_qty: self.reader.read_f64::<LittleEndian>()?,
            ask_qty: self.reader.read_f64::<LittleEndian>()?,
        }))
    }
}
