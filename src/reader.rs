use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;
use std::result;
use std::str;

use lenient_csv_core::{
    ReadRecordResult, Reader as CoreReader, ReaderBuilder as CoreReaderBuilder,
};
use log::{debug, trace};

use crate::error::{Error, Result, Utf8Error};
use crate::string_record::StringRecord;

/// Builds a CSV reader with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, quote character,
/// comment character and which lines are dropped before tokenizing. Once a
/// CSV `Reader` is built, its configuration can still be changed with its
/// `set_*` methods, which affect the records read afterwards.
#[derive(Debug)]
pub struct ReaderBuilder {
    capacity: usize,
    builder: Box<CoreReaderBuilder>,
}

impl Default for ReaderBuilder {
    fn default() -> ReaderBuilder {
        ReaderBuilder {
            capacity: 8 * (1 << 10),
            builder: Box::new(CoreReaderBuilder::default()),
        }
    }
}

impl ReaderBuilder {
    /// Create a new builder for configuring CSV parsing.
    ///
    /// To convert a builder into a reader, call one of the methods starting
    /// with `from_`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::error::Error;
    /// use lenient_csv::ReaderBuilder;
    ///
    /// # fn main() { example().unwrap(); }
    /// fn example() -> Result<(), Box<dyn Error>> {
    ///     let data = "\
    /// city;country
    ///
    /// Boston;United States
    /// ";
    ///     let mut rdr = ReaderBuilder::new()
    ///         .delimiter(b';')
    ///         .skip_blank_lines(true)
    ///         .from_reader(data.as_bytes());
    ///     let records = rdr.records().collect::<Result<Vec<_>, _>>()?;
    ///     assert_eq!(records.len(), 2);
    ///     assert_eq!(records[1], vec!["Boston", "United States"]);
    ///     Ok(())
    /// }
    /// ```
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a CSV parser from this configuration that reads data from the
    /// given file path.
    ///
    /// If there was a problem opening the file at the given path, then this
    /// returns the corresponding error.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Reader<File>> {
        Ok(Reader::new(self, File::open(path)?))
    }

    /// Build a CSV parser from this configuration that reads data from `rdr`.
    ///
    /// Note that the CSV reader is buffered automatically, so you should not
    /// wrap `rdr` in a buffered reader like `io::BufReader`.
    pub fn from_reader<R: io::Read>(&self, rdr: R) -> Reader<R> {
        Reader::new(self, rdr)
    }

    /// The field delimiter to use when parsing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut ReaderBuilder {
        self.builder.delimiter(delimiter);
        self
    }

    /// The quote character to use when parsing CSV.
    ///
    /// A quote toggles quoted mode anywhere inside a field, and two quotes in
    /// a row inside a quoted region produce one literal quote.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut ReaderBuilder {
        self.builder.quote(quote);
        self
    }

    /// The comment character to use when parsing CSV.
    ///
    /// Lines whose first non-blank byte is the comment character are only
    /// dropped when `skip_comment_lines` is enabled.
    ///
    /// The default is `b'#'`.
    pub fn comment(&mut self, comment: u8) -> &mut ReaderBuilder {
        self.builder.comment(comment);
        self
    }

    /// Whether lines containing only spaces and tabs are dropped.
    ///
    /// When disabled (the default), such a line is a record with one empty
    /// field.
    pub fn skip_blank_lines(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.builder.skip_blank_lines(yes);
        self
    }

    /// Whether comment lines are dropped.
    ///
    /// This is disabled by default.
    pub fn skip_comment_lines(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.builder.skip_comment_lines(yes);
        self
    }

    /// Set the capacity (in bytes) of the buffer used in the CSV reader.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut ReaderBuilder {
        self.capacity = capacity;
        self
    }
}

/// A tolerant CSV reader.
///
/// The reader pulls one record at a time out of any `io::Read`. It never
/// rejects malformed CSV. Instead it applies a fixed grammar:
///
/// * `\r\n`, `\r` and `\n` each end a line, also inside quoted fields.
/// * Quotes toggle quoted mode anywhere inside a field and are not part of
///   the field. Inside a quoted region, `""` is one literal quote.
/// * Fields without any quoted region are trimmed of spaces and tabs.
/// * The first record fixes the *pad width*. Later records with fewer fields
///   are padded with empty fields. Longer records are kept as they are.
///
/// # Example
///
/// ```
/// let data = "a;b;c\nd;e\nf;\ng;h;i;j\nk";
/// let mut rdr = lenient_csv::ReaderBuilder::new()
///     .delimiter(b';')
///     .from_reader(data.as_bytes());
///
/// let mut rows = vec![];
/// while rdr.read_record().unwrap() {
///     rows.push(rdr.values().iter().map(String::from).collect::<Vec<_>>());
/// }
/// assert_eq!(rows, vec![
///     vec!["a", "b", "c"],
///     vec!["d", "e", ""],
///     vec!["f", "", ""],
///     vec!["g", "h", "i", "j"],
///     vec!["k", "", ""],
/// ]);
/// ```
#[derive(Debug)]
pub struct Reader<R> {
    /// The underlying tokenizer.
    core: Box<CoreReader>,
    /// The underlying reader. `None` once the reader is closed.
    rdr: Option<io::BufReader<R>>,
    /// Various state tracking.
    state: ReaderState,
    /// The current record.
    record: StringRecord,
    /// Field bytes of the record being tokenized.
    raw: Vec<u8>,
    /// Field end offsets of the record being tokenized.
    ends: Vec<usize>,
}

#[derive(Debug)]
struct ReaderState {
    /// The width every record is padded to, fixed by the first record.
    pad_width: Option<usize>,
    /// The current position of the parser.
    pos: Position,
    /// Whether the end of the data was reached.
    eof: bool,
}

impl Reader<File> {
    /// Create a new CSV parser with a default configuration for the given
    /// file path.
    ///
    /// To customize CSV parsing, use a `ReaderBuilder`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Reader<File>> {
        ReaderBuilder::new().from_path(path)
    }
}

impl<R: io::Read> Reader<R> {
    /// Create a new CSV reader given a builder and a source of underlying
    /// bytes.
    fn new(builder: &ReaderBuilder, rdr: R) -> Reader<R> {
        Reader {
            core: Box::new(builder.builder.build()),
            rdr: Some(io::BufReader::with_capacity(builder.capacity, rdr)),
            state: ReaderState {
                pad_width: None,
                pos: Position::new(),
                eof: false,
            },
            record: StringRecord::new(),
            raw: vec![],
            ends: vec![],
        }
    }

    /// Create a new CSV parser with a default configuration for the given
    /// reader.
    ///
    /// To customize CSV parsing, use a `ReaderBuilder`.
    pub fn from_reader(rdr: R) -> Reader<R> {
        ReaderBuilder::new().from_reader(rdr)
    }

    /// Advance to the next record.
    ///
    /// On success, the record is available through `values` and `true` is
    /// returned. At the end of the data, `values` becomes empty and `false`
    /// is returned.
    ///
    /// # Errors
    ///
    /// Reading fails when the underlying reader fails, when the record is
    /// not valid UTF-8 (in which case `values` is left empty and reading may
    /// continue with the next record) or when this reader has been closed.
    pub fn read_record(&mut self) -> Result<bool> {
        let mut record = std::mem::take(&mut self.record);
        let result = self.read_into(&mut record);
        self.record = record;
        result
    }

    /// Read the next record into `record` instead of the reader's own
    /// current record.
    ///
    /// This behaves like `read_record`, except that `values` is left
    /// untouched. Reusing one `StringRecord` across calls avoids allocating
    /// for every record.
    pub fn read_into(&mut self, record: &mut StringRecord) -> Result<bool> {
        if self.rdr.is_none() {
            return Err(Error::Closed);
        }
        record.clear();
        if self.state.eof {
            return Ok(false);
        }
        let start = self.state.pos.clone();
        let skipped = self.core.skipped_lines();
        let found = self.read_raw()?;

        let newly_skipped = self.core.skipped_lines() - skipped;
        if newly_skipped > 0 {
            debug!(
                "skipped {} blank or comment line(s) before line {}",
                newly_skipped,
                self.core.line()
            );
        }
        if !found {
            trace!("end of CSV data at byte {}", self.state.pos.byte());
            return Ok(false);
        }

        let validated = self.fill(record);
        self.raw.clear();
        self.ends.clear();
        if let Err(err) = validated {
            let mut pos = start;
            pos.set_record(self.state.pos.record + 1);
            return Err(Error::Utf8 { pos: Some(pos), err });
        }
        self.state.pos.record += 1;

        match self.state.pad_width {
            None => {
                debug!("pad width fixed at {} fields", record.len());
                self.state.pad_width = Some(record.len());
            }
            Some(width) => {
                while record.len() < width {
                    record.push_field("");
                }
            }
        }
        trace!(
            "read record {} with {} fields, now at line {}",
            self.state.pos.record,
            record.len(),
            self.state.pos.line
        );
        Ok(true)
    }

    /// Run the tokenizer until it produces a record or reaches the end of
    /// the data. Returns `false` at the end of the data.
    fn read_raw(&mut self) -> Result<bool> {
        let rdr = match self.rdr {
            Some(ref mut rdr) => rdr,
            None => return Err(Error::Closed),
        };
        loop {
            let (res, nin) = {
                let input = match rdr.fill_buf() {
                    Ok(input) => input,
                    Err(ref err) if err.kind() == io::ErrorKind::Interrupted => {
                        continue
                    }
                    Err(err) => return Err(Error::Io(err)),
                };
                self.core.read_record(input, &mut self.raw, &mut self.ends)
            };
            rdr.consume(nin);
            self.state.pos.byte += nin as u64;
            self.state.pos.line = self.core.line();
            match res {
                ReadRecordResult::InputEmpty => continue,
                ReadRecordResult::Record => return Ok(true),
                ReadRecordResult::End => {
                    self.state.eof = true;
                    return Ok(false);
                }
            }
        }
    }

    /// Copy the tokenized fields into `record`, failing if a field is not
    /// valid UTF-8.
    fn fill(
        &self,
        record: &mut StringRecord,
    ) -> result::Result<(), Utf8Error> {
        let mut start = 0;
        for (i, &end) in self.ends.iter().enumerate() {
            match str::from_utf8(&self.raw[start..end]) {
                Ok(field) => record.push_field(field),
                Err(err) => {
                    record.clear();
                    return Err(Utf8Error::new(i, err.valid_up_to()));
                }
            }
            start = end;
        }
        Ok(())
    }

    /// Returns a borrowed iterator over all records as strings.
    ///
    /// Iteration stops at the end of the data or after an I/O error. A
    /// record that is not valid UTF-8 is yielded as an error and iteration
    /// continues with the next record.
    pub fn records(&mut self) -> StringRecordsIter<'_, R> {
        StringRecordsIter::new(self)
    }

    /// Returns an owned iterator over all records as strings.
    ///
    /// This is mostly useful when you want to return a CSV iterator or store
    /// it somewhere.
    pub fn into_records(self) -> StringRecordsIntoIter<R> {
        StringRecordsIntoIter::new(self)
    }

    /// Release the underlying reader.
    ///
    /// Every later read fails with `Error::Closed`. Closing a closed reader
    /// does nothing. Counters and the last record stay available.
    pub fn close(&mut self) {
        if self.rdr.take().is_some() {
            debug!(
                "closed CSV reader after {} records",
                self.state.pos.record
            );
        }
    }

    /// Returns true if `close` was called on this reader.
    pub fn is_closed(&self) -> bool {
        self.rdr.is_none()
    }
}

impl<R> Reader<R> {
    /// The current record.
    ///
    /// This is empty before the first record is read and after the end of
    /// the data was reached.
    pub fn values(&self) -> &StringRecord {
        &self.record
    }

    /// The number of records returned so far.
    ///
    /// A record that fails UTF-8 validation is not counted. The position in
    /// its error carries the number it would have had.
    pub fn record_number(&self) -> u64 {
        self.state.pos.record
    }

    /// The current line number.
    ///
    /// Starts at `1` and grows by one for every `\r\n`, `\r` or `\n`
    /// consumed, including those inside quoted fields and those of skipped
    /// lines.
    pub fn line_number(&self) -> u64 {
        self.state.pos.line
    }

    /// Return the current position of this CSV reader.
    ///
    /// The byte offset is the number of bytes consumed from the underlying
    /// reader.
    pub fn position(&self) -> &Position {
        &self.state.pos
    }

    /// The field count every record is padded to, once the first record was
    /// read.
    pub fn pad_width(&self) -> Option<usize> {
        self.state.pad_width
    }

    /// Returns true if and only if the end of the CSV data was reached.
    pub fn is_done(&self) -> bool {
        self.state.eof
    }

    /// Set the field delimiter for the records read from now on.
    pub fn set_delimiter(&mut self, delimiter: u8) {
        self.core.set_delimiter(delimiter);
    }

    /// Set the quote character for the records read from now on.
    pub fn set_quote(&mut self, quote: u8) {
        self.core.set_quote(quote);
    }

    /// Set the comment character for the lines read from now on.
    pub fn set_comment(&mut self, comment: u8) {
        self.core.set_comment(comment);
    }

    /// Enable or disable dropping blank lines from now on.
    pub fn set_skip_blank_lines(&mut self, yes: bool) {
        self.core.set_skip_blank_lines(yes);
    }

    /// Enable or disable dropping comment lines from now on.
    pub fn set_skip_comment_lines(&mut self, yes: bool) {
        self.core.set_skip_comment_lines(yes);
    }
}

/// A position in CSV data.
///
/// A position is used to report errors in CSV data. All positions include
/// the byte offset, line number and record index at which the error
/// occurred.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Position {
    byte: u64,
    line: u64,
    record: u64,
}

impl Default for Position {
    fn default() -> Position {
        Position::new()
    }
}

impl Position {
    /// Returns a new position initialized to the start value.
    pub fn new() -> Position {
        Position { byte: 0, line: 1, record: 0 }
    }

    /// The byte offset, starting at `0`, of this position.
    pub fn byte(&self) -> u64 {
        self.byte
    }
    /// The line number, starting at `1`, of this position.
    pub fn line(&self) -> u64 {
        self.line
    }
    /// The record number of this position.
    ///
    /// The first record is number `1`. A position before any record was
    /// read has record number `0`.
    pub fn record(&self) -> u64 {
        self.record
    }

    /// Set the byte offset of this position.
    pub fn set_byte(&mut self, byte: u64) -> &mut Position {
        self.byte = byte;
        self
    }

    /// Set the line number of this position.
    ///
    /// If the line number is less than `1`, then this method panics.
    pub fn set_line(&mut self, line: u64) -> &mut Position {
        assert!(line > 0);
        self.line = line;
        self
    }

    /// Set the record number of this position.
    pub fn set_record(&mut self, record: u64) -> &mut Position {
        self.record = record;
        self
    }
}

/// An owned iterator over records as strings.
pub struct StringRecordsIntoIter<R> {
    rdr: Reader<R>,
    rec: StringRecord,
    done: bool,
}

impl<R: io::Read> StringRecordsIntoIter<R> {
    fn new(rdr: Reader<R>) -> StringRecordsIntoIter<R> {
        StringRecordsIntoIter { rdr, rec: StringRecord::new(), done: false }
    }

    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<R> {
        &self.rdr
    }

    /// Drop this iterator and return the underlying CSV reader.
    pub fn into_reader(self) -> Reader<R> {
        self.rdr
    }
}

impl<R: io::Read> Iterator for StringRecordsIntoIter<R> {
    type Item = Result<StringRecord>;

    fn next(&mut self) -> Option<Result<StringRecord>> {
        if self.done {
            return None;
        }
        next_record(&mut self.rdr, &mut self.rec, &mut self.done)
    }
}

/// A borrowed iterator over records as strings.
///
/// The `'r` lifetime parameter refers to the lifetime of the underlying
/// CSV `Reader`.
pub struct StringRecordsIter<'r, R: 'r> {
    rdr: &'r mut Reader<R>,
    rec: StringRecord,
    done: bool,
}

impl<'r, R: io::Read> StringRecordsIter<'r, R> {
    fn new(rdr: &'r mut Reader<R>) -> StringRecordsIter<'r, R> {
        StringRecordsIter { rdr, rec: StringRecord::new(), done: false }
    }

    /// Return a reference to the underlying CSV reader.
    pub fn reader(&self) -> &Reader<R> {
        &self.rdr
    }

    /// Return a mutable reference to the underlying CSV reader.
    pub fn reader_mut(&mut self) -> &mut Reader<R> {
        &mut self.rdr
    }
}

impl<'r, R: io::Read> Iterator for StringRecordsIter<'r, R> {
    type Item = Result<StringRecord>;

    fn next(&mut self) -> Option<Result<StringRecord>> {
        if self.done {
            return None;
        }
        next_record(self.rdr, &mut self.rec, &mut self.done)
    }
}

fn next_record<R: io::Read>(
    rdr: &mut Reader<R>,
    rec: &mut StringRecord,
    done: &mut bool,
) -> Option<Result<StringRecord>> {
    match rdr.read_into(rec) {
        Ok(true) => Some(Ok(rec.clone())),
        Ok(false) => {
            *done = true;
            None
        }
        Err(err) => {
            // Only a bad record can be skipped over.
            *done = !matches!(err, Error::Utf8 { .. });
            Some(Err(err))
        }
    }
}
