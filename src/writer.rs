use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use lenient_csv_core::{
    QuoteStyle, Terminator, Writer as CoreWriter,
    WriterBuilder as CoreWriterBuilder,
};
use log::{debug, trace};

use crate::error::{Error, Result};

/// Builds a CSV writer with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, record terminator
/// and quoting. Once a CSV `Writer` is built, its delimiter, quote character
/// and quoting style can still be changed with its `set_*` methods, which
/// affect the records written afterwards.
#[derive(Debug)]
pub struct WriterBuilder {
    builder: CoreWriterBuilder,
    capacity: usize,
}

impl Default for WriterBuilder {
    fn default() -> WriterBuilder {
        WriterBuilder {
            builder: CoreWriterBuilder::default(),
            capacity: 8 * (1 << 10),
        }
    }
}

impl WriterBuilder {
    /// Create a new builder for configuring CSV writing.
    ///
    /// To convert a builder into a writer, call one of the methods starting
    /// with `from_`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::error::Error;
    /// use lenient_csv::{Terminator, WriterBuilder};
    ///
    /// # fn main() { example().unwrap(); }
    /// fn example() -> Result<(), Box<dyn Error>> {
    ///     let mut wtr = WriterBuilder::new()
    ///         .delimiter(b';')
    ///         .terminator(Terminator::Any(b'\n'))
    ///         .from_writer(vec![]);
    ///     wtr.write_record(&["a", "b;c"])?;
    ///     wtr.write_record(&["x y", ""])?;
    ///
    ///     let data = String::from_utf8(wtr.into_inner()?)?;
    ///     assert_eq!(data, "a;\"b;c\"\nx y;\n");
    ///     Ok(())
    /// }
    /// ```
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// Build a CSV writer from this configuration that writes data to the
    /// given file path. The file is truncated if it already exists.
    ///
    /// If there was a problem opening the file at the given path, then this
    /// returns the corresponding error.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Writer<File>> {
        Ok(Writer::new(self, File::create(path)?))
    }

    /// Build a CSV writer from this configuration that writes data to `wtr`.
    ///
    /// Note that the CSV writer is buffered automatically, so you should not
    /// wrap `wtr` in a buffered writer like `io::BufWriter`.
    pub fn from_writer<W: io::Write>(&self, wtr: W) -> Writer<W> {
        Writer::new(self, wtr)
    }

    /// The field delimiter to use when writing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut WriterBuilder {
        self.builder.delimiter(delimiter);
        self
    }

    /// The record terminator to use when writing CSV.
    ///
    /// The default is `\r\n` on Windows and `\n` everywhere else.
    pub fn terminator(&mut self, term: Terminator) -> &mut WriterBuilder {
        self.builder.terminator(term);
        self
    }

    /// The quoting style to use when writing CSV.
    ///
    /// By default, this is set to `QuoteStyle::Necessary`, which quotes a
    /// field only when it contains the delimiter, the quote character, `\r`
    /// or `\n`. Leading or trailing whitespace is written as is, which means
    /// a reader trims it away again. Use `QuoteStyle::Always` to preserve it.
    pub fn quote_style(&mut self, style: QuoteStyle) -> &mut WriterBuilder {
        self.builder.quote_style(style);
        self
    }

    /// Quote every field when `yes` is true.
    ///
    /// This is a shorthand for `quote_style(QuoteStyle::Always)`, and
    /// `quote_all(false)` restores `QuoteStyle::Necessary`.
    pub fn quote_all(&mut self, yes: bool) -> &mut WriterBuilder {
        let style =
            if yes { QuoteStyle::Always } else { QuoteStyle::Necessary };
        self.quote_style(style)
    }

    /// The quote character to use when writing CSV.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut WriterBuilder {
        self.builder.quote(quote);
        self
    }

    /// Set the capacity (in bytes) of the internal buffer used in the CSV
    /// writer.
    pub fn buffer_capacity(&mut self, capacity: usize) -> &mut WriterBuilder {
        self.capacity = capacity;
        self
    }
}

/// A CSV writer.
///
/// This writer turns records into CSV data that a `Reader` with the same
/// delimiter and quote character reads back field for field. Fields are
/// quoted when they contain the delimiter, the quote character, `\r` or
/// `\n`, and quotes inside quoted fields are doubled.
///
/// The writer is buffered. Data is flushed when `flush`, `close` or
/// `into_inner` is called, and on a best effort basis when the writer is
/// dropped.
///
/// # Example
///
/// ```
/// use std::error::Error;
/// use lenient_csv::{Terminator, WriterBuilder};
///
/// # fn main() { example().unwrap(); }
/// fn example() -> Result<(), Box<dyn Error>> {
///     let mut wtr = WriterBuilder::new()
///         .terminator(Terminator::Any(b'\n'))
///         .from_writer(vec![]);
///     wtr.write_record(&["a\"b\"c", "line\nbreak"])?;
///
///     let data = String::from_utf8(wtr.into_inner()?)?;
///     assert_eq!(data, "\"a\"\"b\"\"c\",\"line\nbreak\"\n");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Writer<W: io::Write> {
    core: CoreWriter,
    /// The underlying writer. `None` once the writer is closed.
    wtr: Option<io::BufWriter<W>>,
    /// Scratch space for encoding one record.
    buf: Vec<u8>,
    state: WriterState,
}

#[derive(Debug)]
struct WriterState {
    /// The number of records written so far.
    records: u64,
    /// Set while a write to the underlying writer is in progress, so that a
    /// panicking writer is not flushed again on drop.
    panicked: bool,
}

impl<W: io::Write> Drop for Writer<W> {
    fn drop(&mut self) {
        if self.wtr.is_some() && !self.state.panicked {
            let _ = self.flush();
        }
    }
}

impl Writer<File> {
    /// Build a CSV writer with a default configuration that writes data to
    /// the given file path. The file is truncated if it already exists.
    ///
    /// If there was a problem opening the file at the given path, then this
    /// returns the corresponding error.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Writer<File>> {
        WriterBuilder::new().from_path(path)
    }
}

impl<W: io::Write> Writer<W> {
    fn new(builder: &WriterBuilder, wtr: W) -> Writer<W> {
        Writer {
            core: builder.builder.build(),
            wtr: Some(io::BufWriter::with_capacity(builder.capacity, wtr)),
            buf: vec![],
            state: WriterState { records: 0, panicked: false },
        }
    }

    /// Build a CSV writer with a default configuration that writes data to
    /// `wtr`.
    ///
    /// To customize CSV writing, use a `WriterBuilder`.
    pub fn from_writer(wtr: W) -> Writer<W> {
        WriterBuilder::new().from_writer(wtr)
    }

    /// Write a single record.
    ///
    /// The fields are joined with the delimiter and followed by the record
    /// terminator. A record without any fields is written as a bare
    /// terminator. Fields may be anything that can be viewed as bytes, such
    /// as `&str`, `String` or `&[u8]`.
    ///
    /// # Example
    ///
    /// ```
    /// use std::error::Error;
    /// use lenient_csv::{Terminator, WriterBuilder};
    ///
    /// # fn main() { example().unwrap(); }
    /// fn example() -> Result<(), Box<dyn Error>> {
    ///     let mut wtr = WriterBuilder::new()
    ///         .terminator(Terminator::CRLF)
    ///         .from_writer(vec![]);
    ///     wtr.write_record(&["a", "b"])?
    ///         .write_record(vec![String::from("c")])?
    ///         .write_record(Vec::<&str>::new())?;
    ///     assert_eq!(wtr.records_written(), 3);
    ///
    ///     let data = String::from_utf8(wtr.into_inner()?)?;
    ///     assert_eq!(data, "a,b\r\nc\r\n\r\n");
    ///     Ok(())
    /// }
    /// ```
    pub fn write_record<I, T>(&mut self, record: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let wtr = match self.wtr {
            Some(ref mut wtr) => wtr,
            None => return Err(Error::Closed),
        };
        self.buf.clear();
        let nfields = self.core.write_record(record, &mut self.buf);
        self.state.panicked = true;
        let result = wtr.write_all(&self.buf);
        self.state.panicked = false;
        result?;
        self.state.records += 1;
        trace!(
            "wrote record {} with {} fields",
            self.state.records,
            nfields
        );
        Ok(self)
    }

    /// Flush the contents of the internal buffer to the underlying writer.
    ///
    /// If there was a problem writing to the underlying writer, then an error
    /// is returned.
    pub fn flush(&mut self) -> Result<()> {
        let wtr = match self.wtr {
            Some(ref mut wtr) => wtr,
            None => return Err(Error::Closed),
        };
        self.state.panicked = true;
        let result = wtr.flush();
        self.state.panicked = false;
        result?;
        Ok(())
    }

    /// Flush and release the underlying writer.
    ///
    /// Every later write fails with `Error::Closed`. Closing a closed writer
    /// does nothing and succeeds. The underlying writer is released even when
    /// the final flush fails.
    pub fn close(&mut self) -> Result<()> {
        let mut wtr = match self.wtr.take() {
            Some(wtr) => wtr,
            None => return Ok(()),
        };
        debug!("closing CSV writer after {} records", self.state.records);
        wtr.flush()?;
        Ok(())
    }

    /// Returns true if `close` was called on this writer.
    pub fn is_closed(&self) -> bool {
        self.wtr.is_none()
    }

    /// Flush the contents of the internal buffer and return the underlying
    /// writer.
    pub fn into_inner(mut self) -> Result<W> {
        let wtr = match self.wtr.take() {
            Some(wtr) => wtr,
            None => return Err(Error::Closed),
        };
        wtr.into_inner().map_err(|err| Error::Io(err.into_error()))
    }

    /// Returns the number of records written so far.
    pub fn records_written(&self) -> u64 {
        self.state.records
    }

    /// Set the field delimiter for the records written from now on.
    pub fn set_delimiter(&mut self, delimiter: u8) {
        self.core.set_delimiter(delimiter);
    }

    /// Set the quote character for the records written from now on.
    pub fn set_quote(&mut self, quote: u8) {
        self.core.set_quote(quote);
    }

    /// Set the quoting style for the records written from now on.
    pub fn set_quote_style(&mut self, style: QuoteStyle) {
        self.core.set_quote_style(style);
    }

    /// Quote every field of the records written from now on when `yes` is
    /// true.
    pub fn set_quote_all(&mut self, yes: bool) {
        let style =
            if yes { QuoteStyle::Always } else { QuoteStyle::Necessary };
        self.set_quote_style(style);
    }

    /// Returns a reference to the underlying writer, unless the writer was
    /// closed.
    pub fn get_ref(&self) -> Option<&W> {
        self.wtr.as_ref().map(|wtr| wtr.get_ref())
    }
}
