use memchr::{memchr, memchr3};

use crate::Terminator;

/// The quoting style to use when writing CSV data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QuoteStyle {
    /// This puts quotes around every field. Always.
    Always,
    /// This puts quotes around fields only when necessary.
    ///
    /// They are necessary when fields contain a quote, delimiter, `\r` or
    /// `\n`. Leading and trailing whitespace alone does not require quotes.
    ///
    /// This is the default.
    Necessary,
}

impl Default for QuoteStyle {
    fn default() -> QuoteStyle {
        QuoteStyle::Necessary
    }
}

/// A builder for configuring a CSV writer.
///
/// This builder permits specifying the CSV delimiter, terminator, quoting
/// style and more.
#[derive(Debug, Default)]
pub struct WriterBuilder {
    wtr: Writer,
}

impl WriterBuilder {
    /// Create a new builder for configuring a CSV writer.
    pub fn new() -> WriterBuilder {
        WriterBuilder::default()
    }

    /// Build a CSV writer from this configuration.
    pub fn build(&self) -> Writer {
        self.wtr.clone()
    }

    /// The field delimiter to use when writing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut WriterBuilder {
        self.wtr.delimiter = delimiter;
        self
    }

    /// The record terminator to use when writing CSV.
    ///
    /// The default is the host's newline convention: `Terminator::CRLF` on
    /// Windows and `Terminator::Any(b'\n')` everywhere else.
    pub fn terminator(&mut self, term: Terminator) -> &mut WriterBuilder {
        self.wtr.term = term;
        self
    }

    /// The quoting style to use when writing CSV.
    ///
    /// By default, this is set to `QuoteStyle::Necessary`, which will only
    /// use quotes when they are necessary to preserve the integrity of data.
    pub fn quote_style(&mut self, style: QuoteStyle) -> &mut WriterBuilder {
        self.wtr.style = style;
        self
    }

    /// The quote character to use when writing CSV.
    ///
    /// The default value is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut WriterBuilder {
        self.wtr.quote = quote;
        self
    }
}

/// An encoder for CSV data.
///
/// The encoder only decides how bytes look on the wire. It appends encoded
/// fields, delimiters and terminators to caller provided buffers and never
/// performs I/O itself.
///
/// A field is quoted when the quoting style asks for it, and every quote
/// inside a quoted field is doubled. Output of this encoder is always parsed
/// back into the original fields by a `Reader` configured with the same
/// delimiter and quote, except that unquoted fields lose their leading and
/// trailing whitespace.
#[derive(Clone, Debug)]
pub struct Writer {
    delimiter: u8,
    term: Terminator,
    style: QuoteStyle,
    quote: u8,
}

impl Default for Writer {
    fn default() -> Writer {
        Writer {
            delimiter: b',',
            term: Terminator::default(),
            style: QuoteStyle::default(),
            quote: b'"',
        }
    }
}

impl Writer {
    /// Creates a new CSV writer with the default configuration.
    pub fn new() -> Writer {
        Writer::default()
    }

    /// Returns the field delimiter.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Set the field delimiter for every record encoded from now on.
    pub fn set_delimiter(&mut self, delimiter: u8) {
        self.delimiter = delimiter;
    }

    /// Returns the quote character.
    pub fn quote(&self) -> u8 {
        self.quote
    }

    /// Set the quote character for every record encoded from now on.
    pub fn set_quote(&mut self, quote: u8) {
        self.quote = quote;
    }

    /// Returns the quoting style.
    pub fn quote_style(&self) -> QuoteStyle {
        self.style
    }

    /// Set the quoting style for every record encoded from now on.
    pub fn set_quote_style(&mut self, style: QuoteStyle) {
        self.style = style;
    }

    /// Returns the record terminator.
    pub fn terminator(&self) -> Terminator {
        self.term
    }

    /// Set the record terminator for every record encoded from now on.
    pub fn set_terminator(&mut self, term: Terminator) {
        self.term = term;
    }

    /// Encode a complete record, terminator included, into `output`.
    ///
    /// Returns the number of fields written. A record without fields is
    /// encoded as a bare terminator.
    pub fn write_record<I, T>(&self, record: I, output: &mut Vec<u8>) -> usize
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut count = 0;
        for field in record {
            if count > 0 {
                self.write_delimiter(output);
            }
            self.write_field(field.as_ref(), output);
            count += 1;
        }
        self.write_terminator(output);
        count
    }

    /// Encode a single field into `output`, quoting it if necessary.
    pub fn write_field(&self, field: &[u8], output: &mut Vec<u8>) {
        if !self.should_quote(field) {
            output.extend_from_slice(field);
            return;
        }
        output.reserve(field.len() + 2);
        output.push(self.quote);
        let mut rest = field;
        while let Some(i) = memchr(self.quote, rest) {
            output.extend_from_slice(&rest[..=i]);
            output.push(self.quote);
            rest = &rest[i + 1..];
        }
        output.extend_from_slice(rest);
        output.push(self.quote);
    }

    /// Append the field delimiter to `output`.
    pub fn write_delimiter(&self, output: &mut Vec<u8>) {
        output.push(self.delimiter);
    }

    /// Append the record terminator to `output`.
    pub fn write_terminator(&self, output: &mut Vec<u8>) {
        match self.term {
            Terminator::CRLF => output.extend_from_slice(b"\r\n"),
            Terminator::Any(b) => output.push(b),
        }
    }

    /// Returns true if and only if `field` is written with quotes.
    pub fn should_quote(&self, field: &[u8]) -> bool {
        match self.style {
            QuoteStyle::Always => true,
            QuoteStyle::Necessary => {
                memchr3(self.delimiter, self.quote, b'\n', field).is_some()
                    || memchr(b'\r', field).is_some()
                    || match self.term {
                        // A custom terminator must not appear raw either.
                        Terminator::Any(b) => memchr(b, field).is_some(),
                        Terminator::CRLF => false,
                    }
            }
        }
    }
}
