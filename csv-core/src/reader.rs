use std::mem;

/// Builds a CSV tokenizer with various configuration knobs.
///
/// This builder can be used to tweak the field delimiter, quote character,
/// comment character and line skipping rules. Once a `Reader` is built, its
/// configuration can still be changed through its `set_*` methods, but only
/// bytes fed after the change are affected.
#[derive(Debug, Default)]
pub struct ReaderBuilder {
    rdr: Reader,
}

impl ReaderBuilder {
    /// Create a new builder.
    pub fn new() -> ReaderBuilder {
        ReaderBuilder::default()
    }

    /// Build a CSV tokenizer from this configuration.
    pub fn build(&self) -> Reader {
        self.rdr.clone()
    }

    /// The field delimiter to use when parsing CSV.
    ///
    /// The default is `b','`.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut ReaderBuilder {
        self.rdr.delimiter = delimiter;
        self
    }

    /// The quote character to use when parsing CSV.
    ///
    /// The default is `b'"'`.
    pub fn quote(&mut self, quote: u8) -> &mut ReaderBuilder {
        self.rdr.quote = quote;
        self
    }

    /// The comment character recognized at the start of a line.
    ///
    /// Comment lines are only dropped when `skip_comment_lines` is enabled.
    /// Otherwise they are parsed like any other line.
    ///
    /// The default is `b'#'`.
    pub fn comment(&mut self, comment: u8) -> &mut ReaderBuilder {
        self.rdr.comment = comment;
        self
    }

    /// Whether to drop lines that are empty once spaces and tabs are
    /// trimmed.
    ///
    /// This is disabled by default, in which case a blank line is a record
    /// with a single empty field.
    pub fn skip_blank_lines(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.rdr.skip_blank_lines = yes;
        self
    }

    /// Whether to drop lines whose first non-blank byte is the comment
    /// character.
    ///
    /// This is disabled by default.
    pub fn skip_comment_lines(&mut self, yes: bool) -> &mut ReaderBuilder {
        self.rdr.skip_comment_lines = yes;
        self
    }
}

/// The result of parsing at most one record from CSV data.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReadRecordResult {
    /// The caller provided input was exhausted before the end of a record was
    /// found.
    InputEmpty,
    /// The end of a record was found.
    Record,
    /// All CSV data has been read.
    ///
    /// This state can only be returned when an empty input buffer is provided
    /// by the caller.
    End,
}

impl ReadRecordResult {
    /// Returns true if this result marks the end of a record.
    pub fn is_record(&self) -> bool {
        *self == ReadRecordResult::Record
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum State {
    /// Nothing of the current line has been consumed yet.
    StartRecord,
    /// Only spaces and tabs of the current line have been consumed. They sit
    /// in `pending` until the line is classified.
    LineStart,
    /// Inside a comment line that is being skipped.
    Comment,
    /// A `\r` terminator was just consumed. A directly following `\n`
    /// belongs to it.
    CR,
    InField,
    InQuotedField,
    /// A quote was seen inside a quoted field. The next byte decides between
    /// a doubled quote escape and the end of the quoted segment.
    QuoteInQuotedField,
    End,
}

/// A pull based CSV tokenizer.
///
/// This tokenizer converts a stream of bytes into records using a small
/// state machine. Callers feed it arbitrarily sized chunks of input with
/// `read_record` and signal the end of the data with an empty chunk.
///
/// The grammar is deliberately tolerant. This tokenizer never returns an
/// error and always finds *a* parse:
///
/// * `\r\n`, `\r` and `\n` are each a single line terminator.
/// * A quote toggles between unquoted and quoted mode anywhere in a field,
///   so a field may mix quoted and unquoted segments. Quotes that act as
///   mode toggles are never part of the field.
/// * Inside a quoted segment, two adjacent quotes produce one literal quote.
/// * A field that never entered quoted mode has leading and trailing spaces
///   and tabs removed. A field with any quoted segment is kept verbatim.
/// * A terminator directly followed by the end of the data does not start
///   another record.
#[derive(Clone, Debug)]
pub struct Reader {
    /// The delimiter that separates fields.
    delimiter: u8,
    /// The quotation byte.
    quote: u8,
    /// The byte that starts a comment line.
    comment: u8,
    /// Whether blank lines are dropped.
    skip_blank_lines: bool,
    /// Whether comment lines are dropped.
    skip_comment_lines: bool,
    /// The current state.
    state: State,
    /// Whether the field being parsed has entered quoted mode.
    quoted: bool,
    /// Whether the last byte appended to a quoted field was `\r`.
    quoted_cr: bool,
    /// Where the field being parsed starts in the caller's output buffer.
    field_start: usize,
    /// Leading blanks of a line that has not been classified yet.
    pending: Vec<u8>,
    /// The current line number.
    line: u64,
    /// The number of blank or comment lines dropped so far.
    skipped: u64,
}

impl Default for Reader {
    fn default() -> Reader {
        Reader {
            delimiter: b',',
            quote: b'"',
            comment: b'#',
            skip_blank_lines: false,
            skip_comment_lines: false,
            state: State::StartRecord,
            quoted: false,
            quoted_cr: false,
            field_start: 0,
            pending: vec![],
            line: 1,
            skipped: 0,
        }
    }
}

impl Reader {
    /// Create a new CSV tokenizer with a default configuration.
    pub fn new() -> Reader {
        ReaderBuilder::new().build()
    }

    /// Reset the tokenizer such that it behaves as if it had never been
    /// used. The configuration is kept.
    pub fn reset(&mut self) {
        self.state = State::StartRecord;
        self.quoted = false;
        self.quoted_cr = false;
        self.field_start = 0;
        self.pending.clear();
        self.line = 1;
        self.skipped = 0;
    }

    /// Return the current line number as measured by the number of line
    /// terminators consumed, including terminators inside quoted fields.
    ///
    /// Line numbers start at `1`.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// Return the number of blank and comment lines dropped so far.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped
    }

    /// Returns the field delimiter.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Set the field delimiter for all data fed from now on.
    pub fn set_delimiter(&mut self, delimiter: u8) {
        self.delimiter = delimiter;
    }

    /// Returns the quote character.
    pub fn quote(&self) -> u8 {
        self.quote
    }

    /// Set the quote character for all data fed from now on.
    pub fn set_quote(&mut self, quote: u8) {
        self.quote = quote;
    }

    /// Returns the comment character.
    pub fn comment(&self) -> u8 {
        self.comment
    }

    /// Set the comment character for all lines starting from now on.
    pub fn set_comment(&mut self, comment: u8) {
        self.comment = comment;
    }

    /// Returns whether blank lines are dropped.
    pub fn skips_blank_lines(&self) -> bool {
        self.skip_blank_lines
    }

    /// Enable or disable dropping blank lines from now on.
    pub fn set_skip_blank_lines(&mut self, yes: bool) {
        self.skip_blank_lines = yes;
    }

    /// Returns whether comment lines are dropped.
    pub fn skips_comment_lines(&self) -> bool {
        self.skip_comment_lines
    }

    /// Enable or disable dropping comment lines from now on.
    pub fn set_skip_comment_lines(&mut self, yes: bool) {
        self.skip_comment_lines = yes;
    }

    /// Parse CSV data in `input`, appending field data to `output` and the
    /// end offset of every field to `ends`.
    ///
    /// Calling this routine parses at most a single record. It returns a
    /// `ReadRecordResult` telling the caller what to do next, along with the
    /// number of bytes consumed from `input`.
    ///
    /// Field data is appended with quotes unescaped and unquoted fields
    /// trimmed. Offsets in `ends` are absolute positions in `output`, so the
    /// fields of a record are `output[ends[i - 1]..ends[i]]` (starting at
    /// `0` for the first one). Callers should hand in empty buffers at the
    /// start of every record and must leave them untouched while this
    /// returns `ReadRecordResult::InputEmpty`.
    ///
    /// # Termination
    ///
    /// An empty `input` buffer indicates that there is no CSV data left to
    /// read. Callers should keep calling with an empty buffer until
    /// `ReadRecordResult::End` is returned.
    ///
    /// # Errors
    ///
    /// This tokenizer can never return an error. Instead, it prefers *a*
    /// parse over *no* parse.
    pub fn read_record(
        &mut self,
        input: &[u8],
        output: &mut Vec<u8>,
        ends: &mut Vec<usize>,
    ) -> (ReadRecordResult, usize) {
        if input.is_empty() {
            return (self.transition_final(output, ends), 0);
        }
        let mut nin = 0;
        while nin < input.len() {
            let (consumed, record_end) =
                self.transition(input[nin], output, ends);
            if consumed {
                nin += 1;
            }
            if record_end {
                return (ReadRecordResult::Record, nin);
            }
        }
        (ReadRecordResult::InputEmpty, nin)
    }

    /// Handle the end of the data.
    fn transition_final(
        &mut self,
        output: &mut Vec<u8>,
        ends: &mut Vec<usize>,
    ) -> ReadRecordResult {
        match self.state {
            State::StartRecord | State::CR | State::Comment | State::End => {
                self.state = State::End;
                ReadRecordResult::End
            }
            State::LineStart if self.skip_blank_lines => {
                self.pending.clear();
                self.skipped += 1;
                self.state = State::End;
                ReadRecordResult::End
            }
            State::LineStart => {
                self.state = State::InField;
                self.replay_pending(output, ends);
                self.end_record(output, ends)
            }
            State::InField
            | State::InQuotedField
            | State::QuoteInQuotedField => self.end_record(output, ends),
        }
    }

    /// Feed a single byte to the state machine.
    ///
    /// Returns whether the byte was consumed and whether a record ended.
    /// A byte that is not consumed is fed again in the new state.
    #[inline(always)]
    fn transition(
        &mut self,
        b: u8,
        output: &mut Vec<u8>,
        ends: &mut Vec<usize>,
    ) -> (bool, bool) {
        match self.state {
            State::End => {
                // Data after the end was signalled starts over.
                self.state = State::StartRecord;
                (false, false)
            }
            State::CR => {
                self.state = State::StartRecord;
                (b == b'\n', false)
            }
            State::StartRecord => {
                self.start_record(output);
                if is_blank(b) {
                    self.pending.push(b);
                    self.state = State::LineStart;
                    (true, false)
                } else {
                    self.classify_line(b, output, ends)
                }
            }
            State::LineStart => {
                if is_blank(b) {
                    self.pending.push(b);
                    (true, false)
                } else {
                    self.classify_line(b, output, ends)
                }
            }
            State::Comment => {
                if b == b'\r' {
                    self.line += 1;
                    self.state = State::CR;
                } else if b == b'\n' {
                    self.line += 1;
                    self.state = State::StartRecord;
                }
                (true, false)
            }
            State::InField => {
                if b == self.quote {
                    self.quoted = true;
                    self.quoted_cr = false;
                    self.state = State::InQuotedField;
                    (true, false)
                } else if b == self.delimiter {
                    self.end_field(output, ends);
                    (true, false)
                } else if b == b'\r' {
                    self.line += 1;
                    self.end_record(output, ends);
                    self.state = State::CR;
                    (true, true)
                } else if b == b'\n' {
                    self.line += 1;
                    self.end_record(output, ends);
                    (true, true)
                } else {
                    output.push(b);
                    (true, false)
                }
            }
            State::InQuotedField => {
                if b == self.quote {
                    self.state = State::QuoteInQuotedField;
                } else {
                    if b == b'\r' || (b == b'\n' && !self.quoted_cr) {
                        self.line += 1;
                    }
                    self.quoted_cr = b == b'\r';
                    output.push(b);
                }
                (true, false)
            }
            State::QuoteInQuotedField => {
                if b == self.quote {
                    output.push(b);
                    self.quoted_cr = false;
                    self.state = State::InQuotedField;
                    (true, false)
                } else {
                    self.state = State::InField;
                    (false, false)
                }
            }
        }
    }

    /// Decide what a line is once its first non-blank byte (or its
    /// terminator) shows up. `b` is never consumed here unless the line is
    /// dropped.
    fn classify_line(
        &mut self,
        b: u8,
        output: &mut Vec<u8>,
        ends: &mut Vec<usize>,
    ) -> (bool, bool) {
        let terminator = b == b'\r' || b == b'\n';
        if terminator && self.skip_blank_lines {
            self.pending.clear();
            self.skipped += 1;
            self.line += 1;
            self.state = if b == b'\r' { State::CR } else { State::StartRecord };
            return (true, false);
        }
        if !terminator && self.skip_comment_lines && b == self.comment {
            self.pending.clear();
            self.skipped += 1;
            self.state = State::Comment;
            return (true, false);
        }
        self.state = State::InField;
        self.replay_pending(output, ends);
        (false, false)
    }

    fn start_record(&mut self, output: &[u8]) {
        self.field_start = output.len();
        self.quoted = false;
        self.quoted_cr = false;
        self.pending.clear();
    }

    /// Feed the leading blanks of a line that turned out to hold data back
    /// through the field states, so a blank delimiter or quote still acts as
    /// one.
    fn replay_pending(
        &mut self,
        output: &mut Vec<u8>,
        ends: &mut Vec<usize>,
    ) {
        let mut pending = mem::take(&mut self.pending);
        for &b in &pending {
            while !self.transition(b, output, ends).0 {}
        }
        pending.clear();
        self.pending = pending;
    }

    fn end_field(&mut self, output: &mut Vec<u8>, ends: &mut Vec<usize>) {
        if !self.quoted {
            let start = self.field_start;
            let keep = output[start..]
                .iter()
                .rposition(|&b| !is_blank(b))
                .map_or(0, |i| i + 1);
            output.truncate(start + keep);
            let lead =
                output[start..].iter().take_while(|&&b| is_blank(b)).count();
            output.drain(start..start + lead);
        }
        ends.push(output.len());
        self.field_start = output.len();
        self.quoted = false;
        self.quoted_cr = false;
    }

    fn end_record(
        &mut self,
        output: &mut Vec<u8>,
        ends: &mut Vec<usize>,
    ) -> ReadRecordResult {
        self.end_field(output, ends);
        self.state = State::StartRecord;
        ReadRecordResult::Record
    }
}

/// Spaces and tabs are the only bytes trimmed from unquoted fields.
#[inline(always)]
fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}
