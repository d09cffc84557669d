/*!
`lenient-csv-core` provides the I/O-free building blocks of a tolerant CSV
reader and writer.

The [`Reader`](struct.Reader.html) type is a tokenizer: callers feed it
chunks of bytes and it splits them into fields and records, handling mixed
quoting, `\r`/`\n`/`\r\n` terminators, whitespace trimming and the dropping
of blank or comment lines. It never fails.

The [`Writer`](struct.Writer.html) type is the matching encoder: it decides
which fields need quotes and escapes embedded quotes by doubling them.

Most users want the `lenient-csv` crate, which wraps both types around
`std::io` readers and writers and exposes records as strings.

# Example

```
use lenient_csv_core::{ReadRecordResult, Reader};

let mut rdr = Reader::new();
let (mut out, mut ends) = (vec![], vec![]);

let (res, nin) = rdr.read_record(b"a, \"b,c\" \nd", &mut out, &mut ends);
assert_eq!(res, ReadRecordResult::Record);
assert_eq!(nin, 10);
assert_eq!(&out[..ends[0]], b"a");
assert_eq!(&out[ends[0]..ends[1]], b" b,c ");
```
*/

#![deny(missing_docs)]

pub use crate::reader::{ReadRecordResult, Reader, ReaderBuilder};
pub use crate::writer::{QuoteStyle, Writer, WriterBuilder};

mod reader;
mod writer;

/// A record terminator for writing.
///
/// Readers always recognize `\r`, `\n` and `\r\n` as terminators. Writers
/// emit the terminator configured here. The default is the host's newline
/// convention.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Terminator {
    /// Writes `\r\n`.
    CRLF,
    /// Writes the byte given.
    Any(u8),
}

impl Default for Terminator {
    #[cfg(windows)]
    fn default() -> Terminator {
        Terminator::CRLF
    }

    #[cfg(not(windows))]
    fn default() -> Terminator {
        Terminator::Any(b'\n')
    }
}
