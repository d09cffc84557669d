/*!
The `lenient-csv` crate reads and writes CSV data without ever rejecting
malformed input.

Real world CSV is messy. Files mix `\r\n`, `\r` and `\n` line endings, quote
only part of a field, leave quotes unterminated or end records early. This
crate does not report any of that as an error. It reads every input with one
fixed grammar instead:

* `\r\n`, `\r` and `\n` are each one line terminator.
* A quote toggles quoted mode anywhere in a field. Inside quoted mode, the
  delimiter and line terminators are plain content and `""` is one literal
  quote.
* Fields that were never quoted lose their leading and trailing spaces and
  tabs. Quoted fields are kept exactly.
* Blank lines and comment lines can optionally be dropped.
* The first record fixes the *pad width*, and shorter records after it are
  padded with empty fields.

The [`Writer`](struct.Writer.html) produces data that the
[`Reader`](struct.Reader.html) reads back field for field.

The I/O-free tokenizer and encoder behind both types live in the
`lenient-csv-core` crate.

# Example

```
use std::error::Error;
use lenient_csv::{ReaderBuilder, Terminator, WriterBuilder};

# fn main() { example().unwrap(); }
fn example() -> Result<(), Box<dyn Error>> {
    let data = "\
# inventory
name, count
\"Mix: \"\"fine\"\" ingredients\", 3
bolts
";
    let mut rdr = ReaderBuilder::new()
        .skip_comment_lines(true)
        .from_reader(data.as_bytes());

    let mut wtr = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(vec![]);
    for result in rdr.records() {
        let record = result?;
        wtr.write_record(&record)?;
    }

    let written = String::from_utf8(wtr.into_inner()?)?;
    assert_eq!(written, "\
name,count
\"Mix: \"\"fine\"\" ingredients\",3
bolts,
");
    Ok(())
}
```
*/

#![deny(missing_docs)]

pub use lenient_csv_core::{QuoteStyle, Terminator};

pub use crate::error::{Error, Result, Utf8Error};
pub use crate::reader::{
    Position, Reader, ReaderBuilder, StringRecordsIntoIter, StringRecordsIter,
};
pub use crate::string_record::{StringRecord, StringRecordIter};
pub use crate::writer::{Writer, WriterBuilder};

mod error;
mod reader;
mod string_record;
mod writer;
