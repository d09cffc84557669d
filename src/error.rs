use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::result;

use crate::reader::Position;

/// A type alias for `Result<T, lenient_csv::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when processing CSV data.
///
/// Malformed CSV is never an error: the reader always finds *a* parse. What
/// can fail is the underlying I/O, the conversion of a record to UTF-8, and
/// any use of a reader or writer after it was closed.
#[derive(Debug)]
pub enum Error {
    /// An I/O error that occurred while reading or writing CSV data.
    Io(io::Error),
    /// A UTF-8 decoding error that occured while reading CSV data into Rust
    /// `String`s.
    Utf8 {
        /// The position of the record in which this error occurred, if
        /// available.
        pos: Option<Position>,
        /// The corresponding UTF-8 error.
        err: Utf8Error,
    },
    /// A reader or writer was used after `close` was called on it.
    Closed,
}

impl Error {
    /// Returns true if this is an I/O error.
    pub fn is_io_error(&self) -> bool {
        match *self {
            Error::Io(_) => true,
            _ => false,
        }
    }

    /// Returns true if this error was caused by using a closed reader or
    /// writer.
    pub fn is_closed(&self) -> bool {
        match *self {
            Error::Closed => true,
            _ => false,
        }
    }

    /// Return the position for this error, if one exists.
    pub fn position(&self) -> Option<&Position> {
        match *self {
            Error::Utf8 { pos: Some(ref pos), .. } => Some(pos),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Io(err) => err,
            err => io::Error::new(io::ErrorKind::Other, err),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            Error::Utf8 { ref err, .. } => Some(err),
            Error::Closed => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => err.fmt(f),
            Error::Utf8 { pos: None, ref err } => {
                write!(f, "CSV parse error: field {}: {}", err.field(), err)
            }
            Error::Utf8 { pos: Some(ref pos), ref err } => write!(
                f,
                "CSV parse error: record {} \
                 (line {}, field: {}, byte: {}): {}",
                pos.record(),
                pos.line(),
                err.field(),
                pos.byte(),
                err
            ),
            Error::Closed => {
                write!(f, "CSV error: reader or writer has been closed")
            }
        }
    }
}

/// A UTF-8 validation error that occurred while converting the bytes of a
/// record into a `StringRecord`.
///
/// The error includes the index of the field that failed validation, and the
/// last byte at which valid UTF-8 was verified.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Utf8Error {
    /// The field index of a record in which UTF-8 validation failed.
    field: usize,
    /// The index into the given field up to which valid UTF-8 was verified.
    valid_up_to: usize,
}

impl Utf8Error {
    pub(crate) fn new(field: usize, valid_up_to: usize) -> Utf8Error {
        Utf8Error { field, valid_up_to }
    }

    /// The field index of a record in which UTF-8 validation failed.
    pub fn field(&self) -> usize {
        self.field
    }

    /// The index into the given field up to which valid UTF-8 was verified.
    pub fn valid_up_to(&self) -> usize {
        self.valid_up_to
    }
}

impl StdError for Utf8Error {}

impl fmt::Display for Utf8Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "invalid utf-8: invalid UTF-8 in field {} near byte index {}",
            self.field, self.valid_up_to
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{Error, Utf8Error};
    use crate::reader::Position;

    #[test]
    fn display_utf8_with_position() {
        let mut pos = Position::new();
        pos.set_byte(7).set_line(2).set_record(2);
        let err = Error::Utf8 { pos: Some(pos), err: Utf8Error::new(1, 3) };
        assert_eq!(
            err.to_string(),
            "CSV parse error: record 2 (line 2, field: 1, byte: 7): \
             invalid utf-8: invalid UTF-8 in field 1 near byte index 3"
        );
        assert_eq!(err.position().map(|p| p.record()), Some(2));
    }

    #[test]
    fn closed_round_trips_through_io_error() {
        let err: io::Error = Error::Closed.into();
        assert_eq!(err.kind(), io::ErrorKind::Other);

        let err = Error::from(io::Error::new(io::ErrorKind::NotFound, "x"));
        assert!(err.is_io_error());
        assert!(!err.is_closed());
        assert!(Error::Closed.is_closed());
    }
}
