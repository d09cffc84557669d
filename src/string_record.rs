use std::fmt;
use std::iter::FromIterator;
use std::ops::{self, Range};

/// A single CSV record stored as valid UTF-8.
///
/// All fields live in one contiguous buffer next to the offsets at which
/// each field ends. An empty field is a real field: `get` only returns
/// `None` for indices past the last field.
#[derive(Clone, Default, Eq)]
pub struct StringRecord {
    /// All fields in this record, stored contiguously.
    fields: String,
    /// The end offset of each field in `fields`.
    ends: Vec<usize>,
}

impl StringRecord {
    /// Create a new empty `StringRecord`.
    pub fn new() -> StringRecord {
        StringRecord::default()
    }

    /// Create a new empty `StringRecord` with room for `buffer` bytes of
    /// field data spread over `fields` fields.
    pub fn with_capacity(buffer: usize, fields: usize) -> StringRecord {
        StringRecord {
            fields: String::with_capacity(buffer),
            ends: Vec::with_capacity(fields),
        }
    }

    /// Return the field at index `i`.
    ///
    /// If no field at index `i` exists, then this returns `None`.
    ///
    /// # Example
    ///
    /// ```
    /// use lenient_csv::StringRecord;
    ///
    /// let record = StringRecord::from(vec!["a", "", "c"]);
    /// assert_eq!(record.get(1), Some(""));
    /// assert_eq!(record.get(3), None);
    /// ```
    pub fn get(&self, i: usize) -> Option<&str> {
        self.range(i).map(|range| &self.fields[range])
    }

    /// Returns true if and only if this record has no fields.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of fields in this record.
    pub fn len(&self) -> usize {
        self.ends.len()
    }

    /// Returns an iterator over all fields in this record.
    pub fn iter(&self) -> StringRecordIter<'_> {
        self.into_iter()
    }

    /// Add a new field to the end of this record.
    pub fn push_field(&mut self, field: &str) {
        self.fields.push_str(field);
        self.ends.push(self.fields.len());
    }

    /// Clear this record so that it has zero fields.
    ///
    /// The allocations are kept, so readers can refill the same record over
    /// and over.
    pub fn clear(&mut self) {
        self.fields.clear();
        self.ends.clear();
    }

    /// Return all field data as one string, without any separators.
    pub fn as_slice(&self) -> &str {
        &self.fields
    }

    fn range(&self, i: usize) -> Option<Range<usize>> {
        let end = *self.ends.get(i)?;
        let start = if i == 0 { 0 } else { self.ends[i - 1] };
        Some(start..end)
    }
}

impl fmt::Debug for StringRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "StringRecord(")?;
        f.debug_list().entries(self.iter()).finish()?;
        write!(f, ")")
    }
}

impl PartialEq for StringRecord {
    fn eq(&self, other: &StringRecord) -> bool {
        self.ends == other.ends && self.fields == other.fields
    }
}

impl<T: AsRef<str>> PartialEq<[T]> for StringRecord {
    fn eq(&self, other: &[T]) -> bool {
        self.len() == other.len()
            && self.iter().zip(other).all(|(a, b)| a == b.as_ref())
    }
}

impl<T: AsRef<str>> PartialEq<Vec<T>> for StringRecord {
    fn eq(&self, other: &Vec<T>) -> bool {
        self == other.as_slice()
    }
}

impl<'a, T: AsRef<str>> PartialEq<[T]> for &'a StringRecord {
    fn eq(&self, other: &[T]) -> bool {
        **self == *other
    }
}

impl<'a, T: AsRef<str>> PartialEq<Vec<T>> for &'a StringRecord {
    fn eq(&self, other: &Vec<T>) -> bool {
        **self == *other
    }
}

impl ops::Index<usize> for StringRecord {
    type Output = str;

    fn index(&self, i: usize) -> &str {
        match self.get(i) {
            Some(field) => field,
            None => panic!(
                "field index {} out of bounds for record with {} fields",
                i,
                self.len()
            ),
        }
    }
}

impl<T: AsRef<str>> From<Vec<T>> for StringRecord {
    fn from(xs: Vec<T>) -> StringRecord {
        StringRecord::from_iter(xs)
    }
}

impl<'a, T: AsRef<str>> From<&'a [T]> for StringRecord {
    fn from(xs: &'a [T]) -> StringRecord {
        let mut record = StringRecord::with_capacity(0, xs.len());
        record.extend(xs);
        record
    }
}

impl<T: AsRef<str>> FromIterator<T> for StringRecord {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> StringRecord {
        let mut record = StringRecord::new();
        record.extend(iter);
        record
    }
}

impl<T: AsRef<str>> Extend<T> for StringRecord {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for x in iter {
            self.push_field(x.as_ref());
        }
    }
}

impl<'a> IntoIterator for &'a StringRecord {
    type IntoIter = StringRecordIter<'a>;
    type Item = &'a str;

    fn into_iter(self) -> StringRecordIter<'a> {
        StringRecordIter { r: self, i: 0 }
    }
}

/// An iterator over the fields in a string record.
///
/// The `'r` lifetime variable refers to the lifetime of the `StringRecord`
/// that is being iterated over.
#[derive(Clone)]
pub struct StringRecordIter<'r> {
    r: &'r StringRecord,
    i: usize,
}

impl<'r> Iterator for StringRecordIter<'r> {
    type Item = &'r str;

    fn next(&mut self) -> Option<&'r str> {
        let field = self.r.get(self.i)?;
        self.i += 1;
        Some(field)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.r.len() - self.i;
        (n, Some(n))
    }
}

impl<'r> ExactSizeIterator for StringRecordIter<'r> {}

#[cfg(feature = "serde")]
impl serde::Serialize for StringRecord {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for StringRecord {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<StringRecord, D::Error> {
        let fields: Vec<String> = serde::Deserialize::deserialize(deserializer)?;
        Ok(StringRecord::from(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::StringRecord;

    #[test]
    fn empty_fields_are_fields() {
        let mut rec = StringRecord::new();
        assert!(rec.is_empty());
        assert_eq!(rec.get(0), None);

        rec.push_field("");
        assert_eq!(rec.len(), 1);
        assert_eq!(rec.get(0), Some(""));

        rec.push_field("foo");
        rec.push_field("");
        assert_eq!(rec, vec!["", "foo", ""]);
        assert_eq!(rec.as_slice(), "foo");
    }

    #[test]
    fn iter_and_index() {
        let rec = StringRecord::from(vec!["a", "bc", "日本"]);
        assert_eq!(rec.iter().collect::<Vec<_>>(), vec!["a", "bc", "日本"]);
        assert_eq!(rec.iter().len(), 3);
        assert_eq!(&rec[2], "日本");

        let mut it = rec.iter();
        it.next();
        assert_eq!(it.size_hint(), (2, Some(2)));
    }

    #[test]
    #[should_panic]
    fn index_out_of_bounds() {
        let rec = StringRecord::from(vec!["a"]);
        let _ = &rec[1];
    }

    #[test]
    fn with_capacity_starts_empty() {
        let mut rec = StringRecord::with_capacity(16, 4);
        assert!(rec.is_empty());
        assert_eq!(rec.as_slice(), "");
        rec.push_field("a");
        assert_eq!(rec, vec!["a"]);

        let from_slice = StringRecord::from(&["x", "", "z"][..]);
        assert_eq!(from_slice.len(), 3);
        assert_eq!(from_slice.get(1), Some(""));
    }

    #[test]
    fn clear_then_reuse() {
        let mut rec: StringRecord = vec!["x", "y"].into_iter().collect();
        rec.clear();
        assert_eq!(rec.len(), 0);
        rec.extend(&["z"]);
        assert_eq!(rec, vec!["z"]);
    }

    #[test]
    fn equality_depends_on_boundaries() {
        let ab = StringRecord::from(vec!["ab"]);
        let a_b = StringRecord::from(vec!["a", "b"]);
        assert_ne!(ab, a_b);
        assert_eq!(a_b, StringRecord::from(&["a", "b"][..]));
    }

    #[test]
    fn debug_lists_fields() {
        let rec = StringRecord::from(vec!["a", ""]);
        assert_eq!(format!("{:?}", rec), r#"StringRecord(["a", ""])"#);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_as_sequence() {
        let rec = StringRecord::from(vec!["a", "", "c\"d"]);
        let json = serde_json::to_string(&rec).unwrap();
        assert_eq!(json, r#"["a","","c\"d"]"#);

        let back: StringRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }
}
