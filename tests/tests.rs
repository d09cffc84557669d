use std::error::Error;
use std::io::{self, Read};

use lenient_csv::{
    QuoteStyle, Reader, ReaderBuilder, StringRecord, Terminator, Writer,
    WriterBuilder,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_all(builder: &WriterBuilder, records: &[Vec<&str>]) -> Vec<u8> {
    let mut wtr = builder.from_writer(vec![]);
    for record in records {
        wtr.write_record(record).unwrap();
    }
    wtr.into_inner().unwrap()
}

fn read_all(builder: &ReaderBuilder, data: &[u8]) -> Vec<Vec<String>> {
    builder
        .from_reader(data)
        .into_records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

fn round_trip(
    wbuilder: &WriterBuilder,
    rbuilder: &ReaderBuilder,
    records: Vec<Vec<&str>>,
) {
    let data = write_all(wbuilder, &records);
    let got = read_all(rbuilder, &data);
    assert_eq!(got, records, "data: {:?}", String::from_utf8_lossy(&data));
}

#[test]
fn round_trip_special_fields() {
    init_logging();
    let records = vec![
        vec!["plain", "with,comma", "with\"quote"],
        vec!["lf\nin", "cr\rin", "crlf\r\nin"],
        vec!["\"", "\"\"", ","],
        vec!["# not a comment", "", "日本語"],
    ];
    for term in &[Terminator::Any(b'\n'), Terminator::CRLF] {
        let mut wbuilder = WriterBuilder::new();
        wbuilder.terminator(*term);
        round_trip(&wbuilder, &ReaderBuilder::new(), records.clone());
    }
    round_trip(&WriterBuilder::new(), &ReaderBuilder::new(), records);
}

#[test]
fn round_trip_custom_delimiter_and_quote() {
    init_logging();
    let records = vec![
        vec!["a;b", "it's", "x,y", "\"q\""],
        vec!["'", ";;", "", "z"],
    ];
    let mut wbuilder = WriterBuilder::new();
    wbuilder.delimiter(b';').quote(b'\'');
    let mut rbuilder = ReaderBuilder::new();
    rbuilder.delimiter(b';').quote(b'\'');
    round_trip(&wbuilder, &rbuilder, records);
}

#[test]
fn round_trip_whitespace_needs_quote_all() {
    init_logging();
    let records = vec![vec![" lead", "trail\t", " both ", ""]];

    let mut wbuilder = WriterBuilder::new();
    wbuilder.quote_all(true);
    round_trip(&wbuilder, &ReaderBuilder::new(), records.clone());

    // Without quotes, the reader trims the whitespace away.
    let data = write_all(&WriterBuilder::new(), &records);
    assert_eq!(
        read_all(&ReaderBuilder::new(), &data),
        vec![vec!["lead", "trail", "both", ""]]
    );
}

#[test]
fn round_trip_quote_style_necessary_is_minimal() {
    let mut wbuilder = WriterBuilder::new();
    wbuilder.quote_style(QuoteStyle::Necessary).terminator(Terminator::CRLF);
    let data = write_all(&wbuilder, &[vec!["a", "b c", "d,e"]]);
    assert_eq!(data, b"a,b c,\"d,e\"\r\n");
}

#[test]
fn semicolon_example() {
    init_logging();
    let mut rbuilder = ReaderBuilder::new();
    rbuilder.delimiter(b';');
    assert_eq!(
        read_all(&rbuilder, b"a;b;c\nd;e\nf;\ng;h;i;j\nk"),
        vec![
            vec!["a", "b", "c"],
            vec!["d", "e", ""],
            vec!["f", "", ""],
            vec!["g", "h", "i", "j"],
            vec!["k", "", ""],
        ]
    );
}

#[test]
fn doubled_quotes_example() {
    let mut wbuilder = WriterBuilder::new();
    wbuilder.terminator(Terminator::Any(b'\n'));
    let data = write_all(&wbuilder, &[vec!["a\"b\"c", "line\nbreak"]]);
    assert_eq!(data, b"\"a\"\"b\"\"c\",\"line\nbreak\"\n");
}

#[test]
fn mixed_quoting_example() {
    let got =
        read_all(&ReaderBuilder::new(), br#"Mix: """fine""" ingredients"#);
    assert_eq!(got, vec![vec![r#"Mix: "fine" ingredients"#]]);
}

#[test]
fn trailing_terminator_makes_no_difference() {
    let pairs: [(&[u8], &[u8]); 3] = [
        (b"a,b\nc", b"a,b\nc\n"),
        (b"x", b"x\r\n"),
        (b"\"q\nq\"", b"\"q\nq\"\r"),
    ];
    for &(without, with) in pairs.iter() {
        assert_eq!(
            read_all(&ReaderBuilder::new(), with),
            read_all(&ReaderBuilder::new(), without)
        );
    }
    assert!(read_all(&ReaderBuilder::new(), b"").is_empty());
}

#[test]
fn line_numbers_count_every_terminator() {
    let data = "a\r\n\"b\rc\r\nd\ne\"\n\nf\r";
    let mut rdr = Reader::from_reader(data.as_bytes());
    let mut lines = vec![];
    while rdr.read_record().unwrap() {
        lines.push(rdr.line_number());
    }
    assert_eq!(lines, vec![2, 6, 7, 8]);
    assert_eq!(rdr.record_number(), 4);
}

#[test]
fn pad_width_is_fixed_by_first_record() {
    let mut rdr = Reader::from_reader(&b"a,b\nc\nd,e,f\ng"[..]);
    let mut widths = vec![];
    while rdr.read_record().unwrap() {
        widths.push(rdr.values().len());
        assert_eq!(rdr.pad_width(), Some(2));
    }
    assert_eq!(widths, vec![2, 2, 3, 2]);
}

/// Hands out its data a few bytes at a time.
struct Chunked<'a> {
    data: &'a [u8],
    size: usize,
}

impl<'a> Read for Chunked<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.size.min(buf.len()).min(self.data.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        self.data = &self.data[n..];
        Ok(n)
    }
}

#[test]
fn chunked_input_parses_like_whole_input() {
    let data = b"col_a, col_b ,\"col\r\nc\"\r\n0aaaa,\"0\"\"b\"\"bb\",0cccc\r\
        \n# note\n\n1aaaa,1bbbb\r2aaaa,'2b',2cccc";
    let mut rbuilder = ReaderBuilder::new();
    rbuilder.skip_blank_lines(true).skip_comment_lines(true);
    let whole = read_all(&rbuilder, data);
    assert_eq!(
        whole,
        vec![
            vec!["col_a", "col_b", "col\r\nc"],
            vec!["0aaaa", "0\"b\"bb", "0cccc"],
            vec!["1aaaa", "1bbbb", ""],
            vec!["2aaaa", "'2b'", "2cccc"],
        ]
    );
    for size in 1..8 {
        let rdr = rbuilder.from_reader(Chunked { data: &data[..], size });
        let chunked: Vec<Vec<String>> = rdr
            .into_records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        assert_eq!(chunked, whole, "chunk size {}", size);
    }
}

#[test]
fn close_semantics() -> Result<(), Box<dyn Error>> {
    init_logging();
    let mut wtr = Writer::from_writer(Vec::<u8>::new());
    wtr.write_record(&["a", "b"])?;
    wtr.close()?;
    wtr.close()?;
    assert!(wtr.is_closed());
    assert!(wtr.write_record(&["c"]).unwrap_err().is_closed());

    let mut rdr = Reader::from_reader(&b"a\nb\n"[..]);
    assert!(rdr.read_record()?);
    rdr.close();
    rdr.close();
    assert!(rdr.read_record().unwrap_err().is_closed());
    assert_eq!(rdr.values(), &vec!["a"]);
    Ok(())
}

#[test]
fn reader_output_feeds_writer() -> Result<(), Box<dyn Error>> {
    let mut rdr = Reader::from_reader(&b"  x  ,\"y \"\n z\n"[..]);
    let mut wtr = WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .quote_all(true)
        .from_writer(vec![]);
    let mut record = StringRecord::new();
    while rdr.read_into(&mut record)? {
        wtr.write_record(&record)?;
    }
    let written = String::from_utf8(wtr.into_inner()?)?;
    assert_eq!(written, "\"x\",\"y \"\n\"z\",\"\"\n");
    Ok(())
}

#[test]
fn files_round_trip() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data.csv");

    let mut wtr = Writer::from_path(&path)?;
    wtr.write_record(&["a", "b,c"])?;
    wtr.write_record(&["d\ne", ""])?;
    assert_eq!(wtr.records_written(), 2);
    wtr.close()?;

    let mut rdr = Reader::from_path(&path)?;
    let records = rdr.records().collect::<Result<Vec<_>, _>>()?;
    assert_eq!(records, vec![vec!["a", "b,c"], vec!["d\ne", ""]]);
    Ok(())
}
