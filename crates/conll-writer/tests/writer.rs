use std::fs;
use std::io::BufWriter;

use conll_types::{Column, OnMissing, Word};
use conll_writer::{CoNLLWriter, IoSink, WriteError, WriterConfig};

fn word(id: &str, text: &str, number: usize, part: u32) -> Word {
    Word {
        word_number: Some(number),
        part_number: Some(part),
        ..Word::new(id, text)
    }
}

fn sentence(part: u32, words: &[&str]) -> Vec<Word> {
    words
        .iter()
        .enumerate()
        .map(|(n, text)| word(&format!("{part}-{n}-{text}"), text, n, part))
        .collect()
}

fn write(config: WriterConfig, sentences: &[Vec<Word>]) -> Result<Vec<String>, WriteError> {
    let mut lines = Vec::new();
    CoNLLWriter::new(config).write(&mut lines, "doc", sentences)?;
    Ok(lines)
}

fn markers(lines: &[String]) -> Vec<&str> {
    lines
        .iter()
        .map(String::as_str)
        .filter(|l| l.starts_with('#'))
        .collect()
}

#[test]
fn part_transition_writes_one_block_per_part() {
    let lines = write(
        WriterConfig::default(),
        &[
            sentence(0, &["a"]),
            sentence(0, &["b"]),
            sentence(1, &["c"]),
            sentence(1, &["d"]),
        ],
    )
    .expect("write");
    assert_eq!(
        markers(&lines),
        [
            "#begin document (doc); part 000",
            "#end document",
            "#begin document (doc); part 001",
            "#end document",
        ]
    );
    assert_eq!(lines.iter().filter(|l| l.is_empty()).count(), 4);
}

#[test]
fn skipped_parts_get_empty_blocks() {
    let lines = write(WriterConfig::default(), &[sentence(2, &["a"])]).expect("write");
    assert_eq!(
        markers(&lines),
        [
            "#begin document (doc); part 000",
            "#end document",
            "#begin document (doc); part 001",
            "#end document",
            "#begin document (doc); part 002",
            "#end document",
        ]
    );
}

#[test]
fn decreasing_part_number_fails() {
    let err = write(
        WriterConfig::default(),
        &[sentence(1, &["a"]), sentence(0, &["b"])],
    )
    .unwrap_err();
    assert!(matches!(
        err,
        WriteError::PartNumberRegression {
            previous: 1,
            found: 0,
            ..
        }
    ));
}

#[test]
fn part_default_is_only_parsed_when_needed() {
    let mut config = WriterConfig {
        columns: vec![Column::PartNumber, Column::Word],
        ..WriterConfig::default()
    };
    config.defaults.insert(Column::PartNumber, "-".into());

    let lines = write(config.clone(), &[sentence(0, &["a"])]).expect("write");
    assert_eq!(lines[1], "doc   0   a");

    let mut unnumbered = sentence(0, &["b"]);
    unnumbered[0].part_number = None;
    let err = write(config, &[unnumbered]).unwrap_err();
    assert!(matches!(err, WriteError::InvalidPartNumber(p) if p == "-"));
}

#[test]
fn columns_are_right_aligned_per_sentence() {
    let mut first = sentence(0, &["The", "elephant", "ran"]);
    first[0].coref = Some("(0".into());
    first[1].coref = Some("0)".into());
    first[2].problem = Some("0".into());
    let second = sentence(0, &["x"]);

    let lines = write(WriterConfig::default(), &[first, second]).expect("write");
    assert_eq!(
        lines,
        [
            "#begin document (doc); part 000",
            "doc   0        The       (0",
            "doc   1   elephant       0)",
            "doc   2        ran   0    -",
            "",
            "doc   0   x      -",
            "",
            "#end document",
        ]
    );
}

#[test]
fn zero_spacing_still_pads_to_width() {
    let config = WriterConfig {
        columns: vec![Column::Word, Column::Coref],
        min_column_spacing: 0,
        ..WriterConfig::default()
    };
    let mut s = sentence(0, &["I", "you"]);
    s[1].coref = Some("(12)".into());
    let lines = write(config, &[s]).expect("write");
    assert_eq!(lines[1], "doc  I   -");
    assert_eq!(lines[2], "docyou(12)");
}

#[test]
fn missing_policies() {
    let mut s = sentence(0, &["a"]);
    s[0].word_number = None;

    let err = write(WriterConfig::default(), std::slice::from_ref(&s)).unwrap_err();
    assert!(matches!(
        err,
        WriteError::MissingField {
            column: Column::WordNumber,
            ..
        }
    ));

    for policy in [OnMissing::Warn, OnMissing::Nothing] {
        let mut config = WriterConfig::default();
        config.on_missing.insert(Column::WordNumber, policy);
        config.defaults.insert(Column::WordNumber, "?".into());
        let lines = write(config, std::slice::from_ref(&s)).expect("write");
        assert_eq!(lines[1], "doc   ?   a      -");
    }
}

#[test]
fn every_column_can_be_written() {
    let config = WriterConfig {
        columns: Column::ALL.to_vec(),
        min_column_spacing: 1,
        ..WriterConfig::default()
    };
    let lines = write(config, &[sentence(0, &["w"])]).expect("write");
    assert_eq!(lines[1], "doc 0 0 w  [POS] * - - - UNKNOWN * -");
}

#[test]
fn io_sink_writes_to_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("out.conll");
    let file = fs::File::create(&path).expect("create");
    let mut sink = IoSink(BufWriter::new(file));
    CoNLLWriter::default()
        .write(&mut sink, "doc", &[sentence(0, &["hi"])])
        .expect("write");
    drop(sink.into_inner());

    let text = fs::read_to_string(&path).expect("read back");
    assert_eq!(
        text,
        "#begin document (doc); part 000\ndoc   0   hi      -\n\n#end document\n"
    );
}
