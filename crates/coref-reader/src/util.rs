use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Result, bail};
use conll_types::Sentence;
use regex::Regex;

/// Directory prefix for documents from the COREA medical part.
pub const COREA_MED_ID: &str = "Med";
/// Directory prefix for documents from the COREA spoken Dutch part.
pub const COREA_CGN_ID: &str = "CGN";
/// Directory prefix for documents from the COREA written Dutch part.
pub const COREA_DCOI_ID: &str = "DCOI";

static MED_BASENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^s\d+$").expect("valid Med basename pattern"));
static DCOI_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^WR-P-P-H-\d+\.p\.(\d+)\.s\.\d+(\.\d+)?\.xml").expect("valid DCOI part pattern")
});

/// Split `items` into runs that share the same number.
///
/// With `validate`, the first number must be `start_number` and every next
/// number must either repeat the previous one or exceed it by exactly one.
pub fn split_on_numbering<T>(
    items: impl IntoIterator<Item = T>,
    number: impl Fn(&T) -> u32,
    validate: bool,
    start_number: u32,
) -> Result<Vec<Vec<T>>> {
    let mut groups: Vec<Vec<T>> = Vec::new();
    let mut prev: Option<u32> = None;
    for item in items {
        let current = number(&item);
        match prev {
            None => {
                if validate && current != start_number {
                    bail!(
                        "the first number of the sequence must be {start_number}, found: {current}"
                    );
                }
                groups.push(Vec::new());
            }
            Some(p) if p != current => {
                if validate && Some(current) != p.checked_add(1) {
                    bail!(
                        "number {current} must either be equal to, or exactly one greater than \
                         the previous number ({p})"
                    );
                }
                groups.push(Vec::new());
            }
            Some(_) => {}
        }
        if let Some(group) = groups.last_mut() {
            group.push(item);
        }
        prev = Some(current);
    }
    Ok(groups)
}

/// Number the words of every sentence from 0.
pub fn add_word_numbers(sentences: &mut [Sentence]) {
    for sentence in sentences {
        for (number, word) in sentence.iter_mut().enumerate() {
            word.word_number = Some(number);
        }
    }
}

/// Document ID taken from a file's base name, or `None` when the name does
/// not end in `extension`.
///
/// COREA Med files (`s123<extension>`) are prefixed with `Med/`.
pub fn document_id_from_filename(path: &Path, extension: &str) -> Option<String> {
    let basename = path.file_name()?.to_str()?;
    let bare = basename.strip_suffix(extension)?;
    if MED_BASENAME.is_match(bare) {
        Some(format!("{COREA_MED_ID}/{bare}"))
    } else {
        Some(bare.to_string())
    }
}

/// Document ID from the rough sentence source recorded on COREA words.
///
/// `comp-j/nl/fn007136/fn007136__1.xml` becomes `CGN/comp-j/nl/fn007136` and
/// `WR-P-P-H-0000000001.p.1.s.1.xml` becomes `DCOI/WR-P-P-H-0000000001`.
pub fn corea_document_id(rough: &str) -> Option<String> {
    if rough.starts_with("comp") {
        let dir = rough.rsplit_once('/').map_or("", |(dir, _)| dir);
        Some(format!("{COREA_CGN_ID}/{dir}"))
    } else if rough.starts_with("WR-P-P-H-") {
        let stem = rough.split('.').next().unwrap_or(rough);
        Some(format!("{COREA_DCOI_ID}/{stem}"))
    } else {
        None
    }
}

/// Part number encoded in a DCOI sentence source such as
/// `WR-P-P-H-0000000001.p.12.s.3.xml`.
pub fn corea_part_number(rough: &str) -> Option<u32> {
    DCOI_PART.captures(rough)?.get(1)?.as_str().parse().ok()
}

/// Position of an MMAX sentence, taken from the number after the last `_`
/// of its ID (`markable_12` → 12).
pub fn sentence_position(id: &str) -> Option<u32> {
    id.rsplit('_').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_changing_numbers() {
        let groups = split_on_numbering([1, 1, 2, 3, 3], |n| *n, true, 1).unwrap();
        assert_eq!(groups, vec![vec![1, 1], vec![2], vec![3, 3]]);
        assert!(
            split_on_numbering(Vec::<u32>::new(), |n| *n, true, 1)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn validation_of_numbering() {
        let err = split_on_numbering([0, 1], |n| *n, true, 1).unwrap_err();
        assert!(err.to_string().contains("must be 1, found: 0"));
        let err = split_on_numbering([1, 3], |n| *n, true, 1).unwrap_err();
        assert!(err.to_string().contains("previous number (1)"));
        let err = split_on_numbering([1, 2, 1], |n| *n, true, 1).unwrap_err();
        assert!(err.to_string().contains("number 1"));

        let groups = split_on_numbering([4, 2, 2], |n| *n, false, 1).unwrap();
        assert_eq!(groups, vec![vec![4], vec![2, 2]]);
    }

    #[test]
    fn document_ids_from_filenames() {
        assert_eq!(
            document_id_from_filename(Path::new("/data/wiki-1.naf.json"), ".naf.json"),
            Some("wiki-1".into())
        );
        assert_eq!(
            document_id_from_filename(Path::new("corpus/s123.json"), ".json"),
            Some("Med/s123".into())
        );
        assert_eq!(
            document_id_from_filename(Path::new("s12a.json"), ".json"),
            Some("s12a".into())
        );
        assert_eq!(document_id_from_filename(Path::new("x.xml"), ".json"), None);
    }

    #[test]
    fn corea_helpers() {
        assert_eq!(
            corea_document_id("comp-j/nl/fn007136/fn007136__1.xml"),
            Some("CGN/comp-j/nl/fn007136".into())
        );
        assert_eq!(
            corea_document_id("WR-P-P-H-0000000001.p.1.s.1.xml"),
            Some("DCOI/WR-P-P-H-0000000001".into())
        );
        assert_eq!(corea_document_id("other"), None);

        assert_eq!(corea_part_number("WR-P-P-H-0000000001.p.12.s.3.xml"), Some(12));
        assert_eq!(corea_part_number("WR-P-P-H-0000000001.p.2.s.3.1.xml"), Some(2));
        assert_eq!(corea_part_number("comp-j/nl/fn007136/fn007136__1.xml"), None);
        assert_eq!(corea_part_number("WR-P-P-H-0000000001.p.2.s.3x1.xml"), None);
    }

    #[test]
    fn sentence_positions() {
        assert_eq!(sentence_position("markable_12"), Some(12));
        assert_eq!(sentence_position("7"), Some(7));
        assert_eq!(sentence_position("markable_x"), None);
    }
}
