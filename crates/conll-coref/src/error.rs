use thiserror::Error;

pub type Result<T> = std::result::Result<T, CorefError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CorefError {
    #[error("unknown word ID {0:?}")]
    UnknownWordId(String),
    #[error("word ID {0:?} occurs more than once in the document")]
    DuplicateWordId(String),
    #[error("span without any word IDs")]
    EmptySpan,
    #[error(
        "illegal span specification: the first ID of a span must appear before the last ID: {span:?}"
    )]
    InvalidSpanOrder { span: Vec<String> },
    #[error("coreference spans in CoNLL must be consecutive; found {span:?}, which should be {correct:?}")]
    NonConsecutiveSpan {
        span: Vec<String>,
        correct: Vec<String>,
    },
    #[error("cannot automatically correct span {span:?}; tried correcting it to {correct:?}")]
    IllegalCorrection {
        span: Vec<String>,
        correct: Vec<String>,
    },
    #[error("illegal span specification {0:?}: only one '..' is allowed between every pair of ','")]
    MalformedSpanText(String),
    #[error("markable {markable:?} refers to unknown markable {reference:?}")]
    UnknownMarkableReference { markable: String, reference: String },
    #[error("expected {expected} markables in the chains, found {found}; missing: {missing:?}")]
    UnreachableMarkables {
        expected: usize,
        found: usize,
        missing: Vec<String>,
    },
}
