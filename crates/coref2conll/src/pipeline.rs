use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use conll_coref::{CorefConverter, CorefSummary};
use conll_types::{OnMissing, Sentence};
use conll_writer::{CoNLLWriter, IoSink, LineSink};
use coref_reader::{ReaderOptions, document_id_from_filename, read_document};
use tracing::{debug, info, warn};

use crate::config::Config;

/// A document after coreference conversion, ready to be written.
#[derive(Clone, Debug)]
pub struct ConvertedDocument {
    pub document_id: String,
    pub sentences: Vec<Sentence>,
    pub summary: CorefSummary,
}

/// Reads, converts and writes single documents with one configuration.
#[derive(Clone, Debug)]
pub struct Converter {
    config: Config,
    reader: ReaderOptions,
    coref: CorefConverter,
    writer: CoNLLWriter,
}

impl Converter {
    pub fn new(config: Config) -> Result<Self> {
        let writer = CoNLLWriter::new(config.writer_config()?);
        Ok(Self {
            reader: config.reader_options(),
            coref: CorefConverter::new(config.coref_options()),
            writer,
            config,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Pick the document ID: the one stored in the file, then the one in its
    /// name, then the configured default according to the missing policy.
    pub fn document_id(&self, input: &Path, stored: Option<&str>) -> Result<String> {
        if let Some(id) = stored {
            return Ok(id.to_string());
        }
        if let Some(id) = document_id_from_filename(input, &self.config.input_extension) {
            return Ok(id);
        }
        match self.config.document_id_on_missing() {
            OnMissing::Throw => bail!("no document ID could be found for {}", input.display()),
            OnMissing::Warn => warn!("no document ID could be found for {}", input.display()),
            OnMissing::Nothing => {}
        }
        Ok(self.config.document_id_default())
    }

    /// Read `input`, add coreference columns and apply the sentence filter.
    pub fn convert(&self, input: &Path) -> Result<ConvertedDocument> {
        let mut doc = read_document(input, self.config.load_mode, &self.reader)?;
        let document_id = self.document_id(input, doc.document.id.as_deref())?;

        let summary = self
            .coref
            .annotate(&mut doc.document, doc.reference_sets)
            .with_context(|| format!("coreference in {}", input.display()))?;
        debug!(
            "{}: {} reference sets, {} mentions, {} filled words",
            document_id, summary.reference_sets, summary.mentions, summary.filled_words
        );

        let filter = self.config.sentence_filter;
        let mut sentences = doc.document.sentences;
        let before = sentences.len();
        sentences.retain(|s| filter.keeps(s));
        if sentences.len() != before {
            debug!(
                "{}: sentence filter kept {} of {} sentences",
                document_id,
                sentences.len(),
                before
            );
        }

        Ok(ConvertedDocument {
            document_id,
            sentences,
            summary,
        })
    }

    pub fn write(&self, sink: &mut impl LineSink, doc: &ConvertedDocument) -> Result<()> {
        self.writer
            .write(sink, &doc.document_id, &doc.sentences)
            .with_context(|| format!("write CoNLL for {}", doc.document_id))
    }

    /// Convert `input` and save the CoNLL output to `output`.
    pub fn convert_file(&self, input: &Path, output: &Path) -> Result<CorefSummary> {
        let doc = self.convert(input)?;
        let file =
            File::create(output).with_context(|| format!("create {}", output.display()))?;
        let mut sink = IoSink(BufWriter::new(file));
        self.write(&mut sink, &doc)?;
        sink.into_inner()
            .flush()
            .with_context(|| format!("flush {}", output.display()))?;
        info!("saved {} to {}", input.display(), output.display());
        Ok(doc.summary)
    }
}
