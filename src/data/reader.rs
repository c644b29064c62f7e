// ============================================================
// Layer 4 — Classification TSV Reader
// ============================================================
// Reads files where every line is one labelled sentence:
//
//   <text>\t<label>
//
// Each line is trimmed, split on the tab, the text is run
// through the tokenizer and the pair becomes an Instance.
//
//   "A great movie\tpos" → Instance(text: [A, great, movie], label: pos)
//
// Blank lines are skipped. Any other line that does not split
// into exactly two fields stops the read with the line number,
// so a broken file is never half-loaded silently.
//
// `read_lazy` streams instances straight from the file so the
// caller can count or index them without holding every token.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §13 (Iterators)

use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use crate::data::indexer::SingleIdTokenIndexer;
use crate::domain::instance::Instance;
use crate::domain::traits::{DatasetReader, Tokenizer};
use crate::error::DataError;

pub struct ClassificationTsvReader {
    tokenizer:     Box<dyn Tokenizer>,
    indexer_name:  String,
    token_indexer: SingleIdTokenIndexer,
    lazy:          bool,
}

impl ClassificationTsvReader {
    pub fn new(
        tokenizer:     Box<dyn Tokenizer>,
        indexer_name:  impl Into<String>,
        token_indexer: SingleIdTokenIndexer,
        lazy:          bool,
    ) -> Self {
        Self {
            tokenizer,
            indexer_name: indexer_name.into(),
            token_indexer,
            lazy,
        }
    }

    /// Key of the single token indexer, e.g. "tokens"
    pub fn indexer_name(&self) -> &str {
        &self.indexer_name
    }

    pub fn token_indexer(&self) -> &SingleIdTokenIndexer {
        &self.token_indexer
    }

    pub fn is_lazy(&self) -> bool {
        self.lazy
    }

    /// Stream instances from `path` one line at a time.
    pub fn read_lazy<'a>(
        &'a self,
        path: &Path,
    ) -> Result<impl Iterator<Item = Result<Instance>> + 'a> {
        let file = File::open(path)
            .with_context(|| format!("Cannot open data file '{}'", path.display()))?;
        let path = path.to_path_buf();

        Ok(BufReader::new(file)
            .lines()
            .enumerate()
            .filter_map(move |(i, line)| {
                let line_number = i + 1;
                match line {
                    Ok(line) => self
                        .parse_line(&path, line_number, &line)
                        .map_err(anyhow::Error::from)
                        .transpose(),
                    Err(e) => Some(Err(anyhow::Error::new(e).context(format!(
                        "Cannot read line {} of '{}'",
                        line_number,
                        path.display()
                    )))),
                }
            }))
    }

    /// Parse one line. Blank lines give Ok(None).
    fn parse_line(
        &self,
        path:        &Path,
        line_number: usize,
        line:        &str,
    ) -> Result<Option<Instance>, DataError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let fields: Vec<&str> = line.split('\t').collect();
        match fields.as_slice() {
            [text, label] => Ok(Some(self.text_to_instance(text, Some(label)))),
            _ => Err(DataError::MalformedLine {
                path: path.to_path_buf(),
                line_number,
                fields: fields.len(),
            }),
        }
    }
}

impl DatasetReader for ClassificationTsvReader {
    fn read(&self, path: &Path) -> Result<Vec<Instance>> {
        tracing::info!("Reading instances from '{}'", path.display());
        let instances = self.read_lazy(path)?.collect::<Result<Vec<_>>>()?;
        tracing::info!("Read {} instances", instances.len());
        Ok(instances)
    }

    fn text_to_instance(&self, text: &str, label: Option<&str>) -> Instance {
        Instance::new(self.tokenizer.tokenize(text), label.map(str::to_string))
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tokenizer::WordTokenizer;
    use std::io::Write;

    fn reader() -> ClassificationTsvReader {
        ClassificationTsvReader::new(
            Box::new(WordTokenizer::new()),
            "tokens",
            SingleIdTokenIndexer::default(),
            false,
        )
    }

    fn write_tsv(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_reads_text_and_label() {
        let f = write_tsv("I loved it!\tpos\nBoring plot\tneg\n");
        let instances = reader().read(f.path()).unwrap();

        assert_eq!(instances.len(), 2);
        let first: Vec<&str> = instances[0].text.tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(first, vec!["I", "loved", "it", "!"]);
        assert_eq!(instances[0].label.as_ref().unwrap().label, "pos");
        assert_eq!(instances[1].label.as_ref().unwrap().label, "neg");
    }

    #[test]
    fn test_skips_blank_lines_and_trims() {
        let f = write_tsv("\n  good\tpos  \n\n");
        let instances = reader().read(f.path()).unwrap();
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].label.as_ref().unwrap().label, "pos");
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let f = write_tsv("fine\tpos\nno label here\n");
        let err = reader().read(f.path()).unwrap_err();
        match err.downcast_ref::<DataError>() {
            Some(DataError::MalformedLine { line_number, fields, .. }) => {
                assert_eq!(*line_number, 2);
                assert_eq!(*fields, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_too_many_fields_is_malformed() {
        let f = write_tsv("a\tb\tc\n");
        assert!(reader().read(f.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = reader().read(Path::new("does/not/exist.tsv")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.tsv"));
    }

    #[test]
    fn test_lazy_read_yields_same_instances() {
        let f = write_tsv("a b\tx\nc\ty\n");
        let r = reader();
        let eager = r.read(f.path()).unwrap();
        let lazy: Vec<Instance> = r.read_lazy(f.path()).unwrap().map(|i| i.unwrap()).collect();
        assert_eq!(eager, lazy);
    }
}
