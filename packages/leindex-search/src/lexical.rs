//! Tantivy-backed lexical index over symbol-level documents ("Lexical
//! index"). Grounded on the teacher's `TantivyLexicalIndex`, but re-scoped
//! from whole-file documents to one document per symbol, and with the
//! identifier tokenizer registered on name-bearing fields instead of a
//! plain text analyzer.

use std::path::Path;
use std::sync::Mutex;

use leindex_storage::{SymbolKind, SymbolRecord};
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, SchemaBuilder, FAST, INDEXED, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, Term};

use crate::error::{Result, SearchError};
use crate::tokenizer::identifier_analyzer;

pub const IDENTIFIER_TOKENIZER_NAME: &str = "leindex_identifier";

#[derive(Debug, Clone, Copy)]
pub struct LexicalHit {
    pub symbol_id: u64,
    pub text_score: f32,
}

#[derive(Clone)]
struct Fields {
    symbol_id: Field,
    project_id: Field,
    file_path: Field,
    symbol_name: Field,
    signature_text: Field,
    docstring: Field,
    language: Field,
    kind: Field,
    complexity: Field,
}

fn build_schema() -> (Schema, Fields) {
    let mut builder: SchemaBuilder = Schema::builder();
    let symbol_id = builder.add_u64_field("symbol_id", STORED | INDEXED | FAST);
    let project_id = builder.add_text_field("project_id", STRING | STORED);
    let file_path = builder.add_text_field(
        "file_path",
        tantivy::schema::TextOptions::default()
            .set_indexing_options(
                tantivy::schema::TextFieldIndexing::default()
                    .set_tokenizer(IDENTIFIER_TOKENIZER_NAME)
                    .set_index_option(tantivy::schema::IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored(),
    );
    let symbol_name = builder.add_text_field(
        "symbol_name",
        tantivy::schema::TextOptions::default()
            .set_indexing_options(
                tantivy::schema::TextFieldIndexing::default()
                    .set_tokenizer(IDENTIFIER_TOKENIZER_NAME)
                    .set_index_option(tantivy::schema::IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored(),
    );
    let signature_text = builder.add_text_field("signature_text", TEXT | STORED);
    let docstring = builder.add_text_field("docstring", TEXT | STORED);
    let language = builder.add_text_field("language", STRING | STORED);
    let kind = builder.add_text_field("kind", STRING | STORED);
    let complexity = builder.add_u64_field("complexity", STORED | FAST);
    let schema = builder.build();
    (
        schema,
        Fields {
            symbol_id,
            project_id,
            file_path,
            symbol_name,
            signature_text,
            docstring,
            language,
            kind,
            complexity,
        },
    )
}

/// Field boosts applied at query time, ordered symbol name > signature >
/// docstring > path ("Field boosts").
const BOOST_SYMBOL_NAME: f32 = 3.0;
const BOOST_SIGNATURE: f32 = 2.0;
const BOOST_DOCSTRING: f32 = 1.5;
const BOOST_PATH: f32 = 1.0;

pub struct LexicalIndex {
    index: Index,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
    fields: Fields,
}

impl LexicalIndex {
    pub fn create_in_ram() -> Result<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        Self::from_index(index, fields)
    }

    pub fn open_or_create(dir: &Path) -> Result<Self> {
        let (schema, fields) = build_schema();
        std::fs::create_dir_all(dir)
            .map_err(|e| SearchError::index(format!("failed to create index dir: {e}")))?;
        let index = if tantivy::directory::MmapDirectory::open(dir).is_ok()
            && dir.read_dir().map(|mut d| d.next().is_some()).unwrap_or(false)
        {
            Index::open_in_dir(dir)?
        } else {
            Index::create_in_dir(dir, schema)?
        };
        Self::from_index(index, fields)
    }

    fn from_index(index: Index, fields: Fields) -> Result<Self> {
        index
            .tokenizers()
            .register(IDENTIFIER_TOKENIZER_NAME, identifier_analyzer());
        let writer = index.writer(50_000_000)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;
        Ok(Self {
            index,
            writer: Mutex::new(writer),
            reader,
            fields,
        })
    }

    /// Replaces any existing document for each symbol's id, then commits once.
    pub fn upsert_symbols(&self, symbols: &[SymbolRecord], language: &str) -> Result<()> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| SearchError::index("lexical index writer lock poisoned"))?;
        for symbol in symbols {
            let term = Term::from_field_u64(self.fields.symbol_id, symbol.id);
            writer.delete_term(term);
            let document = doc!(
                self.fields.symbol_id => symbol.id,
                self.fields.project_id => symbol.project_id.clone(),
                self.fields.file_path => symbol.file_path.clone(),
                self.fields.symbol_name => symbol.symbol_name.clone(),
                self.fields.signature_text => symbol.signature_text.clone(),
                self.fields.docstring => symbol.docstring.clone().unwrap_or_default(),
                self.fields.language => language.to_string(),
                self.fields.kind => symbol.kind.as_str().to_string(),
                self.fields.complexity => symbol.complexity.cyclomatic as u64,
            );
            writer
                .add_document(document)
                .map_err(|e| SearchError::index(format!("failed to add document: {e}")))?;
        }
        self.commit(writer)
    }

    pub fn delete_by_file(&self, project_id: &str, file_path: &str) -> Result<()> {
        let writer = self
            .writer
            .lock()
            .map_err(|_| SearchError::index("lexical index writer lock poisoned"))?;
        let project_term = Term::from_field_text(self.fields.project_id, project_id);
        let path_term = Term::from_field_text(self.fields.file_path, file_path);
        // Conjunctive delete: tantivy deletes are per-term, so scan and
        // delete only documents matching both via a boolean query plan.
        let searcher = self.reader.searcher();
        let query = tantivy::query::BooleanQuery::new(vec![
            (
                tantivy::query::Occur::Must,
                Box::new(tantivy::query::TermQuery::new(
                    project_term,
                    tantivy::schema::IndexRecordOption::Basic,
                )) as Box<dyn tantivy::query::Query>,
            ),
            (
                tantivy::query::Occur::Must,
                Box::new(tantivy::query::TermQuery::new(
                    path_term,
                    tantivy::schema::IndexRecordOption::Basic,
                )) as Box<dyn tantivy::query::Query>,
            ),
        ]);
        let top_docs = searcher.search(&query, &TopDocs::with_limit(10_000))?;
        for (_, address) in top_docs {
            let stored: tantivy::TantivyDocument = searcher.doc(address)?;
            if let Some(symbol_id) = stored
                .get_first(self.fields.symbol_id)
                .and_then(|v| v.as_u64())
            {
                writer.delete_term(Term::from_field_u64(self.fields.symbol_id, symbol_id));
            }
        }
        self.commit(writer)
    }

    fn commit(&self, mut writer: std::sync::MutexGuard<'_, IndexWriter>) -> Result<()> {
        writer.commit()?;
        drop(writer);
        self.reader.reload()?;
        Ok(())
    }

    pub fn search(&self, query_text: &str, limit: usize) -> Result<Vec<LexicalHit>> {
        let searcher = self.reader.searcher();
        let mut parser = QueryParser::for_index(
            &self.index,
            vec![
                self.fields.symbol_name,
                self.fields.signature_text,
                self.fields.docstring,
                self.fields.file_path,
            ],
        );
        parser.set_field_boost(self.fields.symbol_name, BOOST_SYMBOL_NAME);
        parser.set_field_boost(self.fields.signature_text, BOOST_SIGNATURE);
        parser.set_field_boost(self.fields.docstring, BOOST_DOCSTRING);
        parser.set_field_boost(self.fields.file_path, BOOST_PATH);

        let query = parser
            .parse_query(query_text)
            .map_err(|e| SearchError::invalid_query(format!("could not parse query: {e}")))?;

        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;
        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let stored: tantivy::TantivyDocument = searcher.doc(address)?;
            if let Some(symbol_id) = stored
                .get_first(self.fields.symbol_id)
                .and_then(|v| v.as_u64())
            {
                hits.push(LexicalHit {
                    symbol_id,
                    text_score: score,
                });
            }
        }
        Ok(hits)
    }

    /// Exposed so `MetadataFilters::kind` can be checked against the stored
    /// kind string without a round trip through `leindex-storage`.
    pub fn kind_label(kind: SymbolKind) -> &'static str {
        kind.as_str()
    }

    /// Number of live documents in the index, for diagnostics.
    pub fn doc_count(&self) -> usize {
        self.reader.searcher().num_docs() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use leindex_storage::ComplexityMetrics;

    fn symbol(id: u64, name: &str, file_path: &str) -> SymbolRecord {
        SymbolRecord {
            id,
            project_id: "p1".to_string(),
            file_path: file_path.to_string(),
            symbol_name: name.to_string(),
            kind: SymbolKind::Function,
            signature_text: format!("def {name}"),
            parameters: vec![],
            return_type: None,
            docstring: Some("Parses the incoming configuration.".to_string()),
            is_async: false,
            start_line: 1,
            end_line: 10,
            complexity: ComplexityMetrics::default(),
            content_hash: "h".to_string(),
            embedding: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn finds_symbol_by_split_identifier() {
        let index = LexicalIndex::create_in_ram().unwrap();
        index
            .upsert_symbols(&[symbol(1, "parseConfigFile", "src/config.py")], "python")
            .unwrap();
        let hits = index.search("config", 10).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].symbol_id, 1);
    }

    #[test]
    fn upsert_replaces_previous_document_for_same_symbol_id() {
        let index = LexicalIndex::create_in_ram().unwrap();
        index
            .upsert_symbols(&[symbol(1, "oldName", "src/a.py")], "python")
            .unwrap();
        index
            .upsert_symbols(&[symbol(1, "newName", "src/a.py")], "python")
            .unwrap();
        let hits = index.search("oldName", 10).unwrap();
        assert!(hits.is_empty());
        let hits = index.search("newName", 10).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn delete_by_file_removes_only_that_files_symbols() {
        let index = LexicalIndex::create_in_ram().unwrap();
        index
            .upsert_symbols(
                &[
                    symbol(1, "handlerA", "src/a.py"),
                    symbol(2, "handlerB", "src/b.py"),
                ],
                "python",
            )
            .unwrap();
        index.delete_by_file("p1", "src/a.py").unwrap();
        assert!(index.search("handlerA", 10).unwrap().is_empty());
        assert_eq!(index.search("handlerB", 10).unwrap().len(), 1);
    }
}
