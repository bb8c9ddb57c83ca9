//! Lexical BM25 index over alias strings (tantivy, in RAM)

use tantivy::{
    collector::TopDocs,
    query::QueryParser,
    schema::{Field as TantivyField, OwnedValue, Schema, TextFieldIndexing, TextOptions, STORED, STRING},
    tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, TextAnalyzer},
    Index, IndexReader, TantivyDocument,
};

use crate::RetrievalError;

/// Immutable BM25 index over one collection.
///
/// Documents are alias strings; the stored id is the entry's position in
/// the collection, so sparse results line up with the dense index.
pub struct SparseIndex {
    index: Index,
    reader: IndexReader,
    id_field: TantivyField,
    text_field: TantivyField,
}

impl SparseIndex {
    /// Build an in-RAM index over the given texts. The writer is dropped
    /// after the single commit; the index never changes afterwards.
    pub fn build(texts: &[String]) -> Result<Self, RetrievalError> {
        let mut schema_builder = Schema::builder();

        let text_options = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer("alias")
                    .set_index_option(tantivy::schema::IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();

        let id_field = schema_builder.add_text_field("id", STRING | STORED);
        let text_field = schema_builder.add_text_field("text", text_options);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);

        let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(RemoveLongFilter::limit(100))
            .filter(LowerCaser)
            .build();
        index.tokenizers().register("alias", tokenizer);

        let mut writer = index
            .writer(50_000_000)
            .map_err(|e| RetrievalError::Index(e.to_string()))?;

        for (position, text) in texts.iter().enumerate() {
            let mut doc = TantivyDocument::default();
            doc.add_text(id_field, position.to_string());
            doc.add_text(text_field, text);
            writer
                .add_document(doc)
                .map_err(|e| RetrievalError::Index(e.to_string()))?;
        }

        writer
            .commit()
            .map_err(|e| RetrievalError::Index(e.to_string()))?;

        let reader = index
            .reader()
            .map_err(|e| RetrievalError::Index(e.to_string()))?;
        reader
            .reload()
            .map_err(|e| RetrievalError::Index(e.to_string()))?;

        Ok(Self {
            index,
            reader,
            id_field,
            text_field,
        })
    }

    /// Top-k entry positions by BM25 score. User text may carry characters
    /// the query grammar treats specially ("w/l"), so parsing is lenient.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<usize>, RetrievalError> {
        let searcher = self.reader.searcher();
        let query_parser = QueryParser::for_index(&self.index, vec![self.text_field]);

        let (parsed, _errors) = query_parser.parse_query_lenient(query);

        let top_docs = searcher
            .search(&parsed, &TopDocs::with_limit(top_k))
            .map_err(|e| RetrievalError::Search(e.to_string()))?;

        let mut positions = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let doc: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| RetrievalError::Search(e.to_string()))?;
            let id = doc
                .get_first(self.id_field)
                .and_then(|v| match v {
                    OwnedValue::Str(s) => s.parse::<usize>().ok(),
                    _ => None,
                })
                .ok_or_else(|| RetrievalError::Search("document without id".to_string()))?;
            positions.push(id);
        }
        Ok(positions)
    }

    pub fn doc_count(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}
