//! Local BM25 first-stage reranker
//!
//! Okapi BM25 over whitespace tokens of the candidate texts. Cheap enough
//! to run over the full retrieval set before the API-backed second stage
//! sees anything.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::document::DocumentChunk;
use crate::domain::reranker::Reranker;
use crate::domain::DomainError;

const K1: f32 = 1.5;
const B: f32 = 0.75;

/// BM25 reranker keeping the `top_k` best-scoring chunks
#[derive(Debug)]
pub struct Bm25Reranker {
    top_k: usize,
}

impl Bm25Reranker {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace().collect()
}

/// Okapi BM25 scores of `query` against each document, in document order
fn bm25_scores(query: &str, corpus: &[Vec<&str>]) -> Vec<f32> {
    let n = corpus.len();
    let avg_len = corpus.iter().map(|d| d.len()).sum::<usize>() as f32 / n.max(1) as f32;

    // Document frequency per query term
    let query_terms = tokenize(query);
    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for term in &query_terms {
        let df = corpus.iter().filter(|doc| doc.contains(term)).count();
        doc_freq.insert(*term, df);
    }

    corpus
        .iter()
        .map(|doc| {
            let doc_len = doc.len() as f32;
            query_terms
                .iter()
                .map(|term| {
                    let df = doc_freq[*term] as f32;
                    let tf = doc.iter().filter(|&&t| t == *term).count() as f32;
                    if tf == 0.0 {
                        return 0.0;
                    }
                    let idf = ((n as f32 - df + 0.5) / (df + 0.5) + 1.0).ln();
                    let denom = tf + K1 * (1.0 - B + B * doc_len / avg_len.max(1.0));
                    idf * tf * (K1 + 1.0) / denom
                })
                .sum()
        })
        .collect()
}

#[async_trait]
impl Reranker for Bm25Reranker {
    async fn rerank(
        &self,
        query: &str,
        chunks: Vec<DocumentChunk>,
    ) -> Result<Vec<DocumentChunk>, DomainError> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let corpus: Vec<Vec<&str>> = chunks.iter().map(|c| tokenize(&c.text)).collect();
        let scores = bm25_scores(query, &corpus);

        let mut ranked: Vec<(DocumentChunk, f32)> = chunks.into_iter().zip(scores).collect();
        // Stable sort: ties keep retrieval order
        ranked.sort_by(|(_, a), (_, b)| b.total_cmp(a));

        Ok(ranked
            .into_iter()
            .take(self.top_k)
            .map(|(chunk, score)| chunk.with_rerank_score(score))
            .collect())
    }

    fn stage_name(&self) -> &'static str {
        "bm25"
    }
}
