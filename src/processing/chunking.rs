//! Character-budget semantic chunking.
//!
//! The chunker produces overlapping, sentence/paragraph-aware chunks sized for
//! embedding: greedy sentence accumulation toward a target size, a word-tail
//! overlap seeded into the following chunk, and hard minimum/maximum bounds. A
//! single sentence longer than the hard maximum is still emitted rather than
//! silently dropped.

use super::types::{ChunkingError, EmbeddingChunk};

/// Assumed average word length used to convert the character overlap budget
/// into a word count. A heuristic with no normalization for non-Latin scripts;
/// preserved as-is.
const AVG_WORD_LENGTH: usize = 5;

/// Character budgets governing chunk boundaries.
#[derive(Debug, Clone)]
pub struct ChunkPolicy {
    /// Nominal chunk size target in characters.
    pub target_size: usize,
    /// Minimum chunk size in characters.
    pub min_size: usize,
    /// Hard maximum chunk size in characters.
    pub max_size: usize,
    /// Overlap budget in characters carried between adjacent chunks.
    pub overlap: usize,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            target_size: 300,
            min_size: 100,
            max_size: 1200,
            overlap: 100,
        }
    }
}

impl ChunkPolicy {
    /// Number of trailing words of a closed chunk seeded into the next buffer.
    fn overlap_word_budget(&self) -> usize {
        self.overlap / AVG_WORD_LENGTH
    }
}

/// Split cleaned content into overlapping semantic chunks.
///
/// Sentences are accumulated greedily: closing the buffer once the target size
/// would be exceeded (provided the minimum is met), appending while under the
/// hard maximum, and otherwise force-appending to avoid losing content. The
/// final flush and the minimum-size filter keep an undersized chunk when it
/// would be the only one, so a short readable document still yields a chunk.
pub fn create_semantic_chunks(content: &str, policy: &ChunkPolicy) -> Vec<String> {
    let content = content.trim();
    if content.is_empty() {
        return Vec::new();
    }

    let paragraphs = split_paragraphs(content);
    let mut chunks: Vec<String> = Vec::new();
    let mut buffer = String::new();

    for (position, paragraph) in paragraphs.iter().enumerate() {
        for sentence in split_sentences(paragraph) {
            let buffer_len = buffer.chars().count();
            let sentence_len = sentence.chars().count();

            if buffer_len + sentence_len > policy.target_size && buffer_len >= policy.min_size {
                let closed = close_chunk(&mut buffer);
                let tail = word_tail(&closed, policy.overlap_word_budget());
                chunks.push(closed);
                buffer = if tail.is_empty() {
                    sentence
                } else {
                    format!("{tail} {sentence}")
                };
            } else if buffer_len + sentence_len <= policy.max_size {
                append_sentence(&mut buffer, &sentence);
            } else if buffer_len >= policy.min_size {
                chunks.push(close_chunk(&mut buffer));
                buffer = sentence;
            } else {
                // Force-append: an oversized chunk beats losing content.
                append_sentence(&mut buffer, &sentence);
            }
        }

        if position + 1 < paragraphs.len() && !buffer.is_empty() {
            buffer.push('\n');
        }
    }

    let remainder = buffer.trim();
    if !remainder.is_empty() && (remainder.chars().count() >= policy.min_size || chunks.is_empty())
    {
        chunks.push(remainder.to_string());
    }

    if chunks.len() > 1 {
        chunks.retain(|chunk| chunk.chars().count() >= policy.min_size);
    }

    chunks
}

/// Zip chunk texts with their pre-computed embedding vectors by index.
///
/// Errors when the two sequences have different lengths; supplying matching
/// arrays is the caller's responsibility.
pub fn create_embedding_chunks(
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
) -> Result<Vec<EmbeddingChunk>, ChunkingError> {
    if chunks.len() != embeddings.len() {
        return Err(ChunkingError::MisalignedEmbeddings {
            chunks: chunks.len(),
            embeddings: embeddings.len(),
        });
    }

    Ok(chunks
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(index, (content, embedding))| EmbeddingChunk {
            word_count: content.split_whitespace().count(),
            char_count: content.chars().count(),
            content,
            index,
            embedding,
        })
        .collect())
}

fn split_paragraphs(content: &str) -> Vec<&str> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

/// Split a paragraph into sentences on `.`/`!`/`?` followed by whitespace,
/// keeping the terminator with the sentence and discarding empty results.
fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = paragraph.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|next| next.is_whitespace()) {
            push_trimmed(&mut sentences, &current);
            current.clear();
        }
    }
    push_trimmed(&mut sentences, &current);

    sentences
}

fn push_trimmed(sentences: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}

fn append_sentence(buffer: &mut String, sentence: &str) {
    if !buffer.is_empty() && !buffer.ends_with('\n') {
        buffer.push(' ');
    }
    buffer.push_str(sentence);
}

fn close_chunk(buffer: &mut String) -> String {
    std::mem::take(buffer).trim().to_string()
}

/// The last `words` whitespace-separated tokens of a chunk, used as the
/// overlap seed for the following buffer.
fn word_tail(text: &str, words: usize) -> String {
    if words == 0 {
        return String::new();
    }
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let start = tokens.len().saturating_sub(words);
    tokens[start..].join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence_block(count: usize) -> String {
        // Each sentence is 50 characters long including the period.
        (0..count)
            .map(|i| format!("This test sentence number {i:02} pads out fifty chars."))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn empty_content_yields_no_chunks() {
        assert!(create_semantic_chunks("", &ChunkPolicy::default()).is_empty());
        assert!(create_semantic_chunks("  \n ", &ChunkPolicy::default()).is_empty());
    }

    #[test]
    fn short_document_yields_a_single_undersized_chunk() {
        let content = "Sentence one. Sentence two. Sentence three.";
        let chunks = create_semantic_chunks(content, &ChunkPolicy::default());
        assert_eq!(chunks, vec![content.to_string()]);
    }

    #[test]
    fn chunks_respect_size_bounds() {
        let policy = ChunkPolicy::default();
        let content = sentence_block(40);
        let chunks = create_semantic_chunks(&content, &policy);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            let len = chunk.chars().count();
            assert!(len >= policy.min_size, "chunk below minimum: {len}");
            assert!(len <= policy.max_size, "chunk above maximum: {len}");
        }
    }

    #[test]
    fn adjacent_chunks_share_an_overlap_tail() {
        let policy = ChunkPolicy::default();
        let content = sentence_block(20);
        let chunks = create_semantic_chunks(&content, &policy);
        assert!(chunks.len() > 1);

        let first_words: Vec<&str> = chunks[0].split_whitespace().collect();
        let budget = policy.overlap / 5;
        let tail = first_words[first_words.len() - budget..].join(" ");
        assert!(
            chunks[1].starts_with(&tail),
            "second chunk should start with the first chunk's tail"
        );
    }

    #[test]
    fn oversized_single_sentence_is_still_emitted() {
        let policy = ChunkPolicy::default();
        let sentence = format!("{} end.", "word".repeat(400));
        let chunks = create_semantic_chunks(&sentence, &policy);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].chars().count() > policy.max_size);
    }

    #[test]
    fn document_without_paragraph_breaks_is_one_paragraph() {
        let content = sentence_block(8);
        let chunks = create_semantic_chunks(&content, &ChunkPolicy::default());
        assert!(!chunks.is_empty());
        assert!(!chunks[0].contains('\n'));
    }

    #[test]
    fn paragraph_boundary_is_preserved_inside_a_chunk() {
        let content = "First paragraph sentence.\n\nSecond paragraph sentence.";
        let chunks = create_semantic_chunks(content, &ChunkPolicy::default());
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains('\n'));
    }

    #[test]
    fn embedding_chunks_zip_by_index() {
        let chunks = vec!["alpha beta".to_string(), "gamma".to_string()];
        let embeddings = vec![vec![0.1, 0.2], vec![0.3, 0.4]];
        let records = create_embedding_chunks(chunks.clone(), embeddings.clone()).expect("zip");

        assert_eq!(records.len(), 2);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.index, i);
            assert_eq!(record.content, chunks[i]);
            assert_eq!(record.embedding, embeddings[i]);
        }
        assert_eq!(records[0].word_count, 2);
        assert_eq!(records[0].char_count, 10);
    }

    #[test]
    fn embedding_chunks_reject_length_mismatch() {
        let error = create_embedding_chunks(
            vec!["alpha".to_string(), "beta".to_string()],
            vec![vec![0.1]],
        )
        .unwrap_err();
        assert!(matches!(
            error,
            ChunkingError::MisalignedEmbeddings {
                chunks: 2,
                embeddings: 1
            }
        ));
    }
}
