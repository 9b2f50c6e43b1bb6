//! Fact ranking for similarity queries.
//!
//! A fact is a candidate when it sits inside every scope the query names
//! (room, world, sending entity) and carries an embedding of the query's
//! dimension. Candidates are ranked best first; equal scores keep the order
//! the facts were stored in.

use toonctx_core::FactRecord;
use toonctx_core::host::SimilarityQuery;

/// Cosine similarity in `[-1, 1]`, or 0 when the vectors cannot be compared.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    similarity(a, b).unwrap_or(0.0)
}

/// `None` for mismatched dimensions, empty vectors or a zero vector.
fn similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let (dot, aa, bb) = a.iter().zip(b).fold((0.0f64, 0.0f64, 0.0f64), |(dot, aa, bb), (&x, &y)| {
        let (x, y) = (f64::from(x), f64::from(y));
        (dot + x * y, aa + x * x, bb + y * y)
    });
    let norm = (aa * bb).sqrt();
    (norm > f64::EPSILON).then(|| (dot / norm) as f32)
}

/// Whether `fact` lies inside every scope `query` restricts to.
pub fn in_scope(query: &SimilarityQuery, fact: &FactRecord) -> bool {
    fn matches<T: PartialEq>(wanted: &Option<T>, actual: &Option<T>) -> bool {
        wanted.is_none() || wanted.as_ref() == actual.as_ref()
    }
    matches(&query.room_id, &fact.room_id)
        && matches(&query.world_id, &fact.world_id)
        && matches(&query.entity_id, &fact.entity_id)
}

/// The `query.limit` in-scope facts most similar to the query embedding,
/// with `score` filled in.
pub fn search_facts<'a>(
    facts: impl IntoIterator<Item = &'a FactRecord>,
    query: &SimilarityQuery,
) -> Vec<FactRecord> {
    let mut ranked: Vec<FactRecord> = facts
        .into_iter()
        .filter(|fact| in_scope(query, fact))
        .filter_map(|fact| {
            let score = similarity(fact.embedding.as_deref()?, &query.embedding)?;
            Some(FactRecord {
                score,
                ..fact.clone()
            })
        })
        .collect();

    // Stable sort: ties stay in stored order.
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked.truncate(query.limit);
    ranked
}
