//! Registry of known faces and their identity embeddings.
//!
//! Recognition is nearest-neighbor over Euclidean distance. Embeddings
//! are expected to be L2-normalized, for which a Euclidean threshold of
//! 1.1 separates same-person from different-person pairs on ArcFace-style
//! models.

/// Maximum Euclidean distance at which two embeddings count as the
/// same person.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 1.1;

#[derive(Debug)]
pub struct FaceStore {
    entries: Vec<(String, Vec<f32>)>,
    match_threshold: f32,
}

impl Default for FaceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FaceStore {
    pub fn new() -> Self {
        Self::with_match_threshold(DEFAULT_MATCH_THRESHOLD)
    }

    pub fn with_match_threshold(match_threshold: f32) -> Self {
        Self {
            entries: Vec::new(),
            match_threshold,
        }
    }

    pub fn register(&mut self, name: impl Into<String>, embedding: Vec<f32>) {
        self.entries.push((name.into(), embedding));
    }

    /// The name of the nearest registered face, or `None` when the store
    /// is empty or the nearest entry is farther than the threshold.
    pub fn recognize(&self, embedding: &[f32]) -> Option<&str> {
        let mut best: Option<(&str, f32)> = None;
        for (name, known) in &self.entries {
            let distance = euclidean_distance(embedding, known);
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((name.as_str(), distance));
            }
        }
        best.filter(|&(_, distance)| distance <= self.match_threshold)
            .map(|(name, _)| name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
