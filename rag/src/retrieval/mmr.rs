//! Maximal Marginal Relevance re-ranking.
//!
//! Each step picks the candidate maximising
//! `λ × sim(candidate, query) − (1 − λ) × max(sim(candidate, selected))`.
//!
//! λ = 1.0 keeps raw similarity order, λ = 0.0 optimises for diversity alone.

use crate::index::{Neighbor, cosine_with_norms, norm};

/// Re-ranks `candidates` with MMR and returns the chosen positions, in selection order.
///
/// `candidates` must be sorted by descending query similarity; their `score` is used as
/// the relevance term. Ties on the MMR score go to the candidate that ranked higher by
/// raw similarity. At most `min(k, candidates.len())` positions are returned and none
/// repeats.
#[must_use]
pub fn mmr_select(candidates: &[Neighbor<'_>], k: usize, lambda: f32) -> Vec<usize> {
    let k = k.min(candidates.len());
    if k == 0 {
        return Vec::new();
    }

    let norms: Vec<f32> = candidates
        .iter()
        .map(|candidate| norm(&candidate.entry.embedding))
        .collect();
    // Highest similarity of each candidate to anything selected so far.
    let mut redundancy = vec![f32::NEG_INFINITY; candidates.len()];
    let mut taken = vec![false; candidates.len()];
    let mut selected = Vec::with_capacity(k);

    while selected.len() < k {
        let mut best: Option<(usize, f32)> = None;
        for (position, candidate) in candidates.iter().enumerate() {
            if taken[position] {
                continue;
            }
            let penalty = if selected.is_empty() {
                0.0
            } else {
                redundancy[position]
            };
            let score = lambda.mul_add(candidate.score, -(1.0 - lambda) * penalty);
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((position, score));
            }
        }

        let Some((chosen, _)) = best else {
            break;
        };
        taken[chosen] = true;
        selected.push(chosen);

        let chosen_vector = &candidates[chosen].entry.embedding;
        for (position, candidate) in candidates.iter().enumerate() {
            if taken[position] {
                continue;
            }
            let similarity = cosine_with_norms(
                &candidate.entry.embedding,
                norms[position],
                chosen_vector,
                norms[chosen],
            );
            if similarity > redundancy[position] {
                redundancy[position] = similarity;
            }
        }
    }

    selected
}
