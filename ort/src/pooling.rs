//! Pooling strategies for turning per-token hidden states into one sentence vector.

use ndarray::{ArrayView2, Axis};

/// Strategy for pooling hidden states into a single embedding vector.
///
/// Sentence-transformer encoders (MiniLM, MPNet) are trained with [`Mean`](PoolingStrategy::Mean)
/// pooling, decoder embedders (Qwen3-Embedding) with [`LastToken`](PoolingStrategy::LastToken).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PoolingStrategy {
    /// Average all non-padding token hidden states.
    #[default]
    Mean,

    /// Use the last non-padding token's hidden state.
    LastToken,

    /// Use the first token's hidden state (the `[CLS]` token).
    Cls,
}

impl PoolingStrategy {
    /// Pool the hidden states of one sequence.
    ///
    /// `hidden_states` has shape `[seq_len, hidden_dim]` and `attention_mask` marks
    /// real tokens with `1` and padding with `0`. Padding never contributes.
    #[must_use]
    pub fn apply(self, hidden_states: ArrayView2<'_, f32>, attention_mask: &[i64]) -> Vec<f32> {
        let (seq_len, hidden_dim) = hidden_states.dim();
        if seq_len == 0 {
            return vec![0.0; hidden_dim];
        }

        match self {
            Self::Mean => {
                let mut sum = vec![0.0_f32; hidden_dim];
                let mut count = 0_u32;
                for (row, _) in hidden_states
                    .axis_iter(Axis(0))
                    .zip(attention_mask)
                    .filter(|(_, mask)| **mask != 0)
                {
                    count += 1;
                    for (acc, value) in sum.iter_mut().zip(row.iter()) {
                        *acc += value;
                    }
                }
                if count == 0 {
                    return sum;
                }
                #[allow(clippy::cast_precision_loss)]
                let count = count as f32;
                sum.iter_mut().for_each(|v| *v /= count);
                sum
            }
            Self::LastToken => {
                let last = attention_mask
                    .iter()
                    .take(seq_len)
                    .rposition(|&m| m != 0)
                    .unwrap_or(seq_len - 1);
                hidden_states.row(last).to_vec()
            }
            Self::Cls => hidden_states.row(0).to_vec(),
        }
    }
}

/// L2 normalize a vector in place. Zero vectors are left untouched.
pub fn l2_normalize(vec: &mut [f32]) {
    let norm: f32 = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vec.iter_mut().for_each(|v| *v /= norm);
    }
}
