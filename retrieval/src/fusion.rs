use crate::config::OrchestratorConfig;
use crate::intent::{FusionMethod, HybridWeights};
use crate::result::{FusedHit, RankedHit, SourceKind};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tabula_vector_index::{CandidateId, Payload};

/// Score normalization applied for display/threshold purposes only,
/// never before the fusion math itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScoreNormalization {
    /// Raw fused score
    #[default]
    None,
    /// Linear rescale of the fused-score range to [0, 1]
    Percentage,
    /// Square-root compression of score/max, for rough comparability
    /// with raw similarity scores
    Exponential,
}

/// Fusion engine combining independently-ranked candidate lists.
///
/// Raw similarity scores are not comparable across sources (cosine
/// similarity from one field vs. a keyword-match indicator from
/// another), so candidates are scored by rank position alone via
/// Reciprocal Rank Fusion: `score(c) = Σ w_L / (k + rank_L(c))` over the
/// lists containing `c`.
pub struct FusionEngine {
    config: OrchestratorConfig,
}

struct Accumulator {
    score: f64,
    best_rank: usize,
    sources: BTreeSet<SourceKind>,
    payload: Payload,
}

impl FusionEngine {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self { config }
    }

    /// Stage one: fuse same-modality lists (e.g. the per-field vector
    /// searches for "description" and "notes") into one ranking, with
    /// equal weights and the tighter per-field constant.
    pub fn fuse_fields(&self, lists: Vec<Vec<RankedHit>>) -> Vec<FusedHit> {
        let non_empty: Vec<Vec<RankedHit>> =
            lists.into_iter().filter(|l| !l.is_empty()).collect();
        if non_empty.is_empty() {
            return Vec::new();
        }

        let weight = 1.0 / non_empty.len() as f64;
        let weighted: Vec<(f64, Vec<RankedHit>)> =
            non_empty.into_iter().map(|l| (weight, l)).collect();

        self.reciprocal_rank(weighted, self.config.per_field_rrf_k)
    }

    /// Stage two: fuse the vector-modality ranking against the SQL row
    /// list using the broader cross-modality constant and the intent's
    /// weights, renormalized over the sources actually present.
    pub fn fuse_modalities(
        &self,
        sql: Vec<RankedHit>,
        vector: Vec<RankedHit>,
        weights: &HybridWeights,
    ) -> Vec<FusedHit> {
        let mut weighted = Vec::new();
        if !sql.is_empty() {
            weighted.push((weights.sql_weight, sql));
        }
        if !vector.is_empty() {
            weighted.push((weights.vector_weight, vector));
        }

        let total: f64 = weighted.iter().map(|(w, _)| w).sum();
        if weighted.is_empty() || total <= 0.0 {
            return Vec::new();
        }
        for (w, _) in &mut weighted {
            *w /= total;
        }

        match weights.fusion_method {
            FusionMethod::Rrf => {
                self.reciprocal_rank(weighted, self.config.cross_modality_rrf_k)
            }
            FusionMethod::Weighted => self.linear_rank_decay(weighted),
        }
    }

    /// Turn a fused ranking back into a ranked list so it can enter a
    /// further fusion round.
    pub fn to_ranked(hits: &[FusedHit], kind: SourceKind, tag: &str) -> Vec<RankedHit> {
        hits.iter()
            .enumerate()
            .map(|(rank, hit)| RankedHit {
                candidate_id: hit.candidate_id.clone(),
                source_rank: rank,
                source_kind: kind,
                source_tag: tag.to_string(),
                payload: hit.payload.clone(),
            })
            .collect()
    }

    fn reciprocal_rank(
        &self,
        weighted_lists: Vec<(f64, Vec<RankedHit>)>,
        k: f64,
    ) -> Vec<FusedHit> {
        self.accumulate(weighted_lists, |weight, rank, _len| {
            weight / (k + rank as f64)
        })
    }

    /// Rank-based weighted blending for intents that ask for "weighted"
    /// fusion: contribution decays linearly with position. Still uses
    /// rank, not raw score, because scores are not cross-comparable.
    fn linear_rank_decay(&self, weighted_lists: Vec<(f64, Vec<RankedHit>)>) -> Vec<FusedHit> {
        self.accumulate(weighted_lists, |weight, rank, len| {
            weight * (len - rank) as f64 / len as f64
        })
    }

    fn accumulate(
        &self,
        weighted_lists: Vec<(f64, Vec<RankedHit>)>,
        contribution: impl Fn(f64, usize, usize) -> f64,
    ) -> Vec<FusedHit> {
        let mut accumulators: HashMap<CandidateId, Accumulator> = HashMap::new();

        for (weight, list) in &weighted_lists {
            let len = list.len();
            let mut seen: HashSet<&CandidateId> = HashSet::new();
            for hit in list {
                // Deduplicate by id within one list; first occurrence wins.
                if !seen.insert(&hit.candidate_id) {
                    continue;
                }
                let add = contribution(*weight, hit.source_rank, len);
                match accumulators.get_mut(&hit.candidate_id) {
                    Some(acc) => {
                        acc.score += add;
                        acc.best_rank = acc.best_rank.min(hit.source_rank);
                        acc.sources.insert(hit.source_kind);
                        for (key, value) in &hit.payload {
                            acc.payload
                                .entry(key.clone())
                                .or_insert_with(|| value.clone());
                        }
                    }
                    None => {
                        accumulators.insert(
                            hit.candidate_id.clone(),
                            Accumulator {
                                score: add,
                                best_rank: hit.source_rank,
                                sources: BTreeSet::from([hit.source_kind]),
                                payload: hit.payload.clone(),
                            },
                        );
                    }
                }
            }
        }

        let mut fused: Vec<(usize, FusedHit)> = accumulators
            .into_iter()
            .map(|(candidate_id, acc)| {
                (
                    acc.best_rank,
                    FusedHit {
                        candidate_id,
                        fused_score: acc.score,
                        contributing_sources: acc.sources,
                        payload: acc.payload,
                    },
                )
            })
            .collect();

        // Descending score; ties broken by best contributing rank, then
        // candidate id, for a total order.
        fused.sort_by(|(rank_a, a), (rank_b, b)| {
            b.fused_score
                .partial_cmp(&a.fused_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| rank_a.cmp(rank_b))
                .then_with(|| a.candidate_id.cmp(&b.candidate_id))
        });

        debug!("fused {} lists into {} candidates", weighted_lists.len(), fused.len());
        fused.into_iter().map(|(_, hit)| hit).collect()
    }
}

/// Rescale fused scores in place for human display. Never applied before
/// fusion.
pub fn normalize_scores(hits: &mut [FusedHit], mode: ScoreNormalization) {
    if hits.is_empty() || mode == ScoreNormalization::None {
        return;
    }

    let max = hits
        .iter()
        .map(|h| h.fused_score)
        .fold(f64::MIN, f64::max);
    let min = hits
        .iter()
        .map(|h| h.fused_score)
        .fold(f64::MAX, f64::min);

    match mode {
        ScoreNormalization::None => {}
        ScoreNormalization::Percentage => {
            let range = max - min;
            for hit in hits {
                hit.fused_score = if range == 0.0 {
                    1.0
                } else {
                    round2((hit.fused_score - min) / range)
                };
            }
        }
        ScoreNormalization::Exponential => {
            for hit in hits {
                hit.fused_score = if max <= 0.0 {
                    1.0
                } else {
                    round2((hit.fused_score / max).sqrt())
                };
            }
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
