use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, OrderStatistics};

use crate::analysis::{FrequencyTable, GapRecord, HistoryAnalysis};
use crate::config::PredictorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumberScore {
    pub number: u8,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::High => write!(f, "High"),
            Confidence::Medium => write!(f, "Medium"),
            Confidence::Low => write!(f, "Low"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Thresholds {
    pub high: f64,
    pub medium: f64,
}

impl Thresholds {
    pub fn classify(&self, mean_score: f64) -> Confidence {
        if mean_score >= self.high {
            Confidence::High
        } else if mean_score >= self.medium {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// score = w_f × fréquence / tirages + w_g × bonus de retard
pub fn score_numbers(
    freq: &FrequencyTable,
    gaps: &BTreeMap<u8, GapRecord>,
    total_draws: usize,
    config: &PredictorConfig,
) -> Vec<NumberScore> {
    if freq.is_empty() || total_draws == 0 {
        return Vec::new();
    }

    freq.iter()
        .map(|(number, frequency)| {
            let freq_score = frequency as f64 / total_draws as f64;
            let gap_boost = match gaps.get(&number) {
                Some(g) if g.avg_gap > 0.0 && g.last_seen as f64 > g.avg_gap => {
                    (g.last_seen as f64 / (2.0 * g.avg_gap)).min(1.0)
                }
                Some(_) => 0.0,
                None if frequency == 0 => config.never_seen_boost,
                None => 0.0,
            };
            NumberScore {
                number,
                score: config.frequency_weight * freq_score + config.gap_weight * gap_boost,
            }
        })
        .collect()
}

/// Les numéros spéciaux ne sont notés que sur leur fréquence.
pub fn score_specials(freq: &FrequencyTable, total_draws: usize) -> Vec<NumberScore> {
    if freq.is_empty() || total_draws == 0 {
        return Vec::new();
    }
    freq.iter()
        .map(|(number, frequency)| NumberScore {
            number,
            score: frequency as f64 / total_draws as f64,
        })
        .collect()
}

/// Seuils haut/moyen sur la distribution complète des scores.
///
/// Percentiles `statrs` : interpolation R8 (médiane sans biais), rang
/// `h = (n + 1/3)·p + 1/3`. Sur peu de valeurs, les seuils diffèrent
/// légèrement de l'interpolation linéaire de rang `(n - 1)·p`.
pub fn compute_thresholds(scores: &[NumberScore], config: &PredictorConfig) -> Option<Thresholds> {
    if scores.is_empty() {
        return None;
    }
    let mut data = Data::new(scores.iter().map(|s| s.score).collect::<Vec<f64>>());
    Some(Thresholds {
        high: data.percentile(config.high_percentile),
        medium: data.percentile(config.medium_percentile),
    })
}

/// Tri décroissant par score ; à score égal, l'ordre des numéros est conservé.
pub fn rank(scores: &[NumberScore]) -> Vec<NumberScore> {
    let mut ranked = scores.to_vec();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}

#[derive(Debug, Clone, Default)]
pub struct ScoreBoard {
    /// Scores des numéros principaux, par numéro croissant.
    pub main: Vec<NumberScore>,
    pub special: Vec<NumberScore>,
    pub thresholds: Thresholds,
}

impl ScoreBoard {
    /// Vide si l'analyse ne contient aucun tirage.
    pub fn build(analysis: &HistoryAnalysis, config: &PredictorConfig) -> Self {
        let main = score_numbers(&analysis.main, &analysis.gaps, analysis.total_draws, config);
        let Some(thresholds) = compute_thresholds(&main, config) else {
            return Self::default();
        };
        let special = score_specials(&analysis.special, analysis.total_draws);

        tracing::debug!(
            game = %analysis.game,
            high = thresholds.high,
            medium = thresholds.medium,
            "seuils de confiance"
        );

        Self {
            main,
            special,
            thresholds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty()
    }

    pub fn score_of(&self, number: u8) -> f64 {
        self.main
            .iter()
            .find(|s| s.number == number)
            .map(|s| s.score)
            .unwrap_or(0.0)
    }

    pub fn mean_score(&self, numbers: &[u8]) -> f64 {
        if numbers.is_empty() {
            return 0.0;
        }
        numbers.iter().map(|&n| self.score_of(n)).sum::<f64>() / numbers.len() as f64
    }

    pub fn confidence(&self, numbers: &[u8]) -> Confidence {
        self.thresholds.classify(self.mean_score(numbers))
    }

    pub fn ranked_main(&self) -> Vec<NumberScore> {
        rank(&self.main)
    }

    pub fn ranked_special(&self) -> Vec<NumberScore> {
        rank(&self.special)
    }
}
