use std::path::Path;

use anyhow::Context;
use rand::distr::weighted::WeightedIndex;
use rand::prelude::Distribution;
use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use lottowins_db::models::Game;

use crate::analysis::{FrequencyTable, HistoryAnalysis};

/// Fréquences agrégées d'un jeu, éventuellement calculées hors de cette crate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencySummary {
    pub main: FrequencyTable,
    pub special: FrequencyTable,
}

impl FrequencySummary {
    pub fn from_analysis(analysis: &HistoryAnalysis) -> Self {
        Self {
            main: analysis.main.clone(),
            special: analysis.special.clone(),
        }
    }
}

pub fn save_summary(summary: &FrequencySummary, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

pub fn load_summary(path: &Path) -> anyhow::Result<FrequencySummary> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let summary: FrequencySummary = serde_json::from_str(&json)
        .with_context(|| format!("Résumé de fréquences invalide dans {:?}", path))?;
    Ok(summary)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuickPick {
    pub numbers: Vec<u8>,
    pub special: Option<u8>,
}

/// Grille pondérée par `fréquence + 1`, sans remise.
///
/// Seuls les numéros valides pour `game` sont retenus ; `None` si le résumé
/// n'en contient aucun.
pub fn quick_pick<R: Rng + ?Sized>(summary: &FrequencySummary, game: Game, rng: &mut R) -> Option<QuickPick> {
    if summary.main.len() > game.main_max() as usize || summary.special.len() > game.special_max() as usize {
        tracing::warn!(
            game = %game,
            main = summary.main.len(),
            special = summary.special.len(),
            "résumé plus large que le jeu, numéros hors limites ignorés"
        );
    }

    let pick = game.main_count();
    let candidates: Vec<(u8, f64)> = summary
        .main
        .iter()
        .filter(|&(n, _)| n <= game.main_max())
        .map(|(n, c)| (n, c as f64 + 1.0))
        .collect();

    if candidates.is_empty() {
        tracing::warn!(game = %game, "résumé de fréquences vide, pas de grille");
        return None;
    }

    let mut numbers: Vec<u8> = if candidates.len() < pick {
        tracing::warn!(
            game = %game,
            available = candidates.len(),
            needed = pick,
            "pas assez de numéros, grille incomplète"
        );
        candidates.iter().map(|(n, _)| *n).collect()
    } else {
        match candidates.choose_multiple_weighted(rng, pick, |(_, w)| *w) {
            Ok(chosen) => chosen.map(|(n, _)| *n).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "poids invalides, tirage uniforme");
                candidates.choose_multiple(rng, pick).map(|(n, _)| *n).collect()
            }
        }
    };
    numbers.sort_unstable();

    Some(QuickPick {
        numbers,
        special: pick_special(&summary.special, game.special_max(), rng),
    })
}

fn pick_special<R: Rng + ?Sized>(special: &FrequencyTable, special_max: u8, rng: &mut R) -> Option<u8> {
    let weights: Vec<f64> = special
        .iter()
        .filter(|&(n, _)| n <= special_max)
        .map(|(_, c)| c as f64 + 1.0)
        .collect();
    if weights.is_empty() {
        return None;
    }
    match WeightedIndex::new(&weights) {
        Ok(dist) => u8::try_from(dist.sample(rng) + 1).ok(),
        Err(e) => {
            tracing::warn!(error = %e, "poids spéciaux invalides, tirage uniforme");
            let last = u8::try_from(weights.len()).unwrap_or(special_max);
            Some(rng.random_range(1..=last))
        }
    }
}
