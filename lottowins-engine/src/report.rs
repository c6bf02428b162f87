use std::collections::BTreeMap;

use serde::Serialize;

use lottowins_db::models::{Draw, Game};

use crate::analysis::{analyze_history, analyze_pairs, recent_window, FrequencyTable, GapRecord, PairStat};
use crate::config::PredictorConfig;
use crate::sampler::{generate_predictions, Prediction};
use crate::scoring::ScoreBoard;

const TOP_PAIRS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotCold {
    /// (numéro, fréquence), du plus fréquent au moins fréquent.
    pub hot: Vec<(u8, u32)>,
    /// (numéro, fréquence), du moins fréquent au plus fréquent.
    pub cold: Vec<(u8, u32)>,
}

pub fn hot_cold(table: &FrequencyTable, k: usize) -> HotCold {
    let mut entries: Vec<(u8, u32)> = table.iter().collect();

    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    let hot = entries.iter().take(k).copied().collect();

    entries.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
    let cold = entries.iter().take(k).copied().collect();

    HotCold { hot, cold }
}

/// Numéros en retard : (numéro, tirages depuis la dernière sortie).
/// Un numéro jamais sorti compte pour toute la longueur de l'historique.
pub fn overdue(gaps: &BTreeMap<u8, GapRecord>, game: Game, history_len: usize, k: usize) -> Vec<(u8, usize)> {
    if history_len == 0 {
        return Vec::new();
    }
    let mut entries: Vec<(u8, usize)> = (1..=game.main_max())
        .map(|n| (n, gaps.get(&n).map_or(history_len, |g| g.last_seen)))
        .collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    entries.truncate(k);
    entries
}

#[derive(Debug, Clone, Serialize)]
pub struct GameReport {
    pub game: Game,
    pub based_on: usize,
    pub main: HotCold,
    pub special: HotCold,
    pub overdue: Vec<(u8, usize)>,
    pub top_pairs: Vec<PairStat>,
    pub predictions: Vec<Prediction>,
}

/// Analyse, scores et combinaisons pour un jeu en une passe.
pub fn build_report(
    draws: &[Draw],
    game: Game,
    count: usize,
    seed: Option<u64>,
    config: &PredictorConfig,
) -> GameReport {
    let retained = recent_window(draws, config.history_window);
    let analysis = analyze_history(&retained, game, config.history_window);
    let board = ScoreBoard::build(&analysis, config);
    let predictions = generate_predictions(&board, game, count, seed, config);

    let mut top_pairs = analyze_pairs(&retained);
    top_pairs.truncate(TOP_PAIRS);

    let k = config.hot_cold_count;
    GameReport {
        game,
        based_on: analysis.total_draws,
        main: hot_cold(&analysis.main, k),
        special: hot_cold(&analysis.special, k),
        overdue: overdue(&analysis.gaps, game, analysis.total_draws, k),
        top_pairs,
        predictions,
    }
}
