use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lottowins_db::models::{Category, Draw, Game};

/// Nombre d'apparitions de chaque numéro d'une catégorie, indexé par `numéro - 1`.
/// Vide quand aucun tirage n'a été analysé.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyTable {
    pub counts: Vec<u32>,
}

impl FrequencyTable {
    pub fn build(draws: &[Draw], game: Game, category: Category) -> Self {
        if draws.is_empty() {
            return Self::default();
        }
        let size = category.size(game);
        let mut counts = vec![0u32; size];

        for draw in draws {
            for &n in category.numbers_from(draw) {
                if n >= 1 && (n as usize) <= size {
                    counts[(n - 1) as usize] += 1;
                }
            }
        }

        Self { counts }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn get(&self, number: u8) -> u32 {
        if number == 0 {
            return 0;
        }
        self.counts.get((number - 1) as usize).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// (numéro, fréquence) dans l'ordre croissant des numéros.
    /// Les entrées au-delà de 255 ne sont pas représentables et sont ignorées.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .map_while(|(i, &c)| u8::try_from(i + 1).ok().map(|n| (n, c)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GapRecord {
    pub avg_gap: f64,
    pub max_gap: usize,
    pub min_gap: usize,
    /// Tirages écoulés depuis la dernière apparition (0 = sorti au dernier tirage).
    pub last_seen: usize,
}

/// Écarts entre apparitions des numéros principaux.
///
/// draws[0] = tirage le plus récent ; les positions sont recalculées en ordre
/// chronologique (0 = plus ancien). Un numéro sorti une seule fois reçoit
/// l'écart maximal (la longueur de l'historique), un numéro jamais sorti n'a
/// pas d'entrée.
pub fn compute_gaps(draws: &[Draw], game: Game) -> BTreeMap<u8, GapRecord> {
    let len = draws.len();
    let mut appearances: BTreeMap<u8, Vec<usize>> = BTreeMap::new();

    for (idx, draw) in draws.iter().rev().enumerate() {
        for &n in Category::Main.numbers_from(draw) {
            if n >= 1 && n <= game.main_max() {
                appearances.entry(n).or_default().push(idx);
            }
        }
    }

    appearances
        .into_iter()
        .filter_map(|(number, positions)| {
            let last = *positions.last()?;
            let last_seen = len - 1 - last;
            let record = if positions.len() == 1 {
                GapRecord {
                    avg_gap: len as f64,
                    max_gap: len,
                    min_gap: len,
                    last_seen,
                }
            } else {
                let gaps: Vec<usize> = positions.windows(2).map(|w| w[1] - w[0]).collect();
                GapRecord {
                    avg_gap: gaps.iter().sum::<usize>() as f64 / gaps.len() as f64,
                    max_gap: gaps.iter().copied().max().unwrap_or(len),
                    min_gap: gaps.iter().copied().min().unwrap_or(len),
                    last_seen,
                }
            };
            Some((number, record))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairStat {
    pub pair: (u8, u8),
    pub count: u32,
    pub probability: f64,
}

/// Co-occurrences des paires de numéros principaux, triées par nombre décroissant.
pub fn analyze_pairs(draws: &[Draw]) -> Vec<PairStat> {
    if draws.is_empty() {
        return Vec::new();
    }

    let mut counts: BTreeMap<(u8, u8), u32> = BTreeMap::new();
    for draw in draws {
        let main = draw.sorted_main();
        for i in 0..main.len() {
            for j in (i + 1)..main.len() {
                if main[i] != main[j] {
                    *counts.entry((main[i], main[j])).or_insert(0) += 1;
                }
            }
        }
    }

    let total = draws.len() as f64;
    let mut pairs: Vec<PairStat> = counts
        .into_iter()
        .map(|(pair, count)| PairStat {
            pair,
            count,
            probability: count as f64 / total,
        })
        .collect();
    pairs.sort_by(|a, b| b.count.cmp(&a.count));
    pairs
}

/// Résultat de l'analyse d'un historique restreint à la fenêtre retenue.
#[derive(Debug, Clone)]
pub struct HistoryAnalysis {
    pub game: Game,
    pub total_draws: usize,
    pub main: FrequencyTable,
    pub special: FrequencyTable,
    pub gaps: BTreeMap<u8, GapRecord>,
}

impl HistoryAnalysis {
    pub fn is_empty(&self) -> bool {
        self.total_draws == 0
    }
}

/// Les `window` tirages les plus récents, du plus récent au plus ancien,
/// quel que soit l'ordre de `draws`.
pub fn recent_window(draws: &[Draw], window: usize) -> Vec<Draw> {
    let mut sorted = draws.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(window);
    sorted
}

/// Analyse les `window` tirages les plus récents, dans n'importe quel ordre d'entrée.
pub fn analyze_history(draws: &[Draw], game: Game, window: usize) -> HistoryAnalysis {
    let retained = recent_window(draws, window);

    if retained.is_empty() {
        tracing::warn!(game = %game, "historique vide, analyse vide");
    } else {
        tracing::debug!(game = %game, draws = retained.len(), "analyse de l'historique");
    }

    HistoryAnalysis {
        game,
        total_draws: retained.len(),
        main: FrequencyTable::build(&retained, game, Category::Main),
        special: FrequencyTable::build(&retained, game, Category::Special),
        gaps: compute_gaps(&retained, game),
    }
}
