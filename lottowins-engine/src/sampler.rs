use std::collections::BTreeSet;

use chrono::Datelike;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use lottowins_db::models::{Category, Game};

use crate::config::PredictorConfig;
use crate::scoring::{Confidence, ScoreBoard};

/// Réservation maximale du vecteur de résultats.
const MAX_PREALLOC: usize = 1024;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Numéros principaux, triés.
    pub numbers: Vec<u8>,
    pub special: u8,
    pub confidence: Confidence,
    pub mean_score: f64,
}

/// Seed déterministe basé sur la date du jour (YYYYMMDD).
pub fn date_seed() -> u64 {
    let today = chrono::Local::now().date_naive();
    today.year() as u64 * 10_000 + today.month() as u64 * 100 + today.day() as u64
}

pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Nombre de combinaisons de `k` éléments parmi `n`, saturé à `usize::MAX`.
pub fn combinations(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = match result.checked_mul((n - i) as u128) {
            Some(r) => r / (i as u128 + 1),
            None => return usize::MAX,
        };
    }
    usize::try_from(result).unwrap_or(usize::MAX)
}

/// Génère jusqu'à `count` combinaisons distinctes à partir du tableau des scores.
pub fn generate_predictions(
    board: &ScoreBoard,
    game: Game,
    count: usize,
    seed: Option<u64>,
    config: &PredictorConfig,
) -> Vec<Prediction> {
    let mut rng = seeded_rng(seed);
    let mut seen = BTreeSet::new();
    sample_combinations(board, game, count, &mut seen, config, &mut rng)
}

/// Alterne deux stratégies jusqu'à obtenir `count` combinaisons inédites ou
/// épuiser le budget de `retry_factor × count` tentatives :
/// 1. tirage uniforme dans les numéros au-dessus du seuil haut (repli sur le
///    top `fallback_pool` si ce groupe est trop petit) ;
/// 2. mélange de `diversity_mix` numéros moyens avec le reste pris dans le top.
///
/// `seen` contient les combinaisons (triées) déjà produites et est complété.
pub fn sample_combinations<R: Rng + ?Sized>(
    board: &ScoreBoard,
    game: Game,
    count: usize,
    seen: &mut BTreeSet<Vec<u8>>,
    config: &PredictorConfig,
    rng: &mut R,
) -> Vec<Prediction> {
    if board.is_empty() || count == 0 {
        return Vec::new();
    }

    let pick = Category::Main.pick_count(game);
    let ranked = board.ranked_main();
    let ranked_numbers: Vec<u8> = ranked.iter().map(|s| s.number).collect();

    let high_pool: Vec<u8> = ranked
        .iter()
        .filter(|s| s.score >= board.thresholds.high)
        .map(|s| s.number)
        .collect();
    let primary_pool: &[u8] = if high_pool.len() >= pick {
        &high_pool
    } else {
        let fallback = &ranked_numbers[..ranked_numbers.len().min(config.fallback_pool)];
        if fallback.len() >= pick {
            fallback
        } else {
            tracing::warn!(game = %game, "pool de repli trop petit, utilisation de tous les numéros");
            &ranked_numbers
        }
    };

    let mix = config.diversity_mix.min(pick);
    let top_end = ranked_numbers.len().min(pick);
    let mix_end = ranked_numbers.len().min(config.diversity_depth.max(top_end));
    let top_pool = &ranked_numbers[..top_end];
    let mix_pool = &ranked_numbers[top_end..mix_end];
    let diversity = ranked_numbers.len() >= 2 * pick
        && mix_pool.len() >= mix
        && top_pool.len() >= pick - mix;

    let top_specials: Vec<u8> = if board.special.iter().any(|s| s.score > 0.0) {
        board
            .ranked_special()
            .iter()
            .take(config.special_top)
            .map(|s| s.number)
            .collect()
    } else {
        Vec::new()
    };

    let mut reachable: BTreeSet<u8> = primary_pool.iter().copied().collect();
    if diversity {
        reachable.extend(top_pool.iter().copied());
        if mix > 0 {
            reachable.extend(mix_pool.iter().copied());
        }
    }
    let target = count.min(combinations(reachable.len(), pick));
    if target < count {
        tracing::warn!(
            game = %game,
            requested = count,
            possible = target,
            "moins de combinaisons possibles que demandé"
        );
    }

    let budget = config.retry_factor.saturating_mul(target);
    let mut attempts = 0usize;
    let mut predictions = Vec::with_capacity(target.min(MAX_PREALLOC));

    while predictions.len() < target && attempts < budget {
        attempts += 1;
        let candidate: Vec<u8> = primary_pool.choose_multiple(rng, pick).copied().collect();
        try_push(candidate, pick, board, game, &top_specials, seen, &mut predictions, rng);

        if predictions.len() == target || attempts >= budget {
            break;
        }

        if diversity {
            attempts += 1;
            let mut candidate: Vec<u8> = mix_pool.choose_multiple(rng, mix).copied().collect();
            candidate.extend(top_pool.choose_multiple(rng, pick - mix).copied());
            try_push(candidate, pick, board, game, &top_specials, seen, &mut predictions, rng);
        }
    }

    if predictions.len() < target {
        tracing::warn!(
            game = %game,
            requested = count,
            produced = predictions.len(),
            attempts,
            "budget de tentatives épuisé"
        );
    }

    predictions
}

#[allow(clippy::too_many_arguments)]
fn try_push<R: Rng + ?Sized>(
    mut candidate: Vec<u8>,
    pick: usize,
    board: &ScoreBoard,
    game: Game,
    top_specials: &[u8],
    seen: &mut BTreeSet<Vec<u8>>,
    predictions: &mut Vec<Prediction>,
    rng: &mut R,
) {
    candidate.sort_unstable();
    candidate.dedup();
    if candidate.len() != pick || seen.contains(&candidate) {
        return;
    }

    let special = match top_specials.choose(rng) {
        Some(&s) => s,
        None => rng.random_range(1..=game.special_max()),
    };
    let mean_score = board.mean_score(&candidate);
    let confidence = board.thresholds.classify(mean_score);

    seen.insert(candidate.clone());
    predictions.push(Prediction {
        numbers: candidate,
        special,
        confidence,
        mean_score,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_history;
    use chrono::NaiveDate;
    use lottowins_db::models::{make_test_draws, Draw};

    fn board_for(game: Game, draws: &[Draw]) -> ScoreBoard {
        let config = PredictorConfig::default();
        let analysis = analyze_history(draws, game, config.history_window);
        ScoreBoard::build(&analysis, &config)
    }

    fn seven_always() -> Vec<Draw> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        (0..10u8)
            .map(|i| {
                let base = 10 + i * 4;
                let main = vec![7, base, base + 1, base + 2, base + 3];
                Draw::new(Game::MegaMillions, start + chrono::Days::new(i as u64), main, Some(i % 5 + 1))
            })
            .rev()
            .collect()
    }

    #[test]
    fn test_date_seed_format() {
        let seed = date_seed();
        assert_eq!(seed.to_string().len(), 8, "seed devrait avoir 8 chiffres: {seed}");
    }

    #[test]
    fn test_predictions_valid_and_unique() {
        for game in Game::ALL {
            let draws = make_test_draws(game, 50);
            let board = board_for(game, &draws);
            let predictions = generate_predictions(&board, game, 10, Some(42), &PredictorConfig::default());

            assert_eq!(predictions.len(), 10);
            let mut sets = BTreeSet::new();
            for p in &predictions {
                assert_eq!(p.numbers.len(), game.main_count());
                assert!(p.numbers.windows(2).all(|w| w[0] < w[1]), "{:?}", p.numbers);
                assert!(p.numbers.iter().all(|&n| n >= 1 && n <= game.main_max()));
                assert!(p.special >= 1 && p.special <= game.special_max());
                assert!(sets.insert(p.numbers.clone()), "doublon {:?}", p.numbers);
            }
        }
    }

    #[test]
    fn test_seed_determinism() {
        let draws = make_test_draws(Game::Powerball, 50);
        let board = board_for(Game::Powerball, &draws);
        let config = PredictorConfig::default();

        let a = generate_predictions(&board, Game::Powerball, 5, Some(123), &config);
        let b = generate_predictions(&board, Game::Powerball, 5, Some(123), &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_board_returns_nothing() {
        let board = board_for(Game::MegaMillions, &[]);
        let predictions = generate_predictions(&board, Game::MegaMillions, 10, Some(1), &PredictorConfig::default());
        assert!(predictions.is_empty());
    }

    #[test]
    fn test_seen_combinations_excluded() {
        let draws = make_test_draws(Game::MegaMillions, 50);
        let board = board_for(Game::MegaMillions, &draws);
        let config = PredictorConfig::default();
        let mut rng = StdRng::seed_from_u64(9);

        let mut seen = BTreeSet::new();
        let first = sample_combinations(&board, Game::MegaMillions, 5, &mut seen, &config, &mut rng);
        let second = sample_combinations(&board, Game::MegaMillions, 5, &mut seen, &config, &mut rng);

        for p in &second {
            assert!(!first.iter().any(|f| f.numbers == p.numbers));
        }
        assert_eq!(seen.len(), first.len() + second.len());
    }

    #[test]
    fn test_budget_caps_output() {
        // Un seul numéro au-dessus des autres et un pool de repli de 5 :
        // une seule combinaison possible par la stratégie principale.
        let draws = seven_always();
        let board = board_for(Game::MegaMillions, &draws);
        let config = PredictorConfig {
            fallback_pool: 5,
            high_percentile: 100,
            diversity_mix: 0,
            ..PredictorConfig::default()
        };

        let predictions = generate_predictions(&board, Game::MegaMillions, 10, Some(3), &config);
        assert!(predictions.len() < 10);
        assert!(!predictions.is_empty());
    }

    #[test]
    fn test_seven_dominates_and_is_high_confidence() {
        let draws = seven_always();
        let board = board_for(Game::MegaMillions, &draws);
        let config = PredictorConfig::default();

        let mut counts = [0usize; 71];
        let mut total = 0usize;
        for seed in 0..200 {
            for p in generate_predictions(&board, Game::MegaMillions, 10, Some(seed), &config) {
                total += 1;
                for &n in &p.numbers {
                    counts[n as usize] += 1;
                }
                if p.numbers.contains(&7) {
                    assert_eq!(p.confidence, Confidence::High, "{:?}", p);
                }
            }
        }

        // 7 partage le top 5 avec 10..13 ; il doit dominer tout le reste
        for n in (1..=70).filter(|n| ![7, 10, 11, 12, 13].contains(n)) {
            assert!(counts[7] > counts[n], "7: {} vs {}: {}", counts[7], n, counts[n]);
        }
        // bien au-dessus d'un tirage uniforme (5/70)
        assert!(counts[7] as f64 / total as f64 > 0.25, "taux de 7 = {}", counts[7] as f64 / total as f64);
    }

    #[test]
    fn test_special_from_top_scores() {
        let draws = seven_always();
        let board = board_for(Game::MegaMillions, &draws);
        let predictions = generate_predictions(&board, Game::MegaMillions, 10, Some(5), &PredictorConfig::default());
        // les spéciaux observés sont 1 à 5, les seuls avec un score non nul
        for p in &predictions {
            assert!((1..=5).contains(&p.special), "{}", p.special);
        }
    }

    #[test]
    fn test_special_uniform_without_data() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let draws: Vec<Draw> = (0..20u8)
            .map(|i| Draw::new(Game::Cash4Life, start + chrono::Days::new(i as u64), vec![i + 1, i + 21, i + 31, i + 41, 60 - i], None))
            .rev()
            .collect();
        let board = board_for(Game::Cash4Life, &draws);
        let predictions = generate_predictions(&board, Game::Cash4Life, 10, Some(11), &PredictorConfig::default());
        assert!(!predictions.is_empty());
        for p in &predictions {
            assert!(p.special >= 1 && p.special <= 4);
        }
    }

    #[test]
    fn test_combinations() {
        assert_eq!(combinations(15, 5), 3003);
        assert_eq!(combinations(70, 5), 12_103_014);
        assert_eq!(combinations(4, 5), 0);
        assert_eq!(combinations(5, 5), 1);
    }

    #[test]
    fn test_huge_count_does_not_overflow() {
        let draws = seven_always();
        let board = board_for(Game::MegaMillions, &draws);
        let config = PredictorConfig {
            fallback_pool: 6,
            high_percentile: 100,
            diversity_mix: 0,
            ..PredictorConfig::default()
        };

        // pool de repli de 6 numéros : au plus C(6, 5) = 6 combinaisons
        let predictions = generate_predictions(&board, Game::MegaMillions, usize::MAX / 2, Some(8), &config);
        assert!(!predictions.is_empty());
        assert!(predictions.len() <= 6);
        let sets: BTreeSet<Vec<u8>> = predictions.iter().map(|p| p.numbers.clone()).collect();
        assert_eq!(sets.len(), predictions.len());
    }
}
