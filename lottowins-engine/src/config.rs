use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Constantes de réglage du prédicteur, chargées depuis un JSON partiel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    /// Nombre de tirages récents conservés pour l'analyse.
    pub history_window: usize,
    pub frequency_weight: f64,
    pub gap_weight: f64,
    /// Bonus de retard attribué aux numéros jamais sortis.
    pub never_seen_boost: f64,
    pub high_percentile: usize,
    pub medium_percentile: usize,
    /// Taille du pool de repli quand trop peu de numéros dépassent le seuil haut.
    pub fallback_pool: usize,
    /// Numéros pris hors du top dans la stratégie de diversité.
    pub diversity_mix: usize,
    /// Profondeur du classement dans laquelle la diversité pioche.
    pub diversity_depth: usize,
    /// Budget de tentatives = retry_factor × nombre de combinaisons demandées.
    pub retry_factor: usize,
    pub special_top: usize,
    pub hot_cold_count: usize,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            history_window: 50,
            frequency_weight: 0.6,
            gap_weight: 0.4,
            never_seen_boost: 0.1,
            high_percentile: 75,
            medium_percentile: 40,
            fallback_pool: 15,
            diversity_mix: 2,
            diversity_depth: 20,
            retry_factor: 5,
            special_top: 5,
            hot_cold_count: 10,
        }
    }
}

pub fn save_config(config: &PredictorConfig, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)
        .with_context(|| format!("Impossible d'écrire {:?}", path))?;
    Ok(())
}

pub fn load_config(path: &Path) -> anyhow::Result<PredictorConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {:?}", path))?;
    let config: PredictorConfig = serde_json::from_str(&json)
        .with_context(|| format!("Configuration invalide dans {:?}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PredictorConfig::default();
        assert_eq!(config.history_window, 50);
        assert!((config.frequency_weight - 0.6).abs() < 1e-12);
        assert!((config.gap_weight - 0.4).abs() < 1e-12);
        assert_eq!(config.high_percentile, 75);
        assert_eq!(config.medium_percentile, 40);
        assert_eq!(config.fallback_pool, 15);
        assert_eq!(config.retry_factor, 5);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: PredictorConfig = serde_json::from_str(r#"{ "history_window": 120 }"#).unwrap();
        assert_eq!(config.history_window, 120);
        assert_eq!(config.special_top, 5);
        assert_eq!(config.hot_cold_count, 10);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("lottowins-config-{}.json", std::process::id()));
        let config = PredictorConfig {
            history_window: 80,
            ..PredictorConfig::default()
        };
        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_config(Path::new("/nonexistent/lottowins.json")).is_err());
    }
}
