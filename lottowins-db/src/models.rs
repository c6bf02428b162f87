use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Game {
    #[serde(rename = "mega-millions")]
    MegaMillions,
    #[serde(rename = "powerball")]
    Powerball,
    #[serde(rename = "cash4life")]
    Cash4Life,
}

impl Game {
    pub const ALL: [Game; 3] = [Game::MegaMillions, Game::Powerball, Game::Cash4Life];

    pub fn name(&self) -> &'static str {
        match self {
            Game::MegaMillions => "Mega Millions",
            Game::Powerball => "Powerball",
            Game::Cash4Life => "Cash4Life",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Game::MegaMillions => "mega-millions",
            Game::Powerball => "powerball",
            Game::Cash4Life => "cash4life",
        }
    }

    pub fn main_max(&self) -> u8 {
        match self {
            Game::MegaMillions => 70,
            Game::Powerball => 69,
            Game::Cash4Life => 60,
        }
    }

    pub fn main_count(&self) -> usize {
        5
    }

    pub fn special_max(&self) -> u8 {
        match self {
            Game::MegaMillions => 25,
            Game::Powerball => 26,
            Game::Cash4Life => 4,
        }
    }

    pub fn special_name(&self) -> &'static str {
        match self {
            Game::MegaMillions => "Mega Ball",
            Game::Powerball => "Powerball",
            Game::Cash4Life => "Cash Ball",
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Game {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "megamillions" | "mega" => Ok(Game::MegaMillions),
            "powerball" => Ok(Game::Powerball),
            "cash4life" => Ok(Game::Cash4Life),
            _ => Err(format!(
                "Jeu inconnu : '{}' (attendu : mega-millions, powerball, cash4life)",
                s
            )),
        }
    }
}

/// Catégorie de numéros d'un jeu : boules principales ou boule spéciale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Main,
    Special,
}

impl Category {
    pub fn size(&self, game: Game) -> usize {
        match self {
            Category::Main => game.main_max() as usize,
            Category::Special => game.special_max() as usize,
        }
    }

    pub fn pick_count(&self, game: Game) -> usize {
        match self {
            Category::Main => game.main_count(),
            Category::Special => 1,
        }
    }

    pub fn numbers_from<'a>(&self, draw: &'a Draw) -> &'a [u8] {
        match self {
            Category::Main => &draw.main,
            Category::Special => draw.special.as_slice(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draw {
    pub game: Game,
    pub date: NaiveDate,
    pub main: Vec<u8>,
    pub special: Option<u8>,
    #[serde(default)]
    pub multiplier: String,
    #[serde(default)]
    pub jackpot: String,
}

impl Draw {
    pub fn new(game: Game, date: NaiveDate, main: Vec<u8>, special: Option<u8>) -> Self {
        Self {
            game,
            date,
            main,
            special,
            multiplier: String::new(),
            jackpot: String::new(),
        }
    }

    pub fn sorted_main(&self) -> Vec<u8> {
        let mut main = self.main.clone();
        main.sort_unstable();
        main
    }
}

pub fn validate_draw(game: Game, main: &[u8], special: Option<u8>) -> Result<()> {
    if main.len() != game.main_count() {
        bail!(
            "{} : {} numéros principaux attendus, {} reçus",
            game,
            game.main_count(),
            main.len()
        );
    }
    for &n in main {
        if n < 1 || n > game.main_max() {
            bail!("Numéro {} hors limites (1-{})", n, game.main_max());
        }
    }
    for i in 0..main.len() {
        for j in (i + 1)..main.len() {
            if main[i] == main[j] {
                bail!("Numéro en double : {}", main[i]);
            }
        }
    }
    if let Some(s) = special {
        if s < 1 || s > game.special_max() {
            bail!("{} {} hors limites (1-{})", game.special_name(), s, game.special_max());
        }
    }
    Ok(())
}

/// Accepte `AAAA-MM-JJ` et le format américain `MM/JJ/AAAA`.
pub fn parse_draw_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .with_context(|| format!("Format de date invalide : '{}'", raw))
}

/// Historique synthétique déterministe, draws[0] = le plus récent.
pub fn make_test_draws(game: Game, n: usize) -> Vec<Draw> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap_or(NaiveDate::MIN);
    let max = game.main_max() as usize;
    (0..n)
        .map(|i| {
            let t = n - 1 - i;
            let base = (t * 7) % max;
            let main: Vec<u8> = (0..game.main_count())
                .map(|k| ((base + k * 11) % max + 1) as u8)
                .collect();
            let special = Some(((t * 3) % game.special_max() as usize + 1) as u8);
            let date = start + chrono::Days::new((t * 3) as u64);
            Draw::new(game, date, main, special)
        })
        .collect()
}
