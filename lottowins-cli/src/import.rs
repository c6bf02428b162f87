use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use lottowins_db::db::insert_draw;
use lottowins_db::models::{parse_draw_date, validate_draw, Draw, Game};
use lottowins_db::rusqlite::Connection;

/// Numéros fournis en liste (`[7, 30, 39, 41, 60]`) ou en texte (`"07 30 39 41 60"`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumbers {
    List(Vec<u8>),
    Text(String),
}

impl RawNumbers {
    fn into_vec(self) -> Result<Vec<u8>> {
        match self {
            RawNumbers::List(v) => Ok(v),
            RawNumbers::Text(s) => s
                .split(|c: char| c.is_whitespace() || c == ',' || c == '-')
                .filter(|t| !t.is_empty())
                .map(|t| {
                    t.parse::<u8>()
                        .with_context(|| format!("Numéro invalide : '{}'", t))
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDraw {
    #[serde(alias = "draw_date")]
    date: String,
    #[serde(alias = "winning_numbers")]
    numbers: RawNumbers,
    #[serde(default, alias = "megaBall", alias = "mega_ball", alias = "powerball", alias = "cashBall", alias = "cash_ball")]
    special: Option<u8>,
    #[serde(default)]
    multiplier: Option<serde_json::Value>,
    #[serde(default)]
    jackpot: Option<serde_json::Value>,
}

fn value_to_text(value: Option<serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn parse_record(game: Game, value: serde_json::Value) -> Result<Draw> {
    let raw: RawDraw = serde_json::from_value(value).context("Enregistrement mal formé")?;
    let date = parse_draw_date(&raw.date)?;
    let mut main = raw.numbers.into_vec()?;

    // Certaines sources accolent la boule spéciale aux numéros principaux
    let mut special = raw.special;
    if special.is_none() && main.len() == game.main_count() + 1 {
        special = main.pop();
    }

    validate_draw(game, &main, special)?;

    Ok(Draw {
        game,
        date,
        main,
        special,
        multiplier: value_to_text(raw.multiplier),
        jackpot: value_to_text(raw.jackpot),
    })
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_str(conn: &Connection, game: Game, json: &str) -> Result<ImportResult> {
    let records: Vec<serde_json::Value> =
        serde_json::from_str(json).context("Le fichier doit contenir un tableau JSON de tirages")?;
    if records.is_empty() {
        bail!("Aucun tirage dans le fichier");
    }

    let tx = conn
        .unchecked_transaction()
        .context("Impossible de démarrer la transaction")?;

    let mut result = ImportResult::default();

    for value in records {
        result.total_records += 1;
        match parse_record(game, value) {
            Ok(draw) => match insert_draw(&tx, &draw) {
                Ok(true) => result.inserted += 1,
                Ok(false) => result.skipped += 1,
                Err(e) => {
                    tracing::warn!(record = result.total_records, error = %e, "échec d'insertion");
                    result.errors += 1;
                }
            },
            Err(e) => {
                tracing::warn!(record = result.total_records, error = %e, "tirage ignoré");
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Échec du commit")?;
    tracing::debug!(game = %game, inserted = result.inserted, "import terminé");
    Ok(result)
}

pub fn import_json(conn: &Connection, game: Game, path: &Path) -> Result<ImportResult> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible d'ouvrir {:?}", path))?;
    import_str(conn, game, &json)
}
