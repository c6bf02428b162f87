use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

use crate::models::{Draw, Game};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    game          TEXT NOT NULL,
    draw_date     TEXT NOT NULL,
    main_numbers  TEXT NOT NULL,
    special       INTEGER,
    multiplier    TEXT NOT NULL DEFAULT '',
    jackpot       TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (game, draw_date)
);
";

const SELECT_COLUMNS: &str = "game, draw_date, main_numbers, special, multiplier, jackpot";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lottowins.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    tracing::debug!(path = %path.display(), "base ouverte");
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

fn encode_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_numbers(raw: &str) -> Result<Vec<u8>> {
    raw.split(',')
        .map(|s| {
            s.trim()
                .parse::<u8>()
                .with_context(|| format!("Numéro invalide en base : '{}'", s))
        })
        .collect()
}

type DrawRow = (String, NaiveDate, String, Option<u8>, String, String);

fn row_to_draw(row: DrawRow) -> Result<Draw> {
    let (game, date, main_numbers, special, multiplier, jackpot) = row;
    let game: Game = game.parse().map_err(anyhow::Error::msg)?;
    Ok(Draw {
        game,
        date,
        main: decode_numbers(&main_numbers)?,
        special,
        multiplier,
        jackpot,
    })
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DrawRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

pub fn insert_draw(conn: &Connection, draw: &Draw) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (game, draw_date, main_numbers, special, multiplier, jackpot)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            draw.game.slug(),
            draw.date,
            encode_numbers(&draw.main),
            draw.special,
            draw.multiplier,
            draw.jackpot,
        ],
    ).context("Échec de l'insertion")?;
    Ok(changed > 0)
}

/// Derniers tirages d'un jeu, le plus récent en premier.
pub fn fetch_last_draws(conn: &Connection, game: Game, limit: u32) -> Result<Vec<Draw>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM draws WHERE game = ?1 ORDER BY draw_date DESC LIMIT ?2"
    ))?;
    let rows = stmt
        .query_map(rusqlite::params![game.slug(), limit], read_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(row_to_draw).collect()
}

pub fn fetch_draw_on(conn: &Connection, game: Game, date: NaiveDate) -> Result<Option<Draw>> {
    let row = conn
        .query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM draws WHERE game = ?1 AND draw_date = ?2"),
            rusqlite::params![game.slug(), date],
            read_row,
        )
        .optional()
        .context("Échec de la recherche du tirage")?;
    row.map(row_to_draw).transpose()
}

pub fn count_draws(conn: &Connection, game: Game) -> Result<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM draws WHERE game = ?1",
        [game.slug()],
        |row| row.get(0),
    )?;
    Ok(count)
}
