mod display;
mod import;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lottowins_db::db::{count_draws, db_path, fetch_last_draws, insert_draw, migrate, open_db};
use lottowins_db::models::{parse_draw_date, validate_draw, Draw, Game};
use lottowins_db::rusqlite::Connection;
use lottowins_engine::analysis::analyze_history;
use lottowins_engine::config::{load_config, save_config, PredictorConfig};
use lottowins_engine::quick_pick::{load_summary, quick_pick, save_summary, FrequencySummary};
use lottowins_engine::report::build_report;
use lottowins_engine::sampler::{date_seed, generate_predictions, seeded_rng};
use lottowins_engine::scoring::ScoreBoard;
use lottowins_engine::ticket::check_ticket_on;

use crate::display::{
    display_draws, display_import_summary, display_predictions, display_prize_tiers,
    display_quick_pick, display_report, display_ticket_result,
};

#[derive(Parser)]
#[command(name = "lottowins", about = "Prédictions Mega Millions, Powerball et Cash4Life")]
struct Cli {
    /// Fichier JSON de paramètres du prédicteur
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Importer des tirages depuis un fichier JSON
    Import {
        /// Jeu (mega-millions, powerball, cash4life)
        #[arg(short, long)]
        game: Game,

        /// Chemin vers le fichier JSON
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Afficher le chemin de la base de données
    DbPath,

    /// Ajouter un tirage manuellement
    Add {
        #[arg(short, long)]
        game: Game,
    },

    /// Lister les derniers tirages
    List {
        #[arg(short, long)]
        game: Game,

        /// Nombre de tirages à afficher
        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Numéros chauds, froids, en retard et paires fréquentes
    Stats {
        #[arg(short, long)]
        game: Game,
    },

    /// Générer des combinaisons à partir de l'historique
    Predict {
        #[arg(short, long)]
        game: Game,

        /// Nombre de combinaisons
        #[arg(short, long, default_value = "10")]
        count: usize,

        /// Seed pour la reproductibilité
        #[arg(long, conflicts_with = "daily")]
        seed: Option<u64>,

        /// Seed du jour (AAAAMMJJ) : mêmes combinaisons pour toute la journée
        #[arg(long)]
        daily: bool,
    },

    /// Grille pondérée par les fréquences observées
    QuickPick {
        #[arg(short, long)]
        game: Game,

        /// Résumé de fréquences JSON à utiliser à la place de la base
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Enregistrer le résumé calculé depuis la base
        #[arg(long, conflicts_with = "summary")]
        export: Option<PathBuf>,

        #[arg(long)]
        seed: Option<u64>,
    },

    /// Vérifier un ticket contre le tirage d'une date
    Check {
        #[arg(short, long)]
        game: Game,

        /// Date du tirage (AAAA-MM-JJ ou MM/JJ/AAAA)
        #[arg(short, long)]
        date: String,

        /// Numéros joués, ex. "7 30 39 41 60"
        #[arg(short, long)]
        numbers: String,

        /// Boule spéciale jouée
        #[arg(short, long)]
        special: Option<u8>,
    },

    /// Afficher la grille des gains d'un jeu
    Prizes {
        #[arg(short, long)]
        game: Game,
    },

    /// Afficher la configuration effective (JSON)
    Config {
        /// Écrire la configuration dans ce fichier
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = fmt::layer().with_target(false).with_writer(io::stderr);
    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PredictorConfig::default(),
    };

    let path = db_path();
    let conn = open_db(&path)?;
    migrate(&conn)?;

    match cli.command {
        Command::Import { game, file } => cmd_import(&conn, game, &file),
        Command::DbPath => {
            println!("{}", path.display());
            Ok(())
        }
        Command::Add { game } => cmd_add(&conn, game),
        Command::List { game, last } => cmd_list(&conn, game, last),
        Command::Stats { game } => cmd_stats(&conn, game, &config),
        Command::Predict {
            game,
            count,
            seed,
            daily,
        } => {
            let seed = if daily { Some(date_seed()) } else { seed };
            cmd_predict(&conn, game, count, seed, &config)
        }
        Command::QuickPick {
            game,
            summary,
            export,
            seed,
        } => cmd_quick_pick(&conn, game, summary.as_deref(), export.as_deref(), seed, &config),
        Command::Check {
            game,
            date,
            numbers,
            special,
        } => cmd_check(&conn, game, &date, &numbers, special),
        Command::Prizes { game } => {
            println!("\n{game} : grille des gains\n");
            display_prize_tiers(game);
            Ok(())
        }
        Command::Config { save } => cmd_config(&config, save.as_deref()),
    }
}

/// Historique du jeu restreint à la fenêtre d'analyse, `None` si la base est vide.
fn load_history(conn: &Connection, game: Game, config: &PredictorConfig) -> Result<Option<Vec<Draw>>> {
    if count_draws(conn, game)? == 0 {
        println!("Base vide pour {game}. Lancez d'abord : lottowins import --game {} --file <tirages.json>", game.slug());
        return Ok(None);
    }
    let window = u32::try_from(config.history_window).unwrap_or(u32::MAX);
    Ok(Some(fetch_last_draws(conn, game, window)?))
}

fn cmd_import(conn: &Connection, game: Game, file: &Path) -> Result<()> {
    let result = import::import_json(conn, game, file)?;
    display_import_summary(&result);
    Ok(())
}

fn cmd_list(conn: &Connection, game: Game, last: u32) -> Result<()> {
    if count_draws(conn, game)? == 0 {
        println!("Base vide pour {game}. Lancez d'abord : lottowins import --game {} --file <tirages.json>", game.slug());
        return Ok(());
    }
    let draws = fetch_last_draws(conn, game, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_stats(conn: &Connection, game: Game, config: &PredictorConfig) -> Result<()> {
    let Some(draws) = load_history(conn, game, config)? else {
        return Ok(());
    };
    let report = build_report(&draws, game, 0, None, config);
    display_report(&report);
    Ok(())
}

fn cmd_predict(
    conn: &Connection,
    game: Game,
    count: usize,
    seed: Option<u64>,
    config: &PredictorConfig,
) -> Result<()> {
    let Some(draws) = load_history(conn, game, config)? else {
        return Ok(());
    };
    let analysis = analyze_history(&draws, game, config.history_window);
    let board = ScoreBoard::build(&analysis, config);

    println!(
        "Analyse de {} tirages (seuils : haut {:.4}, moyen {:.4})",
        analysis.total_draws, board.thresholds.high, board.thresholds.medium
    );

    let predictions = generate_predictions(&board, game, count, seed, config);
    display_predictions(game, &predictions);
    if predictions.len() < count {
        println!(
            "Seulement {} combinaisons distinctes sur {} demandées.",
            predictions.len(),
            count
        );
    }
    Ok(())
}

fn cmd_quick_pick(
    conn: &Connection,
    game: Game,
    summary_path: Option<&Path>,
    export: Option<&Path>,
    seed: Option<u64>,
    config: &PredictorConfig,
) -> Result<()> {
    let summary = match summary_path {
        Some(path) => load_summary(path)?,
        None => {
            let Some(draws) = load_history(conn, game, config)? else {
                return Ok(());
            };
            let analysis = analyze_history(&draws, game, config.history_window);
            FrequencySummary::from_analysis(&analysis)
        }
    };

    if let Some(path) = export {
        save_summary(&summary, path)?;
        println!("Résumé enregistré dans {}", path.display());
    }

    let mut rng = seeded_rng(seed);
    match quick_pick(&summary, game, &mut rng) {
        Some(pick) => display_quick_pick(game, &pick),
        None => println!("Résumé de fréquences vide, aucune grille."),
    }
    Ok(())
}

fn parse_numbers(raw: &str) -> Result<Vec<u8>> {
    raw.split(|c: char| c.is_whitespace() || c == ',' || c == '-')
        .filter(|t| !t.is_empty())
        .map(|t| {
            t.parse::<u8>()
                .with_context(|| format!("Numéro invalide : '{}'", t))
        })
        .collect()
}

fn cmd_check(conn: &Connection, game: Game, raw_date: &str, raw_numbers: &str, special: Option<u8>) -> Result<()> {
    let date = parse_draw_date(raw_date)?;
    let numbers = parse_numbers(raw_numbers)?;
    validate_draw(game, &numbers, special)?;

    let Some((draw, result)) = check_ticket_on(conn, game, date, &numbers, special)? else {
        println!("Aucun tirage {game} le {}.", date.format("%Y-%m-%d"));
        return Ok(());
    };
    display_ticket_result(&draw, &result);
    Ok(())
}

fn cmd_config(config: &PredictorConfig, save: Option<&Path>) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if let Some(path) = save {
        save_config(config, path)?;
        println!("Configuration enregistrée dans {}", path.display());
    }
    Ok(())
}

fn cmd_add(conn: &Connection, game: Game) -> Result<()> {
    println!("Ajout d'un tirage {game}\n");

    let date = loop {
        let raw = prompt("Date (AAAA-MM-JJ ou MM/JJ/AAAA) : ")?;
        match parse_draw_date(&raw) {
            Ok(d) => break d,
            Err(e) => println!("{e}. Réessayez."),
        }
    };
    let main = prompt_main(game)?;
    let special = prompt_special(game)?;
    validate_draw(game, &main, special)?;

    let mut draw = Draw::new(game, date, main, special);
    draw.multiplier = prompt("Multiplicateur (vide si aucun) : ")?;
    draw.jackpot = prompt("Jackpot (vide si inconnu) : ")?;

    println!("\nTirage à insérer :");
    display_draws(std::slice::from_ref(&draw));

    let confirm = prompt("\nConfirmer l'insertion ? (o/n) : ")?;
    if confirm.trim().to_lowercase() == "o" {
        if insert_draw(conn, &draw)? {
            println!("Tirage inséré avec succès.");
        } else {
            println!("Ce tirage existe déjà (doublon ignoré).");
        }
    } else {
        println!("Insertion annulée.");
    }
    Ok(())
}

fn prompt(msg: &str) -> Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("Erreur de lecture")?;
    Ok(input.trim().to_string())
}

fn prompt_main(game: Game) -> Result<Vec<u8>> {
    loop {
        let input = prompt(&format!(
            "{} numéros (séparés par des espaces, 1-{}) : ",
            game.main_count(),
            game.main_max()
        ))?;
        match parse_numbers(&input) {
            Ok(v) if v.len() == game.main_count() => {
                if validate_draw(game, &v, None).is_ok() {
                    return Ok(v);
                }
                println!("Numéros invalides (1-{}, pas de doublons). Réessayez.", game.main_max());
            }
            _ => println!("Entrez exactement {} numéros. Réessayez.", game.main_count()),
        }
    }
}

fn prompt_special(game: Game) -> Result<Option<u8>> {
    loop {
        let input = prompt(&format!("{} (1-{}, vide si inconnu) : ", game.special_name(), game.special_max()))?;
        if input.is_empty() {
            return Ok(None);
        }
        match input.parse::<u8>() {
            Ok(s) if (1..=game.special_max()).contains(&s) => return Ok(Some(s)),
            _ => println!("{} invalide. Réessayez.", game.special_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_numbers("7 30 39 41 60").unwrap(), vec![7, 30, 39, 41, 60]);
        assert_eq!(parse_numbers("07,30, 39-41 60").unwrap(), vec![7, 30, 39, 41, 60]);
        assert!(parse_numbers("7 trente").is_err());
        assert!(parse_numbers("").unwrap().is_empty());
    }

    #[test]
    fn test_cli_parses_predict() {
        let cli = Cli::try_parse_from(["lottowins", "predict", "--game", "powerball", "--count", "3", "--seed", "42"]).unwrap();
        match cli.command {
            Command::Predict { game, count, seed, daily } => {
                assert_eq!(game, Game::Powerball);
                assert_eq!(count, 3);
                assert_eq!(seed, Some(42));
                assert!(!daily);
            }
            _ => panic!("mauvaise sous-commande"),
        }
        assert!(Cli::try_parse_from(["lottowins", "predict", "--game", "powerball", "--seed", "1", "--daily"]).is_err());
        assert!(Cli::try_parse_from(["lottowins", "list", "--game", "euromillions"]).is_err());
    }
}
