use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use lottowins_db::models::{Draw, Game};
use lottowins_engine::quick_pick::QuickPick;
use lottowins_engine::report::{GameReport, HotCold};
use lottowins_engine::sampler::Prediction;
use lottowins_engine::scoring::Confidence;
use lottowins_engine::ticket::{multiplier_option, prize_tiers, TicketResult};

use crate::import::ImportResult;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

const EMPTY_CELL: &str = "-";

fn special_cell(special: Option<u8>) -> String {
    special.map_or_else(|| EMPTY_CELL.to_string(), |s| format!("{:2}", s))
}

fn text_cell(text: &str) -> String {
    if text.is_empty() {
        EMPTY_CELL.to_string()
    } else {
        text.to_string()
    }
}

pub fn display_draws(draws: &[Draw]) {
    if draws.is_empty() {
        println!("Aucun tirage à afficher.");
        return;
    }
    let game = draws[0].game;

    let mut table = new_table(vec!["Date", "Numéros", game.special_name(), "Multiplicateur", "Jackpot"]);
    for draw in draws {
        table.add_row(vec![
            draw.date.format("%Y-%m-%d").to_string(),
            join_numbers(&draw.sorted_main()),
            special_cell(draw.special),
            text_cell(&draw.multiplier),
            text_cell(&draw.jackpot),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import terminé :");
    println!("  Total tirages lus : {}", result.total_records);
    println!("  Insérés           : {}", result.inserted);
    println!("  Doublons ignorés  : {}", result.skipped);
    if result.errors > 0 {
        println!("  Erreurs           : {}", result.errors);
    }
}

fn display_hot_cold(title: &str, hc: &HotCold) {
    println!("\n── {title} ──");
    let mut table = new_table(vec!["Chauds", "Fréq.", "Froids", "Fréq."]);
    for i in 0..hc.hot.len().max(hc.cold.len()) {
        let (hot_n, hot_f) = hc
            .hot
            .get(i)
            .map_or((String::new(), String::new()), |(n, f)| (format!("{:2}", n), f.to_string()));
        let (cold_n, cold_f) = hc
            .cold
            .get(i)
            .map_or((String::new(), String::new()), |(n, f)| (format!("{:2}", n), f.to_string()));
        table.add_row(vec![
            Cell::new(hot_n).fg(Color::Green),
            Cell::new(hot_f),
            Cell::new(cold_n).fg(Color::Red),
            Cell::new(cold_f),
        ]);
    }
    println!("{table}");
}

pub fn display_report(report: &GameReport) {
    println!(
        "\n📊 {} : statistiques sur les {} derniers tirages",
        report.game, report.based_on
    );

    display_hot_cold("Numéros principaux", &report.main);
    display_hot_cold(report.game.special_name(), &report.special);

    println!("\n── En retard ──");
    let mut table = new_table(vec!["Numéro", "Tirages depuis la dernière sortie"]);
    for (n, since) in &report.overdue {
        table.add_row(vec![format!("{:2}", n), since.to_string()]);
    }
    println!("{table}");

    if !report.top_pairs.is_empty() {
        println!("\n── Paires fréquentes ──");
        let mut table = new_table(vec!["Paire", "Occurrences", "Probabilité"]);
        for stat in &report.top_pairs {
            table.add_row(vec![
                format!("{:2} - {:2}", stat.pair.0, stat.pair.1),
                stat.count.to_string(),
                format!("{:.3}", stat.probability),
            ]);
        }
        println!("{table}");
    }
}

pub fn display_predictions(game: Game, predictions: &[Prediction]) {
    if predictions.is_empty() {
        println!("Aucune combinaison générée.");
        return;
    }
    println!("\n🎲 Combinaisons suggérées ({game})\n");

    let mut table = new_table(vec!["#", "Numéros", game.special_name(), "Score moyen", "Confiance"]);
    for (i, p) in predictions.iter().enumerate() {
        let color = match p.confidence {
            Confidence::High => Color::Green,
            Confidence::Medium => Color::Yellow,
            Confidence::Low => Color::Red,
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(join_numbers(&p.numbers)),
            Cell::new(format!("{:2}", p.special)),
            Cell::new(format!("{:.4}", p.mean_score)),
            Cell::new(p.confidence.to_string()).fg(color),
        ]);
    }
    println!("{table}");
}

pub fn display_quick_pick(game: Game, pick: &QuickPick) {
    println!("\n🎲 Quick pick ({game})\n");
    let mut table = new_table(vec!["Numéros", game.special_name()]);
    table.add_row(vec![join_numbers(&pick.numbers), special_cell(pick.special)]);
    println!("{table}");
}

pub fn display_ticket_result(draw: &Draw, result: &TicketResult) {
    println!("\nTirage du {} :", draw.date.format("%Y-%m-%d"));
    display_draws(std::slice::from_ref(draw));

    println!(
        "Numéros trouvés : {} ({})",
        result.main_matches,
        if result.matched_numbers.is_empty() {
            "aucun".to_string()
        } else {
            join_numbers(&result.matched_numbers)
        }
    );
    println!(
        "{} : {}",
        draw.game.special_name(),
        if result.special_match { "oui" } else { "non" }
    );
    match &result.prize {
        Some(tier) => {
            println!("🏆 Gain : {} (chances : {})", tier.prize, tier.odds);
            if let (Some(factor), Some(prize)) = (result.multiplier, result.multiplied_prize) {
                let name = multiplier_option(draw.game).map_or("Multiplicateur", |(name, _)| name);
                println!("   Avec {name} x{factor} : {prize}");
            }
        }
        None => println!("Pas de gain."),
    }
}

pub fn display_prize_tiers(game: Game) {
    let factors: &[u8] = match multiplier_option(game) {
        Some((_, factors)) => factors,
        None => &[],
    };

    let mut header = vec![
        "Numéros".to_string(),
        game.special_name().to_string(),
        "Chances".to_string(),
        "Gain".to_string(),
    ];
    header.extend(factors.iter().map(|f| format!("x{f}")));

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for tier in prize_tiers(game) {
        let mut row = vec![
            tier.main_matches.to_string(),
            if tier.special_match { "oui" } else { "non" }.to_string(),
            tier.odds.to_string(),
            tier.prize.to_string(),
        ];
        row.extend(factors.iter().map(|&f| text_cell(tier.prize_with(f).unwrap_or(""))));
        table.add_row(row);
    }
    println!("{table}");

    if let Some((name, _)) = multiplier_option(game) {
        println!("Colonnes x2.. : gains avec l'option {name}.");
    }
}
