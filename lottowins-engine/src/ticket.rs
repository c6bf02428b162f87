use std::collections::BTreeSet;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;

use lottowins_db::db::fetch_draw_on;
use lottowins_db::models::{Draw, Game};
use lottowins_db::rusqlite::Connection;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PrizeTier {
    pub main_matches: usize,
    pub special_match: bool,
    pub odds: &'static str,
    pub prize: &'static str,
    /// Gain avec option multiplicateur (Megaplier, Power Play), par facteur.
    pub multiplied: &'static [(u8, &'static str)],
}

impl PrizeTier {
    pub fn prize_with(&self, factor: u8) -> Option<&'static str> {
        self.multiplied
            .iter()
            .find(|(f, _)| *f == factor)
            .map(|(_, prize)| *prize)
    }
}

const fn tier(
    main_matches: usize,
    special_match: bool,
    odds: &'static str,
    prize: &'static str,
    multiplied: &'static [(u8, &'static str)],
) -> PrizeTier {
    PrizeTier { main_matches, special_match, odds, prize, multiplied }
}

static MEGA_MILLIONS_TIERS: [PrizeTier; 9] = [
    tier(5, true, "1 sur 302 575 350", "Jackpot",
        &[(2, "Jackpot"), (3, "Jackpot"), (4, "Jackpot"), (5, "Jackpot")]),
    tier(5, false, "1 sur 12 607 306", "$1,000,000",
        &[(2, "$2,000,000"), (3, "$3,000,000"), (4, "$4,000,000"), (5, "$5,000,000")]),
    tier(4, true, "1 sur 931 001", "$10,000",
        &[(2, "$20,000"), (3, "$30,000"), (4, "$40,000"), (5, "$50,000")]),
    tier(4, false, "1 sur 38 792", "$500",
        &[(2, "$1,000"), (3, "$1,500"), (4, "$2,000"), (5, "$2,500")]),
    tier(3, true, "1 sur 14 547", "$200",
        &[(2, "$400"), (3, "$600"), (4, "$800"), (5, "$1,000")]),
    tier(3, false, "1 sur 606", "$10",
        &[(2, "$20"), (3, "$30"), (4, "$40"), (5, "$50")]),
    tier(2, true, "1 sur 693", "$10",
        &[(2, "$20"), (3, "$30"), (4, "$40"), (5, "$50")]),
    tier(1, true, "1 sur 89", "$4",
        &[(2, "$8"), (3, "$12"), (4, "$16"), (5, "$20")]),
    tier(0, true, "1 sur 37", "$2",
        &[(2, "$4"), (3, "$6"), (4, "$8"), (5, "$10")]),
];

// Power Play : le 5 seul est fixé à $2,000,000 quel que soit le facteur
static POWERBALL_TIERS: [PrizeTier; 9] = [
    tier(5, true, "1 sur 292 201 338", "Jackpot",
        &[(2, "Jackpot"), (3, "Jackpot"), (4, "Jackpot"), (5, "Jackpot"), (10, "Jackpot")]),
    tier(5, false, "1 sur 11 688 054", "$1,000,000",
        &[(2, "$2,000,000"), (3, "$2,000,000"), (4, "$2,000,000"), (5, "$2,000,000"), (10, "$2,000,000")]),
    tier(4, true, "1 sur 913 129", "$50,000",
        &[(2, "$100,000"), (3, "$150,000"), (4, "$200,000"), (5, "$250,000"), (10, "$500,000")]),
    tier(4, false, "1 sur 36 525", "$100",
        &[(2, "$200"), (3, "$300"), (4, "$400"), (5, "$500"), (10, "$1,000")]),
    tier(3, true, "1 sur 14 494", "$100",
        &[(2, "$200"), (3, "$300"), (4, "$400"), (5, "$500"), (10, "$1,000")]),
    tier(3, false, "1 sur 580", "$7",
        &[(2, "$14"), (3, "$21"), (4, "$28"), (5, "$35"), (10, "$70")]),
    tier(2, true, "1 sur 701", "$7",
        &[(2, "$14"), (3, "$21"), (4, "$28"), (5, "$35"), (10, "$70")]),
    tier(1, true, "1 sur 92", "$4",
        &[(2, "$8"), (3, "$12"), (4, "$16"), (5, "$20"), (10, "$40")]),
    tier(0, true, "1 sur 38", "$4",
        &[(2, "$8"), (3, "$12"), (4, "$16"), (5, "$20"), (10, "$40")]),
];

static CASH4LIFE_TIERS: [PrizeTier; 9] = [
    tier(5, true, "1 sur 21 846 048", "$1,000/jour à vie", &[]),
    tier(5, false, "1 sur 7 282 016", "$1,000/semaine à vie", &[]),
    tier(4, true, "1 sur 79 440", "$2,500", &[]),
    tier(4, false, "1 sur 26 480", "$500", &[]),
    tier(3, true, "1 sur 1 471", "$100", &[]),
    tier(3, false, "1 sur 490", "$25", &[]),
    tier(2, true, "1 sur 83", "$10", &[]),
    tier(2, false, "1 sur 28", "$4", &[]),
    tier(1, true, "1 sur 13", "$2", &[]),
];

pub fn prize_tiers(game: Game) -> &'static [PrizeTier] {
    match game {
        Game::MegaMillions => &MEGA_MILLIONS_TIERS,
        Game::Powerball => &POWERBALL_TIERS,
        Game::Cash4Life => &CASH4LIFE_TIERS,
    }
}

const MEGAPLIER_FACTORS: &[u8] = &[2, 3, 4, 5];
const POWER_PLAY_FACTORS: &[u8] = &[2, 3, 4, 5, 10];

/// Nom de l'option multiplicateur et facteurs possibles.
pub fn multiplier_option(game: Game) -> Option<(&'static str, &'static [u8])> {
    match game {
        Game::MegaMillions => Some(("Megaplier", MEGAPLIER_FACTORS)),
        Game::Powerball => Some(("Power Play", POWER_PLAY_FACTORS)),
        Game::Cash4Life => None,
    }
}

/// Lit un multiplicateur tel qu'importé : `"3"`, `"x3"`, `"3X"`, `"03"`.
pub fn parse_multiplier(raw: &str) -> Option<u8> {
    raw.trim()
        .trim_matches(|c: char| c == 'x' || c == 'X')
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|&f| f >= 2)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TicketResult {
    pub main_matches: usize,
    pub matched_numbers: Vec<u8>,
    pub special_match: bool,
    pub prize: Option<PrizeTier>,
    /// Facteur multiplicateur du tirage, s'il est connu.
    pub multiplier: Option<u8>,
    /// Gain si l'option multiplicateur a été jouée.
    pub multiplied_prize: Option<&'static str>,
}

impl TicketResult {
    pub fn is_winner(&self) -> bool {
        self.prize.is_some()
    }
}

/// Compare un ticket au tirage gagnant. Les doublons du ticket sont ignorés.
pub fn check_ticket(draw: &Draw, main: &[u8], special: Option<u8>) -> TicketResult {
    let ticket: BTreeSet<u8> = main.iter().copied().collect();
    let winning: BTreeSet<u8> = draw.main.iter().copied().collect();
    let matched_numbers: Vec<u8> = ticket.intersection(&winning).copied().collect();

    let special_match = matches!((special, draw.special), (Some(a), Some(b)) if a == b);
    let main_matches = matched_numbers.len();
    let prize = prize_tiers(draw.game)
        .iter()
        .find(|t| t.main_matches == main_matches && t.special_match == special_match)
        .copied();

    let multiplier = parse_multiplier(&draw.multiplier);
    let multiplied_prize = match (prize, multiplier) {
        (Some(tier), Some(factor)) => tier.prize_with(factor),
        _ => None,
    };

    TicketResult {
        main_matches,
        matched_numbers,
        special_match,
        prize,
        multiplier,
        multiplied_prize,
    }
}

/// Tirage enregistré et résultat du ticket, `Ok(None)` si aucun tirage à cette date.
pub fn check_ticket_on(
    conn: &Connection,
    game: Game,
    date: NaiveDate,
    main: &[u8],
    special: Option<u8>,
) -> Result<Option<(Draw, TicketResult)>> {
    let Some(draw) = fetch_draw_on(conn, game, date)? else {
        tracing::debug!(game = %game, %date, "aucun tirage à cette date");
        return Ok(None);
    };
    let result = check_ticket(&draw, main, special);
    Ok(Some((draw, result)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottowins_db::db::{insert_draw, migrate};

    fn winning(game: Game, special: Option<u8>) -> Draw {
        let date = NaiveDate::from_ymd_opt(2025, 4, 26).unwrap();
        Draw::new(game, date, vec![7, 30, 39, 41, 60], special)
    }

    #[test]
    fn test_jackpot() {
        let draw = winning(Game::MegaMillions, Some(13));
        let result = check_ticket(&draw, &[60, 41, 39, 30, 7], Some(13));
        assert_eq!(result.main_matches, 5);
        assert!(result.special_match);
        assert_eq!(result.prize.unwrap().prize, "Jackpot");
    }

    #[test]
    fn test_partial_match() {
        let draw = winning(Game::Powerball, Some(3));
        let result = check_ticket(&draw, &[7, 30, 39, 1, 2], Some(4));
        assert_eq!(result.main_matches, 3);
        assert_eq!(result.matched_numbers, vec![7, 30, 39]);
        assert!(!result.special_match);
        assert_eq!(result.prize.unwrap().prize, "$7");
    }

    #[test]
    fn test_special_only() {
        let draw = winning(Game::MegaMillions, Some(13));
        let result = check_ticket(&draw, &[1, 2, 3, 4, 5], Some(13));
        assert_eq!(result.main_matches, 0);
        assert!(result.special_match);
        assert_eq!(result.prize.unwrap().prize, "$2");

        // Cash4Life ne paie rien pour la seule Cash Ball
        let draw = winning(Game::Cash4Life, Some(2));
        assert!(!check_ticket(&draw, &[1, 2, 3, 4, 5], Some(2)).is_winner());
    }

    #[test]
    fn test_no_match() {
        let draw = winning(Game::MegaMillions, Some(13));
        let result = check_ticket(&draw, &[1, 2, 3, 4, 5], Some(12));
        assert_eq!(result.main_matches, 0);
        assert!(!result.special_match);
        assert!(!result.is_winner());
    }

    #[test]
    fn test_missing_specials_never_match() {
        let draw = winning(Game::Powerball, None);
        assert!(!check_ticket(&draw, &[7, 30, 39, 41, 60], Some(1)).special_match);
        let draw = winning(Game::Powerball, Some(1));
        assert!(!check_ticket(&draw, &[7, 30, 39, 41, 60], None).special_match);
    }

    #[test]
    fn test_duplicates_in_ticket_ignored() {
        let draw = winning(Game::Cash4Life, Some(1));
        let result = check_ticket(&draw, &[7, 7, 7, 30, 30], None);
        assert_eq!(result.main_matches, 2);
        assert_eq!(result.prize.unwrap().prize, "$4");
    }

    #[test]
    fn test_tiers_unique_per_game() {
        for game in Game::ALL {
            let tiers = prize_tiers(game);
            for i in 0..tiers.len() {
                for j in (i + 1)..tiers.len() {
                    assert!(
                        tiers[i].main_matches != tiers[j].main_matches
                            || tiers[i].special_match != tiers[j].special_match
                    );
                }
            }
        }
    }

    #[test]
    fn test_check_ticket_on_stored_draw() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let draw = winning(Game::MegaMillions, Some(13));
        insert_draw(&conn, &draw).unwrap();

        let (stored, result) = check_ticket_on(&conn, Game::MegaMillions, draw.date, &[7, 30, 1, 2, 3], Some(13))
            .unwrap()
            .unwrap();
        assert_eq!(stored, draw);
        assert_eq!(result.main_matches, 2);
        assert_eq!(result.prize.unwrap().prize, "$10");

        let other = NaiveDate::from_ymd_opt(2025, 4, 29).unwrap();
        assert!(check_ticket_on(&conn, Game::MegaMillions, other, &[7], None).unwrap().is_none());
        assert!(check_ticket_on(&conn, Game::Powerball, draw.date, &[7], None).unwrap().is_none());
    }

    #[test]
    fn test_multiplier_applied_to_prize() {
        let mut draw = winning(Game::MegaMillions, Some(13));
        draw.multiplier = "3".to_string();
        let result = check_ticket(&draw, &[7, 30, 39, 41, 1], None);
        assert_eq!(result.prize.unwrap().prize, "$500");
        assert_eq!(result.multiplier, Some(3));
        assert_eq!(result.multiplied_prize, Some("$1,500"));

        let mut draw = winning(Game::Powerball, Some(3));
        draw.multiplier = "10X".to_string();
        let result = check_ticket(&draw, &[7, 30, 39, 41, 60], None);
        assert_eq!(result.multiplied_prize, Some("$2,000,000"));

        // pas de multiplicateur enregistré, ou pas de gain
        let draw = winning(Game::Powerball, Some(3));
        assert_eq!(check_ticket(&draw, &[7, 30, 39, 41, 60], None).multiplied_prize, None);
        let mut draw = winning(Game::MegaMillions, Some(13));
        draw.multiplier = "2".to_string();
        let result = check_ticket(&draw, &[1, 2, 3, 4, 5], None);
        assert_eq!(result.multiplier, Some(2));
        assert_eq!(result.multiplied_prize, None);
    }

    #[test]
    fn test_parse_multiplier() {
        assert_eq!(parse_multiplier("3"), Some(3));
        assert_eq!(parse_multiplier(" x4 "), Some(4));
        assert_eq!(parse_multiplier("10X"), Some(10));
        assert_eq!(parse_multiplier("03"), Some(3));
        assert_eq!(parse_multiplier(""), None);
        assert_eq!(parse_multiplier("1"), None);
        assert_eq!(parse_multiplier("abc"), None);
    }

    #[test]
    fn test_multiplier_columns_cover_every_tier() {
        for game in Game::ALL {
            match multiplier_option(game) {
                Some((_, factors)) => {
                    for tier in prize_tiers(game) {
                        for &f in factors {
                            assert!(tier.prize_with(f).is_some(), "{game} {} x{f}", tier.main_matches);
                        }
                    }
                }
                None => assert!(prize_tiers(game).iter().all(|t| t.multiplied.is_empty())),
            }
        }
    }
}
