//! League configuration for supported leagues.
//!
//! This module provides:
//! - Static configuration for every league the registry covers
//! - The knowledge-base property each league's player ids come from

use crate::models::League;

/// Configuration for a single league.
#[derive(Debug, Clone)]
pub struct LeagueConfig {
    pub league: League,
    /// Sport name as stored on registry records
    pub sport: &'static str,
    /// Wikidata property holding the league's player id (e.g., "P3647")
    pub id_property: &'static str,
    /// Human-readable label for that id
    pub id_label: &'static str,
}

/// Static configuration for all supported leagues.
pub static LEAGUE_CONFIGS: &[LeagueConfig] = &[
    LeagueConfig {
        league: League::NFL,
        sport: "American football",
        id_property: "P3561",
        id_label: "pro_football_reference_id",
    },
    LeagueConfig {
        league: League::NBA,
        sport: "Basketball",
        id_property: "P3647",
        id_label: "nba_com_player_id",
    },
    LeagueConfig {
        league: League::MLB,
        sport: "Baseball",
        id_property: "P3541",
        id_label: "mlb_com_player_id",
    },
    LeagueConfig {
        league: League::MLS,
        sport: "Soccer",
        id_property: "P2398",
        id_label: "mls_player_id",
    },
];

/// Get league configuration by code.
pub fn get_league_config(league: &str) -> Option<&'static LeagueConfig> {
    League::parse(league).map(config_for)
}

pub(crate) fn config_for(league: League) -> &'static LeagueConfig {
    // Table is exhaustive over `League`.
    match league {
        League::NFL => &LEAGUE_CONFIGS[0],
        League::NBA => &LEAGUE_CONFIGS[1],
        League::MLB => &LEAGUE_CONFIGS[2],
        League::MLS => &LEAGUE_CONFIGS[3],
    }
}

/// Get all league configurations.
pub fn get_all_league_configs() -> &'static [LeagueConfig] {
    LEAGUE_CONFIGS
}

/// Get list of all league codes.
pub fn get_all_league_codes() -> Vec<&'static str> {
    LEAGUE_CONFIGS.iter().map(|c| c.league.as_str()).collect()
}

/// Whether `code` names a supported league.
pub fn is_known_league(code: &str) -> bool {
    League::parse(code).is_some()
}

// ============================================================================
// Tests
// ============================================================================
