// Shared models for lead qualification
use serde::{Deserialize, Serialize};

pub const DEFAULT_LEVEL: &str = "major";
pub const DEFAULT_SOURCE: &str = "wikidata";

// ============================================================================
// League Enum
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum League {
    NFL,
    NBA,
    MLB,
    MLS,
}

impl League {
    pub const ALL: [League; 4] = [League::NFL, League::NBA, League::MLB, League::MLS];

    pub fn as_str(&self) -> &'static str {
        match self {
            League::NFL => "NFL",
            League::NBA => "NBA",
            League::MLB => "MLB",
            League::MLS => "MLS",
        }
    }

    /// Case-insensitive parse; surrounding whitespace is ignored.
    pub fn parse(s: &str) -> Option<League> {
        let code = s.trim();
        League::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(code))
    }

    pub fn sport(&self) -> &'static str {
        crate::league_config::config_for(*self).sport
    }
}

impl std::fmt::Display for League {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Registry Record
// ============================================================================

/// One known professional athlete.
///
/// Records are immutable once loaded. The normalized comparison key is not
/// stored here; each match run derives its own projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRegistryRecord")]
pub struct RegistryRecord {
    pub name: String,
    /// League code, normally one of [`League`] but kept verbatim.
    pub league: String,
    pub sport: String,
    /// ISO-8601 date or date prefix; `None` when unknown.
    pub date_of_birth: Option<String>,
    /// Knowledge-base item id (e.g. a Wikidata QID).
    pub entity_id: Option<String>,
    pub external_id: String,
    /// Which property the external id came from (e.g. "P3647").
    pub external_id_kind: String,
    /// Stable link to the source-of-truth record.
    pub proof_url: String,
    pub level: String,
    pub source: String,
}

impl RegistryRecord {
    pub fn league_enum(&self) -> Option<League> {
        League::parse(&self.league)
    }
}

/// Wire shape accepted on load. Column names written by the registry
/// builder (`dob`, `league_id`, ...) are accepted as aliases.
#[derive(Debug, Deserialize)]
struct RawRegistryRecord {
    name: String,
    league: String,
    sport: String,
    #[serde(default, alias = "dob")]
    date_of_birth: Option<String>,
    #[serde(default, alias = "qid")]
    entity_id: Option<String>,
    #[serde(alias = "league_id")]
    external_id: String,
    #[serde(alias = "league_id_property")]
    external_id_kind: String,
    #[serde(alias = "proof_wikidata_url")]
    proof_url: String,
    #[serde(default)]
    level: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<RawRegistryRecord> for RegistryRecord {
    fn from(raw: RawRegistryRecord) -> Self {
        Self {
            name: raw.name,
            league: raw.league,
            sport: raw.sport,
            date_of_birth: non_blank(raw.date_of_birth),
            entity_id: non_blank(raw.entity_id),
            external_id: raw.external_id,
            external_id_kind: raw.external_id_kind,
            proof_url: raw.proof_url,
            level: non_blank(raw.level).unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
            source: non_blank(raw.source).unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
        }
    }
}

// ============================================================================
// Lead (match request input)
// ============================================================================

/// An unverified person description submitted for qualification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub raw_name: String,
    /// Loosely formatted; compared as a prefix of the registry date.
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub league_hint: Option<String>,
}

impl Lead {
    pub fn new(raw_name: impl Into<String>) -> Self {
        Self {
            raw_name: raw_name.into(),
            ..Default::default()
        }
    }

    pub fn with_dob(mut self, dob: impl Into<String>) -> Self {
        self.date_of_birth = Some(dob.into());
        self
    }

    pub fn with_league_hint(mut self, hint: impl Into<String>) -> Self {
        self.league_hint = Some(hint.into());
        self
    }

    /// Trimmed DOB, `None` when blank.
    pub fn dob(&self) -> Option<&str> {
        self.date_of_birth
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Trimmed, upper-cased league hint, `None` when blank.
    pub fn league_hint_upper(&self) -> Option<String> {
        self.league_hint
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .map(str::to_uppercase)
    }
}

// ============================================================================
// Match Output
// ============================================================================

/// A registry record kept for one match run, with its score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Final score after corroboration, 0-100.
    pub confidence: u8,
    /// Name similarity before corroboration.
    pub base_score: u8,
    pub dob_corroborated: bool,
    pub normalized_name: String,
    pub name: String,
    pub league: String,
    pub sport: String,
    pub date_of_birth: Option<String>,
    pub entity_id: Option<String>,
    pub external_id: String,
    pub external_id_kind: String,
    pub proof_url: String,
    pub level: String,
    pub source: String,
}

impl MatchCandidate {
    pub fn from_record(record: &RegistryRecord, normalized_name: String, base_score: u8) -> Self {
        Self {
            confidence: base_score.min(100),
            base_score,
            dob_corroborated: false,
            normalized_name,
            name: record.name.clone(),
            league: record.league.clone(),
            sport: record.sport.clone(),
            date_of_birth: record.date_of_birth.clone(),
            entity_id: record.entity_id.clone(),
            external_id: record.external_id.clone(),
            external_id_kind: record.external_id_kind.clone(),
            proof_url: record.proof_url.clone(),
            level: record.level.clone(),
            source: record.source.clone(),
        }
    }
}

/// Outcome of qualifying one lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub is_probable_pro: bool,
    /// Best candidate confidence, 0-100.
    pub confidence: u8,
    /// Kept candidates in similarity rank order (not re-sorted after boosts).
    pub matches: Vec<MatchCandidate>,
    /// Filters applied and verdict rationale, in application order.
    pub reasons: Vec<String>,
}

impl MatchResult {
    /// Terminal result with no candidates.
    pub fn rejected(reason: &str) -> Self {
        Self {
            is_probable_pro: false,
            confidence: 0,
            matches: Vec::new(),
            reasons: vec![reason.to_string()],
        }
    }

    pub fn best_match(&self) -> Option<&MatchCandidate> {
        self.matches.iter().max_by_key(|m| m.confidence)
    }
}
