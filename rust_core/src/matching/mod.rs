//! Lead Matching and Scoring
//!
//! Ranks registry records by name similarity to a lead, corroborates the kept
//! candidates with date of birth, and turns the best score into a verdict.
//!
//! Matching is a pure function of its inputs. It reads the registry, never
//! writes it, and performs no I/O, so any number of matches may run against
//! one snapshot concurrently.

use crate::models::{Lead, MatchCandidate, MatchResult, RegistryRecord};
use crate::utils::normalize::normalize_name;
use crate::utils::similarity::token_set_ratio;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub mod corroboration;

pub use corroboration::{dob_corroborates, DOB_BOOST};

/// Default number of candidates kept per match.
pub const DEFAULT_TOP_K: usize = 5;
/// Normalized lead names shorter than this are rejected outright.
pub const MIN_NAME_LEN: usize = 3;
/// Best score at or above this is a high-confidence match.
pub const HIGH_CONFIDENCE_THRESHOLD: u8 = 92;
/// Best score at or above this (and below high) is a moderate match.
pub const MODERATE_CONFIDENCE_THRESHOLD: u8 = 85;

pub const REASON_EMPTY_REGISTRY: &str = "Registry is empty.";
pub const REASON_NAME_TOO_SHORT: &str = "Lead name is too short to match reliably.";
pub const REASON_HIGH: &str = "High-confidence name match (>=92).";
pub const REASON_MODERATE: &str =
    "Moderate-confidence name match (85-91). Add DOB/team to disambiguate common names.";
pub const REASON_NO_MATCH: &str = "No sufficiently strong match found (<85).";

/// Verdict tier for the best candidate's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verdict {
    NoMatch = 0,
    Moderate = 1, // Probable pro, needs disambiguation
    High = 2,
}

impl Verdict {
    pub fn from_confidence(best: u8) -> Self {
        if best >= HIGH_CONFIDENCE_THRESHOLD {
            Verdict::High
        } else if best >= MODERATE_CONFIDENCE_THRESHOLD {
            Verdict::Moderate
        } else {
            Verdict::NoMatch
        }
    }

    pub fn is_probable_pro(&self) -> bool {
        *self >= Verdict::Moderate
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Verdict::High => REASON_HIGH,
            Verdict::Moderate => REASON_MODERATE,
            Verdict::NoMatch => REASON_NO_MATCH,
        }
    }
}

fn league_filter_reason(hint: &str) -> String {
    format!("Applied league hint filter: {}", hint)
}

/// Qualify a lead against registry records.
///
/// Records are scored in the order given; among equal scores the earlier
/// record is kept. At most `top_k` candidates are returned, in rank order by
/// pre-boost similarity.
pub fn match_lead(records: &[RegistryRecord], lead: &Lead, top_k: usize) -> MatchResult {
    if records.is_empty() {
        return MatchResult::rejected(REASON_EMPTY_REGISTRY);
    }

    let query = normalize_name(&lead.raw_name);
    if query.chars().count() < MIN_NAME_LEN {
        return MatchResult::rejected(REASON_NAME_TOO_SHORT);
    }

    let mut reasons = Vec::new();

    // 1. League filter (reason recorded even if nothing is removed).
    // A blank hint is deliberately treated as no hint: no filter, no reason.
    let league_hint = lead.league_hint_upper();
    let pool: Vec<&RegistryRecord> = match &league_hint {
        Some(hint) => {
            reasons.push(league_filter_reason(hint));
            records
                .iter()
                .filter(|r| r.league.to_uppercase() == *hint)
                .collect()
        }
        None => records.iter().collect(),
    };

    // 2-3. Per-run normalized projection and similarity
    let mut scored: Vec<(usize, String, u8)> = pool
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let normalized = normalize_name(&record.name);
            let score = token_set_ratio(&query, &normalized);
            (idx, normalized, score)
        })
        .collect();

    // 4. Top-K; stable sort keeps registry order among ties
    scored.sort_by(|a, b| b.2.cmp(&a.2));
    scored.truncate(top_k);

    // 5-6. Corroboration and best score
    let lead_dob = lead.dob();
    let mut best = 0u8;
    let matches: Vec<MatchCandidate> = scored
        .into_iter()
        .map(|(idx, normalized, score)| {
            let record = pool[idx];
            let mut candidate = MatchCandidate::from_record(record, normalized, score);
            if let Some(dob) = lead_dob {
                if dob_corroborates(record.date_of_birth.as_deref(), dob) {
                    candidate.confidence = corroboration::boosted(score);
                    candidate.dob_corroborated = true;
                }
            }
            best = best.max(candidate.confidence);
            candidate
        })
        .collect();

    // 7. Verdict policy
    let verdict = Verdict::from_confidence(best);
    reasons.push(verdict.reason().to_string());

    debug!(
        "Lead match: '{}' -> {:?} (best={}, candidates={}, pool={}, league_hint={:?})",
        query,
        verdict,
        best,
        matches.len(),
        pool.len(),
        league_hint
    );

    MatchResult {
        is_probable_pro: verdict.is_probable_pro(),
        confidence: best,
        matches,
        reasons,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, league: &str, dob: Option<&str>) -> RegistryRecord {
        RegistryRecord {
            name: name.to_string(),
            league: league.to_string(),
            sport: "Test".to_string(),
            date_of_birth: dob.map(str::to_string),
            entity_id: None,
            external_id: format!("id-{}", name),
            external_id_kind: "P0".to_string(),
            proof_url: format!("https://www.wikidata.org/wiki/{}", name.replace(' ', "_")),
            level: "major".to_string(),
            source: "wikidata".to_string(),
        }
    }

    fn registry() -> Vec<RegistryRecord> {
        vec![
            record("Mike Trout", "MLB", Some("1991-08-07T00:00:00Z")),
            record("LeBron James", "NBA", Some("1984-12-30T00:00:00Z")),
            record("Tom Brady", "NFL", Some("1977-08-03T00:00:00Z")),
            record("Kobe Bryant", "NBA", Some("1978-08-23T00:00:00Z")),
            record("Lionel Messi", "MLS", Some("1987-06-24T00:00:00Z")),
            record("Josh Allen", "NFL", None),
        ]
    }

    #[test]
    fn test_empty_registry() {
        let result = match_lead(&[], &Lead::new("Mike Trout"), DEFAULT_TOP_K);
        assert!(!result.is_probable_pro);
        assert_eq!(result.confidence, 0);
        assert!(result.matches.is_empty());
        assert_eq!(result.reasons, vec![REASON_EMPTY_REGISTRY.to_string()]);
    }

    #[test]
    fn test_empty_registry_checked_before_name() {
        let result = match_lead(&[], &Lead::new("Al"), DEFAULT_TOP_K);
        assert_eq!(result.reasons, vec![REASON_EMPTY_REGISTRY.to_string()]);
    }

    #[test]
    fn test_short_name_rejected() {
        let regs = vec![record("Al", "NFL", None), record("Al Davis", "NFL", None)];
        for name in ["Al", " A. ", "", "!!", "Al Jr."] {
            let result = match_lead(&regs, &Lead::new(name), DEFAULT_TOP_K);
            assert!(!result.is_probable_pro, "{:?}", name);
            assert_eq!(result.confidence, 0);
            assert!(result.matches.is_empty());
            assert_eq!(result.reasons, vec![REASON_NAME_TOO_SHORT.to_string()]);
        }
    }

    #[test]
    fn test_exact_match_high_confidence() {
        let result = match_lead(&registry(), &Lead::new("Mike Trout"), DEFAULT_TOP_K);
        assert!(result.is_probable_pro);
        assert_eq!(result.confidence, 100);
        assert_eq!(result.matches[0].name, "Mike Trout");
        assert_eq!(result.matches[0].normalized_name, "mike trout");
        assert_eq!(result.reasons, vec![REASON_HIGH.to_string()]);
    }

    #[test]
    fn test_punctuation_and_suffix_tolerated() {
        let result = match_lead(&registry(), &Lead::new("TOM  BRADY Jr."), DEFAULT_TOP_K);
        assert_eq!(result.confidence, 100);
        assert_eq!(result.matches[0].name, "Tom Brady");
    }

    #[test]
    fn test_middle_name_tolerated() {
        let result = match_lead(&registry(), &Lead::new("LeBron Raymone James"), DEFAULT_TOP_K);
        assert_eq!(result.confidence, 100);
        assert!(result.is_probable_pro);
    }

    #[test]
    fn test_no_match() {
        let result = match_lead(&registry(), &Lead::new("Zzyzx Qwerty"), DEFAULT_TOP_K);
        assert!(!result.is_probable_pro);
        assert!(result.confidence < MODERATE_CONFIDENCE_THRESHOLD);
        assert_eq!(result.reasons.last().map(String::as_str), Some(REASON_NO_MATCH));
    }

    #[test]
    fn test_dob_boost_crosses_threshold() {
        let without = match_lead(&registry(), &Lead::new("Jake Trout"), DEFAULT_TOP_K);
        assert_eq!(without.confidence, 80);
        assert!(!without.is_probable_pro);

        let with = match_lead(
            &registry(),
            &Lead::new("Jake Trout").with_dob("1991"),
            DEFAULT_TOP_K,
        );
        let top = &with.matches[0];
        assert_eq!(top.name, "Mike Trout");
        assert_eq!(top.base_score, 80);
        assert_eq!(top.confidence, 90);
        assert!(top.dob_corroborated);
        assert_eq!(with.confidence, 90);
        assert!(with.is_probable_pro);
        assert_eq!(with.reasons, vec![REASON_MODERATE.to_string()]);
    }

    #[test]
    fn test_dob_boost_capped_at_100() {
        let result = match_lead(
            &registry(),
            &Lead::new("Mike Trout").with_dob("1991-08-07"),
            DEFAULT_TOP_K,
        );
        assert_eq!(result.matches[0].confidence, 100);
        assert!(result.matches[0].dob_corroborated);
    }

    #[test]
    fn test_dob_mismatch_no_boost() {
        let result = match_lead(
            &registry(),
            &Lead::new("Jake Trout").with_dob("08/07/1991"),
            DEFAULT_TOP_K,
        );
        assert_eq!(result.confidence, 80);
        assert!(result.matches.iter().all(|m| !m.dob_corroborated));
    }

    #[test]
    fn test_dob_applies_without_league_hint_and_with_it() {
        let plain = match_lead(&registry(), &Lead::new("Jake Trout").with_dob("1991"), 1);
        let hinted = match_lead(
            &registry(),
            &Lead::new("Jake Trout").with_dob("1991").with_league_hint("mlb"),
            1,
        );
        assert_eq!(plain.confidence, 90);
        assert_eq!(hinted.confidence, 90);
    }

    #[test]
    fn test_league_filter_excludes_other_leagues() {
        let regs = vec![
            record("Chris Johnson", "NFL", None),
            record("Chris Johnson", "NBA", None),
            record("Chris Jackson", "NBA", None),
        ];
        let result = match_lead(
            &regs,
            &Lead::new("Chris Johnson").with_league_hint(" nba "),
            DEFAULT_TOP_K,
        );
        assert!(result.matches.iter().all(|m| m.league == "NBA"));
        assert_eq!(result.matches.len(), 2);
        assert_eq!(result.reasons[0], "Applied league hint filter: NBA");
        assert_eq!(result.reasons.len(), 2);
    }

    #[test]
    fn test_league_filter_reason_even_when_nothing_removed() {
        let regs = vec![record("Kobe Bryant", "NBA", None)];
        let result = match_lead(&regs, &Lead::new("Kobe Bryant").with_league_hint("NBA"), 5);
        assert_eq!(result.reasons[0], "Applied league hint filter: NBA");
        assert_eq!(result.reasons[1], REASON_HIGH);
    }

    #[test]
    fn test_unknown_league_hint_filters_to_zero() {
        let result = match_lead(
            &registry(),
            &Lead::new("Mike Trout").with_league_hint("NHL"),
            DEFAULT_TOP_K,
        );
        assert!(result.matches.is_empty());
        assert!(!result.is_probable_pro);
        assert_eq!(result.confidence, 0);
        assert_eq!(
            result.reasons,
            vec![
                "Applied league hint filter: NHL".to_string(),
                REASON_NO_MATCH.to_string()
            ]
        );
    }

    #[test]
    fn test_blank_league_hint_ignored() {
        let result = match_lead(
            &registry(),
            &Lead::new("Mike Trout").with_league_hint("  "),
            DEFAULT_TOP_K,
        );
        assert_eq!(result.reasons, vec![REASON_HIGH.to_string()]);
    }

    #[test]
    fn test_top_k_bound() {
        let regs = registry();
        for k in 0..10 {
            let result = match_lead(&regs, &Lead::new("Kobe Bryant"), k);
            assert!(result.matches.len() <= k);
            assert!(result.matches.len() <= regs.len());
        }
        let hinted = match_lead(&regs, &Lead::new("Kobe Bryant").with_league_hint("NBA"), 10);
        assert_eq!(hinted.matches.len(), 2);
    }

    #[test]
    fn test_zero_top_k_yields_no_verdict() {
        let result = match_lead(&registry(), &Lead::new("Mike Trout"), 0);
        assert!(result.matches.is_empty());
        assert_eq!(result.confidence, 0);
        assert!(!result.is_probable_pro);
    }

    #[test]
    fn test_ties_keep_registry_order() {
        let mut a = record("John Smith", "NFL", None);
        a.external_id = "first".into();
        let mut b = record("John Smith", "NBA", None);
        b.external_id = "second".into();
        let mut c = record("John Smith", "MLB", None);
        c.external_id = "third".into();
        let regs = vec![record("Zed Zulu", "NFL", None), a, b, c];

        let result = match_lead(&regs, &Lead::new("John Smith"), 2);
        let ids: Vec<&str> = result.matches.iter().map(|m| m.external_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second"]);
    }

    #[test]
    fn test_candidates_ranked_by_base_score_not_boost() {
        let regs = vec![
            record("Mike Trout", "MLB", Some("1991-08-07")),
            record("Jake Trout", "MLB", Some("2001-01-01")),
        ];
        let result = match_lead(&regs, &Lead::new("Jake Trout").with_dob("1991"), 5);
        assert_eq!(result.matches[0].name, "Jake Trout");
        assert_eq!(result.matches[0].confidence, 100);
        assert_eq!(result.matches[1].name, "Mike Trout");
        assert_eq!(result.matches[1].confidence, 90);
    }

    #[test]
    fn test_confidence_bounded_for_adversarial_input() {
        let long = "Ab".repeat(300);
        let leads = [
            "'''---'''",
            "0000000",
            long.as_str(),
            "Mike Mike Mike Trout Trout",
            "Ωμέγα Ψ",
            "a b c d e f g h",
        ];
        let mut regs = registry();
        regs.push(record("", "NFL", Some("")));
        regs.push(record("!!!", "NBA", None));
        for name in leads {
            let result = match_lead(&regs, &Lead::new(name).with_dob("1"), 3);
            assert!(result.confidence <= 100);
            assert!(result.matches.iter().all(|m| m.confidence <= 100));
            assert!(result.matches.len() <= 3);
        }
    }

    #[test]
    fn test_deterministic() {
        let regs = registry();
        let lead = Lead::new("Kobe Brian").with_dob("1978").with_league_hint("nba");
        let a = match_lead(&regs, &lead, 3);
        let b = match_lead(&regs, &lead, 3);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_registry_not_mutated() {
        let regs = registry();
        let before = regs.clone();
        let _ = match_lead(&regs, &Lead::new("LeBron James").with_league_hint("NBA"), 2);
        assert_eq!(regs, before);
    }

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(Verdict::from_confidence(100), Verdict::High);
        assert_eq!(Verdict::from_confidence(92), Verdict::High);
        assert_eq!(Verdict::from_confidence(91), Verdict::Moderate);
        assert_eq!(Verdict::from_confidence(85), Verdict::Moderate);
        assert_eq!(Verdict::from_confidence(84), Verdict::NoMatch);
        assert_eq!(Verdict::from_confidence(0), Verdict::NoMatch);

        assert!(Verdict::High.is_probable_pro());
        assert!(Verdict::Moderate.is_probable_pro());
        assert!(!Verdict::NoMatch.is_probable_pro());
        assert_eq!(Verdict::Moderate.reason(), REASON_MODERATE);
    }

    #[test]
    fn test_threshold_boundaries_end_to_end() {
        // spike trout ~ mike trout scores exactly 85
        let regs = vec![record("Mike Trout", "MLB", None)];
        let result = match_lead(&regs, &Lead::new("Spike Trout"), 5);
        assert_eq!(result.confidence, 85);
        assert!(result.is_probable_pro);
        assert_eq!(result.reasons, vec![REASON_MODERATE.to_string()]);

        // jon smyth ~ john smith scores exactly 84
        let regs = vec![record("John Smith", "NFL", None)];
        let result = match_lead(&regs, &Lead::new("Jon Smyth"), 5);
        assert_eq!(result.confidence, 84);
        assert!(!result.is_probable_pro);
    }
}
