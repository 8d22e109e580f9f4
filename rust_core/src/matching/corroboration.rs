//! Date-of-birth corroboration.
//!
//! A lead DOB corroborates a candidate when the candidate's stored date starts
//! with it. Prefix comparison lets callers pass a partial date ("1991",
//! "1991-08") and still corroborate; unparseable input simply never matches.

/// Score increment for a corroborated candidate.
pub const DOB_BOOST: u8 = 10;

/// Whether `lead_dob` (already trimmed, non-empty) is a prefix of the
/// candidate's stored date.
pub fn dob_corroborates(candidate_dob: Option<&str>, lead_dob: &str) -> bool {
    if lead_dob.is_empty() {
        return false;
    }
    candidate_dob.is_some_and(|dob| dob.starts_with(lead_dob))
}

/// Apply the boost, capped at 100.
pub fn boosted(score: u8) -> u8 {
    score.saturating_add(DOB_BOOST).min(100)
}
