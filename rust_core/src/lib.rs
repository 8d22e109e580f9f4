//! Pro Qualifier Core - athlete lead qualification.
//!
//! This module provides:
//! - Name normalization (case, punctuation, diacritics, generational suffixes)
//! - Token-set fuzzy similarity
//! - Lead matching against an athlete registry with league filtering,
//!   date-of-birth corroboration and a fixed confidence-to-verdict policy
//! - Registry snapshots loaded from CSV/JSON with atomic reload
//! - Batch matching of independent leads with rayon

pub mod error;
pub mod league_config;
pub mod matching;
pub mod models;
pub mod registry;
pub mod utils;

use rayon::prelude::*;

pub use error::RegistryError;
pub use matching::{match_lead, Verdict, DEFAULT_TOP_K};
pub use models::{League, Lead, MatchCandidate, MatchResult, RegistryRecord};
pub use registry::{Registry, RegistryHandle};
pub use utils::normalize::normalize_name;
pub use utils::similarity::token_set_ratio;

/// Qualify many leads against one registry snapshot in parallel.
///
/// Leads are independent, so each runs on its own rayon task. Results come
/// back in input order.
pub fn match_leads_batch(registry: &Registry, leads: &[Lead], top_k: usize) -> Vec<MatchResult> {
    leads
        .par_iter()
        .map(|lead| registry.match_lead(lead, top_k))
        .collect()
}
