//! Lead match RPC types and request handling.

use pro_qualifier_core::{Lead, MatchCandidate, MatchResult, Registry};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LeadMatchRequest {
    pub request_id: String,
    pub name: String,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub league_hint: Option<String>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl LeadMatchRequest {
    pub fn lead(&self) -> Lead {
        Lead {
            raw_name: self.name.clone(),
            date_of_birth: self.dob.clone(),
            league_hint: self.league_hint.clone(),
        }
    }

    /// Requested `top_k`, falling back to the default for missing or zero.
    pub fn top_k(&self, default: usize) -> usize {
        self.top_k.filter(|k| *k > 0).unwrap_or(default)
    }
}

#[derive(Debug, Serialize)]
pub struct LeadMatchResponse {
    pub request_id: String,
    pub is_probable_pro: bool,
    pub confidence: u8,
    pub reasons: Vec<String>,
    pub matches: Vec<MatchCandidate>,
    pub registry_size: usize,
}

impl LeadMatchResponse {
    fn from_result(request_id: String, result: MatchResult, registry_size: usize) -> Self {
        Self {
            request_id,
            is_probable_pro: result.is_probable_pro,
            confidence: result.confidence,
            reasons: result.reasons,
            matches: result.matches,
            registry_size,
        }
    }
}

pub fn handle_match(registry: &Registry, req: &LeadMatchRequest, default_top_k: usize) -> LeadMatchResponse {
    let result = registry.match_lead(&req.lead(), req.top_k(default_top_k));
    LeadMatchResponse::from_result(req.request_id.clone(), result, registry.len())
}
