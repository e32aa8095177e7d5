//! Settings for search plans and backend endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::FacilityKind;

// Enough candidates for ranking to matter.
const MIN_CANDIDATES: usize = 5;

/// Connection settings for one facility backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointSettings {
    /// Base URL; the adapter appends its own path.
    pub base_url: String,

    /// Access token sent in the `X-Access-Token` header.
    #[serde(default)]
    pub api_token: Option<String>,
}

impl EndpointSettings {
    /// Endpoint without a token.
    #[must_use]
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
        }
    }

    /// Base URL without a trailing slash.
    #[must_use]
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// Parameters of one facility lookup triggered by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPlan {
    /// Provider to query.
    pub kind: FacilityKind,
    /// Search radius in meters.
    pub radius_meters: u32,
    /// Number of candidates requested from the provider.
    pub limit: usize,
    /// Restrict to monitored smart bins.
    pub only_monitored: bool,
    /// Number of ranked facilities shown to the user.
    pub top_n: usize,
}

/// Tunables of the conversation router.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSettings {
    /// Radius for the bin lookup after a photo classification.
    #[serde(default = "default_nearby_radius")]
    pub classification_radius_m: u32,

    /// Radius for a location shared without any pending request.
    #[serde(default = "default_nearby_radius")]
    pub idle_radius_m: u32,

    /// Radius for an explicit smart bin search.
    #[serde(default = "default_smart_bin_radius")]
    pub smart_bin_radius_m: u32,

    /// Radius for an explicit bulky-waste search.
    #[serde(default = "default_bulky_waste_radius")]
    pub bulky_waste_radius_m: u32,

    /// Radius for an explicit collection yard search.
    #[serde(default = "default_collection_yard_radius")]
    pub collection_yard_radius_m: u32,

    /// Candidates requested per lookup; must leave room for ranking.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,

    /// Bulky-waste points listed per reply.
    #[serde(default = "default_bulky_waste_top_n")]
    pub bulky_waste_top_n: usize,

    /// Upper bound for a single provider call in milliseconds.
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,

    /// Free-chat turns kept per user.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Seconds without events after which a user's conversation is forgotten.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

fn default_nearby_radius() -> u32 {
    500
}
fn default_smart_bin_radius() -> u32 {
    1000
}
fn default_bulky_waste_radius() -> u32 {
    2000
}
fn default_collection_yard_radius() -> u32 {
    5000
}
fn default_candidate_limit() -> usize {
    10
}
fn default_bulky_waste_top_n() -> usize {
    3
}
fn default_provider_timeout_ms() -> u64 {
    10_000
}
fn default_history_limit() -> usize {
    10
}
fn default_session_idle_secs() -> u64 {
    1800
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            classification_radius_m: default_nearby_radius(),
            idle_radius_m: default_nearby_radius(),
            smart_bin_radius_m: default_smart_bin_radius(),
            bulky_waste_radius_m: default_bulky_waste_radius(),
            collection_yard_radius_m: default_collection_yard_radius(),
            candidate_limit: default_candidate_limit(),
            bulky_waste_top_n: default_bulky_waste_top_n(),
            provider_timeout_ms: default_provider_timeout_ms(),
            history_limit: default_history_limit(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

impl RouterSettings {
    /// Monitored smart bin lookup following a photo classification.
    #[must_use]
    pub fn classification_plan(&self) -> SearchPlan {
        self.nearest_bin_plan(self.classification_radius_m)
    }

    /// Monitored smart bin lookup for a location with nothing pending.
    #[must_use]
    pub fn idle_plan(&self) -> SearchPlan {
        self.nearest_bin_plan(self.idle_radius_m)
    }

    /// Lookup for an explicitly selected facility kind.
    #[must_use]
    pub fn mode_plan(&self, kind: FacilityKind) -> SearchPlan {
        match kind {
            FacilityKind::SmartBin => self.nearest_bin_plan(self.smart_bin_radius_m),
            FacilityKind::BulkyWaste => SearchPlan {
                kind,
                radius_meters: self.bulky_waste_radius_m,
                limit: self.candidate_limit.max(MIN_CANDIDATES),
                only_monitored: false,
                top_n: self.bulky_waste_top_n.max(1),
            },
            FacilityKind::CollectionYard => SearchPlan {
                kind,
                radius_meters: self.collection_yard_radius_m,
                limit: self.candidate_limit.max(MIN_CANDIDATES),
                only_monitored: false,
                top_n: 1,
            },
        }
    }

    /// Provider call timeout.
    #[must_use]
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Idle time after which a conversation is evicted.
    #[must_use]
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }

    fn nearest_bin_plan(&self, radius_meters: u32) -> SearchPlan {
        SearchPlan {
            kind: FacilityKind::SmartBin,
            radius_meters,
            limit: self.candidate_limit.max(MIN_CANDIDATES),
            only_monitored: true,
            top_n: 1,
        }
    }
}
