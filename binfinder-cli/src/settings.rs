//! Layered settings: defaults, optional `binfinder.toml`, then `BINFINDER_*` variables.

use anyhow::Result;
use binfinder_core::{EndpointSettings, RouterSettings};
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;

use binfinder_provider_bulky as bulky;
use binfinder_provider_smartbin as smartbin;
use binfinder_provider_yard as yard;

const CONFIG_FILE: &str = "binfinder";
const ENV_PREFIX: &str = "BINFINDER";

/// Everything the binary needs to wire the assistant.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Settings {
    pub(crate) smart_bin: EndpointSettings,
    pub(crate) bulky_waste: EndpointSettings,
    pub(crate) collection_yard: EndpointSettings,

    #[serde(default)]
    pub(crate) router: RouterSettings,

    /// Chat-completions backend used for translation and free chat.
    #[serde(default)]
    pub(crate) llm: Option<LlmSettings>,

    /// Remote image classifier; file names are used as labels without it.
    #[serde(default)]
    pub(crate) classifier_url: Option<String>,

    /// Language of the console session until changed with `lang`.
    #[serde(default = "default_language")]
    pub(crate) language: String,
}

/// OpenAI-compatible chat-completions endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LlmSettings {
    /// Base URL; `/chat/completions` is appended.
    pub(crate) url: String,

    #[serde(default)]
    pub(crate) api_key: Option<String>,

    #[serde(default = "default_model")]
    pub(crate) model: String,

    #[serde(default = "default_llm_timeout_ms")]
    pub(crate) timeout_ms: u64,
}

fn default_language() -> String {
    "en".to_owned()
}
fn default_model() -> String {
    "gpt-4o-mini".to_owned()
}
fn default_llm_timeout_ms() -> u64 {
    20_000
}

/// Load settings from `binfinder.toml` (if present) and the environment.
///
/// Nested keys use `__`, e.g. `BINFINDER_SMART_BIN__API_TOKEN`.
pub(crate) fn load() -> Result<Settings> {
    let env = Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true);

    let settings = defaults()?
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(env)
        .build()?
        .try_deserialize()?;
    Ok(settings)
}

fn defaults() -> Result<ConfigBuilder<DefaultState>> {
    Ok(Config::builder()
        .set_default("smart_bin.base_url", smartbin::DEFAULT_BASE_URL)?
        .set_default("bulky_waste.base_url", bulky::DEFAULT_BASE_URL)?
        .set_default("collection_yard.base_url", yard::DEFAULT_BASE_URL)?)
}
