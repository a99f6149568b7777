// src/config/mod.rs
pub mod settings;

pub use settings::{
    CacheSettings, SectionSettings, Settings, SocialTrendsSettings, DEFAULT_SETTINGS_PATH,
    ENV_FRESHNESS_HOURS, ENV_SETTINGS_PATH,
};
