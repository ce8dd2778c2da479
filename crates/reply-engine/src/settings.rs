//! Typed view over the key/value settings table.
//!
//! Settings are written by the admin surface and read here with safe
//! defaults: a missing or unparseable value never fails resolution, it
//! falls back to the default for that key.

use std::collections::HashMap;
use std::time::Duration;

/// Which AI backend to try first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Engine {
    #[default]
    Local,
    Claude,
}

impl Engine {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "local" => Some(Engine::Local),
            "claude" => Some(Engine::Claude),
            _ => None,
        }
    }
}

/// Default reply behavior for peers with no rule and no personal flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NewContactMode {
    #[default]
    Off,
    Template,
    Ai,
}

impl NewContactMode {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "off" => Some(NewContactMode::Off),
            "template" => Some(NewContactMode::Template),
            "ai" => Some(NewContactMode::Ai),
            _ => None,
        }
    }
}

/// A per-message snapshot of global configuration.
///
/// Re-read from storage for every message so admin edits take effect
/// without a restart.
#[derive(Debug, Clone)]
pub struct GlobalSettings {
    /// Master switch. Off means the engine never replies.
    pub auto_reply_enabled: bool,
    /// AI switch. Off downgrades any resolved ai mode to off.
    pub ai_enabled: bool,
    pub ai_engine: Engine,
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Fallback text for template mode when the rule has none.
    pub default_template: Option<String>,
    pub new_contact_mode: NewContactMode,
    /// Cumulative cap on replies to a not-yet-personal contact.
    pub new_contact_max_replies: i64,
    /// Per-subject daily reply cap for private chats.
    pub daily_max_replies: i64,
    /// Context window size for AI generation.
    pub context_window: i64,
    /// Interval applied when a subject has no rule.
    pub default_min_interval: Duration,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            auto_reply_enabled: false,
            ai_enabled: true,
            ai_engine: Engine::default(),
            system_prompt: None,
            temperature: 0.7,
            max_tokens: None,
            default_template: None,
            new_contact_mode: NewContactMode::default(),
            new_contact_max_replies: 5,
            daily_max_replies: 50,
            context_window: 20,
            default_min_interval: Duration::ZERO,
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl GlobalSettings {
    /// Build a snapshot from raw key/value rows.
    pub fn from_map(map: &HashMap<String, String>) -> Self {
        let defaults = Self::default();

        let get = |key: &str| map.get(key).map(String::as_str);

        Self {
            auto_reply_enabled: get("auto_reply_enabled")
                .and_then(parse_bool)
                .unwrap_or(defaults.auto_reply_enabled),
            ai_enabled: get("ai_enabled")
                .and_then(parse_bool)
                .unwrap_or(defaults.ai_enabled),
            ai_engine: get("ai_engine")
                .and_then(Engine::parse)
                .unwrap_or(defaults.ai_engine),
            system_prompt: get("system_prompt").map(str::to_string),
            temperature: get("temperature")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.temperature),
            max_tokens: get("max_tokens").and_then(|s| s.parse().ok()),
            default_template: get("default_template").map(str::to_string),
            new_contact_mode: get("new_contact_mode")
                .and_then(NewContactMode::parse)
                .unwrap_or(defaults.new_contact_mode),
            new_contact_max_replies: get("new_contact_max_replies")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.new_contact_max_replies),
            daily_max_replies: get("daily_max_replies")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.daily_max_replies),
            context_window: get("context_window")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.context_window),
            default_min_interval: get("default_min_interval_sec")
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.default_min_interval),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_are_safe() {
        let settings = GlobalSettings::from_map(&HashMap::new());
        assert!(!settings.auto_reply_enabled);
        assert_eq!(settings.new_contact_mode, NewContactMode::Off);
        assert_eq!(settings.daily_max_replies, 50);
        assert_eq!(settings.new_contact_max_replies, 5);
        assert_eq!(settings.ai_engine, Engine::Local);
    }

    #[test]
    fn test_parses_known_keys() {
        let settings = GlobalSettings::from_map(&map(&[
            ("auto_reply_enabled", "1"),
            ("ai_engine", "claude"),
            ("temperature", "0.3"),
            ("new_contact_mode", "template"),
            ("default_min_interval_sec", "120"),
        ]));

        assert!(settings.auto_reply_enabled);
        assert_eq!(settings.ai_engine, Engine::Claude);
        assert!((settings.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(settings.new_contact_mode, NewContactMode::Template);
        assert_eq!(settings.default_min_interval, Duration::from_secs(120));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let settings = GlobalSettings::from_map(&map(&[
            ("auto_reply_enabled", "maybe"),
            ("ai_engine", "gpt"),
            ("temperature", "hot"),
            ("daily_max_replies", ""),
        ]));

        assert!(!settings.auto_reply_enabled);
        assert_eq!(settings.ai_engine, Engine::Local);
        assert!((settings.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(settings.daily_max_replies, 50);
    }
}
