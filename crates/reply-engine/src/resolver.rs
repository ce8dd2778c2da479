//! Rule resolution: which reply mode applies to a subject.
//!
//! Resolution is a precedence chain, not a loop. An explicit enabled rule
//! always wins, including one that says off.

use std::time::Duration;

use database::{Peer, ReplyRule};

use crate::settings::{GlobalSettings, NewContactMode};

/// How to reply, with the parameters the mode needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMode {
    /// Generate with an AI backend; `prompt` overrides the global system prompt.
    Ai { prompt: Option<String> },
    /// Send literal text; `None` falls back to the global default template.
    Template { text: Option<String> },
    Off,
}

/// The concrete policy chosen for one subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPolicy {
    pub mode: ReplyMode,
    /// Minimum gap between replies to this subject.
    pub min_interval: Duration,
    /// True when the new-contact cumulative cap applies.
    pub is_new_contact: bool,
}

impl ResolvedPolicy {
    fn off() -> Self {
        Self {
            mode: ReplyMode::Off,
            min_interval: Duration::ZERO,
            is_new_contact: false,
        }
    }
}

fn mode_from_rule(rule: &ReplyRule) -> ReplyMode {
    match rule.mode.as_str() {
        "ai" => ReplyMode::Ai {
            prompt: rule.prompt.clone(),
        },
        "template" => ReplyMode::Template {
            text: rule.template.clone(),
        },
        // "off" and anything unrecognized resolve to off.
        _ => ReplyMode::Off,
    }
}

/// Downgrade ai mode to off when the AI master switch is disabled.
fn gate_ai(mode: ReplyMode, settings: &GlobalSettings) -> ReplyMode {
    match mode {
        ReplyMode::Ai { .. } if !settings.ai_enabled => ReplyMode::Off,
        other => other,
    }
}

/// Resolve the policy for a private peer.
///
/// Precedence: master switch → explicit enabled rule → personal-folder
/// default (ai) → new-contact mode from global settings.
pub fn resolve_private(
    peer: &Peer,
    rule: Option<&ReplyRule>,
    settings: &GlobalSettings,
) -> ResolvedPolicy {
    if !settings.auto_reply_enabled {
        return ResolvedPolicy::off();
    }

    if let Some(rule) = rule.filter(|r| r.enabled) {
        return ResolvedPolicy {
            mode: gate_ai(mode_from_rule(rule), settings),
            min_interval: Duration::from_secs(rule.min_interval_sec.max(0) as u64),
            is_new_contact: false,
        };
    }

    if peer.in_personal {
        return ResolvedPolicy {
            mode: gate_ai(ReplyMode::Ai { prompt: None }, settings),
            min_interval: settings.default_min_interval,
            is_new_contact: false,
        };
    }

    let mode = match settings.new_contact_mode {
        NewContactMode::Off => ReplyMode::Off,
        NewContactMode::Template => ReplyMode::Template { text: None },
        NewContactMode::Ai => gate_ai(ReplyMode::Ai { prompt: None }, settings),
    };

    ResolvedPolicy {
        mode,
        min_interval: settings.default_min_interval,
        is_new_contact: true,
    }
}

/// Resolve the policy for a group chat.
///
/// This decides *how* to reply; *whether* to reply is the trigger
/// matcher's call. Groups default to ai mode when no rule exists.
pub fn resolve_group(rule: Option<&ReplyRule>, settings: &GlobalSettings) -> ResolvedPolicy {
    if !settings.auto_reply_enabled {
        return ResolvedPolicy::off();
    }

    if let Some(rule) = rule.filter(|r| r.enabled) {
        return ResolvedPolicy {
            mode: gate_ai(mode_from_rule(rule), settings),
            min_interval: Duration::from_secs(rule.min_interval_sec.max(0) as u64),
            is_new_contact: false,
        };
    }

    ResolvedPolicy {
        mode: gate_ai(ReplyMode::Ai { prompt: None }, settings),
        min_interval: settings.default_min_interval,
        is_new_contact: false,
    }
}
