//! Agent identity resolution.
//!
//! An acting agent's display identity is derived from a small hand-written
//! profile document (`IDENTITY.md`) in that agent's workspace. Resolution
//! failure (missing workspace, unreadable file, no `Name` field) is a
//! normal outcome that routes the send to the bot API, never an error.

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::webhook::WebhookIdentity;

/// Profile document filename inside an agent workspace.
pub const IDENTITY_FILE: &str = "IDENTITY.md";

/// Agents root used when neither an override nor a home directory is available.
const FALLBACK_AGENTS_ROOT: &str = "/var/lib/courier/agents";

/// Matches one profile field line: `- **Name:** Ember`.
static PROFILE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*-\s*\*\*(name|emoji|creature|vibe|avatar):\*\*\s*(.+?)\s*$")
        .expect("profile field pattern is valid")
});

/// Identity parsed from a profile document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    /// Display name. A document without one parses to no identity at all.
    pub name: String,
    /// Emoji prefixed to the display name when present.
    pub emoji: Option<String>,
    /// Creature tag (flavor only, not used for presentation).
    pub creature: Option<String>,
    /// Vibe tag (flavor only, not used for presentation).
    pub vibe: Option<String>,
    /// Avatar image reference.
    pub avatar: Option<String>,
}

impl AgentIdentity {
    /// Display name: `"<emoji> <name>"` when an emoji is present.
    pub fn display_name(&self) -> String {
        match &self.emoji {
            Some(emoji) => format!("{emoji} {}", self.name),
            None => self.name.clone(),
        }
    }

    /// Convert to webhook presentation.
    ///
    /// The avatar is the explicit override when supplied, else the profile's
    /// avatar field, else absent.
    pub fn display(&self, avatar_override: Option<&str>) -> WebhookIdentity {
        WebhookIdentity {
            username: Some(self.display_name()),
            avatar_url: avatar_override
                .map(str::to_owned)
                .or_else(|| self.avatar.clone()),
        }
    }
}

/// Parse a profile document into an identity.
///
/// Recognizes lines of the shape `- **<Field>:** <value>` with field names
/// name, emoji, creature, vibe, avatar (case-insensitive). Unrecognized
/// lines are ignored; duplicate fields overwrite earlier ones. A document
/// with no `Name` field yields `None`, not a partial identity.
pub fn parse_identity(doc: &str) -> Option<AgentIdentity> {
    let mut name = None;
    let mut emoji = None;
    let mut creature = None;
    let mut vibe = None;
    let mut avatar = None;

    for line in doc.lines() {
        let Some(caps) = PROFILE_FIELD.captures(line) else {
            continue;
        };
        let value = caps[2].to_owned();
        match caps[1].to_ascii_lowercase().as_str() {
            "name" => name = Some(value),
            "emoji" => emoji = Some(value),
            "creature" => creature = Some(value),
            "vibe" => vibe = Some(value),
            "avatar" => avatar = Some(value),
            _ => {}
        }
    }

    Some(AgentIdentity {
        name: name?,
        emoji,
        creature,
        vibe,
        avatar,
    })
}

/// Resolves agent identities from per-agent workspace directories.
///
/// The resolver is deterministic: the agents root is fixed at construction,
/// and every [`resolve`](IdentityResolver::resolve) re-reads the profile
/// document from disk. Nothing is cached across calls.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    agents_root: PathBuf,
}

impl IdentityResolver {
    /// Create a resolver rooted at an explicit agents directory.
    pub fn new(agents_root: impl Into<PathBuf>) -> Self {
        Self {
            agents_root: agents_root.into(),
        }
    }

    /// Create a resolver rooted at the default agents directory.
    ///
    /// Uses `~/.courier/agents` when a home directory can be determined,
    /// else a fixed system path.
    pub fn with_default_root() -> Self {
        let root = directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".courier").join("agents"))
            .unwrap_or_else(|| PathBuf::from(FALLBACK_AGENTS_ROOT));
        Self::new(root)
    }

    /// Path of the workspace directory for `agent_id`.
    pub fn workspace_dir(&self, agent_id: &str) -> PathBuf {
        self.agents_root.join(agent_id)
    }

    /// Resolve an agent's identity from its workspace profile document.
    ///
    /// Any read failure and any document without a `Name` field yield
    /// `None`. The caller treats that as "use the bot API path".
    pub fn resolve(&self, agent_id: &str) -> Option<AgentIdentity> {
        let path = self.workspace_dir(agent_id).join(IDENTITY_FILE);
        let doc = match std::fs::read_to_string(&path) {
            Ok(doc) => doc,
            Err(e) => {
                debug!(agent_id, path = %path.display(), error = %e, "no readable profile document");
                return None;
            }
        };
        let identity = parse_identity(&doc);
        if identity.is_none() {
            debug!(agent_id, path = %path.display(), "profile document has no name field");
        }
        identity
    }
}
