//! Role definitions for mission agents.
//!
//! Every agent task is assigned one of a fixed set of roles. A role carries
//! defaults (model tier, timeout, display emoji) and the keywords used to
//! infer it from a free-text subtask description.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MissionError;

/// Worker role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Researcher,
    Analyst,
    Writer,
    Coder,
    Reviewer,
    Integrator,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Researcher,
        Role::Analyst,
        Role::Writer,
        Role::Coder,
        Role::Reviewer,
        Role::Integrator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Researcher => "researcher",
            Role::Analyst => "analyst",
            Role::Writer => "writer",
            Role::Coder => "coder",
            Role::Reviewer => "reviewer",
            Role::Integrator => "integrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = MissionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| {
                MissionError::InvalidSubtasks(format!(
                    "unknown role '{}'. Valid roles: researcher, analyst, writer, coder, reviewer, integrator",
                    s
                ))
            })
    }
}

/// Defaults attached to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleProfile {
    pub emoji: String,
    pub model: String,
    pub timeout_secs: u64,
    pub keywords: Vec<String>,
}

impl RoleProfile {
    fn new(emoji: &str, model: &str, timeout_secs: u64, keywords: &[&str]) -> Self {
        Self {
            emoji: emoji.to_string(),
            model: model.to_string(),
            timeout_secs,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }
}

/// Partial override of a role profile, as read from the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RoleOverride {
    pub emoji: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub keywords: Option<Vec<String>>,
}

/// Ordered role table. Order decides which role wins when a description
/// matches keywords of more than one role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleTable {
    entries: Vec<(Role, RoleProfile)>,
    default_role: Role,
}

impl Default for RoleTable {
    fn default() -> Self {
        Self {
            entries: vec![
                (
                    Role::Researcher,
                    RoleProfile::new(
                        "🔬",
                        "sonnet",
                        1800,
                        &[
                            "research", "investigate", "search", "collect", "survey", "조사",
                            "리서치", "검색", "수집", "분석",
                        ],
                    ),
                ),
                (
                    Role::Analyst,
                    RoleProfile::new(
                        "🔍",
                        "opus",
                        1200,
                        &["analy", "pattern", "insight", "evaluate", "분석", "패턴", "인사이트", "평가"],
                    ),
                ),
                (
                    Role::Writer,
                    RoleProfile::new(
                        "🖊️",
                        "sonnet",
                        900,
                        &[
                            "write", "document", "report", "content", "draft", "작성", "문서",
                            "리포트", "콘텐츠", "글",
                        ],
                    ),
                ),
                (
                    Role::Coder,
                    RoleProfile::new(
                        "💻",
                        "opus",
                        2400,
                        &[
                            "code", "implement", "develop", "api", "program", "코드", "개발", "구현",
                            "프로그래밍",
                        ],
                    ),
                ),
                (
                    Role::Reviewer,
                    RoleProfile::new(
                        "✅",
                        "opus",
                        600,
                        &["review", "feedback", "verify", "check", "검토", "리뷰", "피드백", "확인"],
                    ),
                ),
                (
                    Role::Integrator,
                    RoleProfile::new(
                        "🔧",
                        "sonnet",
                        900,
                        &["integrat", "merge", "combine", "final", "통합", "병합", "조합", "최종"],
                    ),
                ),
            ],
            default_role: Role::Researcher,
        }
    }
}

impl RoleTable {
    /// Profile for a role. Every role is present in the table.
    pub fn profile(&self, role: Role) -> &RoleProfile {
        self.entries
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, p)| p)
            .unwrap_or_else(|| &self.entries[0].1)
    }

    pub fn default_role(&self) -> Role {
        self.default_role
    }

    /// Infer a role from a description: first role (in table order) with a
    /// keyword contained in the lowercased description. Falls back to the
    /// default role.
    pub fn infer(&self, description: &str) -> Role {
        let lowered = description.to_lowercase();
        self.entries
            .iter()
            .find(|(_, profile)| profile.keywords.iter().any(|k| lowered.contains(k.as_str())))
            .map(|(role, _)| *role)
            .unwrap_or(self.default_role)
    }

    /// Apply config-file overrides keyed by role name.
    pub fn apply_overrides(
        &mut self,
        overrides: &HashMap<String, RoleOverride>,
    ) -> std::result::Result<(), MissionError> {
        for (name, over) in overrides {
            let role: Role = name
                .parse()
                .map_err(|_| MissionError::Config(format!("unknown role '{}' in [roles]", name)))?;
            let Some((_, profile)) = self.entries.iter_mut().find(|(r, _)| *r == role) else {
                continue;
            };
            if let Some(emoji) = &over.emoji {
                profile.emoji = emoji.clone();
            }
            if let Some(model) = &over.model {
                profile.model = model.clone();
            }
            if let Some(timeout) = over.timeout_secs {
                profile.timeout_secs = timeout;
            }
            if let Some(keywords) = &over.keywords {
                profile.keywords = keywords.iter().map(|k| k.to_lowercase()).collect();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_str() {
        assert_eq!("coder".parse::<Role>().unwrap(), Role::Coder);
        assert_eq!("Reviewer".parse::<Role>().unwrap(), Role::Reviewer);
        assert!("wizard".parse::<Role>().is_err());
    }

    #[test]
    fn test_infer_first_match_wins() {
        let table = RoleTable::default();
        // "분석" is a researcher keyword as well as an analyst keyword
        assert_eq!(table.infer("시장 분석"), Role::Researcher);
        assert_eq!(table.infer("Find usage patterns"), Role::Analyst);
        assert_eq!(table.infer("Implement the REST API"), Role::Coder);
        assert_eq!(table.infer("Write the final summary"), Role::Writer);
    }

    #[test]
    fn test_infer_defaults_to_researcher() {
        let table = RoleTable::default();
        assert_eq!(table.infer("do something unusual"), Role::Researcher);
    }

    #[test]
    fn test_profile_defaults() {
        let table = RoleTable::default();
        let coder = table.profile(Role::Coder);
        assert_eq!(coder.model, "opus");
        assert_eq!(coder.timeout_secs, 2400);
        assert_eq!(table.profile(Role::Reviewer).timeout_secs, 600);
    }

    #[test]
    fn test_apply_overrides() {
        let mut table = RoleTable::default();
        let mut overrides = HashMap::new();
        overrides.insert(
            "writer".to_string(),
            RoleOverride {
                model: Some("haiku".to_string()),
                timeout_secs: Some(300),
                ..Default::default()
            },
        );
        table.apply_overrides(&overrides).unwrap();
        let writer = table.profile(Role::Writer);
        assert_eq!(writer.model, "haiku");
        assert_eq!(writer.timeout_secs, 300);
        assert_eq!(writer.emoji, "🖊️");
    }

    #[test]
    fn test_apply_overrides_rejects_unknown_role() {
        let mut table = RoleTable::default();
        let mut overrides = HashMap::new();
        overrides.insert("pilot".to_string(), RoleOverride::default());
        assert!(table.apply_overrides(&overrides).is_err());
    }
}
