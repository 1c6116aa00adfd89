//! Per-user profile used to personalise the assistant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MAX_CONCERN_TAGS: usize = 7;
pub const MAX_GOALS: usize = 10;
pub const MAX_BIO_CHARS: usize = 400;

db_enum! {
    #[derive(Default)]
    pub enum Tone {
        #[default]
        Neutral => "NEUTRAL",
        Soft => "SOFT",
        Cheerful => "CHEERFUL",
        Direct => "DIRECT",
    }
}

db_enum! {
    #[derive(Default)]
    pub enum Sensitivity {
        Low => "LOW",
        #[default]
        Medium => "MEDIUM",
        High => "HIGH",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: i64,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub tone: Tone,
    pub sensitivity: Sensitivity,
    pub language: String,
    pub anonymity: bool,
    pub reminder: Option<String>,
    pub region: String,
    /// Opt-in to the Monday check-in summary.
    pub weekly_summary: bool,
    pub safety_consent: bool,
    pub concern_tags: Vec<String>,
    pub goals: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Profile created on first access.
    #[must_use]
    pub fn default_for(user_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            nickname: format!("사용자{user_id}"),
            avatar_url: None,
            bio: None,
            tone: Tone::Neutral,
            sensitivity: Sensitivity::Medium,
            language: "ko".to_string(),
            anonymity: true,
            reminder: None,
            region: "KR".to_string(),
            weekly_summary: false,
            safety_consent: false,
            concern_tags: Vec::new(),
            goals: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// System prompt that frames a chat session for this user.
    #[must_use]
    pub fn system_prompt(&self) -> String {
        let tone = match self.tone {
            Tone::Neutral => "차분하고 중립적인",
            Tone::Soft => "부드럽고 다정한",
            Tone::Cheerful => "밝고 활기찬",
            Tone::Direct => "간결하고 직접적인",
        };
        let care = match self.sensitivity {
            Sensitivity::Low => "편하게",
            Sensitivity::Medium => "세심하게",
            Sensitivity::High => "매우 조심스럽게",
        };
        format!(
            "당신은 마음 건강을 돕는 상담 도우미입니다. 사용자 '{}'에게 {} 말투로, 감정을 {} 다루며 답하세요.",
            self.nickname, tone, care
        )
    }
}

/// Trims, drops blanks and removes duplicates while keeping first occurrences.
#[must_use]
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_profile() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let p = Profile::default_for(42, now);
        assert_eq!(p.nickname, "사용자42");
        assert_eq!(p.tone, Tone::Neutral);
        assert_eq!(p.sensitivity, Sensitivity::Medium);
        assert_eq!(p.language, "ko");
        assert!(p.anonymity);
        assert_eq!(p.region, "KR");
        assert!(!p.weekly_summary);
        assert!(!p.safety_consent);
        assert_eq!(p.bio, None);
        assert!(p.system_prompt().contains("사용자42"));
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![" sleep ".into(), "work".into(), "sleep".into(), " ".into()];
        assert_eq!(normalize_tags(tags), vec!["sleep".to_string(), "work".to_string()]);
    }
}
