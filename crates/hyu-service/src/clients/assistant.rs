//! Assistant that answers chat messages.

use async_trait::async_trait;
use hyu_core::{HyuResult, Interface};
use hyu_domain::ChatMessage;
use shaku::Component;

const PROMPT_TO_SHARE: &str = "무슨 생각이 드셨는지 한두 문장으로 적어주실래요?";
const GREETING: &str = "안녕하세요! 오늘 기분은 어떠세요? 편하게 말씀해 주세요.";
const ASK_FOR_DETAIL: &str = "조금만 더 자세히 들려주실 수 있을까요? 어떤 상황이었는지도 함께 알려주세요.";
const REFLECTION: &str = "말해 주셔서 고마워요. 말씀하신 내용을 보니 꽤 신경 쓰이는 일이었겠어요. \
그 상황에서 특히 힘들었던 점 한 가지를 꼽는다면 무엇일까요?";

/// Produces the assistant turn of a conversation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssistantClient: Interface + Send + Sync {
    /// Replies to `message` given the session's system prompt and recent history.
    async fn reply(&self, system: &str, history: &[ChatMessage], message: &str) -> HyuResult<String>;
}

/// Canned replies chosen from the shape of the user's message.
#[derive(Component, Debug, Clone)]
#[shaku(interface = AssistantClient)]
pub struct RuleBasedAssistant {
    /// Messages shorter than this get a follow-up question.
    #[shaku(default = 8)]
    min_detail_chars: usize,
}

impl RuleBasedAssistant {
    #[must_use]
    pub const fn new(min_detail_chars: usize) -> Self {
        Self { min_detail_chars }
    }

    fn pick(&self, message: &str) -> &'static str {
        let text = message.trim();
        if text.is_empty() {
            PROMPT_TO_SHARE
        } else if text.contains("안녕") {
            GREETING
        } else if text.chars().count() < self.min_detail_chars {
            ASK_FOR_DETAIL
        } else {
            REFLECTION
        }
    }
}

impl Default for RuleBasedAssistant {
    fn default() -> Self {
        Self::new(8)
    }
}

#[async_trait]
impl AssistantClient for RuleBasedAssistant {
    async fn reply(&self, _system: &str, _history: &[ChatMessage], message: &str) -> HyuResult<String> {
        Ok(self.pick(message).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rule_based_replies() {
        let assistant = RuleBasedAssistant::default();
        assert_eq!(assistant.reply("", &[], "  ").await.unwrap(), PROMPT_TO_SHARE);
        assert_eq!(assistant.reply("", &[], "안녕 반가워").await.unwrap(), GREETING);
        assert_eq!(assistant.reply("", &[], "피곤해").await.unwrap(), ASK_FOR_DETAIL);
        assert_eq!(
            assistant.reply("", &[], "회사에서 발표를 망쳐서 계속 생각나요").await.unwrap(),
            REFLECTION
        );
    }

    #[test]
    fn test_detail_threshold_counts_chars() {
        let assistant = RuleBasedAssistant::new(3);
        // three Hangul syllables are nine bytes
        assert_eq!(assistant.pick("힘들다"), REFLECTION);
        assert_eq!(assistant.pick("힘들"), ASK_FOR_DETAIL);
    }
}
