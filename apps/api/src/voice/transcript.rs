use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ChatEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Interviewee,
    Interviewer,
}

impl Speaker {
    pub fn label(&self) -> &'static str {
        match self {
            Speaker::Interviewee => "Interviewee",
            Speaker::Interviewer => "Interviewer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub speaker: Speaker,
    pub text: String,
    /// Emotion intensities, present only for the interviewee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotions: Option<BTreeMap<String, f64>>,
}

/// Consecutive messages by one speaker, shown as a single block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub speaker: Speaker,
    pub messages: Vec<String>,
}

/// Keeps spoken messages only; system, tool and audio events are dropped.
pub fn from_events(events: Vec<ChatEvent>) -> Vec<TranscriptMessage> {
    events
        .into_iter()
        .filter_map(|event| {
            let speaker = match event.event_type.as_str() {
                "USER_MESSAGE" => Speaker::Interviewee,
                "AGENT_MESSAGE" => Speaker::Interviewer,
                _ => return None,
            };
            let text = event.message_text.filter(|t| !t.trim().is_empty())?;
            let emotions = match speaker {
                Speaker::Interviewee => event
                    .emotion_features
                    .and_then(|raw| serde_json::from_str(&raw).ok()),
                Speaker::Interviewer => None,
            };
            Some(TranscriptMessage {
                speaker,
                text,
                emotions,
            })
        })
        .collect()
}

pub fn condense(messages: &[TranscriptMessage]) -> Vec<TranscriptTurn> {
    let mut turns: Vec<TranscriptTurn> = Vec::new();
    for message in messages {
        match turns.last_mut() {
            Some(turn) if turn.speaker == message.speaker => {
                turn.messages.push(message.text.clone())
            }
            _ => turns.push(TranscriptTurn {
                speaker: message.speaker,
                messages: vec![message.text.clone()],
            }),
        }
    }
    turns
}

/// Plain-text rendering for prompts. Interviewee lines carry their top
/// three emotions.
pub fn render(messages: &[TranscriptMessage]) -> String {
    messages
        .iter()
        .map(|m| {
            let mut line = format!("{}: {}", m.speaker.label(), m.text);
            if let Some(emotions) = &m.emotions {
                let mut ranked: Vec<(&String, &f64)> = emotions.iter().collect();
                ranked.sort_by(|a, b| b.1.total_cmp(a.1));
                let top: Vec<String> = ranked
                    .into_iter()
                    .take(3)
                    .map(|(name, score)| format!("{name} {score:.2}"))
                    .collect();
                if !top.is_empty() {
                    line.push_str(&format!(" [{}]", top.join(", ")));
                }
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: &str, text: Option<&str>, emotions: Option<&str>) -> ChatEvent {
        ChatEvent {
            event_type: kind.to_string(),
            message_text: text.map(String::from),
            emotion_features: emotions.map(String::from),
        }
    }

    #[test]
    fn test_from_events_keeps_spoken_messages_in_order() {
        let messages = from_events(vec![
            event("SYSTEM_PROMPT", Some("be nice"), None),
            event("AGENT_MESSAGE", Some("Tell me about yourself."), Some(r#"{"Calmness":0.9}"#)),
            event("USER_MESSAGE", Some("I build APIs."), Some(r#"{"Joy":0.4,"Anxiety":0.2}"#)),
            event("USER_MESSAGE", Some("   "), None),
        ]);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].speaker, Speaker::Interviewer);
        assert!(messages[0].emotions.is_none());
        assert_eq!(messages[1].speaker, Speaker::Interviewee);
        assert_eq!(messages[1].emotions.as_ref().unwrap()["Joy"], 0.4);
    }

    #[test]
    fn test_condense_groups_consecutive_speakers() {
        let messages = from_events(vec![
            event("AGENT_MESSAGE", Some("Hello."), None),
            event("AGENT_MESSAGE", Some("Ready?"), None),
            event("USER_MESSAGE", Some("Yes."), None),
            event("AGENT_MESSAGE", Some("Great."), None),
        ]);
        let turns = condense(&messages);
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].messages, vec!["Hello.", "Ready?"]);
        assert_eq!(turns[1].speaker, Speaker::Interviewee);
        assert_eq!(turns[2].messages, vec!["Great."]);
    }

    #[test]
    fn test_render_lists_top_emotions() {
        let messages = from_events(vec![event(
            "USER_MESSAGE",
            Some("Hi"),
            Some(r#"{"Joy":0.1,"Calmness":0.7,"Interest":0.5,"Doubt":0.3}"#),
        )]);
        assert_eq!(
            render(&messages),
            "Interviewee: Hi [Calmness 0.70, Interest 0.50, Doubt 0.30]"
        );
    }
}
