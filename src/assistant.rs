use crate::entities::elder;
use serde_json::{json, Value};

pub const MAX_CALL_DURATION_SECONDS: u32 = 1200; // 20 minutes
pub const ANALYSIS_TIMEOUT_SECONDS: u32 = 30;

const QUESTION_MEAL: &str =
    "Meals – Ask whether they have eaten today.\nExample: 오늘 식사는 하셨어요?";
const QUESTION_MEDICATION: &str =
    "Medications – Ask whether they have taken their medications today.\nExample: 오늘 약을 먹으셨어요?";
const QUESTION_EMOTION: &str =
    "Emotions – Ask how they are feeling today.\nExample: 오늘 기분이 어때요?";
const QUESTION_SPECIAL_EVENT: &str =
    "Special Events – Ask about any special events or plans they have for the day.\nExample: 오늘 특별한 일이 있으신가요?";
const QUESTION_PERSONALIZED: &str = "Personalized – Ask about the following topic:";

/// Full session configuration for the voice platform, assembled from the
/// elder's profile. Deterministic for an unchanged elder row; the device
/// fetches this after a wake push, so nothing here is persisted.
pub fn build_assistant_config(elder: &elder::Model, server_url: &str) -> Value {
    let system_prompt = build_system_prompt(elder);

    json!({
        "voice": {
            "provider": "openai",
            "voiceId": "echo",
            "model": "tts-1"
        },
        "model": {
            "provider": "openai",
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": system_prompt}
            ]
        },
        "transcriber": {
            "model": "nova-2",
            "language": "ko",
            "provider": "deepgram"
        },
        "firstMessageMode": "assistant-speaks-first-with-model-generated-message",
        "endCallFunctionEnabled": true,
        "endCallMessage": "그럼 통화는 이렇게 마무리하고, 다음에 또 전화드리겠습니다.",
        "serverMessages": ["end-of-call-report"],
        "maxDurationSeconds": MAX_CALL_DURATION_SECONDS,
        "analysisPlan": {
            "minMessagesThreshold": 1,
            "summaryPlan": summary_plan(),
            "structuredDataPlan": structured_data_plan()
        },
        "server": {
            "url": server_url
        }
    })
}

/// Required check-in question blocks, one per enabled topic flag, plus a
/// personalized block when the guardian left notes.
fn required_questions(elder: &elder::Model) -> Vec<String> {
    let mut questions = Vec::new();

    if elder.ask_meal {
        questions.push(QUESTION_MEAL.to_string());
    }
    if elder.ask_medication {
        questions.push(QUESTION_MEDICATION.to_string());
    }
    if elder.ask_emotion {
        questions.push(QUESTION_EMOTION.to_string());
    }
    if elder.ask_special_event {
        questions.push(QUESTION_SPECIAL_EVENT.to_string());
    }
    if let Some(info) = elder
        .additional_info
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        questions.push(format!("{} {}", QUESTION_PERSONALIZED, info));
    }

    questions
}

fn client_information(elder: &elder::Model) -> String {
    format!(
        "NAME: {}\nAGE: {}\nGENDER: {}\nRESIDENCE TYPE: {}\nHEALTH CONDITION: {}\n",
        elder.name, elder.age, elder.gender, elder.residence_type, elder.health_condition
    )
}

fn build_system_prompt(elder: &elder::Model) -> String {
    let questions_prompt = required_questions(elder).join("\n\n");

    format!(
        "You are a compassionate assistant named Sori \
         designed to check in on Korean older adults living alone. \
         Speak with warmth, patience, and clarity.\
         Ask gentle, supportive questions, including the required check-in questions,\
         about their well-being, daily needs, and safety. \
         Be a good 말동무 who is curious about their life, and also be an attentive listener. \
         If you detect signs of distress or risk, respond calmly \
         and gently ask more about the situation without \
         being overly intrusive.\n\n\
         CLIENT INFORMATION\n\n{}\n\
         REQUIRED CHECK-IN QUESTIONS\n\n{}\n\
         LANGUAGE REQUIREMENT\n\n\
         - polite, respectful korean\n\
         - DO NOT SAY MORE THAN 2 SENTENCES AT A TIME\n\
         - do not ask more than 1 question at a time\n\
         - begin the conversation with a greeting and do not introduce yourself\n\n",
        client_information(elder),
        questions_prompt
    )
}

fn summary_plan() -> Value {
    let summary_system_prompt = "You are an expert note-taker. \
         You will be given a transcript of a call between an elderly user and an AI assistant. \
         Summarize the call in 1-3 sentences IN KOREAN, \
         focusing on the content of the user's messages within the transcript. \
         Take special note of any mentions of physical or mental risk. \
         An example of the summary is: 오늘은 어르신께서 무릎이 조금 쑤신다고 하셨는데, \
         산책은 다녀오셨다고 합니다. 가까운 친구의 투병에 대해 말씀하시며 슬퍼하셨지만, \
         다음 주에 예정된 손주의 방문에 대해서는 들뜬 마음으로 이야기하셨습니다. \
         DO NOT return anything except the summary.";

    json!({
        "messages": [
            {"role": "system", "content": summary_system_prompt},
            {"role": "user", "content": "Here is the transcript: {{ transcript }}"}
        ]
    })
}

fn structured_data_plan() -> Value {
    let structured_data_system_prompt = "You are an expert data extractor. \
         You will be given a transcript of a call. \
         Extract structured data per the JSON Schema. \
         Tags should be short words in KOREAN and summarize important keywords \
         from the user's messages, such as 통증, 가족, 운동, 기대감. \
         DO NOT return anything except the structured data.\n\n\
         Json Schema:\n{{ schema }}\n\n\
         Only respond with the JSON.";

    json!({
        "enabled": true,
        "messages": [
            {"role": "system", "content": structured_data_system_prompt},
            {"role": "user", "content": "Here is the transcript: {{ transcript }}"}
        ],
        "schema": {
            "type": "object",
            "required": ["emotion", "tags"],
            "properties": {
                "emotion": {
                    "type": "string",
                    "enum": ["좋음", "보통", "나쁨"]
                },
                "tags": {
                    "type": "array",
                    "items": {"type": "string"},
                    "minItems": 2,
                    "maxItems": 3
                }
            }
        },
        "timeoutSeconds": ANALYSIS_TIMEOUT_SECONDS
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_elder() -> elder::Model {
        let created = NaiveDate::from_ymd_opt(2025, 7, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        elder::Model {
            id: 1,
            user_id: 1,
            name: "김순자".to_string(),
            age: 81,
            gender: "여성".to_string(),
            relation: "딸".to_string(),
            phone: "010-1234-5678".to_string(),
            residence_type: "아파트".to_string(),
            health_condition: "고혈압".to_string(),
            begin_date: created,
            end_date: None,
            ask_meal: true,
            ask_medication: false,
            ask_emotion: true,
            ask_special_event: false,
            additional_info: None,
            invite_code: "A1B2C3".to_string(),
            voip_device_token: None,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn config_is_deterministic_for_unchanged_elder() {
        let elder = sample_elder();
        let a = build_assistant_config(&elder, "https://example.com/webhook");
        let b = build_assistant_config(&elder, "https://example.com/webhook");
        assert_eq!(
            serde_json::to_vec(&a).unwrap(),
            serde_json::to_vec(&b).unwrap()
        );
    }

    #[test]
    fn prompt_contains_only_enabled_question_blocks() {
        // meal + emotion on, medication + special event off, no notes
        let elder = sample_elder();
        let prompt = build_system_prompt(&elder);

        assert!(prompt.contains("Meals – Ask whether they have eaten today."));
        assert!(prompt.contains("Emotions – Ask how they are feeling today."));
        assert!(!prompt.contains("Medications"));
        assert!(!prompt.contains("Special Events"));
        assert!(!prompt.contains("Personalized"));
        assert_eq!(required_questions(&elder).len(), 2);
    }

    #[test]
    fn additional_info_adds_personalized_block() {
        let mut elder = sample_elder();
        elder.additional_info = Some("최근에 허리 수술을 받으셨어요".to_string());
        let questions = required_questions(&elder);
        assert_eq!(questions.len(), 3);
        assert!(questions
            .last()
            .unwrap()
            .contains("최근에 허리 수술을 받으셨어요"));
    }

    #[test]
    fn config_caps_duration_and_requests_end_of_call_report() {
        let elder = sample_elder();
        let config = build_assistant_config(&elder, "https://example.com/webhook");
        assert_eq!(config["maxDurationSeconds"], MAX_CALL_DURATION_SECONDS);
        assert_eq!(config["serverMessages"][0], "end-of-call-report");
        assert_eq!(config["server"]["url"], "https://example.com/webhook");
        assert_eq!(
            config["analysisPlan"]["structuredDataPlan"]["schema"]["properties"]["emotion"]["enum"],
            json!(["좋음", "보통", "나쁨"])
        );
    }
}
