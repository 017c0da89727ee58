//! Fixed triage messages and the recommendation template.
//!
//! Chinese is the default language; `"en"` selects English.

use super::knowledge::department_label;
use super::types::Urgency;

/// Number of scripted follow-up questions.
pub const FOLLOW_UP_COUNT: usize = 5;

static FOLLOW_UPS_ZH: [&str; FOLLOW_UP_COUNT] = [
    "请问这些症状持续多长时间了？",
    "症状的严重程度如何？是轻微、中等还是剧烈？",
    "症状是一直存在还是时有时无？大概多久出现一次？",
    "还有其他不舒服的地方吗？比如发热、恶心或乏力？",
    "您是否有慢性病史，或者正在服用什么药物？",
];

static FOLLOW_UPS_EN: [&str; FOLLOW_UP_COUNT] = [
    "How long have these symptoms been going on?",
    "How bad is it? Would you call it mild, moderate or severe?",
    "Is it constant, or does it come and go? How often does it happen?",
    "Is anything else bothering you, such as fever, nausea or tiredness?",
    "Are there any long-term conditions or regular medicines we should know about?",
];

pub fn greeting(lang: &str) -> &'static str {
    match lang {
        "en" => "Hello, I'm the MediMind triage assistant. Please describe what is bothering you.",
        _ => "您好，我是MediMind智能分诊助手。请描述一下您哪里不舒服？",
    }
}

/// Follow-up for the given 0-based index, with a generic prompt past the script.
pub fn follow_up_question(index: usize, lang: &str) -> &'static str {
    let script = match lang {
        "en" => &FOLLOW_UPS_EN,
        _ => &FOLLOW_UPS_ZH,
    };
    match script.get(index).copied() {
        Some(question) => question,
        None => match lang {
            "en" => "Is there anything else about your symptoms you would like to add?",
            _ => "还有其他需要补充的症状吗？",
        },
    }
}

pub fn emergency_message(lang: &str) -> &'static str {
    match lang {
        "en" => "⚠️ What you describe may be a medical emergency. Call 120 (or your local \
                 emergency number) or go to the nearest emergency department right away. \
                 Do not wait for symptoms to ease.",
        _ => "⚠️ 您描述的情况可能属于紧急状况！请立即拨打120急救电话或前往最近医院的急诊科就诊，\
              不要等待症状自行缓解。",
    }
}

pub fn session_complete_message(lang: &str) -> &'static str {
    match lang {
        "en" => "This triage session is already complete. Please start a new session for a new concern.",
        _ => "本次分诊已完成。如有新的问题，请开始新的会话。",
    }
}

pub fn session_not_found_message(lang: &str) -> &'static str {
    match lang {
        "en" => "Session not found, please start a new one.",
        _ => "会话不存在或已过期，请开始新的会话。",
    }
}

fn urgency_advice(urgency: Urgency, lang: &str) -> &'static str {
    match (urgency, lang) {
        (Urgency::Emergency, "en") => "immediately",
        (Urgency::Urgent, "en") => "as soon as possible",
        (Urgency::Normal, "en") => "at your convenience",
        (Urgency::Emergency, _) => "立即",
        (Urgency::Urgent, _) => "尽快",
        (Urgency::Normal, _) => "在方便时",
    }
}

/// Templated recommendation combining symptoms, departments and urgency.
pub fn recommendation_message(
    symptoms: &[String],
    departments: &[String],
    urgency: Urgency,
    lang: &str,
) -> String {
    let advice = urgency_advice(urgency, lang);
    match lang {
        "en" => {
            let basis = if symptoms.is_empty() {
                "Based on the information provided".to_string()
            } else {
                format!("Based on the symptoms described ({})", symptoms.join(", "))
            };
            let departments = departments
                .iter()
                .map(|d| department_label(d))
                .collect::<Vec<_>>()
                .join(", ");
            let mut message = format!(
                "{basis}, we recommend visiting the following department(s) {advice}: {departments}."
            );
            match urgency {
                Urgency::Emergency => message.push_str(
                    " If symptoms get worse, call 120 or your local emergency number.",
                ),
                Urgency::Urgent => message.push_str(
                    " Please don't put this off; symptoms like these should be seen soon.",
                ),
                Urgency::Normal => message.push_str(
                    " Meanwhile, rest, stay hydrated and keep an eye on how things develop.",
                ),
            }
            message
        }
        _ => {
            let basis = if symptoms.is_empty() {
                "根据您提供的信息".to_string()
            } else {
                format!("根据您描述的症状（{}）", symptoms.join("、"))
            };
            let mut message = format!(
                "{basis}，建议您{advice}前往以下科室就诊：{}。",
                departments.join("、")
            );
            match urgency {
                Urgency::Emergency => message.push_str("如症状加重，请立即拨打120急救电话。"),
                Urgency::Urgent => message.push_str("请不要拖延，此类症状需要尽早就医。"),
                Urgency::Normal => message.push_str("在此之前请注意休息、多喝水，留意症状变化。"),
            }
            message
        }
    }
}
