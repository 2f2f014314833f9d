use akasha_core::{ChatHistory, Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Answer language. Picks the prompt set used for condensation and
/// answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Japanese,
}

impl Language {
    /// Japanese when the text contains kana or CJK ideographs, English
    /// otherwise.
    pub fn detect(text: &str) -> Self {
        if text.chars().any(is_japanese_char) {
            Language::Japanese
        } else {
            Language::English
        }
    }

    pub fn prompts(self) -> &'static PromptSet {
        match self {
            Language::English => &ENGLISH,
            Language::Japanese => &JAPANESE,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Japanese => "ja",
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "ja" | "japanese" => Ok(Language::Japanese),
            other => Err(Error::configuration(format!(
                "Unsupported language '{}', expected en or ja",
                other
            ))),
        }
    }
}

fn is_japanese_char(c: char) -> bool {
    matches!(c,
        '\u{3040}'..='\u{309F}'   // hiragana
        | '\u{30A0}'..='\u{30FF}' // katakana
        | '\u{4E00}'..='\u{9FFF}' // CJK unified ideographs
        | '\u{FF66}'..='\u{FF9F}' // half-width katakana
    )
}

/// Fixed template parts for one language.
#[derive(Debug)]
pub struct PromptSet {
    condense_instructions: &'static str,
    history_label: &'static str,
    follow_up_label: &'static str,
    standalone_label: &'static str,
    human_label: &'static str,
    assistant_label: &'static str,
    qa_instructions: &'static str,
    question_label: &'static str,
    answer_label: &'static str,
}

static ENGLISH: PromptSet = PromptSet {
    condense_instructions: "Given the following conversation and a follow up question, answer the follow up question in the initial language of the question. If you don't have the correct answer in the given context, please try to answer from your knowledge. If you don't know the answer, just say that you don't know, don't try to make up an answer.",
    history_label: "Chat History:",
    follow_up_label: "Follow Up Input:",
    standalone_label: "Standalone question:",
    human_label: "Human:",
    assistant_label: "Assistant:",
    qa_instructions: "Use the following pieces of context to answer the question in the language of the question. If you don't have the correct answer in the given context, please try to answer from your knowledge. If you don't know the answer, just say that you don't know, don't try to make up an answer. ",
    question_label: "Question:",
    answer_label: "Helpful Answer:",
};

static JAPANESE: PromptSet = PromptSet {
    condense_instructions: "以下の会話とフォローアップの質問をもとに、フォローアップの質問を質問と同じ言語で独立した質問に書き換えてください。与えられた文脈に正しい答えがない場合は、あなたの知識から答えるようにしてください。答えがわからない場合は、わからないと答え、答えを作り上げないでください。",
    history_label: "チャット履歴:",
    follow_up_label: "フォローアップの入力:",
    standalone_label: "独立した質問:",
    human_label: "Human:",
    assistant_label: "Assistant:",
    qa_instructions: "以下の文脈を使って、質問と同じ言語で質問に答えてください。与えられた文脈に正しい答えがない場合は、あなたの知識から答えるようにしてください。答えがわからない場合は、わからないと答え、答えを作り上げないでください。",
    question_label: "質問:",
    answer_label: "役に立つ回答:",
};

impl PromptSet {
    /// Renders turns as alternating `Human:` / `Assistant:` lines.
    pub fn render_history(&self, history: &ChatHistory) -> String {
        history
            .turns()
            .iter()
            .map(|turn| {
                format!(
                    "{} {}\n{} {}",
                    self.human_label, turn.question, self.assistant_label, turn.answer
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn condense_prompt(&self, history: &ChatHistory, follow_up: &str) -> String {
        format!(
            "{}\n\n{}\n{}\n{} {}\n{}",
            self.condense_instructions,
            self.history_label,
            self.render_history(history),
            self.follow_up_label,
            follow_up,
            self.standalone_label
        )
    }

    /// Context passages are separated by blank lines.
    pub fn qa_prompt<S: AsRef<str>>(&self, context: &[S], question: &str) -> String {
        let context = context
            .iter()
            .map(|passage| passage.as_ref())
            .collect::<Vec<_>>()
            .join("\n\n");
        format!(
            "{}\n\n{}\n\n{} {}\n{}",
            self.qa_instructions, context, self.question_label, question, self.answer_label
        )
    }
}
