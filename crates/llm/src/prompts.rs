//! Prompt templates for Indonesian review summarization

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulasan_common::{Result, UlasanError};

/// Template key used when the caller does not pick one
pub const DEFAULT_MODEL_TYPE: &str = "mistral";

const DEFAULT_SUMMARY_INSTRUCTION: &str =
    "Buatlah ringkasan dari ulasan produk berikut dalam Bahasa Indonesia yang natural dan informatif.";

const MULTI_REVIEW_INSTRUCTION: &str =
    "Buatlah ringkasan dari ulasan-ulasan produk berikut dalam Bahasa Indonesia.";

/// A model-specific prompt layout
///
/// `instruction` carries the `{system}` and `{user_input}` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub system: &'static str,
    pub instruction: &'static str,
}

const MISTRAL: PromptTemplate = PromptTemplate {
    system: "Anda adalah asisten AI yang ahli dalam merangkum ulasan e-commerce dalam Bahasa Indonesia.",
    instruction: "[INST] {system}\n\n{user_input} [/INST]",
};

const LLAMA: PromptTemplate = PromptTemplate {
    system: "You are a helpful assistant that specializes in summarizing Indonesian e-commerce reviews.",
    instruction: "<s>[INST] <<SYS>>\n{system}\n<</SYS>>\n\n{user_input} [/INST]",
};

const GENERIC: PromptTemplate = PromptTemplate {
    system: "You are an AI assistant that summarizes Indonesian e-commerce reviews.",
    instruction: "{system}\n\nUser: {user_input}\nAssistant:",
};

const INDONESIAN: PromptTemplate = PromptTemplate {
    system: "Anda adalah asisten yang membantu merangkum ulasan produk e-commerce dalam Bahasa Indonesia.",
    instruction: "### Instruksi:\n{system}\n\n### Input:\n{user_input}\n\n### Respon:",
};

impl PromptTemplate {
    /// Fill both placeholders in a single pass
    ///
    /// Substituted text is never scanned again, so a review that happens to
    /// contain `{system}` comes out literally. Unknown `{...}` sequences in the
    /// template are copied through.
    pub fn render(&self, user_input: &str) -> String {
        let mut out = String::with_capacity(
            self.instruction.len() + self.system.len() + user_input.len(),
        );
        let mut rest = self.instruction;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let tail = &rest[start..];

            if let Some(after) = tail.strip_prefix("{system}") {
                out.push_str(self.system);
                rest = after;
            } else if let Some(after) = tail.strip_prefix("{user_input}") {
                out.push_str(user_input);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }

        out.push_str(rest);
        out
    }
}

/// Target model families with a registered prompt template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Mistral,
    Llama,
    Generic,
    Indonesian,
}

impl ModelType {
    /// Every registered model type, in registry order
    pub const ALL: [ModelType; 4] = [
        ModelType::Mistral,
        ModelType::Llama,
        ModelType::Generic,
        ModelType::Indonesian,
    ];

    /// Registry key
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mistral => "mistral",
            Self::Llama => "llama",
            Self::Generic => "generic",
            Self::Indonesian => "indonesian",
        }
    }

    /// Template registered for this model type
    pub fn template(self) -> &'static PromptTemplate {
        match self {
            Self::Mistral => &MISTRAL,
            Self::Llama => &LLAMA,
            Self::Generic => &GENERIC,
            Self::Indonesian => &INDONESIAN,
        }
    }

    /// All registry keys
    pub fn keys() -> Vec<&'static str> {
        Self::ALL.iter().map(|m| m.as_str()).collect()
    }
}

impl FromStr for ModelType {
    type Err = UlasanError;

    /// Keys are matched exactly, as registered
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| UlasanError::unknown_model_type(s, Self::keys()))
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn join_aspects<A: AsRef<str>>(aspects: &[A]) -> String {
    aspects
        .iter()
        .map(|a| a.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `Ulasan {n}: {text}` lines, numbered from 1
fn numbered_review_lines<S: AsRef<str>>(reviews: &[S]) -> String {
    reviews
        .iter()
        .enumerate()
        .map(|(i, review)| format!("Ulasan {}: {}", i + 1, review.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Create a prompt for summarizing one or more reviews
///
/// A single review is shown under an `Ulasan:` header; any other count
/// (including zero) is listed as `1. ...`, `2. ...` under `Ulasan-ulasan:`.
/// A non-empty `custom_instruction` replaces the default instruction and
/// `max_length` is then ignored.
///
/// ```
/// use ulasan_llm::create_summarization_prompt;
///
/// let prompt = create_summarization_prompt(&["Barang bagus"], "mistral", None, None).unwrap();
/// assert!(prompt.starts_with("[INST]"));
/// assert!(prompt.contains("Ulasan:\nBarang bagus"));
/// ```
pub fn create_summarization_prompt<S: AsRef<str>>(
    reviews: &[S],
    model_type: &str,
    custom_instruction: Option<&str>,
    max_length: Option<usize>,
) -> Result<String> {
    let template = model_type.parse::<ModelType>()?.template();

    let reviews_text = match reviews {
        [single] => format!("Ulasan:\n{}", single.as_ref()),
        _ => {
            let lines: Vec<String> = reviews
                .iter()
                .enumerate()
                .map(|(i, review)| format!("{}. {}", i + 1, review.as_ref()))
                .collect();
            format!("Ulasan-ulasan:\n{}", lines.join("\n"))
        }
    };

    let instruction = match custom_instruction.filter(|c| !c.is_empty()) {
        Some(custom) => custom.to_string(),
        None => match max_length.filter(|&n| n > 0) {
            Some(n) => format!("{} Ringkasan maksimal {} kata.", DEFAULT_SUMMARY_INSTRUCTION, n),
            None => DEFAULT_SUMMARY_INSTRUCTION.to_string(),
        },
    };

    let user_input = format!("{}\n\n{}", instruction, reviews_text);
    Ok(template.render(&user_input))
}

/// Create a prompt for summarizing several reviews, optionally focused on aspects
///
/// Reviews are always rendered as `Ulasan {n}: ...` lines, even when there
/// is only one. An empty `focus_aspects` adds no focus clause.
pub fn create_multi_review_prompt<S: AsRef<str>, A: AsRef<str>>(
    reviews: &[S],
    model_type: &str,
    focus_aspects: &[A],
) -> Result<String> {
    let template = model_type.parse::<ModelType>()?.template();

    let instruction = if focus_aspects.is_empty() {
        MULTI_REVIEW_INSTRUCTION.to_string()
    } else {
        format!(
            "{} Fokus pada aspek: {}.",
            MULTI_REVIEW_INSTRUCTION,
            join_aspects(focus_aspects)
        )
    };

    let user_input = format!("{}\n\n{}", instruction, numbered_review_lines(reviews));
    Ok(template.render(&user_input))
}

/// Create a prompt asking for a summary per aspect
pub fn create_aspect_based_prompt<S: AsRef<str>, A: AsRef<str>>(
    reviews: &[S],
    aspects: &[A],
    model_type: &str,
) -> Result<String> {
    let template = model_type.parse::<ModelType>()?.template();

    let instruction = format!(
        "Buatlah ringkasan dari ulasan-ulasan berikut untuk setiap aspek: {}",
        join_aspects(aspects)
    );

    let user_input = format!("{}\n\n{}", instruction, numbered_review_lines(reviews));
    Ok(template.render(&user_input))
}
