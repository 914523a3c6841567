use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::hash::Hash;

use crate::request::ApiError;

/// One translation of a word as returned by the dictionary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variant {
    pub value: String,
    pub votes: i64,
    pub context: String,
    /// Already in the user's dictionary.
    pub in_dictionary: bool,
}

/// Source language of a looked-up word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    English,
    Russian,
}

/// A looked-up word with its normalised translations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordTranslation {
    pub word: String,
    pub transcription: String,
    pub sound_url: String,
    /// Empty when the dictionary gives none.
    pub part_of_speech: String,
    /// The word itself is already in the user's dictionary.
    pub user_word: bool,
    /// Unique by value, highest votes first.
    pub variants: Vec<Variant>,
    /// Translations to add to the dictionary for this word.
    pub to_add: Vec<String>,
}

impl WordTranslation {
    /// Parses a translate (or add-word) reply for `word`.
    ///
    /// A non-empty `error_msg` becomes [`ApiError::Translation`]. Variants are
    /// deduplicated by value, keeping the first occurrence, then stably
    /// sorted by votes, highest first.
    pub fn from_response(word: &str, body: &str) -> Result<Self, ApiError> {
        let raw: RawTranslation = serde_json::from_str(body)?;

        if let Some(message) = raw.error_msg.filter(|m| !m.is_empty()) {
            return Err(ApiError::Translation {
                word: word.to_string(),
                message,
            });
        }

        let mut variants = unique_by(
            raw.translate.map(RawVariants::into_variants).unwrap_or_default(),
            |v| v.value.clone(),
        );
        variants.sort_by(|a, b| b.votes.cmp(&a.votes));

        Ok(Self {
            word: word.to_string(),
            transcription: raw.transcription.unwrap_or_default(),
            sound_url: raw.sound_url.unwrap_or_default(),
            part_of_speech: raw.pos.unwrap_or_default(),
            user_word: raw.is_user,
            variants,
            to_add: Vec::new(),
        })
    }

    /// True if the word or any of its variants is already in the dictionary.
    pub fn in_dictionary(&self) -> bool {
        self.user_word || self.variants.iter().any(|v| v.in_dictionary)
    }

    /// The API returns no transcription for Russian words.
    pub fn direction(&self) -> Direction {
        if self.transcription.is_empty() {
            Direction::Russian
        } else {
            Direction::English
        }
    }

    /// Replaces the add list with `translations`, duplicates removed.
    pub fn set_custom_translations(&mut self, translations: &[String]) {
        self.to_add = unique(translations.iter().cloned());
    }

    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }
}

/// Keeps the first item for every key, preserving order.
pub fn unique_by<T, K, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}

pub fn unique<T: Eq + Hash + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    unique_by(items, Clone::clone)
}

/// True if `word` consists only of Latin-script letters and numerals.
///
/// Accented Latin letters count; Cyrillic, whitespace and punctuation don't.
pub fn is_english_word(word: &str) -> bool {
    word.chars().all(|c| c.is_numeric() || is_latin_letter(c))
}

fn is_latin_letter(c: char) -> bool {
    if c.is_ascii_alphabetic() {
        return true;
    }
    if !c.is_alphabetic() {
        return false;
    }
    matches!(c,
        '\u{00C0}'..='\u{024F}'
        | '\u{1E00}'..='\u{1EFF}'
        | '\u{2C60}'..='\u{2C7F}'
        | '\u{A720}'..='\u{A7FF}'
        | '\u{AB30}'..='\u{AB6F}'
        | '\u{FF21}'..='\u{FF3A}'
        | '\u{FF41}'..='\u{FF5A}'
    )
}

#[derive(Debug, Deserialize)]
struct RawTranslation {
    #[serde(default)]
    error_msg: Option<String>,
    #[serde(default)]
    transcription: Option<String>,
    #[serde(default)]
    sound_url: Option<String>,
    #[serde(default)]
    pos: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    is_user: bool,
    #[serde(default)]
    translate: Option<RawVariants>,
}

/// `translate` arrives either as full objects or as bare strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawVariants {
    Full(Vec<RawVariant>),
    Bare(Vec<String>),
}

impl RawVariants {
    fn into_variants(self) -> Vec<Variant> {
        match self {
            Self::Full(raw) => raw.into_iter().map(RawVariant::into_variant).collect(),
            Self::Bare(values) => values
                .into_iter()
                .map(|value| Variant {
                    value,
                    ..Variant::default()
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawVariant {
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    votes: Option<i64>,
    #[serde(default)]
    ctx: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    ut: bool,
}

impl RawVariant {
    fn into_variant(self) -> Variant {
        Variant {
            value: self.value.unwrap_or_default(),
            votes: self.votes.unwrap_or_default(),
            context: self.ctx.unwrap_or_default(),
            in_dictionary: self.ut,
        }
    }
}

/// Accepts `true/false`, `1/0`, `"1"/"0"`, `"true"/"false"` and `null`.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(false),
        Some(Repr::Bool(value)) => Ok(value),
        Some(Repr::Int(1)) => Ok(true),
        Some(Repr::Int(0)) => Ok(false),
        Some(Repr::Int(other)) => Err(D::Error::custom(format!("invalid flag value: {other}"))),
        Some(Repr::Text(text)) => match text.as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" | "null" => Ok(false),
            other => Err(D::Error::custom(format!("invalid flag value: {other}"))),
        },
    }
}
