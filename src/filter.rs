//! Per-language hallucination filter.
//!
//! Whisper-family models emit fluent but spurious text on silence or noise,
//! typically broadcast sign-offs ("시청해주셔서 감사합니다.") learned from
//! subtitled training data. Each language gets either a curated rule (an
//! allow-pattern anchored at the start of the text plus a denylist of exact
//! phrases) or an explicit pass-through.

use crate::config::{FilterConfig, LanguageRule};
use crate::error::{Result, SweepError};
use crate::transcript::Transcript;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Korean: hangul, latin letters, digits, whitespace or punctuation first.
const KO_ALLOW: &str = r"[가-힣a-zA-Z0-9\s\W]+";

const KO_DENY: &[&str] = &[
    "이 시각 세계였습니다.",
    "MBC 뉴스 김성현입니다.",
    "지금까지 뉴스 스토리였습니다.",
    "시청해주셔서 감사합니다.",
    "날씨였습니다.",
    "자막 제공 배달의민족",
    "제작지원 자막 제작지원",
    "이 노래는 제가 부르는 노래입니다.",
    "아이유의 러브게임",
    "감사합니다.",
    "고맙습니다.",
    "아멘",
];

const PASS_THROUGH_LANGUAGES: &[&str] = &["en", "ja", "zh", "es", "it", "ru", "id", "de", "nl"];

/// What to do with a language code that has no registered rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownLanguagePolicy {
    /// Fail with [`SweepError::UnknownLanguage`].
    #[default]
    Reject,
    /// Accept every segment.
    PassThrough,
}

/// Rule for a single language.
#[derive(Debug, Clone)]
pub enum LanguageFilter {
    /// Accepts everything.
    PassThrough,
    Curated {
        pattern: String,
        allow: Regex,
        deny: HashSet<String>,
    },
}

static PASS_THROUGH: LanguageFilter = LanguageFilter::PassThrough;

impl LanguageFilter {
    /// Builds a curated rule. `allow` only has to match at the start of the
    /// text, not the whole of it.
    pub fn curated<I, S>(language: &str, allow: &str, deny: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let regex = Regex::new(&format!("^(?:{})", allow)).map_err(|source| SweepError::Pattern {
            language: language.to_string(),
            source,
        })?;
        Ok(LanguageFilter::Curated {
            pattern: allow.to_string(),
            allow: regex,
            deny: deny.into_iter().map(Into::into).collect(),
        })
    }

    /// Whether `text` survives this rule. Surrounding whitespace is ignored.
    pub fn accepts(&self, text: &str) -> bool {
        match self {
            LanguageFilter::PassThrough => true,
            LanguageFilter::Curated { allow, deny, .. } => {
                let text = text.trim();
                allow.is_match(text) && !deny.contains(text)
            }
        }
    }

    pub fn is_pass_through(&self) -> bool {
        matches!(self, LanguageFilter::PassThrough)
    }

    fn deny_list(&self) -> Vec<String> {
        match self {
            LanguageFilter::PassThrough => Vec::new(),
            LanguageFilter::Curated { deny, .. } => deny.iter().cloned().collect(),
        }
    }

    fn pattern(&self) -> Option<&str> {
        match self {
            LanguageFilter::PassThrough => None,
            LanguageFilter::Curated { pattern, .. } => Some(pattern),
        }
    }
}

/// Immutable language code to rule lookup.
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    languages: BTreeMap<String, LanguageFilter>,
    unknown: UnknownLanguagePolicy,
}

impl FilterRegistry {
    /// Registry with no languages.
    pub fn empty(unknown: UnknownLanguagePolicy) -> Self {
        Self {
            languages: BTreeMap::new(),
            unknown,
        }
    }

    /// The built-in table: curated Korean, pass-through for the rest.
    pub fn builtin() -> Result<Self> {
        let mut registry = Self::empty(UnknownLanguagePolicy::Reject)
            .with_language("ko", LanguageFilter::curated("ko", KO_ALLOW, KO_DENY.iter().copied())?);
        for code in PASS_THROUGH_LANGUAGES {
            registry = registry.with_language(code, LanguageFilter::PassThrough);
        }
        Ok(registry)
    }

    /// Builds the registry described by the `[filter]` config section.
    ///
    /// A rule with an `allow` pattern replaces the language's pattern and
    /// keeps its existing denylist. A rule with only `deny` phrases extends
    /// the denylist. A rule with neither declares a pass-through language.
    pub fn from_config(config: &FilterConfig) -> Result<Self> {
        let mut registry = if config.builtin {
            Self::builtin()?
        } else {
            Self::empty(config.unknown_language)
        };
        registry.unknown = config.unknown_language;

        for (code, rule) in &config.languages {
            let merged = registry.merge_rule(code, rule)?;
            registry.languages.insert(code.clone(), merged);
        }
        Ok(registry)
    }

    fn merge_rule(&self, code: &str, rule: &LanguageRule) -> Result<LanguageFilter> {
        let existing = self.languages.get(code);
        let mut deny = existing.map(LanguageFilter::deny_list).unwrap_or_default();
        deny.extend(rule.deny.iter().cloned());

        match (&rule.allow, existing.and_then(LanguageFilter::pattern)) {
            (Some(allow), _) => LanguageFilter::curated(code, allow, deny),
            (None, Some(pattern)) => LanguageFilter::curated(code, pattern, deny),
            (None, None) if deny.is_empty() => Ok(LanguageFilter::PassThrough),
            (None, None) => LanguageFilter::curated(code, ".*", deny),
        }
    }

    pub fn with_language(mut self, code: &str, filter: LanguageFilter) -> Self {
        self.languages.insert(code.to_string(), filter);
        self
    }

    /// Registered language codes in sorted order.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    pub fn lookup(&self, language: &str) -> Result<&LanguageFilter> {
        match self.languages.get(language) {
            Some(filter) => Ok(filter),
            None => match self.unknown {
                UnknownLanguagePolicy::PassThrough => Ok(&PASS_THROUGH),
                UnknownLanguagePolicy::Reject => Err(SweepError::UnknownLanguage {
                    language: language.to_string(),
                }),
            },
        }
    }

    pub fn accept(&self, text: &str, language: &str) -> Result<bool> {
        Ok(self.lookup(language)?.accepts(text))
    }

    /// Drops rejected segments, keeping survivors in order with their timing.
    pub fn filter_transcript(&self, transcript: Transcript) -> Result<Transcript> {
        let filter = self.lookup(&transcript.language)?;
        let Transcript { language, segments } = transcript;

        let segments = segments
            .into_iter()
            .filter(|segment| {
                let keep = filter.accepts(&segment.text);
                if !keep {
                    tracing::debug!(
                        language = %language,
                        start = segment.start,
                        text = %segment.text,
                        "Dropped hallucinated segment"
                    );
                }
                keep
            })
            .collect();

        Ok(Transcript { language, segments })
    }
}
