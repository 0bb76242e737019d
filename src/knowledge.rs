/*
 * @file knowledge.rs
 * @brief Bilingual knowledge table, validation and loading
 * @author Kevin Thomas
 * @date 2025
 *
 * MIT License
 *
 * Copyright (c) 2025 Kevin Thomas
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Knowledge base of recognizable topics and their bilingual answers.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::language::{contains_arabic, Language};

/// English fallback used when no record matches.
pub const FALLBACK_EN: &str =
    "I'm sorry, I didn't understand your question. Could you please rephrase?";

/// Arabic fallback used when no record matches.
pub const FALLBACK_AR: &str = "آسف، لم أفهم سؤالك. هل يمكنك إعادة صياغته؟";

/// Configuration errors raised while building a [`KnowledgeBase`].
///
/// Record indexes are zero-based positions in the source table.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("failed to read knowledge file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse knowledge file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("knowledge base has no records")]
    Empty,

    #[error("record {index} has no patterns")]
    NoPatterns { index: usize },

    #[error("record {index} has a blank pattern")]
    BlankPattern { index: usize },

    #[error("record {index} has an invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("record {index} uses unknown language code {code:?}")]
    UnknownLanguage { index: usize, code: String },

    #[error("record {index} is missing its {language} answer")]
    MissingAnswer { index: usize, language: Language },

    #[error("record {index} has more than one {language} answer")]
    DuplicateLanguage { index: usize, language: Language },

    #[error("record {index} has a blank {language} answer")]
    BlankAnswer { index: usize, language: Language },

    #[error("fallback uses unknown language code {code:?}")]
    UnknownFallbackLanguage { code: String },

    #[error("fallback is missing its {language} text")]
    MissingFallback { language: Language },

    #[error("fallback has a blank {language} text")]
    BlankFallback { language: Language },

    #[error("fallback has more than one {language} text")]
    DuplicateFallbackLanguage { language: Language },
}

/// Declarative form of one record, as authored in a knowledge file.
#[derive(Clone, Debug, Deserialize)]
pub struct RecordSource {
    /// Regular expressions tried in order; any of them triggers the record.
    #[serde(default)]
    pub patterns: Vec<String>,
    /// Answer text keyed by language code (`en`, `ar`).
    #[serde(default)]
    pub answers: BTreeMap<String, String>,
}

/// Declarative form of a whole knowledge table.
///
/// # Details
/// Loaded from JSON or produced by [`KnowledgeSource::builtin`]. Nothing here
/// is validated; [`KnowledgeBase::from_source`] does that eagerly.
#[derive(Clone, Debug, Deserialize)]
pub struct KnowledgeSource {
    /// Records in priority order; the first match wins.
    pub records: Vec<RecordSource>,
    /// Optional override of the "didn't understand" strings.
    #[serde(default)]
    pub fallback: Option<BTreeMap<String, String>>,
}

/// Static shape of the built-in table.
struct BuiltinRecord {
    patterns: &'static [&'static str],
    en: &'static str,
    ar: &'static str,
}

/// Built-in Tahreez topics. More specific patterns precede general ones.
const BUILTIN_RECORDS: &[BuiltinRecord] = &[
    BuiltinRecord {
        patterns: &["what.*tahreez", "what does.*company do"],
        en: "Tahreez is a system integrator established in 2020 that delivers advanced safety, security, communication, AIoT and audio\u{2011}visual solutions across Saudi Arabia.",
        ar: "طهريز هي شركة تكامل أنظمة تأسست في عام 2020 وتقدم حلولاً متقدمة في السلامة والأمن والاتصال وإنترنت الأشياء والأنظمة السمعية البصرية في المملكة العربية السعودية.",
    },
    BuiltinRecord {
        patterns: &["who.*managing director", "who.*general manager"],
        en: "Our Managing Director is Francesco Fidicaro.",
        ar: "المدير العام هو فرانشيسكو فيديكارو.",
    },
    BuiltinRecord {
        patterns: &["who.*engineering director"],
        en: "Our Engineering Director is Khalid Makki.",
        ar: "مدير الهندسة هو خالد مكي.",
    },
    BuiltinRecord {
        patterns: &["who.*operations director"],
        en: "Our Operations Director is Monzer Dannouni.",
        ar: "مدير العمليات هو منذر دنوني.",
    },
    BuiltinRecord {
        patterns: &["mission"],
        en: "Our mission is to enable safer, smarter cities and industries by integrating technology with purpose and delivering scalable, future\u{2011}proof solutions.",
        ar: "مهمتنا هي تمكين المدن والقطاعات لتكون أكثر أماناً وذكاءً من خلال دمج التكنولوجيا مع الغاية وتقديم حلول قابلة للتطوير للمستقبل.",
    },
    BuiltinRecord {
        patterns: &["services|what.*offer"],
        en: "We offer security systems, audio\u{2011}visual and ICT integration, AIoT solutions, and specialized systems such as Infant Protection and Nurse Call Systems.",
        ar: "نحن نقدم أنظمة الأمن والدمج السمعي البصري وأنظمة إنترنت الأشياء، بالإضافة إلى حلول خاصة مثل أنظمة حماية الرضع وأنظمة النداء التمريضي.",
    },
];

impl KnowledgeSource {
    /// Returns the built-in Tahreez table in its declarative form.
    pub fn builtin() -> Self {
        let records = BUILTIN_RECORDS
            .iter()
            .map(|record| RecordSource {
                patterns: record.patterns.iter().map(|p| p.to_string()).collect(),
                answers: BTreeMap::from([
                    (Language::En.code().to_string(), record.en.to_string()),
                    (Language::Ar.code().to_string(), record.ar.to_string()),
                ]),
            })
            .collect();
        Self {
            records,
            fallback: None,
        }
    }
}

/// A pair of strings, one per supported language.
#[derive(Clone, Debug)]
struct Localized {
    en: String,
    ar: String,
}

impl Localized {
    fn get(&self, language: Language) -> &str {
        match language {
            Language::En => &self.en,
            Language::Ar => &self.ar,
        }
    }
}

/// Why a language map could not be turned into a [`Localized`] pair.
enum LocalizeFault {
    Unknown(String),
    Missing(Language),
    Blank(Language),
    Duplicate(Language),
}

/// Checks that `map` holds exactly one non-blank string for every supported
/// language and nothing else. Codes are case-insensitive, so `EN` and `en`
/// name the same language.
fn localize(map: &BTreeMap<String, String>) -> Result<Localized, LocalizeFault> {
    let mut en = None;
    let mut ar = None;
    for (code, text) in map {
        let language =
            Language::from_code(code).ok_or_else(|| LocalizeFault::Unknown(code.clone()))?;
        if text.trim().is_empty() {
            return Err(LocalizeFault::Blank(language));
        }
        let slot = match language {
            Language::En => &mut en,
            Language::Ar => &mut ar,
        };
        if slot.replace(text.clone()).is_some() {
            return Err(LocalizeFault::Duplicate(language));
        }
    }
    Ok(Localized {
        en: en.ok_or(LocalizeFault::Missing(Language::En))?,
        ar: ar.ok_or(LocalizeFault::Missing(Language::Ar))?,
    })
}

/// One topic the assistant can answer.
#[derive(Clone, Debug)]
pub struct AnswerRecord {
    patterns: Vec<Regex>,
    answers: Localized,
}

impl AnswerRecord {
    /// Answer text for `language`.
    pub fn answer(&self, language: Language) -> &str {
        self.answers.get(language)
    }

    /// Returns `true` when any pattern matches anywhere in `normalized`.
    pub fn matches(&self, normalized: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(normalized))
    }

    /// Returns `true` when any pattern source contains Arabic script.
    fn has_arabic_trigger(&self) -> bool {
        self.patterns
            .iter()
            .any(|pattern| contains_arabic(pattern.as_str()))
    }
}

/// Ordered, immutable table of [`AnswerRecord`]s plus the fallback strings.
#[derive(Clone, Debug)]
pub struct KnowledgeBase {
    records: Vec<AnswerRecord>,
    fallback: Localized,
}

impl KnowledgeBase {
    /// Builds the built-in Tahreez knowledge base.
    ///
    /// # Errors
    /// Returns an error only if the built-in table itself is malformed.
    pub fn builtin() -> Result<Self, KnowledgeError> {
        Self::from_source(KnowledgeSource::builtin())
    }

    /// Reads a JSON knowledge file and builds a validated knowledge base.
    ///
    /// # Arguments
    /// * `path` - Location of the knowledge file.
    ///
    /// # Returns
    /// * `Ok(KnowledgeBase)` - Every record compiled and validated.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, KnowledgeError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| KnowledgeError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let source: KnowledgeSource =
            serde_json::from_str(&raw).map_err(|source| KnowledgeError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        info!(path = %path.display(), "Loaded knowledge file");
        Self::from_source(source)
    }

    /// Validates and compiles a declarative table.
    ///
    /// # Details
    /// Every pattern is compiled case-insensitively and left unanchored.
    /// Validation is eager so authoring mistakes surface at startup rather
    /// than as a wrong answer later.
    ///
    /// # Arguments
    /// * `source` - Declarative table to compile.
    ///
    /// # Returns
    /// * `Ok(KnowledgeBase)` - Records in the same order as `source`.
    ///
    /// # Errors
    /// Returns the first [`KnowledgeError`] found, in record order.
    pub fn from_source(source: KnowledgeSource) -> Result<Self, KnowledgeError> {
        if source.records.is_empty() {
            return Err(KnowledgeError::Empty);
        }
        let records = source
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| compile_record(index, record))
            .collect::<Result<Vec<_>, _>>()?;
        let fallback = match &source.fallback {
            Some(map) => localize(map).map_err(|fault| match fault {
                LocalizeFault::Unknown(code) => KnowledgeError::UnknownFallbackLanguage { code },
                LocalizeFault::Missing(language) => KnowledgeError::MissingFallback { language },
                LocalizeFault::Blank(language) => KnowledgeError::BlankFallback { language },
                LocalizeFault::Duplicate(language) => {
                    KnowledgeError::DuplicateFallbackLanguage { language }
                }
            })?,
            None => Localized {
                en: FALLBACK_EN.to_string(),
                ar: FALLBACK_AR.to_string(),
            },
        };
        let knowledge = Self { records, fallback };
        debug!(records = knowledge.len(), "Knowledge base compiled");
        if !knowledge.has_arabic_triggers() {
            info!("No Arabic-script patterns configured; Arabic queries will receive the fallback answer");
        }
        Ok(knowledge)
    }

    /// Records in match-priority order.
    pub fn records(&self) -> &[AnswerRecord] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always `false` for a validated knowledge base.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The "didn't understand" string for `language`.
    pub fn fallback(&self, language: Language) -> &str {
        self.fallback.get(language)
    }

    /// Returns `true` when at least one record can be triggered by Arabic script.
    pub fn has_arabic_triggers(&self) -> bool {
        self.records.iter().any(AnswerRecord::has_arabic_trigger)
    }
}

/// Validates one declarative record and compiles its patterns.
fn compile_record(index: usize, record: &RecordSource) -> Result<AnswerRecord, KnowledgeError> {
    if record.patterns.is_empty() {
        return Err(KnowledgeError::NoPatterns { index });
    }
    let patterns = record
        .patterns
        .iter()
        .map(|pattern| compile_pattern(index, pattern))
        .collect::<Result<Vec<_>, _>>()?;
    let answers = localize(&record.answers).map_err(|fault| match fault {
        LocalizeFault::Unknown(code) => KnowledgeError::UnknownLanguage { index, code },
        LocalizeFault::Missing(language) => KnowledgeError::MissingAnswer { index, language },
        LocalizeFault::Blank(language) => KnowledgeError::BlankAnswer { index, language },
        LocalizeFault::Duplicate(language) => KnowledgeError::DuplicateLanguage { index, language },
    })?;
    Ok(AnswerRecord { patterns, answers })
}

fn compile_pattern(index: usize, pattern: &str) -> Result<Regex, KnowledgeError> {
    if pattern.trim().is_empty() {
        return Err(KnowledgeError::BlankPattern { index });
    }
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| KnowledgeError::InvalidPattern {
            index,
            pattern: pattern.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn record(patterns: &[&str], answers: &[(&str, &str)]) -> RecordSource {
        RecordSource {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            answers: answers
                .iter()
                .map(|(code, text)| (code.to_string(), text.to_string()))
                .collect(),
        }
    }

    fn source(records: Vec<RecordSource>) -> KnowledgeSource {
        KnowledgeSource {
            records,
            fallback: None,
        }
    }

    #[test]
    fn builtin_table_compiles_in_order() {
        let knowledge = KnowledgeBase::builtin().expect("builtin table");
        assert_eq!(knowledge.len(), 6);
        assert!(knowledge.records()[0]
            .answer(Language::En)
            .starts_with("Tahreez is a system integrator"));
        assert_eq!(
            knowledge.records()[1].answer(Language::En),
            "Our Managing Director is Francesco Fidicaro."
        );
        assert!(!knowledge.has_arabic_triggers());
    }

    #[test]
    fn builtin_fallbacks_are_localized() {
        let knowledge = KnowledgeBase::builtin().expect("builtin table");
        assert_eq!(knowledge.fallback(Language::En), FALLBACK_EN);
        assert_eq!(knowledge.fallback(Language::Ar), FALLBACK_AR);
    }

    #[test]
    fn empty_table_is_rejected() {
        let err = KnowledgeBase::from_source(source(vec![])).unwrap_err();
        assert!(matches!(err, KnowledgeError::Empty));
    }

    #[test]
    fn record_without_patterns_is_rejected() {
        let records = vec![
            record(&["hello"], &[("en", "Hi"), ("ar", "مرحبا")]),
            record(&[], &[("en", "Hi"), ("ar", "مرحبا")]),
        ];
        let err = KnowledgeBase::from_source(source(records)).unwrap_err();
        assert!(matches!(err, KnowledgeError::NoPatterns { index: 1 }));
    }

    #[test]
    fn blank_pattern_is_rejected() {
        let records = vec![record(&["  "], &[("en", "Hi"), ("ar", "مرحبا")])];
        let err = KnowledgeBase::from_source(source(records)).unwrap_err();
        assert!(matches!(err, KnowledgeError::BlankPattern { index: 0 }));
    }

    #[test]
    fn invalid_pattern_is_rejected_with_its_text() {
        let records = vec![record(&["who.*(director"], &[("en", "Hi"), ("ar", "مرحبا")])];
        match KnowledgeBase::from_source(source(records)).unwrap_err() {
            KnowledgeError::InvalidPattern { index, pattern, .. } => {
                assert_eq!(index, 0);
                assert_eq!(pattern, "who.*(director");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_language_is_rejected() {
        let records = vec![record(&["hello"], &[("en", "Hi")])];
        let err = KnowledgeBase::from_source(source(records)).unwrap_err();
        assert!(matches!(
            err,
            KnowledgeError::MissingAnswer {
                index: 0,
                language: Language::Ar
            }
        ));
    }

    #[test]
    fn blank_answer_is_rejected() {
        let records = vec![record(&["hello"], &[("en", " "), ("ar", "مرحبا")])];
        let err = KnowledgeBase::from_source(source(records)).unwrap_err();
        assert!(matches!(
            err,
            KnowledgeError::BlankAnswer {
                index: 0,
                language: Language::En
            }
        ));
    }

    #[test]
    fn unknown_language_is_rejected() {
        let records = vec![record(
            &["hello"],
            &[("en", "Hi"), ("ar", "مرحبا"), ("fr", "Salut")],
        )];
        let err = KnowledgeBase::from_source(source(records)).unwrap_err();
        assert!(matches!(err, KnowledgeError::UnknownLanguage { index: 0, .. }));
    }

    #[test]
    fn language_codes_differing_in_case_are_rejected() {
        let records = vec![record(
            &["hello"],
            &[("EN", "Hi"), ("en", "Hello"), ("ar", "مرحبا")],
        )];
        let err = KnowledgeBase::from_source(source(records)).unwrap_err();
        assert!(matches!(
            err,
            KnowledgeError::DuplicateLanguage {
                index: 0,
                language: Language::En
            }
        ));
    }

    #[test]
    fn duplicate_fallback_language_is_rejected() {
        let mut table = source(vec![record(&["hello"], &[("en", "Hi"), ("ar", "مرحبا")])]);
        table.fallback = Some(BTreeMap::from([
            ("ar".to_string(), "عفواً؟".to_string()),
            ("AR".to_string(), "عفواً".to_string()),
            ("en".to_string(), "Pardon?".to_string()),
        ]));
        let err = KnowledgeBase::from_source(table).unwrap_err();
        assert!(matches!(
            err,
            KnowledgeError::DuplicateFallbackLanguage {
                language: Language::Ar
            }
        ));
    }

    #[test]
    fn incomplete_fallback_is_rejected() {
        let mut table = source(vec![record(&["hello"], &[("en", "Hi"), ("ar", "مرحبا")])]);
        table.fallback = Some(BTreeMap::from([("en".to_string(), "Pardon?".to_string())]));
        let err = KnowledgeBase::from_source(table).unwrap_err();
        assert!(matches!(
            err,
            KnowledgeError::MissingFallback {
                language: Language::Ar
            }
        ));
    }

    #[test]
    fn patterns_are_case_insensitive() {
        let records = vec![record(&["managing director"], &[("en", "Hi"), ("ar", "مرحبا")])];
        let knowledge = KnowledgeBase::from_source(source(records)).expect("valid table");
        assert!(knowledge.records()[0].matches("the MANAGING Director"));
    }

    #[test]
    fn arabic_trigger_is_detected() {
        let records = vec![record(&["المدير"], &[("en", "Hi"), ("ar", "مرحبا")])];
        let knowledge = KnowledgeBase::from_source(source(records)).expect("valid table");
        assert!(knowledge.has_arabic_triggers());
    }

    #[test]
    fn load_reads_json_file() {
        let path = std::env::temp_dir().join("tahreez_knowledge_load_test.json");
        let json = r#"{
            "records": [
                { "patterns": ["opening hours"], "answers": { "en": "We open at 8.", "ar": "نفتح الساعة 8." } }
            ],
            "fallback": { "en": "Pardon?", "ar": "عفواً؟" }
        }"#;
        fs::write(&path, json).expect("write knowledge file");
        let knowledge = KnowledgeBase::load(&path).expect("load knowledge file");
        fs::remove_file(&path).ok();
        assert_eq!(knowledge.len(), 1);
        assert_eq!(knowledge.fallback(Language::Ar), "عفواً؟");
    }

    #[test]
    fn example_file_adds_arabic_triggers() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("knowledge.example.json");
        let knowledge = KnowledgeBase::load(&path).expect("example knowledge file");
        assert_eq!(knowledge.len(), 6);
        assert!(knowledge.has_arabic_triggers());
        let director = &knowledge.records()[1];
        assert!(director.matches("من هو المدير العام؟"));
        assert_eq!(director.answer(Language::Ar), "المدير العام هو فرانشيسكو فيديكارو.");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = KnowledgeBase::load(Path::new("definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, KnowledgeError::Read { .. }));
    }

    #[test]
    fn load_reports_malformed_json() {
        let path = std::env::temp_dir().join("tahreez_knowledge_bad_test.json");
        fs::write(&path, "{ not json").expect("write knowledge file");
        let err = KnowledgeBase::load(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(matches!(err, KnowledgeError::Parse { .. }));
    }
}
