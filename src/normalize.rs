use deunicode::{deunicode, deunicode_char};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const DEFAULT_PUNCTUATION: [&str; 10] = ["/", ".", ",", "*", "(", ")", "&", "#", "@", "!"];

/// "Αρ." is the Greek abbreviation for "No.".
pub const DEFAULT_NOISE_WORDS: [&str; 2] = ["Αρ", "block"];

pub const DEFAULT_OVERRIDES: [(&str, &str); 3] = [("χ", "ch"), ("θ", "th"), ("φ", "ph")];

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Override {
    pub source: String,
    pub replacement: String,
}

/// Lookup tables for [`Normalizer`], written in source script.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizerConfig {
    /// Removed wherever they occur.
    pub punctuation: Vec<String>,
    /// Dropped when they make up a whole token.
    pub noise_words: Vec<String>,
    /// Applied in order to the transliterated text.
    pub overrides: Vec<Override>,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            punctuation: DEFAULT_PUNCTUATION.iter().map(|s| s.to_string()).collect(),
            noise_words: DEFAULT_NOISE_WORDS.iter().map(|s| s.to_string()).collect(),
            overrides: DEFAULT_OVERRIDES
                .iter()
                .map(|&(source, replacement)| Override {
                    source: source.to_string(),
                    replacement: replacement.to_string(),
                })
                .collect(),
        }
    }
}

///
/// Maps raw address strings to their canonical comparable form.
///
/// The pipeline is, in order:
///
/// 1. trim surrounding whitespace
/// 2. lowercase and transliterate to ASCII
/// 3. remove punctuation
/// 4. apply transliteration overrides
/// 5. drop noise tokens and collapse whitespace
///
/// Transliteration runs before any stripping, so every table is matched in
/// its transliterated form. `Normalizer::new` converts the configured tables
/// once; `normalize` never allocates them again.
///
#[derive(Clone, Debug)]
pub struct Normalizer {
    punctuation: Vec<String>,
    noise_words: HashSet<String>,
    overrides: Vec<(String, String)>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(&NormalizerConfig::default())
    }
}

impl Normalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        let punctuation: Vec<String> = config
            .punctuation
            .iter()
            .map(|p| fold(p))
            .filter(|p| !p.is_empty())
            .collect();
        let overrides: Vec<(String, String)> = config
            .overrides
            .iter()
            .map(|o| (fold(&o.source), strip(&fold(&o.replacement), &punctuation)))
            .filter(|(source, replacement)| !source.is_empty() && source != replacement)
            .collect();
        // Noise words go through the same steps as the text they are matched against.
        let noise_words = config
            .noise_words
            .iter()
            .map(|w| apply_overrides(strip(&fold(w.trim()), &punctuation), &overrides))
            .filter(|w| !w.is_empty())
            .collect();
        Normalizer {
            punctuation,
            noise_words,
            overrides,
        }
    }

    pub fn normalize(&self, raw: &str) -> String {
        let folded = fold(raw.trim());
        let text = apply_overrides(strip(&folded, &self.punctuation), &self.overrides);
        text.split_whitespace()
            .filter(|token| !self.noise_words.contains(*token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Lowercase, transliterate, lowercase again: deunicode emits capitals for
/// some scripts even from lowercase input.
///
/// Vulgar fractions become separate numerator and denominator tokens, so
/// "1½" reads "1 1 2" rather than "11/2", which loses its slash to the
/// punctuation table.
fn fold(text: &str) -> String {
    let mut spaced = String::with_capacity(text.len());
    for c in text.chars() {
        if is_vulgar_fraction(c) {
            spaced.push(' ');
            spaced.push_str(&deunicode_char(c).unwrap_or_default().replace('/', " "));
            spaced.push(' ');
        } else {
            spaced.push(c);
        }
    }
    deunicode(&spaced.to_lowercase()).to_lowercase()
}

fn is_vulgar_fraction(c: char) -> bool {
    matches!(c, '\u{00BC}'..='\u{00BE}' | '\u{2150}'..='\u{215E}' | '\u{2189}')
}

fn apply_overrides(mut text: String, overrides: &[(String, String)]) -> String {
    for (source, replacement) in overrides {
        if text.contains(source.as_str()) {
            text = text.replace(source.as_str(), replacement);
        }
    }
    text
}

fn strip(text: &str, punctuation: &[String]) -> String {
    let mut out = text.to_string();
    for p in punctuation {
        if out.contains(p.as_str()) {
            out = out.replace(p.as_str(), "");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(raw: &str) -> String {
        Normalizer::default().normalize(raw)
    }

    #[test]
    fn test_trims_and_collapses_whitespace() {
        assert_eq!(normalize("   9   Alkinoou \t Germasogeia  "), "9 alkinoou germasogeia");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_strips_punctuation_without_spacing() {
        assert_eq!(normalize("9, Alkinoou (Germasogeia)"), "9 alkinoou germasogeia");
        assert_eq!(normalize("12/3 A.B. Str!"), "123 ab str");
        assert_eq!(normalize("#@&*"), "");
    }

    #[test]
    fn test_drops_noise_tokens_only_when_whole() {
        assert_eq!(normalize("Block 5, Lapithou 1"), "5 lapithou 1");
        assert_eq!(normalize("Blockhouse 5"), "blockhouse 5");
    }

    #[test]
    fn test_configured_noise_words_see_overrides() {
        let config = NormalizerConfig {
            noise_words: vec![String::from("Χωριό"), String::from("block")],
            ..NormalizerConfig::default()
        };
        let normalizer = Normalizer::new(&config);
        assert_eq!(normalizer.normalize("Χωριό Lapithou 1"), "lapithou 1");
        assert_eq!(normalizer.normalize("ΧΩΡΙΟ Lapithou 1"), "lapithou 1");
    }

    #[test]
    fn test_vulgar_fractions_keep_house_numbers_apart() {
        assert_eq!(normalize("Lapithou 1½"), "lapithou 1 1 2");
        assert_eq!(normalize("Lapithou 1¾, Germasogeia"), "lapithou 1 3 4 germasogeia");
        assert_ne!(normalize("Lapithou 1½"), normalize("Lapithou 112"));
    }

    #[test]
    fn test_greek_number_abbreviation_is_noise() {
        assert_eq!(normalize("Αρ. 1"), "1");
        assert_eq!(normalize("Lapithou Αρ. 1"), "lapithou 1");
    }

    #[test]
    fn test_transliterates_greek() {
        assert_eq!(normalize("Γερμασόγεια"), "germasogeia");
        assert_eq!(normalize("ΓΕΡΜΑΣΟΓΕΙΑ"), "germasogeia");
    }

    #[test]
    fn test_folds_latin_diacritics() {
        assert_eq!(normalize("Álvaro Pérez"), "alvaro perez");
    }

    #[test]
    fn test_overrides_apply_to_transliterated_form() {
        assert_eq!(normalize("Χαλκίδα"), "chalkida");
        // Whatever χ transliterates to is rewritten, Latin input included.
        let chi = deunicode("χ").to_lowercase();
        assert_eq!(normalize(&format!("Ma{chi}aira")), "machaira");
    }

    #[test]
    fn test_overrides_can_be_replaced() {
        let config = NormalizerConfig {
            overrides: vec![],
            ..NormalizerConfig::default()
        };
        assert_eq!(
            Normalizer::new(&config).normalize("Χαλκίδα"),
            deunicode("χαλκίδα").to_lowercase()
        );
    }

    #[test]
    fn test_punctuation_is_removed_after_transliteration() {
        // The ellipsis transliterates to "...", which is then stripped.
        assert_eq!(normalize("Lapithou… 1"), "lapithou 1");
    }

    #[test]
    fn test_punctuation_removal_happens_before_overrides() {
        let chi = deunicode("χ").to_lowercase();
        let (head, tail) = chi.split_at(1);
        assert_eq!(normalize(&format!("{head}.{tail}")), "ch");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "9 Alkinoou, Germasogeia",
            "Λαπίθου Αρ. 1, Γερμασόγεια",
            "Block 5 (Χαλκίδα) k.h",
            "  Rue de l'Église #4 / Apt. 2 ",
            "Lapithou… 1",
            "Lapithou 1½",
            "",
        ];
        let normalizer = Normalizer::default();
        for input in inputs {
            let once = normalizer.normalize(input);
            assert_eq!(normalizer.normalize(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_empty_tables_only_fold_and_collapse() {
        let config = NormalizerConfig {
            punctuation: vec![],
            noise_words: vec![],
            overrides: vec![],
        };
        let normalizer = Normalizer::new(&config);
        assert_eq!(normalizer.normalize(" Block  5, Αρ. 1 "), "block 5, ar. 1");
    }
}
