// ============================================================
// Layer 4 - Sentence Preprocessor
// ============================================================
// Normalises one sentence before tokenisation.
//
// Sentences scraped from books and the web often contain:
//   - Non-breaking spaces (U+00A0), especially before French
//     punctuation ("Bonjour !"), and narrow NBSP (U+202F)
//   - Zero-width spaces (U+200B) and byte order marks (U+FEFF)
//   - Typographic apostrophes (’) next to ASCII ones (')
//   - Stray tabs, line breaks and control characters
//
// Left alone, "l’homme" and "l'homme" become different tokens
// and the vocabulary fills up with duplicates.
//
// Steps (applied in order):
//   1. Map odd whitespace / control characters to a plain space
//   2. Map typographic apostrophes to '
//   3. Collapse runs of whitespace into one space
//   4. Trim both ends
//
// A sentence is a single line, so line breaks collapse too.
//
// Reference: Rust Book §8 (Strings in Rust)

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean one sentence. Returns an owned, single-line String.
    pub fn clean(&self, text: &str) -> String {
        let mapped = text.chars().map(|c| match c {
            '\u{00A0}' | '\u{202F}' | '\u{200B}' | '\u{FEFF}' => ' ',
            '\u{2019}' | '\u{2018}' | '\u{02BC}' => '\'',
            c if c.is_control() => ' ',
            c => c,
        });

        let mut out        = String::with_capacity(text.len());
        let mut last_space = true; // swallows leading whitespace

        for c in mapped {
            if c.is_whitespace() {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        // At most one trailing space can remain
        if out.ends_with(' ') {
            out.pop();
        }
        out
    }

    /// Clean a batch of sentences
    pub fn clean_all<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        texts.into_iter().map(|t| self.clean(t)).collect()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("Le   chat  dort"), "Le chat dort");
    }

    #[test]
    fn test_trims_edges() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("  Bonjour  "), "Bonjour");
    }

    #[test]
    fn test_non_breaking_space_before_punctuation() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("Bonjour\u{00A0}!"), "Bonjour !");
        assert_eq!(p.clean("Quoi\u{202F}?"), "Quoi ?");
    }

    #[test]
    fn test_apostrophes_are_unified() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("l\u{2019}homme"), "l'homme");
    }

    #[test]
    fn test_line_breaks_and_control_chars() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("une\r\nphrase\x01ici\t!"), "une phrase ici !");
    }

    #[test]
    fn test_empty_and_blank() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(""), "");
        assert_eq!(p.clean(" \u{200B} \n"), "");
    }
}
