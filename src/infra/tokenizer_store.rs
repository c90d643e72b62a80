// ============================================================
// Layer 6 - Tokenizer Store
// ============================================================
// Decides which tokenizer a run uses and keeps a copy of it next
// to the checkpoints, so inference always tokenises exactly the
// way training did.
//
// Resolution order in `prepare`:
//   1. A pretrained tokenizer.json passed with --tokenizer
//      (e.g. downloaded from a model hub); copied into the
//      checkpoint dir
//   2. A tokenizer.json already in the checkpoint dir
//   3. A word-level vocabulary built from the training corpus
//
// The built tokenizer is written as HuggingFace JSON and loaded
// back with Tokenizer::from_file, which sidesteps the
// trainer/ModelWrapper type juggling of the tokenizers crate.
// Word counting runs the same BertNormalizer and Whitespace
// pre-tokenizer objects that get serialised into that JSON, so
// every vocabulary entry is a piece the encoder can produce.
// Ids are contiguous (specials first), so the largest id + 1 is
// a safe embedding size.
//
// Reference: HuggingFace tokenizers JSON format

use anyhow::{anyhow, bail, Context, Result};
use std::{collections::HashMap, fs, path::PathBuf};
use tokenizers::{
    normalizers::bert::BertNormalizer,
    pre_tokenizers::whitespace::Whitespace,
    NormalizedString, Normalizer, OffsetReferential, OffsetType, PreTokenizedString,
    PreTokenizer, Tokenizer,
};

const TOKENIZER_FILE: &str = "tokenizer.json";

/// Ids of the special tokens the pipeline relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub pad: u32,
    pub unk: u32,
    pub cls: u32,
    pub sep: u32,
}

impl SpecialTokens {
    /// Look the specials up in `tokenizer`, accepting both BERT-style
    /// ([PAD], [CLS]...) and RoBERTa/CamemBERT-style (<pad>, <s>...) names.
    pub fn resolve(tokenizer: &Tokenizer) -> Result<Self> {
        let find = |names: &[&str]| names.iter().find_map(|n| tokenizer.token_to_id(n));

        let pad = find(&["[PAD]", "<pad>"]).unwrap_or(0);
        let unk = find(&["[UNK]", "<unk>"]).unwrap_or(pad);
        let (Some(cls), Some(sep)) = (find(&["[CLS]", "<s>"]), find(&["[SEP]", "</s>"])) else {
            bail!("Tokenizer has no [CLS]/[SEP] (or <s>/</s>) tokens");
        };
        Ok(Self { pad, unk, cls, sep })
    }
}

/// Embedding rows needed to cover every id the tokenizer can emit.
pub fn embedding_size(tokenizer: &Tokenizer) -> usize {
    tokenizer
        .get_vocab(true)
        .values()
        .max()
        .map_or(0, |&id| id as usize + 1)
}

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: PathBuf::from(dir.into()) }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Pick the tokenizer for a training run (see module docs).
    pub fn prepare(
        &self,
        pretrained: Option<&str>,
        texts:      &[String],
        vocab_size: usize,
    ) -> Result<Tokenizer> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        if let Some(src) = pretrained {
            tracing::info!("Using pretrained tokenizer '{}'", src);
            fs::copy(src, self.path())
                .with_context(|| format!("Cannot copy tokenizer from '{src}'"))?;
            return self.load();
        }

        if self.path().exists() {
            tracing::info!("Loading existing tokenizer from disk");
            self.load()
        } else {
            tracing::info!("Building new word-level tokenizer (vocab_size={})", vocab_size);
            self.build_and_save(texts, vocab_size)
        }
    }

    /// Load the tokenizer saved next to the checkpoints
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path).map_err(|e| {
            anyhow::anyhow!("Cannot load tokenizer from '{}': {}", path.display(), e)
        })
    }

    fn build_and_save(&self, texts: &[String], vocab_size: usize) -> Result<Tokenizer> {
        // ── Step 1: Count word frequencies ────────────────────────────────────
        let normalizer    = word_normalizer();
        let pre_tokenizer = Whitespace::default();

        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for piece in split_words(&normalizer, &pre_tokenizer, text)? {
                *freq.entry(piece).or_insert(0) += 1;
            }
        }

        // Most frequent first; ties broken alphabetically so the
        // vocabulary is deterministic
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        const SPECIALS: [&str; 5] = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "[MASK]"];
        words.truncate(vocab_size.saturating_sub(SPECIALS.len()));

        // ── Step 2: Build vocab with contiguous ids ───────────────────────────
        let mut vocab = serde_json::Map::new();
        for (id, token) in SPECIALS.iter().enumerate() {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        for (word, _) in &words {
            if !vocab.contains_key(word) {
                let id = vocab.len();
                vocab.insert(word.clone(), serde_json::json!(id));
            }
        }
        let total = vocab.len();

        let added_tokens: Vec<serde_json::Value> = SPECIALS
            .iter()
            .enumerate()
            .map(|(id, token)| serde_json::json!({
                "id": id, "content": token, "single_word": false, "lstrip": false,
                "rstrip": false, "normalized": false, "special": true
            }))
            .collect();

        // ── Step 3: Write tokenizer JSON in HuggingFace format ────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": serde_json::to_value(&normalizer)?,
            "pre_tokenizer": serde_json::to_value(&pre_tokenizer)?,
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": "[UNK]"
            }
        });

        let tok_path = self.path();
        fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", tok_path.display()))?;

        tracing::info!("Tokenizer built with {} tokens, saved to '{}'", total, tok_path.display());
        self.load()
    }
}

/// Lowercasing BERT normaliser. strip_accents must be explicitly
/// false: left unset it follows `lowercase` and would turn "coûts"
/// into "couts".
fn word_normalizer() -> BertNormalizer {
    BertNormalizer::new(true, true, Some(false), true)
}

/// Normalise and pre-tokenise `text` exactly as the saved tokenizer will.
fn split_words(
    normalizer:    &BertNormalizer,
    pre_tokenizer: &Whitespace,
    text:          &str,
) -> Result<Vec<String>> {
    let mut normalized = NormalizedString::from(text);
    normalizer
        .normalize(&mut normalized)
        .map_err(|e| anyhow!("Normalisation error: {e}"))?;

    let mut pretokenized = PreTokenizedString::from(normalized);
    pre_tokenizer
        .pre_tokenize(&mut pretokenized)
        .map_err(|e| anyhow!("Pre-tokenisation error: {e}"))?;

    Ok(pretokenized
        .get_splits(OffsetReferential::Normalized, OffsetType::Byte)
        .into_iter()
        .map(|(piece, _, _)| piece.to_string())
        .collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn corpus() -> Vec<String> {
        vec![
            "Le chat dort.".to_string(),
            "Le chien mange, le chat dort !".to_string(),
            "Les coûts réels".to_string(),
        ]
    }

    #[test]
    fn test_split_words_lowercases_and_splits_punctuation() {
        let pieces = split_words(&word_normalizer(), &Whitespace::default(), "L'homme dort... vite!")
            .unwrap();
        assert_eq!(pieces, vec!["l", "'", "homme", "dort", "...", "vite", "!"]);
    }

    #[test]
    fn test_decomposed_accents_are_known_words() {
        // "coûts" written with a combining circumflex (U+0302)
        let decomposed = "Les cou\u{0302}ts montent".to_string();

        let dir   = TempDir::new().unwrap();
        let store = TokenizerStore::new(dir.path().to_string_lossy());
        let tok   = store.prepare(None, &[decomposed.clone()], 100).unwrap();

        let unk = SpecialTokens::resolve(&tok).unwrap().unk;
        let ids = tok.encode(decomposed.as_str(), false).unwrap().get_ids().to_vec();
        assert!(ids.len() >= 3);
        assert!(ids.iter().all(|&id| id != unk));
    }

    #[test]
    fn test_built_tokenizer_round_trips_known_words() {
        let dir   = TempDir::new().unwrap();
        let store = TokenizerStore::new(dir.path().to_string_lossy());
        let tok   = store.prepare(None, &corpus(), 100).unwrap();

        let specials = SpecialTokens::resolve(&tok).unwrap();
        assert_eq!(specials, SpecialTokens { pad: 0, unk: 1, cls: 2, sep: 3 });

        // Accents survive normalisation
        let ids = tok.encode("Les coûts", false).unwrap().get_ids().to_vec();
        assert_eq!(ids.len(), 2);
        assert!(ids.iter().all(|&id| id != specials.unk));

        // Unknown words map to [UNK]
        let ids = tok.encode("ornithorynque", false).unwrap().get_ids().to_vec();
        assert_eq!(ids, vec![specials.unk]);
    }

    #[test]
    fn test_vocab_size_caps_the_vocabulary() {
        let dir   = TempDir::new().unwrap();
        let store = TokenizerStore::new(dir.path().to_string_lossy());
        let tok   = store.prepare(None, &corpus(), 7).unwrap();

        // 5 specials + the 2 most frequent words
        assert_eq!(embedding_size(&tok), 7);
    }

    #[test]
    fn test_existing_tokenizer_is_reused() {
        let dir   = TempDir::new().unwrap();
        let store = TokenizerStore::new(dir.path().to_string_lossy());
        store.prepare(None, &corpus(), 100).unwrap();

        // A different corpus must not rebuild the saved vocabulary
        let tok = store.prepare(None, &["zzz".to_string()], 100).unwrap();
        assert!(tok.token_to_id("chat").is_some());
        assert!(tok.token_to_id("zzz").is_none());
    }

    #[test]
    fn test_pretrained_tokenizer_is_copied() {
        let src_dir = TempDir::new().unwrap();
        let src     = TokenizerStore::new(src_dir.path().to_string_lossy());
        src.prepare(None, &corpus(), 100).unwrap();

        let dst_dir = TempDir::new().unwrap();
        let dst     = TokenizerStore::new(dst_dir.path().to_string_lossy());
        let pretrained = src.path().to_string_lossy().to_string();
        let tok = dst.prepare(Some(&pretrained), &[], 100).unwrap();

        assert!(dst.path().exists());
        assert!(tok.token_to_id("chien").is_some());
    }
}
