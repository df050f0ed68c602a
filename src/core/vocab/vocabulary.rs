//! 단어 <-> 인덱스 어휘 사전
//!
//! 예약 심볼 4개(PAD, START, END, UNK)가 항상 0..4 인덱스를 차지한다.

use crate::core::error::{CaptionError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const PAD: &str = "<PAD>";
pub const START: &str = "<START>";
pub const END: &str = "<END>";
pub const UNK: &str = "<UNK>";

/// 예약 심볼 개수
pub const NUM_RESERVED: usize = 4;

/// 빔 탐색이 필요로 하는 예약 토큰 인덱스
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokens {
    pub pad: usize,
    pub start: usize,
    pub end: usize,
}

impl Default for SpecialTokens {
    fn default() -> Self {
        Self { pad: 0, start: 1, end: 2 }
    }
}

/// 어휘 사전
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "VocabularyFile", into = "VocabularyFile")]
pub struct Vocabulary {
    /// 인덱스 -> 단어
    i2w: Vec<String>,
    /// 단어 -> 인덱스
    w2i: HashMap<String, usize>,
}

/// 직렬화 형식. 역인덱스는 로드할 때 다시 만든다.
#[derive(Serialize, Deserialize)]
struct VocabularyFile {
    i2w: Vec<String>,
}

impl From<VocabularyFile> for Vocabulary {
    fn from(file: VocabularyFile) -> Self {
        Self::from_words(file.i2w)
    }
}

impl From<Vocabulary> for VocabularyFile {
    fn from(vocab: Vocabulary) -> Self {
        Self { i2w: vocab.i2w }
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl Vocabulary {
    /// 예약 심볼만 가진 사전
    pub fn new() -> Self {
        Self::from_words([PAD, START, END, UNK].iter().map(|w| w.to_string()).collect())
    }

    fn from_words(i2w: Vec<String>) -> Self {
        let w2i = i2w.iter().enumerate().map(|(i, w)| (w.clone(), i)).collect();
        Self { i2w, w2i }
    }

    /// 캡션 말뭉치로부터 빈도 상위 단어를 모아 사전을 만든다.
    ///
    /// `vocab_size` 는 예약 심볼을 포함한 전체 크기.
    pub fn from_captions<S: AsRef<str>>(captions: &[S], vocab_size: usize) -> Result<Self> {
        if vocab_size < NUM_RESERVED {
            return Err(CaptionError::invalid(format!(
                "vocab_size must be at least {}, got {}",
                NUM_RESERVED, vocab_size
            )));
        }

        let mut counts: HashMap<String, usize> = HashMap::new();
        for caption in captions {
            for token in tokenize(caption.as_ref()) {
                *counts.entry(token).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = counts
            .into_iter()
            .filter(|(w, _)| ![PAD, START, END, UNK].contains(&w.as_str()))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(vocab_size - NUM_RESERVED);

        let mut vocab = Self::new();
        for (word, _) in ranked {
            vocab.w2i.insert(word.clone(), vocab.i2w.len());
            vocab.i2w.push(word);
        }

        info!("vocabulary built: {} words from {} captions", vocab.len(), captions.len());
        Ok(vocab)
    }

    pub fn len(&self) -> usize {
        self.i2w.len()
    }

    pub fn is_empty(&self) -> bool {
        self.i2w.is_empty()
    }

    /// 단어의 인덱스 (없으면 UNK)
    pub fn index_of(&self, word: &str) -> usize {
        self.w2i
            .get(word)
            .or_else(|| self.w2i.get(UNK))
            .copied()
            .unwrap_or(NUM_RESERVED - 1)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.w2i.contains_key(word)
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.i2w.get(index).map(String::as_str)
    }

    pub fn special_tokens(&self) -> SpecialTokens {
        SpecialTokens {
            pad: self.index_of(PAD),
            start: self.index_of(START),
            end: self.index_of(END),
        }
    }

    /// 문장을 인덱스 열로 (START/END 없이)
    pub fn encode(&self, sentence: &str) -> Vec<usize> {
        tokenize(sentence).iter().map(|t| self.index_of(t)).collect()
    }

    /// 인덱스 열을 단어 열로. 범위를 벗어난 인덱스는 UNK.
    pub fn decode(&self, indices: &[usize]) -> Vec<String> {
        indices
            .iter()
            .map(|&i| self.word(i).unwrap_or(UNK).to_string())
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let vocab: Vocabulary = serde_json::from_str(&content)?;

        for (i, reserved) in [PAD, START, END, UNK].iter().enumerate() {
            if vocab.word(i) != Some(*reserved) {
                return Err(CaptionError::invalid(format!(
                    "vocabulary file {} must start with {} at index {}",
                    path.display(),
                    reserved,
                    i
                )));
            }
        }
        Ok(vocab)
    }
}

/// 소문자화 후 공백 기준으로 나누고, 단어 문자와 구두점 묶음을 분리한다.
pub fn tokenize(sentence: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for chunk in sentence.split_whitespace() {
        let mut current = String::new();
        let mut current_is_word = true;
        for c in chunk.to_lowercase().chars() {
            let is_word = c.is_alphanumeric() || c == '_';
            if !current.is_empty() && is_word != current_is_word {
                tokens.push(std::mem::take(&mut current));
            }
            current_is_word = is_word;
            current.push(c);
        }
        if !current.is_empty() {
            tokens.push(current);
        }
    }
    tokens
}
