//! # 어휘 사전 모듈

pub mod vocabulary;

pub use vocabulary::{tokenize, SpecialTokens, Vocabulary, END, NUM_RESERVED, PAD, START, UNK};
