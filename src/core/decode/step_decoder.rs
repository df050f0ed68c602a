//! 디코더 모델 경계
//!
//! 디코드 루프는 모델 내부를 모르고, 슬롯별 마지막 토큰을 넘겨 다음 단계의
//! `slots x vocab` 점수 테이블만 받는다.

use crate::core::error::{CaptionError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 단계별 점수 테이블을 내놓는 디코더
pub trait StepDecoder {
    /// `tokens[k]` 는 슬롯 `k` 의 마지막 토큰, `origins[k]` 는 그 슬롯이 이어받은
    /// 이전 슬롯 (첫 단계에는 None). 상태를 가진 디코더는 `origins` 로 은닉 상태를
    /// 재배열한다.
    fn step(&mut self, tokens: &[usize], origins: Option<&[usize]>) -> Result<Array2<f32>>;

    /// 어휘 크기
    fn vocab_size(&self) -> usize;
}

/// 마지막 토큰에만 의존하는 표 기반 디코더
///
/// `transitions[[prev, next]]` 가 `prev` 다음에 `next` 가 올 점수.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BigramDecoder {
    transitions: Array2<f32>,
}

impl BigramDecoder {
    pub fn new(transitions: Array2<f32>) -> Result<Self> {
        let (rows, cols) = transitions.dim();
        if rows != cols || rows == 0 {
            return Err(CaptionError::invalid(format!(
                "bigram transitions must be a non-empty square table, got {}x{}",
                rows, cols
            )));
        }
        Ok(Self { transitions })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let raw: BigramDecoder = serde_json::from_str(&content)?;
        Self::new(raw.transitions)
    }

    pub fn transitions(&self) -> &Array2<f32> {
        &self.transitions
    }
}

impl StepDecoder for BigramDecoder {
    fn step(&mut self, tokens: &[usize], _origins: Option<&[usize]>) -> Result<Array2<f32>> {
        let vocab = self.vocab_size();
        let mut table = Array2::zeros((tokens.len(), vocab));
        for (slot, &token) in tokens.iter().enumerate() {
            if token >= vocab {
                return Err(CaptionError::Decoder(format!(
                    "token {} outside bigram vocabulary of {}",
                    token, vocab
                )));
            }
            table.row_mut(slot).assign(&self.transitions.row(token));
        }
        Ok(table)
    }

    fn vocab_size(&self) -> usize {
        self.transitions.ncols()
    }
}
