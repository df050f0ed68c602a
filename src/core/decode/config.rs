//! # 디코딩 설정
//!
//! 디코드 루프에 명시적으로 넘기는 하이퍼파라미터 묶음

use crate::core::error::{CaptionError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 디코딩 전략
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecodeStrategy {
    /// 빔 탐색
    Beam,
    /// 단계별 argmax
    Greedy,
}

/// 디코드 루프 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// 빔 크기
    pub beam_size: usize,
    /// 최대 생성 단계 수
    pub max_sentence_length: usize,
    /// 디코딩 전략
    pub strategy: DecodeStrategy,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            beam_size: 3,
            max_sentence_length: 60,
            strategy: DecodeStrategy::Beam,
        }
    }
}

impl DecodeConfig {
    /// JSON 파일에서 설정 로드 (빠진 필드는 기본값)
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: DecodeConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.beam_size < 1 {
            return Err(CaptionError::invalid("beam_size must be at least 1"));
        }
        if self.max_sentence_length < 1 {
            return Err(CaptionError::invalid("max_sentence_length must be at least 1"));
        }
        Ok(())
    }
}
