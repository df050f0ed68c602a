//! # 빔 탐색 모듈
//!
//! 캡션 생성용 빔 탐색 핵심 구현

pub mod beam_search;

pub use beam_search::{top_k, BeamSearcher};

#[cfg(test)]
pub mod __tests__;
