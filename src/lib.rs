//! 이미지 캡션 빔 탐색 디코더 라이브러리
//!
//! 디코더 모델이 단계마다 내놓는 어휘 점수 테이블로 후보 캡션들의 빔을 전진시키고,
//! 완료 후 백포인터를 따라 최고 가설을 복원한다.

pub mod core;

// 핵심 모듈들 재수출
pub use crate::core::{
    // 빔 탐색
    BeamSearcher,
    // 어휘
    SpecialTokens, Vocabulary,
    // 디코드 루프
    beam_decode, decode, decode_batch, greedy_decode, BigramDecoder, DecodeConfig,
    DecodeStrategy, Hypothesis, StepDecoder,
    // 에러
    CaptionError,
};

// 편의 타입 별칭들
pub type Beam = BeamSearcher;
pub type Result<T> = crate::core::Result<T>;
