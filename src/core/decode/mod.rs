//! # 디코딩 모듈
//!
//! 디코더 모델과 빔 탐색을 엮는 디코드 루프, 설정, 예측 파일 출력

pub mod config;
pub mod decode_loop;
pub mod prediction;
pub mod step_decoder;

pub use config::{DecodeConfig, DecodeStrategy};
pub use decode_loop::{beam_decode, decode, decode_batch, greedy_decode, Hypothesis};
pub use prediction::{prediction_file_name, write_predictions};
pub use step_decoder::{BigramDecoder, StepDecoder};

#[cfg(test)]
pub mod __tests__;
