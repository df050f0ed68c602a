//! # 캡션 디코딩 핵심 모듈
//!
//! 빔 탐색, 어휘 사전, 디코드 루프

pub mod error;
pub mod vocab;
pub mod beam;
pub mod decode;

// 주요 타입들 재수출
pub use error::{CaptionError, Result};
pub use vocab::{SpecialTokens, Vocabulary};
pub use beam::BeamSearcher;
pub use decode::*;
