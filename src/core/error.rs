//! 캡션 디코딩 에러 타입

use thiserror::Error;

/// 빔 탐색/디코딩 과정에서 발생하는 에러
#[derive(Debug, Error)]
pub enum CaptionError {
    /// 잘못된 인자 (빔 크기, 슬롯 인덱스, 테이블 형상 등)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// 파일 입출력 실패
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 직렬화/역직렬화 실패
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 외부 디코더 모델 실패
    #[error("Decoder error: {0}")]
    Decoder(String),
}

/// 크레이트 공통 Result
pub type Result<T> = std::result::Result<T, CaptionError>;

impl CaptionError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        CaptionError::InvalidArgument(msg.into())
    }
}
