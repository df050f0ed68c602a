//! # 디코딩 모듈 단위테스트
