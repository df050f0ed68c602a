//! # 빔 탐색 단위테스트

pub mod beam_search_test;
