//! 디코드 루프
//!
//! 디코더 호출 → 빔 전진을 완료 또는 최대 길이까지 반복한다.

use crate::core::beam::BeamSearcher;
use crate::core::decode::config::{DecodeConfig, DecodeStrategy};
use crate::core::decode::step_decoder::StepDecoder;
use crate::core::error::{CaptionError, Result};
use crate::core::vocab::SpecialTokens;
use log::{debug, info};
use rayon::prelude::*;

/// 디코딩 결과 가설
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis {
    /// 생성된 토큰 (START 제외, 종료 토큰 포함)
    pub tokens: Vec<usize>,
    /// 누적 점수
    pub score: f32,
}

impl Hypothesis {
    /// 뒤쪽 PAD 들과 마지막 END 하나를 떼어낸 캡션 토큰
    pub fn caption_tokens(&self, special: SpecialTokens) -> &[usize] {
        let mut end = self.tokens.len();
        while end > 0 && self.tokens[end - 1] == special.pad {
            end -= 1;
        }
        if end > 0 && self.tokens[end - 1] == special.end {
            end -= 1;
        }
        &self.tokens[..end]
    }
}

/// 빔 탐색 디코딩
pub fn beam_decode<D: StepDecoder + ?Sized>(
    decoder: &mut D,
    config: &DecodeConfig,
    special: SpecialTokens,
) -> Result<Hypothesis> {
    config.validate()?;
    let mut beam = BeamSearcher::new(config.beam_size, special)?;

    for step in 0..config.max_sentence_length {
        let table = decoder.step(beam.get_current_state(), beam.get_current_origin())?;
        if beam.advance(table.view())? {
            debug!("beam finished after {} steps", step + 1);
            break;
        }
    }

    let (score, slot) = beam.best_slot();
    let tokens = beam.reconstruct(slot)?;
    info!("beam decode: {} tokens, score {:.4}", tokens.len(), score);
    Ok(Hypothesis { tokens, score })
}

/// 단계마다 최댓값 토큰만 고르는 디코딩. END 를 내면 멈춘다.
pub fn greedy_decode<D: StepDecoder + ?Sized>(
    decoder: &mut D,
    config: &DecodeConfig,
    special: SpecialTokens,
) -> Result<Hypothesis> {
    config.validate()?;
    let mut last = special.start;
    let mut tokens = Vec::new();
    let mut score = 0.0f32;

    // 단일 슬롯은 항상 자기 자신을 이어받는다
    let origin = [0usize];
    for step in 0..config.max_sentence_length {
        let origins = if step == 0 { None } else { Some(&origin[..]) };
        let table = decoder.step(&[last], origins)?;
        if table.nrows() != 1 || table.ncols() < 1 {
            return Err(CaptionError::invalid(format!(
                "greedy step expects a 1 x vocab table, got {:?}",
                table.dim()
            )));
        }

        let row = table.row(0);
        let mut best = 0;
        for (idx, &value) in row.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(CaptionError::invalid(format!(
                    "score table values must be finite and non-negative, found {}",
                    value
                )));
            }
            if value > row[best] {
                best = idx;
            }
        }

        score += row[best];
        tokens.push(best);
        last = best;
        if best == special.end {
            break;
        }
    }

    info!("greedy decode: {} tokens, score {:.4}", tokens.len(), score);
    Ok(Hypothesis { tokens, score })
}

/// 설정된 전략으로 디코딩
pub fn decode<D: StepDecoder + ?Sized>(
    decoder: &mut D,
    config: &DecodeConfig,
    special: SpecialTokens,
) -> Result<Hypothesis> {
    match config.strategy {
        DecodeStrategy::Beam => beam_decode(decoder, config, special),
        DecodeStrategy::Greedy => greedy_decode(decoder, config, special),
    }
}

/// 이름 붙은 디코더들을 병렬로 디코딩한다. 결과 순서는 입력 순서와 같다.
pub fn decode_batch<D: StepDecoder + Send>(
    jobs: Vec<(String, D)>,
    config: &DecodeConfig,
    special: SpecialTokens,
) -> Result<Vec<(String, Hypothesis)>> {
    config.validate()?;
    info!("decoding {} sequences with {:?}", jobs.len(), config.strategy);

    jobs.into_par_iter()
        .map(|(name, mut decoder)| -> Result<(String, Hypothesis)> {
            let hyp = decode(&mut decoder, config, special)?;
            Ok((name, hyp))
        })
        .collect()
}
