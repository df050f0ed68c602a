//! # 빔 탐색 (Beam Search)
//!
//! 후보 부분 시퀀스들의 순위 집합을 유지하면서 디코더가 단계마다 내놓는
//! 어휘 점수 테이블로 한 단계씩 전진시킨다.
//!
//! ```text
//!   hyp1 ─ hyp1 ─── hyp1   hyp1
//!            \            /
//!   hyp2 ─ hyp2   ─ hyp2 ─ hyp2
//!                /        \
//!   hyp3 ─ hyp3 ─── hyp3   hyp3
//! ```
//!
//! 각 단계의 백포인터와 토큰 기록을 거꾸로 따라가면 완성된 가설을 복원할 수 있다.

use crate::core::error::{CaptionError, Result};
use crate::core::vocab::SpecialTokens;
use log::debug;
use ndarray::{Array2, ArrayView2};
use std::cmp::Ordering;

/// 슬롯 마스크 값: 아직 확장 가능
const ACTIVE: f32 = 1.0;
/// 슬롯 마스크 값: END/PAD 를 이미 방출함
const FINISHED: f32 = f32::NEG_INFINITY;

/// 정렬된 후보 출력들의 빔
#[derive(Debug, Clone)]
pub struct BeamSearcher {
    /// 빔 크기 (슬롯 수)
    size: usize,
    /// 예약 토큰 인덱스
    special: SpecialTokens,
    /// 슬롯별 누적 점수
    scores: Vec<f32>,
    /// 슬롯별 마스크 (1 = 활성, -inf = 종료)
    mask: Vec<f32>,
    /// 단계별 백포인터 (현재 슬롯 -> 이전 단계 슬롯)
    prev_ks: Vec<Vec<usize>>,
    /// 단계별 방출 토큰 (초기 상태 포함)
    next_ys: Vec<Vec<usize>>,
    /// 호출자가 넘긴 어텐션 테이블 (알고리즘에는 쓰이지 않음)
    attention: Vec<Array2<f32>>,
    /// 모든 슬롯이 종료되었는지
    done: bool,
}

impl BeamSearcher {
    /// 새 빔 생성. 슬롯 0 은 START, 나머지는 PAD 로 시작한다.
    pub fn new(size: usize, special: SpecialTokens) -> Result<Self> {
        if size < 1 {
            return Err(CaptionError::invalid("beam size must be at least 1"));
        }

        let mut initial = vec![special.pad; size];
        initial[0] = special.start;

        Ok(Self {
            size,
            special,
            scores: vec![0.0; size],
            mask: vec![ACTIVE; size],
            prev_ks: Vec::new(),
            next_ys: vec![initial],
            attention: Vec::new(),
            done: false,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn special_tokens(&self) -> SpecialTokens {
        self.special
    }

    /// 슬롯별 누적 점수
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// 슬롯별 활성 여부
    pub fn active_mask(&self) -> Vec<bool> {
        self.mask.iter().map(|&m| m == ACTIVE).collect()
    }

    pub fn is_finished(&self, slot: usize) -> bool {
        self.mask.get(slot).map_or(false, |&m| m != ACTIVE)
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// 지금까지 수행한 advance 횟수
    pub fn steps(&self) -> usize {
        self.prev_ks.len()
    }

    pub fn backpointers(&self) -> &[Vec<usize>] {
        &self.prev_ks
    }

    pub fn token_history(&self) -> &[Vec<usize>] {
        &self.next_ys
    }

    pub fn attention_history(&self) -> &[Array2<f32>] {
        &self.attention
    }

    /// 현재 단계의 슬롯별 토큰 (다음 디코더 입력)
    pub fn get_current_state(&self) -> &[usize] {
        // next_ys 는 생성 시점부터 비어 있지 않다
        &self.next_ys[self.next_ys.len() - 1]
    }

    /// 현재 단계의 백포인터. 첫 advance 이전에는 None.
    pub fn get_current_origin(&self) -> Option<&[usize]> {
        self.prev_ks.last().map(Vec::as_slice)
    }

    /// 단계 점수 테이블(`size x vocab`)로 빔을 한 단계 전진시킨다.
    ///
    /// 반환값은 빔 탐색 완료 여부.
    pub fn advance(&mut self, word_lk: ArrayView2<'_, f32>) -> Result<bool> {
        self.validate_table(&word_lk)?;
        let num_words = word_lk.ncols();

        // 종료된 슬롯은 PAD 로만, 비용 없이 확장된다
        let mut beam_lk = word_lk.to_owned();
        for (slot, mut row) in beam_lk.rows_mut().into_iter().enumerate() {
            if self.mask[slot] == FINISHED {
                row.fill(f32::NEG_INFINITY);
                row[self.special.pad] = 0.0;
            }
        }

        // 첫 단계는 모든 슬롯이 동일하므로 0번 행만 후보가 된다
        let candidates: Vec<f32> = if self.prev_ks.is_empty() {
            beam_lk.row(0).to_vec()
        } else {
            for (mut row, &score) in beam_lk.rows_mut().into_iter().zip(self.scores.iter()) {
                row += score;
            }
            beam_lk.iter().copied().collect()
        };

        let best = top_k(&candidates, self.size);

        let mut prev_k = Vec::with_capacity(self.size);
        let mut next_y = Vec::with_capacity(self.size);
        for (slot, &flat) in best.iter().enumerate() {
            self.scores[slot] = candidates[flat];
            prev_k.push(flat / num_words);
            next_y.push(flat % num_words);
        }

        // 이번 단계에 END/PAD 를 낸 슬롯만 종료로 다시 표시한다.
        // 이전에 종료됐던 가설이 top-k 에서 밀려나면 그 슬롯은 다시 활성이 된다.
        for (slot, &token) in next_y.iter().enumerate() {
            self.mask[slot] = if token == self.special.end || token == self.special.pad {
                FINISHED
            } else {
                ACTIVE
            };
        }

        self.prev_ks.push(prev_k);
        self.next_ys.push(next_y);

        if self.mask.iter().all(|&m| m != ACTIVE) {
            self.done = true;
        }

        debug!(
            "beam step {}: scores={:?} tokens={:?} done={}",
            self.prev_ks.len(),
            self.scores,
            self.get_current_state(),
            self.done
        );

        Ok(self.done)
    }

    /// 어텐션 테이블을 함께 기록하면서 전진
    pub fn advance_with_attention(
        &mut self,
        word_lk: ArrayView2<'_, f32>,
        attention: ArrayView2<'_, f32>,
    ) -> Result<bool> {
        if attention.nrows() != self.size {
            return Err(CaptionError::invalid(format!(
                "attention has {} rows, expected {}",
                attention.nrows(),
                self.size
            )));
        }
        let done = self.advance(word_lk)?;
        self.attention.push(attention.to_owned());
        Ok(done)
    }

    /// 점수 내림차순으로 정렬된 (점수, 슬롯) 목록
    pub fn sort_best(&self) -> Vec<(f32, usize)> {
        let mut ranked: Vec<(f32, usize)> =
            self.scores.iter().copied().enumerate().map(|(k, s)| (s, k)).collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        ranked
    }

    /// 가장 점수가 높은 슬롯
    pub fn best_slot(&self) -> (f32, usize) {
        // size >= 1 이므로 항상 원소가 있다
        self.sort_best()[0]
    }

    /// 백포인터를 거꾸로 따라가 슬롯 `k` 의 가설을 복원한다.
    ///
    /// START 는 포함하지 않고, 마지막으로 방출된 종료 토큰은 포함한다.
    pub fn reconstruct(&self, k: usize) -> Result<Vec<usize>> {
        if k >= self.size {
            return Err(CaptionError::invalid(format!(
                "slot {} out of range for beam of size {}",
                k, self.size
            )));
        }

        let mut hyp = Vec::with_capacity(self.prev_ks.len());
        let mut slot = k;
        for step in (0..self.prev_ks.len()).rev() {
            hyp.push(self.next_ys[step + 1][slot]);
            slot = self.prev_ks[step][slot];
        }
        hyp.reverse();
        Ok(hyp)
    }

    fn validate_table(&self, word_lk: &ArrayView2<'_, f32>) -> Result<()> {
        let (rows, cols) = word_lk.dim();
        if rows != self.size {
            return Err(CaptionError::invalid(format!(
                "score table has {} rows, expected {}",
                rows, self.size
            )));
        }
        if self.special.pad >= cols || self.special.end >= cols {
            return Err(CaptionError::invalid(format!(
                "score table has {} columns, too few for PAD={} END={}",
                cols, self.special.pad, self.special.end
            )));
        }
        if self.prev_ks.is_empty() && cols < self.size {
            return Err(CaptionError::invalid(format!(
                "first step needs at least {} columns, got {}",
                self.size, cols
            )));
        }
        if let Some(bad) = word_lk.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(CaptionError::invalid(format!(
                "score table values must be finite and non-negative, found {}",
                bad
            )));
        }
        Ok(())
    }
}

/// 내림차순 상위 `k` 개의 평탄 인덱스. 동점이면 낮은 인덱스가 먼저 온다.
pub fn top_k(values: &[f32], k: usize) -> Vec<usize> {
    let by_score = |a: &usize, b: &usize| match values[*b].total_cmp(&values[*a]) {
        Ordering::Equal => a.cmp(b),
        other => other,
    };

    let mut order: Vec<usize> = (0..values.len()).collect();
    let keep = k.min(order.len());
    if keep == 0 {
        return Vec::new();
    }
    if keep < order.len() {
        order.select_nth_unstable_by(keep - 1, by_score);
        order.truncate(keep);
    }
    order.sort_unstable_by(by_score);
    order
}
