//! # BeamSearcher 단위테스트
//!
//! top-k 선택, 종료 마스킹, 백포인터 복원 검증

use crate::core::beam::beam_search::{top_k, BeamSearcher};
use crate::core::error::CaptionError;
use crate::core::vocab::SpecialTokens;
use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// PAD=0, START=1, END=2
fn special() -> SpecialTokens {
    SpecialTokens { pad: 0, start: 1, end: 2 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn 초기_상태_테스트() {
        let beam = BeamSearcher::new(3, special()).unwrap();

        assert_eq!(beam.get_current_state(), &[1, 0, 0]);
        assert_eq!(beam.get_current_origin(), None);
        assert_eq!(beam.scores(), &[0.0, 0.0, 0.0]);
        assert_eq!(beam.active_mask(), vec![true, true, true]);
        assert_eq!(beam.token_history().len(), beam.backpointers().len() + 1);
        assert!(!beam.is_done());
        assert_eq!(beam.reconstruct(0).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn 빔_크기_0_거부_테스트() {
        let result = BeamSearcher::new(0, special());
        assert!(matches!(result, Err(CaptionError::InvalidArgument(_))));
    }

    #[test]
    fn 첫_단계_top_k_동점_처리_테스트() {
        let mut beam = BeamSearcher::new(2, special()).unwrap();
        // 첫 단계는 0번 행만 본다
        let table = array![[0.1, 0.0, 0.1, 0.8], [9.0, 9.0, 9.0, 9.0]];

        let done = beam.advance(table.view()).unwrap();

        assert!(!done);
        assert_eq!(beam.scores(), &[0.8, 0.1]);
        // 0.1 동점은 낮은 평탄 인덱스(PAD)가 이긴다
        assert_eq!(beam.get_current_state(), &[3, 0]);
        assert_eq!(beam.get_current_origin(), Some(&[0usize, 0][..]));
        assert_eq!(beam.active_mask(), vec![true, false]);
        println!("✅ 첫 단계 top-k: scores={:?}", beam.scores());
    }

    #[test]
    fn 종료_슬롯_pad_무비용_확장_테스트() {
        let mut beam = BeamSearcher::new(2, special()).unwrap();
        beam.advance(array![[0.5, 0.0, 0.0, 0.3], [0.0, 0.0, 0.0, 0.0]].view())
            .unwrap();
        assert_eq!(beam.get_current_state(), &[0, 3]);
        assert!(beam.is_finished(0));

        // 종료된 0번 슬롯의 입력값 0.9 는 무시되고 PAD 열은 0 으로 고정된다
        let done = beam
            .advance(array![[0.9, 0.9, 0.9, 0.9], [0.0, 0.0, 0.1, 0.0]].view())
            .unwrap();

        assert!(done);
        assert_eq!(beam.scores()[0], 0.5);
        assert_abs_diff_eq!(beam.scores()[1], 0.4, epsilon = 1e-6);
        assert_eq!(beam.get_current_state(), &[0, 2]);
        assert_eq!(beam.get_current_origin(), Some(&[0usize, 1][..]));
        assert_eq!(beam.reconstruct(0).unwrap(), vec![0, 0]);
        assert_eq!(beam.reconstruct(1).unwrap(), vec![3, 2]);
    }

    #[test]
    fn 한_단계_종료_테스트() {
        let mut beam = BeamSearcher::new(2, special()).unwrap();
        let done = beam
            .advance(array![[0.3, 0.0, 0.6, 0.1], [0.3, 0.0, 0.6, 0.1]].view())
            .unwrap();

        assert!(done);
        assert!(beam.is_done());
        assert_eq!(beam.steps(), 1);
        assert_eq!(beam.get_current_state(), &[2, 0]);
    }

    #[test]
    fn 다단계_백포인터_복원_테스트() {
        // PAD=0, START=1, END=2, a=3, b=4
        let mut beam = BeamSearcher::new(2, special()).unwrap();

        beam.advance(array![[0.0, 0.0, 0.1, 0.6, 0.3], [0.0, 0.0, 0.0, 0.0, 0.0]].view())
            .unwrap();
        assert_eq!(beam.get_current_state(), &[3, 4]);

        let done = beam
            .advance(array![[0.0, 0.0, 0.1, 0.1, 0.2], [0.0, 0.0, 0.9, 0.0, 0.1]].view())
            .unwrap();
        assert!(!done);
        assert_eq!(beam.get_current_state(), &[2, 4]);
        assert_eq!(beam.get_current_origin(), Some(&[1usize, 0][..]));
        assert_eq!(beam.reconstruct(0).unwrap(), vec![4, 2]);
        assert_eq!(beam.reconstruct(1).unwrap(), vec![3, 4]);
        let (best_score, best) = beam.best_slot();
        assert_eq!(best, 0);
        assert_abs_diff_eq!(best_score, 1.2, epsilon = 1e-6);

        let done = beam
            .advance(array![[5.0, 5.0, 5.0, 5.0, 5.0], [0.0, 0.0, 0.5, 0.0, 0.0]].view())
            .unwrap();
        assert!(done);
        assert_eq!(beam.reconstruct(0).unwrap(), vec![3, 4, 2]);
        assert_eq!(beam.reconstruct(1).unwrap(), vec![4, 2, 0]);
        assert_abs_diff_eq!(beam.scores()[0], 1.3, epsilon = 1e-6);
        assert_abs_diff_eq!(beam.scores()[1], 1.2, epsilon = 1e-6);
        println!("✅ 복원된 가설: {:?}", beam.reconstruct(0).unwrap());
    }

    #[test]
    fn 밀려난_종료_슬롯_재활성화_테스트() {
        let mut beam = BeamSearcher::new(2, special()).unwrap();
        beam.advance(array![[0.5, 0.0, 0.0, 0.3], [0.0, 0.0, 0.0, 0.0]].view())
            .unwrap();
        assert_eq!(beam.active_mask(), vec![false, true]);

        // 종료 가설이 1번 자리로 밀려나면 0번 자리는 다시 활성이 된다
        beam.advance(array![[0.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.9]].view())
            .unwrap();
        assert_eq!(beam.get_current_state(), &[3, 0]);
        assert_eq!(beam.get_current_origin(), Some(&[1usize, 0][..]));
        assert_eq!(beam.active_mask(), vec![true, false]);
    }

    #[test]
    fn 무작위_테이블_불변식_테스트() {
        let mut rng = StdRng::seed_from_u64(42);
        let size = 4;
        let vocab = 10;
        let mut beam = BeamSearcher::new(size, special()).unwrap();

        for _ in 0..12 {
            let table = Array2::from_shape_fn((size, vocab), |_| rng.gen_range(0.0f32..1.0));
            let before = beam.token_history().len();
            beam.advance(table.view()).unwrap();

            assert_eq!(beam.token_history().len(), before + 1);
            assert_eq!(beam.token_history().len(), beam.backpointers().len() + 1);
            assert_eq!(beam.scores().len(), size);
            assert_eq!(beam.active_mask().len(), size);
            assert!(
                beam.scores().windows(2).all(|w| w[0] >= w[1]),
                "scores not sorted: {:?}",
                beam.scores()
            );
            for k in 0..size {
                assert_eq!(beam.reconstruct(k).unwrap(), beam.reconstruct(k).unwrap());
                assert_eq!(beam.reconstruct(k).unwrap().len(), beam.steps());
            }
        }
    }

    #[test]
    fn best_slot_멱등성_테스트() {
        let mut beam = BeamSearcher::new(3, special()).unwrap();
        beam.advance(array![
            [0.0, 0.0, 0.2, 0.5, 0.3],
            [0.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 0.0]
        ].view())
            .unwrap();

        let first = beam.best_slot();
        assert_eq!(first, beam.best_slot());
        assert_eq!(first.1, 0);
        assert_eq!(beam.sort_best().len(), 3);
        assert_eq!(beam.sort_best(), beam.sort_best());
    }

    #[test]
    fn 잘못된_입력_거부_테스트() {
        let mut beam = BeamSearcher::new(2, special()).unwrap();

        let wrong_rows = Array2::<f32>::zeros((3, 4));
        assert!(matches!(
            beam.advance(wrong_rows.view()),
            Err(CaptionError::InvalidArgument(_))
        ));

        let negative = array![[0.1, -0.5, 0.2, 0.3], [0.0, 0.0, 0.0, 0.0]];
        assert!(beam.advance(negative.view()).is_err());

        let nan = array![[0.1, f32::NAN, 0.2, 0.3], [0.0, 0.0, 0.0, 0.0]];
        assert!(beam.advance(nan.view()).is_err());

        // PAD/END 열이 없는 테이블
        let narrow = array![[0.1, 0.2], [0.3, 0.4]];
        assert!(beam.advance(narrow.view()).is_err());

        assert!(matches!(beam.reconstruct(2), Err(CaptionError::InvalidArgument(_))));

        // 실패한 호출은 상태를 바꾸지 않는다
        assert_eq!(beam.steps(), 0);
        assert_eq!(beam.token_history().len(), 1);
    }

    #[test]
    fn 첫_단계_어휘_부족_거부_테스트() {
        let mut beam = BeamSearcher::new(5, special()).unwrap();
        let table = Array2::<f32>::zeros((5, 3));
        assert!(beam.advance(table.view()).is_err());
    }

    #[test]
    fn 어텐션_기록_테스트() {
        let mut beam = BeamSearcher::new(2, special()).unwrap();
        let table = array![[0.1, 0.0, 0.1, 0.8], [0.0, 0.0, 0.0, 0.0]];

        let bad_attention = Array2::<f32>::zeros((1, 7));
        assert!(beam.advance_with_attention(table.view(), bad_attention.view()).is_err());
        assert_eq!(beam.steps(), 0);

        let attention = Array2::<f32>::ones((2, 7));
        beam.advance_with_attention(table.view(), attention.view()).unwrap();
        assert_eq!(beam.attention_history().len(), 1);
        assert_eq!(beam.attention_history()[0], attention);
    }

    #[test]
    fn top_k_안정_정렬_테스트() {
        let values = [0.2, 0.7, 0.2, f32::NEG_INFINITY, 0.7];
        assert_eq!(top_k(&values, 3), vec![1, 4, 0]);
        assert_eq!(top_k(&values, 10), vec![1, 4, 0, 2, 3]);
    }

    #[test]
    fn top_k_부분_선택_전체_정렬_일치_테스트() {
        let mut rng = StdRng::seed_from_u64(7);
        // 동점이 많도록 값을 몇 개로 제한한다
        let values: Vec<f32> = (0..200).map(|_| rng.gen_range(0..6) as f32 * 0.25).collect();

        let mut reference: Vec<usize> = (0..values.len()).collect();
        reference.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(a.cmp(&b)));

        for k in [0, 1, 5, 37, 199, 200, 250] {
            let expected: Vec<usize> = reference.iter().copied().take(k).collect();
            assert_eq!(top_k(&values, k), expected, "k = {}", k);
        }
    }
}
