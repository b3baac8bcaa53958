//! Tests for the candidate set reference counting.

#[cfg(test)]
mod tests {
    use super::super::candidates::GrabCandidates;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    #[test]
    fn test_enter_exit_single() {
        let mut candidates = GrabCandidates::new();

        assert_eq!(candidates.enter(7u32), 1);
        assert!(candidates.contains(7));

        assert_eq!(candidates.exit(7), Some(0));
        assert!(!candidates.contains(7));
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_multiple_colliders_keep_candidate() {
        let mut candidates = GrabCandidates::new();

        // Два коллайдера одного объекта
        candidates.enter(3u32);
        candidates.enter(3);
        assert_eq!(candidates.count(3), 2);

        // Один вышел: всё ещё кандидат
        assert_eq!(candidates.exit(3), Some(1));
        assert!(candidates.contains(3));

        assert_eq!(candidates.exit(3), Some(0));
        assert!(!candidates.contains(3));
    }

    #[test]
    fn test_untracked_exit_is_noop() {
        let mut candidates = GrabCandidates::new();
        candidates.enter(1u32);

        assert_eq!(candidates.exit(99), None);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates.count(99), 0);
    }

    #[test]
    fn test_iteration_order_is_sorted() {
        let mut candidates = GrabCandidates::new();
        for key in [5u32, 1, 3] {
            candidates.enter(key);
        }

        let keys: Vec<_> = candidates.iter().collect();
        assert_eq!(keys, vec![1, 3, 5]);
    }

    #[test]
    fn test_random_sequences_match_net_count() {
        // Модель: net = enters - exits (exit неизвестного игнорируется → net не уходит в минус)
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _run in 0..20 {
            let mut candidates = GrabCandidates::new();
            let mut model: HashMap<u32, u32> = HashMap::new();

            for _step in 0..500 {
                let key = rng.gen_range(0..6u32);
                if rng.gen_bool(0.5) {
                    candidates.enter(key);
                    *model.entry(key).or_insert(0) += 1;
                } else {
                    candidates.exit(key);
                    if let Some(count) = model.get_mut(&key) {
                        *count -= 1;
                        if *count == 0 {
                            model.remove(&key);
                        }
                    }
                }

                for key in 0..6u32 {
                    let expected = model.get(&key).copied().unwrap_or(0);
                    assert_eq!(candidates.count(key), expected);
                    assert_eq!(candidates.contains(key), expected > 0);
                }
            }
        }
    }

    #[test]
    fn test_clear() {
        let mut candidates = GrabCandidates::new();
        candidates.enter(1u32);
        candidates.enter(2);

        candidates.clear();

        assert!(candidates.is_empty());
        assert_eq!(candidates.exit(1), None);
    }
}
