//! Weighted proposer rotation over long runs.

#[cfg(test)]
mod tests {
    use crate::integration::support::validator;
    use std::collections::HashMap;
    use zena_types::{Address, ValidatorSet};

    fn selection_counts(set: &mut ValidatorSet, steps: u64) -> HashMap<Address, u64> {
        let mut counts: HashMap<Address, u64> = HashMap::new();
        for _ in 0..steps {
            let proposer = set.increment_proposer_priority(1).unwrap();
            *counts.entry(proposer.address).or_default() += 1;
        }
        counts
    }

    #[test]
    fn test_two_unequal_validators_split_101_slots() {
        // Powers 100 and 1: over 101 steps the heavy validator proposes
        // 100 times and the light one once.
        let mut set = ValidatorSet::new(vec![validator(1, 0xaa, 100), validator(2, 0xbb, 1)]);
        let counts = selection_counts(&mut set, 101);

        assert_eq!(counts[&Address::repeat_byte(0xaa)], 100);
        assert_eq!(counts[&Address::repeat_byte(0xbb)], 1);

        // Priorities return to a centered position after a full cycle.
        let sum: i64 = set.validators().iter().map(|v| v.proposer_priority).sum();
        assert_eq!(sum, 0);
    }

    #[test]
    fn test_selection_is_power_proportional() {
        let mut set = ValidatorSet::new(vec![
            validator(1, 0x01, 4),
            validator(2, 0x02, 2),
            validator(3, 0x03, 1),
        ]);
        let total = set.total_voting_power() as u64;
        let counts = selection_counts(&mut set, total);

        assert_eq!(counts[&Address::repeat_byte(0x01)], 4);
        assert_eq!(counts[&Address::repeat_byte(0x02)], 2);
        assert_eq!(counts[&Address::repeat_byte(0x03)], 1);
    }

    #[test]
    fn test_rotation_is_deterministic() {
        let seed = vec![
            validator(1, 0x01, 7),
            validator(2, 0x02, 3),
            validator(3, 0x03, 3),
        ];
        let mut left = ValidatorSet::new(seed.clone());
        let mut right = ValidatorSet::new(seed);

        for _ in 0..50 {
            let a = left.increment_proposer_priority(1).unwrap();
            let b = right.increment_proposer_priority(1).unwrap();
            assert_eq!(a.address, b.address);
        }
    }

    #[test]
    fn test_update_preserves_priorities_for_surviving_validators() {
        let mut set = ValidatorSet::new(vec![validator(1, 0x01, 10), validator(2, 0x02, 10)]);
        set.increment_proposer_priority(3);

        let updated = set.update(vec![
            validator(1, 0x01, 10),
            validator(2, 0x02, 10),
            validator(3, 0x03, 5),
        ]);

        assert_eq!(updated.len(), 3);
        let sum: i64 = updated.validators().iter().map(|v| v.proposer_priority).sum();
        assert_eq!(sum, 0);
    }
}
