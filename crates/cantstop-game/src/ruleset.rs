//! Registry of game variants.
//!
//! A [`RuleSet`] is plain immutable data: how many dice, how long each
//! path is, how the dice may be split into groups, and when a player
//! wins. Variants are looked up by index with [`RuleSet::get`].

use crate::GameError;

/// Path length marking a path that doesn't exist in this variant.
pub const DISABLED_PATH: i8 = -1;

/// How a grouping of dice turns into candidate actions.
///
/// The set of strategies is closed: every registered variant picks one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStrategy {
    /// Two groups, each summed to a path index. The combined move wins
    /// when legal; otherwise each group is offered on its own.
    TwoGroups,
}

impl ActionStrategy {
    /// Returns the legal actions for one grouping.
    ///
    /// `is_valid` decides whether an ordered list of path indices may be
    /// applied from the current state. A combined action is never
    /// offered alongside the single-group actions it is built from.
    pub fn actions(
        self,
        grouping: &[Vec<u8>],
        mut is_valid: impl FnMut(&[usize]) -> bool,
    ) -> Vec<Vec<usize>> {
        match self {
            Self::TwoGroups => {
                let [first, second] = grouping else {
                    return Vec::new();
                };
                let (a, b) = (group_sum(first), group_sum(second));
                if is_valid(&[a, b]) {
                    return vec![vec![a, b]];
                }
                let mut actions = Vec::with_capacity(2);
                if is_valid(&[a]) {
                    actions.push(vec![a]);
                }
                if is_valid(&[b]) {
                    actions.push(vec![b]);
                }
                actions
            }
        }
    }
}

fn group_sum(group: &[u8]) -> usize {
    group.iter().map(|&d| usize::from(d)).sum()
}

/// Immutable parameters of one game variant.
#[derive(Debug)]
pub struct RuleSet {
    pub name: &'static str,
    /// Maximum number of distinct paths with uncommitted progress.
    pub num_temp_paths: usize,
    /// Completed paths needed to win.
    pub goal: usize,
    /// Faces of each die.
    pub dice: &'static [u8],
    /// Length of each path; [`DISABLED_PATH`] for unused indices.
    pub path_lengths: &'static [i8],
    /// Ways to split the dice (by position) into groups.
    pub partitions: &'static [&'static [&'static [usize]]],
    pub strategy: ActionStrategy,
}

static RULESETS: [RuleSet; 2] = [
    RuleSet {
        name: "classic",
        num_temp_paths: 3,
        goal: 3,
        dice: &[6, 6, 6, 6],
        path_lengths: &[-1, -1, 3, 5, 7, 9, 11, 13, 11, 9, 7, 5, 3],
        partitions: &[
            &[&[0, 1], &[2, 3]],
            &[&[0, 2], &[1, 3]],
            &[&[0, 3], &[1, 2]],
        ],
        strategy: ActionStrategy::TwoGroups,
    },
    RuleSet {
        name: "quick",
        num_temp_paths: 2,
        goal: 2,
        dice: &[6, 6],
        path_lengths: &[-1, 6, 6, 6, 6, 6, 6],
        partitions: &[&[&[0], &[1]]],
        strategy: ActionStrategy::TwoGroups,
    },
];

impl RuleSet {
    /// Looks up a variant by index.
    pub fn get(index: usize) -> Result<&'static RuleSet, GameError> {
        RULESETS.get(index).ok_or(GameError::RuleSetNotFound(index))
    }

    /// Number of registered variants.
    pub fn count() -> usize {
        RULESETS.len()
    }

    pub fn dice_count(&self) -> usize {
        self.dice.len()
    }

    /// Returns `true` if `path` exists in this variant.
    pub fn is_enabled(&self, path: usize) -> bool {
        self.path_lengths
            .get(path)
            .is_some_and(|&len| len != DISABLED_PATH)
    }

    /// Applies every partition to a roll, producing one grouping of dice
    /// values per partition, in registry order.
    pub fn groupings(&self, points: &[u8]) -> Vec<Vec<Vec<u8>>> {
        self.partitions
            .iter()
            .map(|partition| {
                partition
                    .iter()
                    .map(|part| {
                        part.iter()
                            .filter_map(|&i| points.get(i).copied())
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_known_and_unknown_index() {
        assert_eq!(RuleSet::get(0).unwrap().name, "classic");
        assert_eq!(RuleSet::get(1).unwrap().name, "quick");
        assert!(matches!(
            RuleSet::get(2),
            Err(GameError::RuleSetNotFound(2))
        ));
        assert_eq!(RuleSet::count(), 2);
    }

    #[test]
    fn test_every_partition_covers_every_die_once() {
        for index in 0..RuleSet::count() {
            let rules = RuleSet::get(index).unwrap();
            for partition in rules.partitions {
                let mut used: Vec<usize> =
                    partition.iter().flat_map(|p| p.iter().copied()).collect();
                used.sort_unstable();
                let expected: Vec<usize> = (0..rules.dice_count()).collect();
                assert_eq!(used, expected, "ruleset {}", rules.name);
            }
        }
    }

    #[test]
    fn test_every_reachable_sum_is_an_enabled_path() {
        for index in 0..RuleSet::count() {
            let rules = RuleSet::get(index).unwrap();
            let group_size = rules.partitions[0][0].len();
            let lo = group_size;
            let hi = group_size * usize::from(rules.dice[0]);
            for sum in lo..=hi {
                assert!(rules.is_enabled(sum), "{} sum {sum}", rules.name);
            }
        }
    }

    #[test]
    fn test_groupings_follow_partitions() {
        let rules = RuleSet::get(0).unwrap();
        let groupings = rules.groupings(&[1, 2, 3, 4]);
        assert_eq!(
            groupings,
            vec![
                vec![vec![1, 2], vec![3, 4]],
                vec![vec![1, 3], vec![2, 4]],
                vec![vec![1, 4], vec![2, 3]],
            ]
        );
    }

    #[test]
    fn test_is_enabled() {
        let rules = RuleSet::get(0).unwrap();
        assert!(!rules.is_enabled(0));
        assert!(!rules.is_enabled(1));
        assert!(rules.is_enabled(7));
        assert!(!rules.is_enabled(13));
    }

    // =====================================================================
    // ActionStrategy
    // =====================================================================

    #[test]
    fn test_two_groups_combined_move_takes_precedence() {
        let actions = ActionStrategy::TwoGroups
            .actions(&[vec![3, 4], vec![1, 1]], |_| true);
        assert_eq!(actions, vec![vec![7, 2]]);
    }

    #[test]
    fn test_two_groups_falls_back_to_singles() {
        let actions = ActionStrategy::TwoGroups
            .actions(&[vec![3, 4], vec![1, 1]], |a| a.len() == 1);
        assert_eq!(actions, vec![vec![7], vec![2]]);
    }

    #[test]
    fn test_two_groups_keeps_equal_singles() {
        let actions = ActionStrategy::TwoGroups
            .actions(&[vec![3, 3], vec![3, 3]], |a| a.len() == 1);
        assert_eq!(actions, vec![vec![6], vec![6]]);
    }

    #[test]
    fn test_two_groups_only_legal_single() {
        let actions = ActionStrategy::TwoGroups
            .actions(&[vec![6, 6], vec![1, 1]], |a| a == [2]);
        assert_eq!(actions, vec![vec![2]]);
    }

    #[test]
    fn test_two_groups_nothing_legal() {
        let actions = ActionStrategy::TwoGroups
            .actions(&[vec![6], vec![6]], |_| false);
        assert!(actions.is_empty());
    }
}
