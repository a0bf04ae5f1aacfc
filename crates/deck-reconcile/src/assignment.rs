use crate::priority::Priority;
use deck_model::Slide;

/// `sigma[i]` is `Some(j)` when target position `i` in `after` reuses the
/// slide currently at `j` in `before`, or `None` when `i` is a brand new
/// slide with no reusable source.
pub type Assignment = Vec<Option<usize>>;

/// Computes the assignment `sigma: positions in after -> positions in before
/// ∪ {NEW}` per the three policies in the reconciliation engine's spec:
///
/// 1. Exact-match pairs (priority 1) are committed first, in order of `i`.
/// 2. Remaining positions are filled tier by tier (priority 2..6, ascending)
///    in order of `i`; a source already claimed by a better tier is no
///    longer available, which is exactly what keeps priority 4-6 sources
///    from being "stolen" away from a pair that dominates them.
/// 3. When several sources tie on priority for the same target, the one
///    whose position is closest to the target's position wins; remaining
///    ties are broken by the lowest source index.
pub fn assign(before: &[Slide], after: &[Slide]) -> Assignment {
    let len_a = after.len();
    let len_b = before.len();

    let mut sigma: Assignment = vec![None; len_a];
    let mut used = vec![false; len_b];

    for tier in Priority::REUSE_TIERS {
        for i in 0..len_a {
            if sigma[i].is_some() {
                continue;
            }
            let mut best: Option<usize> = None;
            for j in 0..len_b {
                if used[j] {
                    continue;
                }
                if Priority::score(&before[j], &after[i]) != tier {
                    continue;
                }
                best = Some(match best {
                    None => j,
                    Some(cur) => {
                        let cur_dist = cur.abs_diff(i);
                        let j_dist = j.abs_diff(i);
                        if j_dist < cur_dist || (j_dist == cur_dist && j < cur) {
                            j
                        } else {
                            cur
                        }
                    }
                });
            }
            if let Some(j) = best {
                sigma[i] = Some(j);
                used[j] = true;
            }
        }
    }

    sigma
}
