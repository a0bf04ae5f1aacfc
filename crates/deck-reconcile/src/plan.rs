use crate::assignment::Assignment;
use deck_model::Slide;

/// One step of a reconciliation plan. Indices are always expressed against
/// the live remote sequence *at the moment the action fires*, after every
/// earlier action in the plan has already taken effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Append { slide: Slide },
    Insert { slide: Slide, at: usize },
    Update { index: usize, slide: Slide },
    Move { from: usize, to: usize },
    Delete { index: usize },
}

/// The ordered sequence of actions that takes the remote sequence from
/// `before` to `after`.
pub type Plan = Vec<Action>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Slot {
    Existing(usize),
    Fresh,
}

/// Generates the plan for a computed assignment.
///
/// Implements the four-phase ordering: all moves, then all updates, then all
/// inserts/appends, then all deletes (descending). Moves and inserts are
/// simulated against a reference sequence of slots so every index handed to
/// the caller is the true live index at fire time, never recomputed by the
/// caller.
pub fn generate(before: &[Slide], after: &[Slide], sigma: &Assignment) -> Plan {
    let matched: Vec<usize> = (0..after.len()).filter(|&i| sigma[i].is_some()).collect();
    let mut rank_of = vec![0usize; after.len()];
    for (rank, &i) in matched.iter().enumerate() {
        rank_of[i] = rank;
    }

    let mut actions = Vec::new();
    let mut live: Vec<Slot> = (0..before.len()).map(Slot::Existing).collect();

    // Phase 1: moves. Each matched source is relocated to its rank among
    // matched targets — the position it would hold in a sequence containing
    // only the before-elements, since the new slides phase 3 will insert
    // don't exist yet at this point in real execution.
    for &i in &matched {
        let j = sigma[i].expect("matched position has a source");
        let dest = rank_of[i];
        let cur = live
            .iter()
            .position(|slot| *slot == Slot::Existing(j))
            .expect("source slide still present");
        if cur != dest {
            actions.push(Action::Move { from: cur, to: dest });
            let slot = live.remove(cur);
            live.insert(dest, slot);
        }
    }

    // Phase 2: updates. After phase 1, the matched source for target `i`
    // sits at live index `rank_of[i]` — its rank among matched targets, not
    // `i` itself, since unmatched targets before it haven't been inserted
    // yet at this point in real execution.
    for &i in &matched {
        let j = sigma[i].expect("matched position has a source");
        if before[j] != after[i] {
            actions.push(Action::Update {
                index: rank_of[i],
                slide: after[i].clone(),
            });
        }
    }

    // Phase 3: inserts/appends, ascending. `live.len()` is the true current
    // length of the remote sequence, including not-yet-deleted leftovers
    // from `before` that phase 4 will remove.
    for i in 0..after.len() {
        if sigma[i].is_some() {
            continue;
        }
        if i == live.len() {
            actions.push(Action::Append {
                slide: after[i].clone(),
            });
        } else {
            actions.push(Action::Insert {
                slide: after[i].clone(),
                at: i,
            });
        }
        live.insert(i.min(live.len()), Slot::Fresh);
    }

    // Phase 4: deletes, descending. Any before-index never claimed by sigma
    // is still sitting in `live` wherever phases 1-3 left it.
    let used: std::collections::HashSet<usize> = sigma.iter().filter_map(|&s| s).collect();
    let mut delete_positions: Vec<usize> = (0..before.len())
        .filter(|j| !used.contains(j))
        .map(|j| {
            live.iter()
                .position(|slot| *slot == Slot::Existing(j))
                .expect("unmatched source still present")
        })
        .collect();
    delete_positions.sort_unstable_by(|a, b| b.cmp(a));
    for index in delete_positions {
        actions.push(Action::Delete { index });
    }

    actions
}
