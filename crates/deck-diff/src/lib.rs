//! Cheap, reconciliation-free change detection used by the watch loop's
//! incremental path.
//!
//! `changed_pages` never constructs a [`deck_reconcile::Plan`]; it only tells
//! the watch loop which positions are worth re-applying so a single-line edit
//! doesn't trigger a full reconcile over the whole deck.

use deck_model::Slide;

/// Returns the ordered, 1-indexed positions where `old` and `new` differ.
///
/// Positions beyond `old`'s length but within `new`'s are reported too
/// (newly appended slides); positions beyond `new`'s length are not (deleting
/// a trailing slide is the apply driver's concern, not the detector's).
/// A position is suppressed entirely when `new[i].freeze` is set: frozen
/// slides are never republished even if their declared content changed.
pub fn changed_pages(old: &[Slide], new: &[Slide]) -> Vec<usize> {
    let mut pages = Vec::new();
    for (zero_based, target) in new.iter().enumerate() {
        if target.freeze {
            continue;
        }
        let differs = match old.get(zero_based) {
            Some(source) => source != target,
            None => true,
        };
        if differs {
            pages.push(zero_based + 1);
        }
    }
    pages
}
