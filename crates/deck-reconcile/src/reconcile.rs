use crate::assignment::assign;
use crate::plan::{generate, Plan};
use deck_model::Slide;

/// Computes the plan that takes a remote sequence from `before` to `after`.
///
/// Pure and total: no I/O, no async runtime, no error path. Calling this
/// twice with the same inputs always returns byte-identical plans.
pub fn reconcile(before: &[Slide], after: &[Slide]) -> Plan {
    let sigma = assign(before, after);
    generate(before, after, &sigma)
}
