//! The reconciliation engine: pure, single-threaded, and total. Given a
//! remote slide sequence and a declared one, computes the ordered plan of
//! actions that takes one to the other.
//!
//! No I/O, no async runtime, no error type — there is nothing here that can
//! fail. Everything downstream (the apply driver, the remote adapter) is
//! where fallibility and concurrency live.

mod assignment;
mod plan;
mod priority;
mod reconcile;

pub use assignment::{assign, Assignment};
pub use plan::{generate, Action, Plan};
pub use priority::Priority;
pub use reconcile::reconcile;
