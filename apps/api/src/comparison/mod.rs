// Comparison Selector: same-posting pairing, recommendation and the
// side-by-side score table.

pub mod handlers;
pub mod report;
pub mod selector;
