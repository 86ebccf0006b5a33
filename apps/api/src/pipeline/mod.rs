// Pipeline Engine: feedback normalization, capability policy and the
// role-gated stage/comment/note mutations applied to a Resume Record.

pub mod engine;
pub mod feedback;
pub mod policy;
