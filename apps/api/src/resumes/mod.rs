// Resume lifecycle: upload and scoring, persistence, listing and reports.

pub mod handlers;
pub mod listing;
pub mod report;
pub mod repository;
pub mod upload;
