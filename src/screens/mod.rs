pub mod dashboard;

// The monitor has a single screen:
// - Header with title and timestamp
// - Infrastructure and application service tables
// - Aggregate counts with the overall summary
// - Warnings for degraded cycles (runtime unreachable, ambiguous or late lookups)
// - Footer with the cycle timing

pub use dashboard::{CycleTiming, Dashboard, DashboardFrame};
