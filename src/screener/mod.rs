// =============================================================================
// Screening Engine
// =============================================================================
//
// Criteria evaluation, report assembly, and the bulk orchestrator. The
// division of failure semantics lives here: the orchestrator's bulk path is
// best-effort (per-symbol errors become observed skips), while report
// assembly on a single known symbol is invoked by fail-loud callers that
// surface fetch errors directly.

pub mod criteria;
pub mod orchestrator;
pub mod report;

pub use criteria::{MaCriterion, MacdCriterion, RsiCriterion, ScreenCriteria};
pub use orchestrator::{screen, screen_with_observer, ScanObserver, SkipReason, MIN_SCREEN_BARS};
pub use report::{indicator_report, ReportFamilies};
