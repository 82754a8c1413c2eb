//! Convenience re-exports for common use.

pub use crate::auth::{AuthError, TokenManager};
pub use crate::config::{Credentials, ReportingConfig};
pub use crate::error::{ReportError, Result};
pub use crate::performance::{
    AccountTotals, CampaignPerformance, DailyPerformance, PerformanceService,
};
pub use crate::report::{ReportFetcher, ReportKind, ReportRequest, ReportTable};
pub use crate::util::poll::PollPolicy;
pub use tokio_util::sync::CancellationToken;
