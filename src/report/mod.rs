//! Report generation workflow: request documents, SOAP exchange, job
//! polling, artifact download and CSV parsing.

pub mod download;
pub mod fetcher;
pub mod job;
pub mod request;
pub mod soap;
pub mod table;

pub use fetcher::ReportFetcher;
pub use job::{ReportJob, ReportStatus};
pub use request::{Aggregation, ReportDate, ReportKind, ReportRequest};
pub use table::{ReportRow, ReportTable};
