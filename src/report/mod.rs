pub mod builder;
pub mod selection;

pub use builder::{
    Report, ReportBuilder, ReportExtras, ReportImage, ReportJob, ReportOptions, ReportProperty,
    ReportSection, ReportTotals,
};
pub use selection::{CheckState, ReportSelection};
