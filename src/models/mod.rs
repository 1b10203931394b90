pub mod enums;
mod feedback;
mod profile;
mod report;
mod share;

pub use enums::{ReportStatus, Role};
pub use feedback::*;
pub use profile::*;
pub use report::*;
pub use share::*;
