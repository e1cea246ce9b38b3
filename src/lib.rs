pub mod config;
pub mod probe;
pub mod report;
pub mod resources;
pub mod scanners;
pub mod target;
pub mod utils;

pub use probe::{HttpProber, ProbeOutcome, ProbeRequest, Prober};
pub use resources::{MissingListPolicy, ResourceLoader};
pub use scanners::{
    run_scan, CancelToken, Candidate, Classification, Finding, ScanOptions, ScanRun,
};
pub use target::Target;
pub use utils::error::{ArgusError, ArgusResult};
