mod pipeline;

pub use pipeline::{FileFailure, InstallPipeline, InstallReport, InstallTarget, ModInstallSummary};
