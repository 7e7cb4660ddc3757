//! Result adapters that attach the offending path to campaign-loading errors.

use std::fmt::Display;
use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Turns filesystem failures into [`ApplicationError::OperationFailed`].
pub trait IoResultExt<T> {
    /// `action` reads like a verb phrase, e.g. "scan data directory".
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{}: {}", action, path.display()),
            source: Box::new(e),
        })
    }
}

/// Turns parse and validation failures inside an export file into
/// [`ApplicationError::InvalidCampaignFile`].
pub trait CampaignFileResultExt<T> {
    fn in_campaign_file(self, path: &Path) -> ApplicationResult<T>;
}

impl<T, E: Display> CampaignFileResultExt<T> for Result<T, E> {
    fn in_campaign_file(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::InvalidCampaignFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}
