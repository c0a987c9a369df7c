//! I/O results around files below `$HELM_HOME` and the plugins root

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

pub trait IoResultExt<T> {
    /// `OperationFailed` naming what was attempted on which path.
    ///
    /// ```ignore
    /// fs.create_dir_all(&dir).with_path_context("create directory", &dir)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;

    /// A missing file becomes `Ok(None)`; other failures are kept.
    fn optional(self) -> io::Result<Option<T>>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{} {}", action, path.display()),
            source: Box::new(e),
        })
    }

    fn optional(self) -> io::Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_missing_file_when_optional_then_none() {
        let missing: io::Result<String> = Err(io::Error::from(io::ErrorKind::NotFound));
        assert!(missing.optional().unwrap().is_none());

        let denied: io::Result<String> = Err(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(denied.optional().is_err());
    }

    #[test]
    fn given_io_error_when_adding_context_then_names_action_and_path() {
        let failed: io::Result<()> = Err(io::Error::from(io::ErrorKind::PermissionDenied));

        let err = failed
            .with_path_context("write", Path::new("/h/repository/repositories.yaml"))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "operation failed: write /h/repository/repositories.yaml"
        );
    }
}
