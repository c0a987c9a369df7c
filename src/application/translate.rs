//! Rewrites remote-call failures into the message the remote side supplied.

use crate::application::ApplicationError;

/// Strip transport framing from remote failures. Other errors pass through.
pub fn translate(err: ApplicationError) -> ApplicationError {
    match err {
        ApplicationError::Remote(remote) => ApplicationError::Release {
            kind: remote.kind,
            message: remote.description,
        },
        other => other,
    }
}

/// `translate` lifted over an optional error.
pub fn pretty_error(err: Option<ApplicationError>) -> Option<ApplicationError> {
    err.map(translate)
}
