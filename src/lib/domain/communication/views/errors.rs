//! View errors

use thiserror::Error;
use tracing::debug;

/// Errors a [`Renderer`](super::Renderer) can report
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    /// No template exists for the view
    #[error("view \"{view}\" not found")]
    NotFound {
        /// The view identifier that was asked for
        view: String,

        /// The locations that were searched
        searched: Vec<String>,
    },

    /// The template exists but could not be rendered
    #[error("could not render view \"{view}\": {detail}")]
    Fault {
        /// The view identifier that was asked for
        view: String,

        /// The diagnostic reported by the template engine
        detail: String,
    },
}

/// Errors that can occur when composing a message body
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComposeError {
    /// A required input is missing
    #[error("invalid composition request: {0}")]
    InvalidArgument(String),

    /// Neither a plain-text nor an HTML view exists
    #[error("no views found for \"{view}\", searched: {}", .search_path.join(", "))]
    NoViewsFound {
        /// The view identifier, without extension
        view: String,

        /// Every location that was searched
        search_path: Vec<String>,
    },

    /// A view exists but rendering it failed
    #[error("failed to compose \"{view}\": {detail}")]
    CompositionFault {
        /// The view identifier, with extension
        view: String,

        /// The diagnostic reported by the renderer
        detail: String,
    },
}

impl From<RenderError> for ComposeError {
    fn from(err: RenderError) -> Self {
        debug!("RenderError -> ComposeError");

        match err {
            RenderError::NotFound { view, searched } => ComposeError::NoViewsFound {
                view: view
                    .rsplit_once('.')
                    .map_or(view.as_str(), |(stem, _)| stem)
                    .to_string(),
                search_path: searched,
            },
            RenderError::Fault { view, detail } => ComposeError::CompositionFault { view, detail },
        }
    }
}
