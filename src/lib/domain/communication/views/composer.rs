//! Body composer

use std::{fmt, sync::Arc};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::domain::communication::mailer::{BodyPart, MediaKind, Message};

use super::{ComposeError, RenderError, Renderer};

/// How a message body is composed
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ComposeOptions {
    /// Layout the HTML view is wrapped in
    pub layout: Option<String>,

    /// Strip leading and trailing whitespace from each rendered variant
    pub trim: bool,

    /// Inline `<style>` rules into the HTML variant's elements
    pub inline_css: bool,
}

/// Renders the plain-text and HTML variants of a message body.
///
/// The plain-text view is `<view>.txt`, the HTML view `<view>.html`. Either may
/// be missing, but not both.
pub struct BodyComposer<R>
where
    R: Renderer,
{
    renderer: Arc<R>,
}

impl<R> BodyComposer<R>
where
    R: Renderer,
{
    /// Creates a new body composer.
    pub fn new(renderer: Arc<R>) -> Self {
        Self { renderer }
    }

    /// Renders `view` with `model` and attaches the results to `message`.
    ///
    /// # Arguments
    /// * `message` - The [`Message`] the body variants are attached to.
    /// * `view` - The view identifier, without extension.
    /// * `model` - The model both views are rendered with.
    /// * `options` - The [`ComposeOptions`] to apply.
    ///
    /// # Returns
    /// - [`Ok`] if at least one variant was attached.
    /// - [`Err`] with [`ComposeError::NoViewsFound`] if neither view exists.
    /// - [`Err`] with [`ComposeError::CompositionFault`] if an existing view failed to render.
    ///
    /// On error `message` is left untouched.
    pub fn compose(
        &self,
        message: &mut Message,
        view: &str,
        model: &Value,
        options: &ComposeOptions,
    ) -> Result<(), ComposeError> {
        if view.trim().is_empty() {
            return Err(ComposeError::InvalidArgument(
                "view identifier is empty".to_string(),
            ));
        }

        let mut search_path = Vec::new();

        let text_view = format!("{view}.{}", MediaKind::PlainText.extension());
        let text = match self.resolve(&text_view, model, None, &mut search_path)? {
            Some(text) => Some(encode(
                message,
                MediaKind::PlainText,
                &text_view,
                &finish(text, options.trim),
            )?),
            None => None,
        };

        let layout = options.layout.as_deref();

        if let Some(layout) = layout {
            self.warm_layout(layout);
        }

        let html_view = format!("{view}.{}", MediaKind::Html.extension());
        let html = match self.resolve(&html_view, model, layout, &mut search_path)? {
            Some(html) => {
                let mut html = finish(html, options.trim);

                if options.inline_css {
                    html = css_inline::inline(&html).map_err(|err| {
                        ComposeError::CompositionFault {
                            view: html_view.clone(),
                            detail: err.to_string(),
                        }
                    })?;
                }

                Some(encode(message, MediaKind::Html, &html_view, &html)?)
            }
            None => None,
        };

        if text.is_none() && html.is_none() {
            return Err(ComposeError::NoViewsFound {
                view: view.to_string(),
                search_path,
            });
        }

        // Nothing reaches the message until both variants have resolved.
        for (kind, part) in [(MediaKind::PlainText, text), (MediaKind::Html, html)] {
            match part {
                Some(part) => message.insert(part),
                None => {
                    debug!(view, %kind, "no view for variant, dropping any previous one");
                    message.remove(kind);
                }
            }
        }

        Ok(())
    }

    fn resolve(
        &self,
        view: &str,
        model: &Value,
        layout: Option<&str>,
        search_path: &mut Vec<String>,
    ) -> Result<Option<String>, ComposeError> {
        match self.renderer.render(view, model, layout) {
            Ok(rendered) => Ok(Some(rendered)),
            Err(RenderError::NotFound { searched, .. }) => {
                debug!(view, "view not found");

                search_path.extend(searched);

                Ok(None)
            }
            Err(err @ RenderError::Fault { .. }) => Err(err.into()),
        }
    }

    /// Resolves the layout once with an empty model so the renderer has it
    /// loaded before the real render. Failures are left to that render.
    fn warm_layout(&self, layout: &str) {
        let empty = Value::Object(Map::new());

        if let Err(err) = self.renderer.render(layout, &empty, None) {
            debug!(layout, error = %err, "layout pre-resolution failed");
        }
    }
}

impl<R> Clone for BodyComposer<R>
where
    R: Renderer,
{
    fn clone(&self) -> Self {
        Self {
            renderer: Arc::clone(&self.renderer),
        }
    }
}

impl<R> fmt::Debug for BodyComposer<R>
where
    R: Renderer,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyComposer")
            .field("renderer", &"Renderer")
            .finish()
    }
}

fn encode(
    message: &Message,
    kind: MediaKind,
    view: &str,
    text: &str,
) -> Result<BodyPart, ComposeError> {
    message
        .encode(kind, text)
        .map_err(|err| ComposeError::CompositionFault {
            view: view.to_string(),
            detail: err.to_string(),
        })
}

fn finish(rendered: String, trim: bool) -> String {
    if trim {
        rendered.trim().to_string()
    } else {
        rendered
    }
}
