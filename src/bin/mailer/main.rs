#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Composes a message from views and delivers it

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use mail_composer::{
    domain::communication::{
        email_addresses::EmailAddress,
        mailer::{DeliveryHelper, Interceptor, Message, Sender},
        views::{BodyComposer, ComposeOptions},
    },
    infrastructure::{
        email::{
            log::LogSender,
            smtp::{SmtpConfig, SmtpSender},
        },
        interceptors::{AuditInterceptor, InterceptorChain, SuppressingInterceptor},
        views::templates::{TemplateRenderer, ViewsConfig},
    },
};

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
pub struct Args {
    /// The sender address
    #[clap(long, env = "MAIL_FROM")]
    pub from: String,

    /// A recipient address, may be repeated
    #[clap(long, required = true)]
    pub to: Vec<String>,

    /// The subject line
    #[clap(long)]
    pub subject: String,

    /// The view identifier, without extension
    #[clap(long)]
    pub view: String,

    /// The model, as JSON
    #[clap(long, default_value = "{}")]
    pub model: String,

    /// The layout the HTML view is wrapped in
    #[clap(long)]
    pub layout: Option<String>,

    /// Trim whitespace around each rendered variant
    #[clap(long)]
    pub trim: bool,

    /// Inline CSS into the HTML variant
    #[clap(long)]
    pub inline_css: bool,

    /// Log the message instead of sending it over SMTP
    #[clap(long)]
    pub dry_run: bool,

    /// Cancel every delivery
    #[clap(long, env = "MAIL_SUPPRESS_DELIVERY")]
    pub suppress_delivery: bool,

    /// The SMTP configuration
    #[clap(flatten)]
    pub smtp: SmtpConfig,

    /// The views configuration
    #[clap(flatten)]
    pub views: ViewsConfig,
}

#[mutants::skip]
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt::init();

    let args = Args::parse();

    let mut interceptors = InterceptorChain::new().with(AuditInterceptor);

    if args.suppress_delivery {
        interceptors = interceptors.with(SuppressingInterceptor);
    }

    if args.dry_run {
        run(&args, LogSender, interceptors).await
    } else {
        run(&args, SmtpSender::new(args.smtp.clone()), interceptors).await
    }
}

async fn run<S, I>(args: &Args, sender: S, interceptor: I) -> Result<()>
where
    S: Sender,
    I: Interceptor,
{
    let mut recipients = args.to.iter().map(|to| EmailAddress::new(to));

    let first = recipients
        .next()
        .context("at least one recipient is required")??;

    let mut message = Message::new(EmailAddress::new(&args.from)?, first, &args.subject);

    for to in recipients {
        message.add_recipient(to?);
    }

    let model: serde_json::Value =
        serde_json::from_str(&args.model).context("model is not valid JSON")?;

    let options = ComposeOptions {
        layout: args.layout.clone(),
        trim: args.trim,
        inline_css: args.inline_css,
    };

    let composer = BodyComposer::new(Arc::new(TemplateRenderer::from_directory(
        &args.views.templates_dir,
    )));

    composer.compose(&mut message, &args.view, &model, &options)?;

    let helper = DeliveryHelper::new(Arc::new(sender), Arc::new(interceptor));

    let delivery = helper.deliver_async(message).await?;

    info!(sent = delivery.is_sent(), "done");

    Ok(())
}
