//! Startup helpers for the standalone messenger view.
//!
//! A terminal front end over [`WidgetSession`]: the same runtime that backs
//! an embedded widget, driven line-by-line. Configured entirely through
//! environment variables so it can point at any widget API deployment.

use std::process::ExitCode;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::api::{ClientConfig, HttpWidgetClient, WidgetApi};
use crate::conversation::MessageRole;
use crate::forms::{FieldKind, FormFill, FormSchema};
use crate::identity::{IdentityStore, MemoryIdentityStore, SqliteIdentityStore, TenantKey};
use crate::markup::MarkupRenderer;
use crate::session::{EndReason, FormOutcome, SubmitBlocked, WidgetSession};

/// Run the messenger (used by the `chatframe-messenger` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on a clean exit, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    tracing::info!("Starting chatframe messenger v{}", env!("CARGO_PKG_VERSION"));

    let base_url = std::env::var("CHATFRAME_API_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string());
    let tenant = std::env::var("CHATFRAME_TENANT").unwrap_or_else(|_| "default".to_string());
    let data_path = std::env::var("CHATFRAME_DATA_PATH").ok();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(run_messenger(base_url, tenant, data_path)) {
        tracing::error!("Messenger error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Open the identity store: durable when a data path is configured and
/// usable, otherwise in-memory for this run.
async fn open_store(data_path: Option<String>) -> Arc<dyn IdentityStore> {
    if let Some(path) = data_path {
        match SqliteIdentityStore::open_at(&path).await {
            Ok(store) => return Arc::new(store),
            Err(e) => {
                tracing::warn!("durable identity store unavailable at {path}: {e}");
            }
        }
    }
    Arc::new(MemoryIdentityStore::new())
}

async fn run_messenger(
    base_url: String,
    tenant: String,
    data_path: Option<String>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let tenant = TenantKey::new(tenant)?;
    let api: Arc<dyn WidgetApi> =
        Arc::new(HttpWidgetClient::new(ClientConfig::new().with_base_url(base_url))?);
    let store = open_store(data_path).await;

    let mut session = WidgetSession::open(tenant, store, api).await?;
    let renderer = MarkupRenderer::new()?;
    let render_html = std::env::var("CHATFRAME_HTML").is_ok_and(|v| v == "1");

    println!("=== {} ===", session.config().name);
    for (i, faq) in session.config().faqs.iter().enumerate() {
        println!("  /faq {}  {}", i + 1, faq.question);
    }
    println!("  /form    fill the pending form   /end    end the chat");

    let mut printed = 0;
    print_new_entries(&session, &mut printed, &renderer, render_html);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let Some(line) = lines.next_line().await? else {
            // EOF: component teardown without an explicit end.
            session.end(EndReason::Teardown).await;
            break;
        };
        let line = line.trim().to_string();

        if line == "/end" {
            session.end(EndReason::UserAction).await;
            println!("(conversation ended)");
            printed = 0;
        } else if let Some(arg) = line.strip_prefix("/faq ") {
            match arg.trim().parse::<usize>() {
                Ok(n) if n >= 1 => {
                    if let Err(e) = session.ask_faq(n - 1).await {
                        println!("({e})");
                    }
                }
                _ => println!("(usage: /faq N)"),
            }
        } else if line == "/form" {
            fill_and_submit(&mut session, &mut lines).await?;
        } else if !line.is_empty() {
            if let Err(e) = session.send_text(&line).await {
                println!("({e})");
            }
        }

        print_new_entries(&session, &mut printed, &renderer, render_html);
    }

    Ok(())
}

/// Print transcript entries appended since the last call.
fn print_new_entries(
    session: &WidgetSession,
    printed: &mut usize,
    renderer: &MarkupRenderer,
    render_html: bool,
) {
    for message in session.transcript().iter().skip(*printed) {
        let who = match message.role {
            MessageRole::Visitor => "you",
            MessageRole::Agent => "agent",
        };
        if render_html && message.role == MessageRole::Agent {
            println!("{who}: {}", renderer.render(&message.content));
        } else {
            println!("{who}: {}", message.content);
        }
        if let Some(form) = &message.attached_form {
            print_form(form);
        }
    }
    *printed = session.transcript().len();
}

fn print_form(form: &FormSchema) {
    println!("-- form: {} --", form.title);
    for field in &form.fields {
        let required = if field.required { " (required)" } else { "" };
        match &field.options {
            Some(options) => println!("  {}{}: one of {:?}", field.label, required, options),
            None => println!("  {}{}", field.label, required),
        }
    }
}

/// Prompt for each field of the pending form and submit it.
async fn fill_and_submit(
    session: &mut WidgetSession,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(form) = session.pending_form().cloned() else {
        println!("(no form is pending)");
        return Ok(());
    };

    let mut fill = FormFill::new();
    for field in &form.fields {
        println!("{}? ", field.label);
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let value = line.trim();
        if value.is_empty() {
            continue;
        }
        if field.kind == FieldKind::Checkbox {
            for option in value.split(',') {
                fill.toggle_option(&field.id, option.trim());
            }
        } else {
            fill.set_value(&field.id, value);
        }
    }

    if form.require_terms_acceptance {
        println!("Accept the terms? [y/N] ");
        if let Some(line) = lines.next_line().await? {
            fill.set_terms_accepted(line.trim().eq_ignore_ascii_case("y"));
        }
    }

    match session.submit_form(fill).await {
        Ok(FormOutcome::Confirmed) => {}
        Ok(FormOutcome::TransportFailed) => println!("(form could not be submitted, try again later)"),
        Err(SubmitBlocked::Validation(errors)) => {
            for (field, message) in errors.iter() {
                println!("  {field}: {message}");
            }
            if let Some(message) = errors.terms_error() {
                println!("  terms: {message}");
            }
        }
        Err(SubmitBlocked::State(rejected)) => println!("({rejected})"),
    }

    Ok(())
}
