//! Server-rendered form page: `GET /` and `POST /`.
//!
//! The page is the operation selector, the content textarea, the Generate button and the
//! output card. `POST /` runs one submission through a fresh form controller and draws the
//! resulting state: inline field error, error banner, or the rendered result.

use axum::{
    extract::{Form, State},
    response::Html,
};
use seolens::form::Phase;
use seolens::{
    render_state, ContentBounds, CountedField, FormController, FormState, Operation, Panel,
    ValidationError, View,
};
use serde::Deserialize;
use std::sync::Arc;

use super::api::parse_operation;
use super::app::AppState;

/// `POST /` body (form-encoded).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct FormBody {
    #[serde(default)]
    pub(crate) operation: String,
    #[serde(default)]
    pub(crate) content: String,
}

/// Everything the page needs to draw itself.
#[derive(Debug, Default)]
pub(crate) struct PageModel {
    pub(crate) operation: Option<Operation>,
    pub(crate) content: String,
    pub(crate) bounds: ContentBounds,
    pub(crate) field_error: Option<ValidationError>,
    pub(crate) banner: Option<String>,
    pub(crate) panel: Option<Panel>,
}

impl PageModel {
    fn from_state(operation: Option<Operation>, content: String, bounds: ContentBounds, state: &FormState) -> Self {
        let panel = render_state(state);
        let banner = match (&panel, state.phase) {
            (Panel::Error { message }, Phase::Failed) => Some(message.clone()),
            _ => None,
        };
        Self {
            operation,
            content,
            bounds,
            field_error: state.field_error.clone(),
            banner,
            panel: Some(panel),
        }
    }
}

pub(crate) async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_page(&PageModel {
        bounds: state.config.bounds,
        ..Default::default()
    }))
}

pub(crate) async fn submit_form(
    State(state): State<Arc<AppState>>,
    Form(body): Form<FormBody>,
) -> Html<String> {
    let bounds = state.config.bounds;
    let operation = match parse_operation(&body.operation) {
        Ok(op) => op,
        Err(e) => {
            return Html(render_page(&PageModel {
                content: body.content,
                bounds,
                panel: Some(Panel::Result {
                    operation: Operation::default(),
                    view: View::unsupported(e.to_string()),
                }),
                ..Default::default()
            }))
        }
    };
    let form = FormController::with_bounds(state.pipeline.clone(), bounds);
    form.submit(operation, &body.content).await;
    Html(render_page(&PageModel::from_state(
        operation,
        body.content,
        bounds,
        &form.state(),
    )))
}

/// Escapes text for HTML element content and double-quoted attributes.
pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn field_error_html(model: &PageModel, field: &str) -> String {
    match &model.field_error {
        Some(e) if e.field == field => format!(
            r#"<p class="field-error" role="alert">{}</p>"#,
            escape(&e.constraint)
        ),
        _ => String::new(),
    }
}

fn options_html(selected: Option<Operation>) -> String {
    let mut html = String::from(r#"<option value="">Select analysis type</option>"#);
    for op in Operation::ALL {
        let sel = if selected == Some(op) { " selected" } else { "" };
        html.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            op.as_str(),
            sel,
            escape(op.label())
        ));
    }
    html
}

fn copy_button(target: &str) -> String {
    format!(r#"<button type="button" class="copy" data-copy="{}">Copy</button>"#, target)
}

fn counted_field_html(index: usize, f: &CountedField) -> String {
    let id = format!("field-{}", index);
    let class = if f.over_limit { "count over" } else { "count" };
    format!(
        r#"<div class="counted">
            <div class="counted-head"><h4>{label}</h4><span class="{class}">{count}/{limit} characters</span></div>
            <div class="value" id="{id}">{value}</div>
            {copy}
        </div>"#,
        label = escape(&f.label),
        class = class,
        count = f.count,
        limit = f.limit,
        id = id,
        value = escape(&f.value),
        copy = if f.copyable { copy_button(&id) } else { String::new() },
    )
}

/// HTML for one rendered result.
pub(crate) fn view_html(view: &View) -> String {
    match view {
        View::Prose { body } => format!(r#"<div class="prose">{}</div>"#, escape(body)),
        View::Copyable { title, body } => format!(
            r#"<div class="copyable"><h3>{}</h3><div class="value" id="copy-body">{}</div>{}</div>"#,
            escape(title),
            escape(body),
            copy_button("copy-body")
        ),
        View::Disclosures { items } => {
            let mut html = String::from(r#"<div class="disclosures">"#);
            for item in items {
                html.push_str(&format!(
                    r#"<details id="{}"><summary>{}</summary><p>{}</p></details>"#,
                    escape(&item.id),
                    escape(&item.summary),
                    escape(&item.detail)
                ));
            }
            html.push_str("</div>");
            html
        }
        View::CountedFields { fields } => fields
            .iter()
            .enumerate()
            .map(|(i, f)| counted_field_html(i, f))
            .collect(),
        View::Unsupported { title, message } => format!(
            r#"<div class="unsupported"><h3>{}</h3><p>{}</p></div>"#,
            escape(title),
            escape(message)
        ),
    }
}

const EMPTY_CARD: &str = r#"<div class="empty"><h3>Ready to Optimize</h3><p>Enter your content and select an analysis type to get started.</p></div>"#;
const LOADING_CARD: &str = r#"<div class="loading" aria-busy="true">Analyzing your content...</div>"#;

/// HTML for the output card.
pub(crate) fn panel_html(panel: Option<&Panel>) -> String {
    match panel {
        None | Some(Panel::Empty) | Some(Panel::Error { .. }) => EMPTY_CARD.to_string(),
        Some(Panel::Loading) => LOADING_CARD.to_string(),
        Some(Panel::Result { view, .. }) => view_html(view),
    }
}

/// Full page.
pub(crate) fn render_page(model: &PageModel) -> String {
    let banner = match &model.banner {
        Some(message) => format!(
            r#"<div class="banner" role="alert"><span>{}</span><button type="button" class="dismiss" aria-label="Dismiss">&times;</button></div>"#,
            escape(message)
        ),
        None => String::new(),
    };
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>SeoLens</title>
    <style>
{css}
    </style>
</head>
<body>
    <header>
        <h1>SeoLens</h1>
        <p>Audit, rewrite and enrich your content for search.</p>
    </header>
    {banner}
    <main>
        <section class="input-card">
            <form id="analyze-form" method="post" action="/">
                <label for="operation">Analysis type</label>
                <select id="operation" name="operation">{options}</select>
                {operation_error}
                <label for="content">Content</label>
                <textarea id="content" name="content" rows="12" placeholder="Paste your content here...">{content}</textarea>
                <p class="hint">Between {min} and {max} characters.</p>
                {content_error}
                <button type="submit" id="generate">Generate</button>
            </form>
        </section>
        <section class="output-card" id="output">
            {panel}
        </section>
    </main>
    <script>
{js}
    </script>
</body>
</html>"#,
        css = CSS,
        js = JS,
        banner = banner,
        options = options_html(model.operation),
        operation_error = field_error_html(model, "operation"),
        content = escape(&model.content),
        min = model.bounds.min_chars,
        max = model.bounds.max_chars,
        content_error = field_error_html(model, "content"),
        panel = panel_html(model.panel.as_ref()),
    )
}

const CSS: &str = r#"
        body { font-family: system-ui, sans-serif; max-width: 1100px; margin: 0 auto; padding: 20px; color: #1f2933; }
        header h1 { margin-bottom: 0; }
        main { display: grid; grid-template-columns: 1fr 1fr; gap: 20px; margin-top: 20px; }
        section { border: 1px solid #d9e2ec; border-radius: 8px; padding: 16px; }
        label { display: block; font-weight: 600; margin: 12px 0 4px; }
        select, textarea { width: 100%; box-sizing: border-box; font: inherit; }
        button { font: inherit; cursor: pointer; }
        #generate { margin-top: 12px; padding: 8px 16px; }
        #generate:disabled { opacity: 0.6; cursor: wait; }
        .hint { color: #627d98; font-size: 0.85em; }
        .field-error { color: #b42318; font-size: 0.9em; margin: 4px 0; }
        .banner { display: flex; justify-content: space-between; background: #fef3f2; border: 1px solid #fda29b; color: #b42318; padding: 10px 14px; border-radius: 6px; }
        .banner .dismiss { background: none; border: none; font-size: 1.2em; }
        .empty, .loading { color: #627d98; text-align: center; padding: 40px 0; }
        .prose, .value { white-space: pre-wrap; }
        details { border-bottom: 1px solid #e4e7eb; padding: 8px 0; }
        summary { font-weight: 600; }
        .counted { margin-bottom: 16px; }
        .counted-head { display: flex; justify-content: space-between; align-items: baseline; }
        .count { color: #627d98; font-size: 0.85em; }
        .count.over { color: #b42318; font-weight: 600; }
        .copy { margin-top: 6px; }
        .unsupported { color: #8d2b0b; }
"#;

const JS: &str = r#"
        document.addEventListener('click', function (ev) {
            var t = ev.target;
            if (t.matches('.copy')) {
                var el = document.getElementById(t.getAttribute('data-copy'));
                if (el && navigator.clipboard) {
                    navigator.clipboard.writeText(el.textContent).then(function () {
                        t.textContent = 'Copied';
                        setTimeout(function () { t.textContent = 'Copy'; }, 1500);
                    });
                }
            } else if (t.matches('.dismiss')) {
                t.closest('.banner').remove();
            }
        });
        document.getElementById('analyze-form').addEventListener('submit', function () {
            var b = document.getElementById('generate');
            b.disabled = true;
            b.textContent = 'Generating...';
            document.getElementById('output').innerHTML = '<div class="loading" aria-busy="true">Analyzing your content...</div>';
        });
"#;
