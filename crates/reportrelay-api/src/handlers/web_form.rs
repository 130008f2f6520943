use crate::state::AppState;
use axum::{extract::State, response::Html};
use std::path::Path;
use std::sync::Arc;

pub const FORM_TEMPLATE_FILE: &str = "form.html";
const COMPANY_NAME_PLACEHOLDER: &str = "{{.CompanyName}}";

const EMBEDDED_FORM: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Report upload</title></head>
<body>
    <h1>Report upload {{.CompanyName}}</h1>
    <p>Form template not found. Create templates/form.html.</p>
</body>
</html>"#;

/// Upload form, from `<templates_dir>/form.html` or the embedded fallback.
pub async fn render_form(State(state): State<Arc<AppState>>) -> Html<String> {
    let path = Path::new(state.config.templates_dir()).join(FORM_TEMPLATE_FILE);
    let template = match tokio::fs::read_to_string(&path).await {
        Ok(template) => template,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Using embedded form template");
            EMBEDDED_FORM.to_string()
        }
    };

    Html(render(&template, state.config.company_name()))
}

fn render(template: &str, company_name: &str) -> String {
    template.replace(COMPANY_NAME_PLACEHOLDER, &escape_html(company_name))
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
