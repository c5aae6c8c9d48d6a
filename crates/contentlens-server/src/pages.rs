//! Server-rendered HTML. Every interpolated value goes through [`escape_html`],
//! except generated markdown, which goes through [`render_markdown`].

use contentlens::ProcessedUpload;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

const UNSAFE_SCHEMES: [&str; 3] = ["javascript:", "vbscript:", "data:"];

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:48rem;margin:2rem auto;padding:0 1rem;color:#222}\
textarea{width:100%;min-height:6rem}\
.result{border:1px solid #ddd;border-radius:4px;padding:0 1rem}\
pre{white-space:pre-wrap;background:#f5f5f5;padding:1rem;border-radius:4px}\
.error{color:#a00}.notice{color:#8a5a00}\
nav a{margin-right:1rem}";

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Renders model output as HTML. Raw HTML in the markdown is shown as text and
/// links or images with script-capable schemes point nowhere.
pub fn render_markdown(markdown: &str) -> String {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let events = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut rendered = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut rendered, events);
    rendered
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let normalized: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    if UNSAFE_SCHEMES.iter().any(|scheme| normalized.starts_with(scheme)) {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title} - ContentLens</title>\n<style>{STYLE}</style>\n</head>\n\
         <body>\n<h1>ContentLens</h1>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
    )
}

pub fn index_page(max_upload_bytes: u64) -> String {
    let limit_mib = max_upload_bytes as f64 / (1024.0 * 1024.0);
    layout(
        "Upload",
        &format!(
            "<p>Upload a document or image and describe what you want done with it.</p>\n\
             <form action=\"/upload\" method=\"post\" enctype=\"multipart/form-data\">\n\
             <p><label>Document (max {limit_mib:.1} MiB)<br>\n\
             <input type=\"file\" name=\"document\" accept=\".txt,.md,.markdown,.json,.docx,image/*\" required></label></p>\n\
             <p><label>Instructions<br>\n\
             <textarea name=\"instructions\" required placeholder=\"Summarize this document in three bullet points\"></textarea></label></p>\n\
             <p><button type=\"submit\">Process</button></p>\n\
             </form>"
        ),
    )
}

pub fn result_page(processed: &ProcessedUpload) -> String {
    let notice = if processed.degraded {
        "<p class=\"notice\">The document's text could not be extracted; the answer is based on the error message only.</p>\n"
    } else {
        ""
    };

    layout(
        "Result",
        &format!(
            "<h2>Result for {name}</h2>\n{notice}<div class=\"result\">\n{markdown}</div>\n\
             <nav><a href=\"/download/{id}\">Download markdown</a>\
             <a href=\"/process-another\">Process another document</a></nav>",
            name = escape_html(&processed.original_name),
            markdown = render_markdown(&processed.markdown),
            id = escape_html(&processed.id),
        ),
    )
}

pub fn error_page(title: &str, message: &str) -> String {
    layout(
        title,
        &format!(
            "<h2 class=\"error\">{title}</h2>\n<p>{message}</p>\n<p><a href=\"/\">Back to upload</a></p>",
            title = escape_html(title),
            message = escape_html(message),
        ),
    )
}
