//! Rendering of [`ViewerState`].
//!
//! Both renderers are pure functions of the state. The HTML page is a plain
//! server-rendered document: the upload control posts to `/pick`, the
//! generate button posts to `/submit`.

use std::fmt::Write as _;

use crate::state::ViewerState;

pub const TITLE: &str = "AI Image Captioner";
pub const ERROR_LABEL: &str = "Error!";
pub const SUBMIT_LABEL: &str = "Generate Caption";
pub const LOADING_LABEL: &str = "Generating...";
pub const CAPTION_HEADING: &str = "Generated Caption:";
pub const COLORS_LABEL: &str = "Detected Colors:";

const STYLE: &str = r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, sans-serif;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            min-height: 100vh;
            display: flex;
            align-items: center;
            justify-content: center;
            padding: 20px;
        }

        .card {
            background: white;
            border-radius: 20px;
            box-shadow: 0 20px 60px rgba(0,0,0,0.3);
            max-width: 800px;
            width: 100%;
            padding: 40px;
        }

        .title { color: #333; margin-bottom: 10px; font-size: 2em; }
        .description { color: #666; margin-bottom: 30px; font-size: 0.9em; }

        .upload-area {
            display: block;
            border: 3px dashed #667eea;
            border-radius: 15px;
            padding: 40px 20px;
            text-align: center;
            cursor: pointer;
            background: #f8f9ff;
        }
        .upload-area:hover { border-color: #764ba2; background: #f0f2ff; }
        .upload-text { color: #667eea; font-size: 1.2em; font-weight: 600; margin-bottom: 10px; }
        .upload-info { color: #999; font-size: 0.9em; }
        .file-input-hidden { display: none; }

        .image-preview-section { margin-top: 30px; }
        .image-preview {
            max-width: 100%;
            border-radius: 10px;
            box-shadow: 0 4px 15px rgba(0,0,0,0.1);
        }

        .error-message {
            background: #fee;
            border: 2px solid #fcc;
            color: #c33;
            padding: 15px;
            border-radius: 10px;
            margin-top: 20px;
        }
        .error-message strong { margin-right: 8px; }

        .generate-button {
            margin-top: 20px;
            width: 100%;
            padding: 14px;
            border: none;
            border-radius: 10px;
            background: #667eea;
            color: white;
            font-size: 1em;
            font-weight: 600;
            cursor: pointer;
        }
        .generate-button-disabled { background: #b8bde8; cursor: not-allowed; }

        .loading-spinner {
            display: inline-block;
            border: 3px solid #f3f3f3;
            border-top: 3px solid #764ba2;
            border-radius: 50%;
            width: 16px;
            height: 16px;
            margin-right: 8px;
            vertical-align: middle;
            animation: spin 1s linear infinite;
        }
        @keyframes spin {
            0% { transform: rotate(0deg); }
            100% { transform: rotate(360deg); }
        }

        .caption-display { background: #f8f9ff; border-radius: 10px; padding: 20px; margin-top: 20px; }
        .caption-heading {
            color: #667eea;
            font-weight: 600;
            margin-bottom: 10px;
            font-size: 0.9em;
            text-transform: uppercase;
            letter-spacing: 1px;
        }
        .caption-text { color: #333; font-size: 1.1em; line-height: 1.6; }
        .dominant-color-info { margin-top: 10px; }
"#;

/// Escapes text for use in HTML element content and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Renders the full HTML document for the viewer.
pub fn render_page(state: &ViewerState) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    if state.is_loading() {
        // Poll until the in-flight request completes.
        html.push_str("    <meta http-equiv=\"refresh\" content=\"1\">\n");
    }
    let _ = writeln!(html, "    <title>{TITLE}</title>");
    let _ = writeln!(html, "    <style>{STYLE}    </style>");
    html.push_str("</head>\n<body>\n");
    html.push_str(&render_component(state));
    html.push_str("</body>\n</html>\n");
    html
}

/// Renders the component markup (the card) without the surrounding document.
pub fn render_component(state: &ViewerState) -> String {
    let mut html = String::new();

    html.push_str("<div class=\"app-container\">\n<div class=\"card\">\n");
    let _ = writeln!(html, "<h1 class=\"title\">{TITLE}</h1>");
    html.push_str(
        "<p class=\"description\">Upload an image to get a detailed description, \
         including key color information.</p>\n",
    );

    html.push_str(
        "<form class=\"upload-section\" action=\"/pick\" method=\"post\" \
         enctype=\"multipart/form-data\">\n\
         <label for=\"file-upload\" class=\"upload-area\">\n\
         <div class=\"upload-text\">Upload Image</div>\n\
         <p class=\"upload-info\">PNG, JPG, GIF up to 10MB</p>\n\
         <input id=\"file-upload\" name=\"file\" type=\"file\" class=\"file-input-hidden\" \
         accept=\"image/*\" onchange=\"this.form.submit()\">\n\
         </label>\n</form>\n",
    );

    if let Some(url) = state.preview_url() {
        let _ = write!(
            html,
            "<div class=\"image-preview-section\">\n\
             <h3 class=\"image-preview-heading\">Image Preview:</h3>\n\
             <img src=\"{}\" alt=\"Preview\" class=\"image-preview\">\n</div>\n",
            escape_html(&url)
        );
    }

    if let Some(err) = state.error() {
        let _ = write!(
            html,
            "<div class=\"error-message\" role=\"alert\">\
             <strong>{ERROR_LABEL}</strong><span>{}</span></div>\n",
            escape_html(&err.to_string())
        );
    }

    let enabled = state.can_submit();
    html.push_str("<form action=\"/submit\" method=\"post\">\n");
    let _ = write!(
        html,
        "<button type=\"submit\" class=\"generate-button{}\"{}>",
        if enabled { "" } else { " generate-button-disabled" },
        if enabled { "" } else { " disabled" }
    );
    if state.is_loading() {
        let _ = write!(
            html,
            "<span class=\"loading-spinner-container\">\
             <span class=\"loading-spinner\"></span>{LOADING_LABEL}</span>"
        );
    } else {
        html.push_str(SUBMIT_LABEL);
    }
    html.push_str("</button>\n</form>\n");

    if state.has_result() {
        html.push_str("<div class=\"caption-display\">\n");
        if let Some(caption) = state.caption() {
            let _ = write!(
                html,
                "<h3 class=\"caption-heading\">{CAPTION_HEADING}</h3>\n\
                 <p class=\"caption-text\">\"{}\"</p>\n",
                escape_html(caption)
            );
        }
        if !state.detected_colors().is_empty() {
            let _ = write!(
                html,
                "<p class=\"caption-text dominant-color-info\">\
                 <strong>{COLORS_LABEL}</strong> {}</p>\n",
                escape_html(&state.detected_colors().join(", "))
            );
        }
        html.push_str("</div>\n");
    }

    html.push_str("</div>\n</div>\n");
    html
}

/// Plain-text rendering used by the command line.
pub fn render_text(state: &ViewerState) -> String {
    let mut out = String::new();

    if let Some(file) = state.selected_file() {
        let _ = writeln!(out, "Image: {} ({}, {} bytes)", file.name, file.content_type, file.len());
    }
    if let Some(err) = state.error() {
        let _ = writeln!(out, "{ERROR_LABEL} {err}");
    }
    if state.is_loading() {
        let _ = writeln!(out, "{LOADING_LABEL}");
    }
    if let Some(caption) = state.caption() {
        let _ = writeln!(out, "{CAPTION_HEADING} \"{caption}\"");
    }
    if !state.detected_colors().is_empty() {
        let _ = writeln!(out, "{COLORS_LABEL} {}", state.detected_colors().join(", "));
    }
    out
}
