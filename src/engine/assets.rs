//! engine::assets
//!
//! Scripts that attach stylesheets, scripts and styles to the notebook page.
//!
//! Arguments are embedded as JSON string literals, so quotes, backticks and
//! `${...}` in the input stay inert.

use thiserror::Error;

use crate::core::types::identifier_len;

/// Module providing the classic notebook's code cell class.
pub const CODECELL_MODULE: &str = "notebook/js/codecell";

/// Errors from building asset scripts.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssetError {
    #[error("invalid magic name '{0}': expected an identifier")]
    InvalidMagicName(String),
}

fn literal(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}

/// Append a `<link rel="stylesheet">` for `href` to the page head.
pub fn link_css(href: &str) -> String {
    format!(
        r#"const href = {href};
const link = document.createElement("link");
link.rel = "stylesheet";
link.type = "text/css";
link.href = href;

document.head.appendChild(link);
"#,
        href = literal(href)
    )
}

/// Append a `<script src>` for `src` to the page head.
pub fn link_js(src: &str) -> String {
    format!(
        r#"const src = {src};
const script = document.createElement("script");
script.src = src;

document.head.appendChild(script);
"#,
        src = literal(src)
    )
}

/// Append an inline `<style>` element holding `css`.
pub fn load_style(css: &str) -> String {
    format!(
        r#"const style = {css};
const e = document.createElement("style");
e.type = "text/css";
e.textContent = style;

document.head.appendChild(e);
"#,
        css = literal(css)
    )
}

/// Append an inline `<script>` element holding `js`.
pub fn load_script(js: &str) -> String {
    format!(
        r#"const source = {js};
const e = document.createElement("script");
e.type = "text/javascript";
e.textContent = source;

document.head.appendChild(e);
"#,
        js = literal(js)
    )
}

/// Body that enables JavaScript highlighting of `%%<magic>` cells.
///
/// Must run with [`CODECELL_MODULE`] required; the module is bound to
/// `notebook_js_codecell`.
///
/// # Errors
///
/// Returns `AssetError::InvalidMagicName` unless `magic` is an identifier.
pub fn syntax_highlight(magic: &str) -> Result<String, AssetError> {
    if magic.is_empty() || identifier_len(magic) != Some(magic.len()) {
        return Err(AssetError::InvalidMagicName(magic.to_string()));
    }

    Ok(format!(
        r#"notebook_js_codecell.CodeCell.options_default.highlight_modes['magic_text/javascript'] = {{'reg': [/^%%{magic}/]}};

Jupyter.notebook.events.one('kernel_ready.Kernel', function () {{
    Jupyter.notebook.get_cells().map(function (cell) {{
        if (cell.cell_type == 'code') {{ cell.auto_highlight(); }}
    }});
}});

console.log("JavaScript syntax highlight activated for '%%{magic}'.");"#,
        magic = magic
    ))
}
