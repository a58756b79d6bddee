//! Feed template environment.
//!
//! Templates are loaded once at startup from a directory of `*.xml.tmpl`
//! files, one per extraction strategy. Values render unescaped unless a
//! template pipes them through the `escape` filter. Item dates travel
//! through the template context as RFC 3339 strings (the persisted record
//! form); the `rfc2822` filter reformats them into the date shape RSS
//! readers expect.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::DateTime;
use tera::{Tera, Value};

use crate::models::Item;

/// Load the template directory and register the filters.
///
/// Autoescaping is off: the built-in HTML escaper entity-encodes `/`, which
/// turns every URL into noise. Templates escape explicitly through the
/// `escape` filter instead.
pub fn load_templates(dir: &Path) -> Result<Tera> {
    let glob = format!("{}/*.xml.tmpl", dir.display());
    let mut tera =
        Tera::new(&glob).with_context(|| format!("load templates from {}", dir.display()))?;
    tera.autoescape_on(vec![]);
    tera.register_filter("escape", escape_xml);
    tera.register_filter("rfc2822", rfc2822);
    Ok(tera)
}

/// Render the ordered item sequence through the named template.
pub fn render_feed(
    tera: &Tera,
    template: &str,
    feed: &str,
    items: &[Item],
) -> Result<String, tera::Error> {
    let mut context = tera::Context::new();
    context.insert("feed", feed);
    context.insert("items", items);
    tera.render(template, &context)
}

/// Escape text for XML element and attribute content.
fn escape_xml(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("escape expects a string"))?;
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    Ok(Value::String(out))
}

/// Reformat an RFC 3339 date string as RFC 2822 (`Mon, 21 Oct 2024
/// 12:45:12 +0000`).
fn rfc2822(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("rfc2822 expects a string"))?;
    let date = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| tera::Error::msg(format!("rfc2822: parse {raw:?}: {e}")))?;
    Ok(Value::String(date.to_rfc2822()))
}
