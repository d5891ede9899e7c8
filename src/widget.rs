//! HTML widgets embedded by the chat host.
//!
//! [`WidgetRenderer::render_full`] injects the collection into the compiled
//! widget template found under the assets directory;
//! [`WidgetRenderer::render_card`] builds a self-contained inline-styled
//! summary. Templates are read through a small LRU [`TemplateCache`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::note::Note;
use crate::record::Record;
use crate::task::Task;

/// Templates kept in memory at once.
pub const DEFAULT_CACHE_CAPACITY: usize = 10;

/// Records shown on the summary card.
pub const CARD_LIMIT: usize = 5;

/// The widget template could not be located under the assets directory.
#[derive(Debug, Clone, thiserror::Error)]
#[error("widget '{widget}' not found under {}", assets_dir.display())]
pub struct AssetMissing {
    pub widget: String,
    pub assets_dir: PathBuf,
    pub searched: Vec<PathBuf>,
    /// HTML files that do exist, relative to `assets_dir`.
    pub available: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
struct CachedTemplate {
    path: PathBuf,
    modified: Option<SystemTime>,
    html: Arc<str>,
}

/// Bounded least-recently-used cache of widget templates keyed by name.
///
/// Entries hold the template with asset URLs already made absolute. An
/// entry whose file changed on disk since it was read (an asset rebuild) is
/// dropped and re-read. Lookup failures are never cached.
#[derive(Debug)]
pub struct TemplateCache {
    assets_dir: PathBuf,
    base_url: String,
    capacity: usize,
    entries: Mutex<IndexMap<String, CachedTemplate>>,
}

impl TemplateCache {
    pub fn new(assets_dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self::with_capacity(assets_dir, base_url, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(
        assets_dir: impl Into<PathBuf>,
        base_url: impl Into<String>,
        capacity: usize,
    ) -> Self {
        TemplateCache {
            assets_dir: assets_dir.into(),
            base_url: base_url.into(),
            capacity: capacity.max(1),
            entries: Mutex::new(IndexMap::new()),
        }
    }

    pub fn assets_dir(&self) -> &Path {
        &self.assets_dir
    }

    /// Return the template for `name`, reading it from disk on a miss.
    pub fn load(&self, name: &str) -> Result<Arc<str>, AssetMissing> {
        {
            let mut entries = self.entries.lock();
            if let Some(entry) = entries.shift_remove(name) {
                if modified_time(&entry.path) == entry.modified {
                    let html = Arc::clone(&entry.html);
                    // Re-insert at the back: most recently used.
                    entries.insert(name.to_string(), entry);
                    return Ok(html);
                }
                tracing::info!(widget = name, path = %entry.path.display(), "template changed on disk, reloading");
            }
        }

        let entry = self.read_template(name)?;
        let html = Arc::clone(&entry.html);

        let mut entries = self.entries.lock();
        entries.insert(name.to_string(), entry);
        while entries.len() > self.capacity {
            entries.shift_remove_index(0);
        }
        Ok(html)
    }

    /// Drop the cached template for `name`. Returns whether one was cached.
    pub fn invalidate(&self, name: &str) -> bool {
        self.entries.lock().shift_remove(name).is_some()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().contains_key(name)
    }

    fn read_template(&self, name: &str) -> Result<CachedTemplate, AssetMissing> {
        let candidates = self.candidate_paths(name);
        let found = candidates.iter().find(|p| p.is_file()).cloned();

        let Some(path) = found else {
            return Err(AssetMissing {
                widget: name.to_string(),
                assets_dir: self.assets_dir.clone(),
                searched: candidates.into_iter().take(3).collect(),
                available: self.available_html(),
            });
        };

        let raw = std::fs::read_to_string(&path).map_err(|e| {
            tracing::warn!(widget = name, path = %path.display(), error = %e, "failed to read template");
            AssetMissing {
                widget: name.to_string(),
                assets_dir: self.assets_dir.clone(),
                searched: vec![path.clone()],
                available: self.available_html(),
            }
        })?;

        tracing::debug!(widget = name, path = %path.display(), "template loaded");
        Ok(CachedTemplate {
            modified: modified_time(&path),
            html: rewrite_asset_urls(&raw, &self.base_url).into(),
            path,
        })
    }

    /// Fixed locations first, then directory-name and file-name matches.
    fn candidate_paths(&self, name: &str) -> Vec<PathBuf> {
        let dir = &self.assets_dir;
        let mut paths = vec![
            dir.join(format!("{name}.html")),
            dir.join(name).join("index.html"),
            dir.join("src").join(name).join("index.html"),
        ];
        let root = glob::Pattern::escape(&dir.to_string_lossy());
        let name = glob::Pattern::escape(name);
        paths.extend(glob_files(&format!("{root}/**/*{name}*/index.html")));
        paths.extend(glob_files(&format!("{root}/**/{name}*.html")));
        paths
    }

    fn available_html(&self) -> Vec<PathBuf> {
        let root = glob::Pattern::escape(&self.assets_dir.to_string_lossy());
        glob_files(&format!("{root}/**/*.html"))
            .into_iter()
            .map(|p| p.strip_prefix(&self.assets_dir).map(Path::to_path_buf).unwrap_or(p))
            .collect()
    }
}

fn glob_files(pattern: &str) -> Vec<PathBuf> {
    match glob::glob(pattern) {
        Ok(paths) => paths.filter_map(Result::ok).collect(),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "invalid template search pattern");
            Vec::new()
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Make root- and dot-relative `/assets/` references absolute.
pub fn rewrite_asset_urls(html: &str, base_url: &str) -> String {
    html.replace("=\"/assets/", &format!("=\"{base_url}/assets/"))
        .replace("'/assets/", &format!("'{base_url}/assets/"))
        .replace("=\"./assets/", &format!("=\"{base_url}/assets/"))
        .replace("'./assets/", &format!("'{base_url}/assets/"))
}

/// Insert `snippet` before `</head>`, else right after the `<body>` tag,
/// else at the top of the document.
pub fn inject_into_head(html: &str, snippet: &str) -> String {
    if let Some(pos) = html.find("</head>") {
        let mut out = String::with_capacity(html.len() + snippet.len());
        out.push_str(&html[..pos]);
        out.push_str(snippet);
        out.push_str(&html[pos..]);
        out
    } else if let Some(close) = html
        .find("<body")
        .and_then(|pos| html[pos..].find('>').map(|c| pos + c + 1))
    {
        let mut out = String::with_capacity(html.len() + snippet.len());
        out.push_str(&html[..close]);
        out.push_str(snippet);
        out.push_str(&html[close..]);
        out
    } else {
        format!("{snippet}{html}")
    }
}

/// Serialize `records` for embedding inside a `<script>` element.
///
/// `</` is written as `<\/`, which is still valid JSON.
pub fn script_safe_json<R: Record>(records: &[R]) -> String {
    serde_json::to_string(records)
        .unwrap_or_else(|_| "[]".to_string())
        .replace("</", "<\\/")
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

/// One row of the summary card.
pub trait CardItem {
    /// Colour of the row's left border.
    fn accent(&self) -> &'static str;
    /// Inner HTML of the row.
    fn card_body(&self) -> String;
}

impl CardItem for Note {
    fn accent(&self) -> &'static str {
        match self.category.as_str() {
            "technology" => "#3b82f6",
            "learning" => "#10b981",
            "ideas" => "#f59e0b",
            _ => "#6b7280",
        }
    }

    fn card_body(&self) -> String {
        let mut body = format!(
            r#"<div style="font-weight: 600; color: #1f2937;">{}</div>"#,
            escape_html(&self.title)
        );
        if let Some(desc) = self.description.as_deref().filter(|d| !d.is_empty()) {
            body.push_str(&format!(
                r#"<div style="font-size: 13px; color: #6b7280; margin-top: 2px;">{}</div>"#,
                escape_html(desc)
            ));
        }
        if !self.created_at.is_empty() {
            body.push_str(&format!(
                r#"<div style="font-size: 12px; color: #9ca3af; margin-top: 4px;">📅 {}</div>"#,
                escape_html(&self.created_at)
            ));
        }
        if !self.tags.is_empty() {
            let tags: Vec<String> = self.tags.iter().take(3).map(|t| escape_html(t)).collect();
            body.push_str(&format!(
                r#"<div style="font-size: 11px; color: #9ca3af; margin-top: 4px;">🏷️ {}</div>"#,
                tags.join(", ")
            ));
        }
        body
    }
}

impl CardItem for Task {
    fn accent(&self) -> &'static str {
        match self.priority.as_str() {
            "high" => "#ef4444",
            "medium" => "#f59e0b",
            "low" => "#10b981",
            _ => "#6b7280",
        }
    }

    fn card_body(&self) -> String {
        let (mark, decoration) = if self.completed {
            ("✅", "line-through")
        } else {
            ("⬜", "none")
        };
        let mut body = format!(
            r#"<div style="font-weight: 600; color: #1f2937; text-decoration: {decoration};">{mark} {}</div>"#,
            escape_html(&self.title)
        );
        if let Some(desc) = self.description.as_deref().filter(|d| !d.is_empty()) {
            body.push_str(&format!(
                r#"<div style="font-size: 13px; color: #6b7280; margin-top: 2px;">{}</div>"#,
                escape_html(desc)
            ));
        }
        if let Some(due) = self.due_date.as_deref() {
            body.push_str(&format!(
                r#"<div style="font-size: 12px; color: #9ca3af; margin-top: 4px;">📅 {} · {}</div>"#,
                escape_html(due),
                escape_html(&self.priority)
            ));
        }
        body
    }
}

/// Renders store contents for the chat host.
#[derive(Debug)]
pub struct WidgetRenderer {
    templates: TemplateCache,
    base_url: String,
}

impl WidgetRenderer {
    pub fn new(assets_dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        WidgetRenderer {
            templates: TemplateCache::new(assets_dir, base_url.clone()),
            base_url,
        }
    }

    pub fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The compiled widget with `records` available as `window.<DATA_GLOBAL>`.
    ///
    /// A missing template yields a diagnostic page instead of an error.
    pub fn render_full<R: Record>(&self, records: &[R]) -> String {
        match self.templates.load(R::WIDGET_NAME) {
            Ok(template) => {
                let script = format!(
                    "\n<script>\nwindow.{} = {};\n</script>\n",
                    R::DATA_GLOBAL,
                    script_safe_json(records)
                );
                inject_into_head(&template, &script)
            }
            Err(missing) => {
                tracing::warn!(widget = %missing.widget, assets_dir = %missing.assets_dir.display(), "widget template missing");
                diagnostic_page(&missing)
            }
        }
    }

    /// Self-contained summary of the first [`CARD_LIMIT`] records.
    pub fn render_card<R: Record>(&self, records: &[R]) -> String {
        let items: String = records
            .iter()
            .take(CARD_LIMIT)
            .map(|r| {
                format!(
                    r#"<div style="display: flex; align-items: start; gap: 8px; padding: 8px; border-left: 3px solid {}; background: rgba(0,0,0,0.02); border-radius: 4px; margin-bottom: 8px;"><div style="flex: 1;">{}</div></div>"#,
                    r.accent(),
                    r.card_body()
                )
            })
            .collect();

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
</head>
<body style="margin: 0; padding: 16px; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;">
<div style="max-width: 500px; margin: 0 auto; background: white; border-radius: 12px; box-shadow: 0 2px 8px rgba(0,0,0,0.1); padding: 20px; border: 1px solid #e5e7eb;">
<div style="display: flex; justify-content: space-between; align-items: center; margin-bottom: 16px;">
<h2 style="margin: 0; font-size: 20px; color: #111827;">{title}</h2>
<span data-count="{count}" style="background: #dbeafe; color: #1e40af; padding: 4px 10px; border-radius: 12px; font-weight: 600; font-size: 14px;">📝 {count}</span>
</div>
<div style="margin-top: 16px;">{items}</div>
<div style="margin-top: 16px; padding-top: 16px; border-top: 1px solid #e5e7eb; text-align: center;">
<a href="{base}/widget" target="_blank" style="color: #2563eb; text-decoration: none; font-size: 14px; font-weight: 500;">🔗 Open full widget →</a>
</div>
</div>
</body>
</html>
"#,
            title = R::CARD_TITLE,
            count = records.len(),
            items = items,
            base = self.base_url,
        )
    }
}

fn diagnostic_page(missing: &AssetMissing) -> String {
    let list = |paths: &[PathBuf]| -> String {
        if paths.is_empty() {
            return "<li>none found</li>".to_string();
        }
        paths
            .iter()
            .map(|p| format!("<li>{}</li>", escape_html(&p.display().to_string())))
            .collect()
    };
    format!(
        r#"<div style="padding: 20px; font-family: monospace; background: #fee; border: 2px solid #f00; border-radius: 8px;">
<h3>❌ Widget '{widget}' not found</h3>
<p><strong>Assets directory:</strong> {dir}</p>
<p><strong>Paths searched:</strong></p>
<ul style="background: #fff; padding: 10px; border-radius: 4px;">{searched}</ul>
<p><strong>HTML files available:</strong></p>
<ul style="background: #fff; padding: 10px; border-radius: 4px;">{available}</ul>
<p><strong>Fix:</strong> run <code>npm run build</code> to produce the widget bundle.</p>
</div>
"#,
        widget = escape_html(&missing.widget),
        dir = escape_html(&missing.assets_dir.display().to_string()),
        searched = list(&missing.searched),
        available = list(&missing.available),
    )
}
