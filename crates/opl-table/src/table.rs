use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use uuid::Uuid;

const EMPTY_NOTICE: &str =
    "<p>No query results and no column headers were provided. Nothing to display.</p>";

/// One result row: column id -> cell value
pub type TableRow = BTreeMap<String, Value>;

/// Custom cell renderer for a column.
///
/// Receives the cell value (`Value::Null` when the row has no such column)
/// and the whole row. The returned markup is inserted without escaping.
pub type Rewriter = Box<dyn Fn(&Value, &TableRow) -> String + Send + Sync>;

/// Query results ready to be rendered as a table
pub struct QueryResultsTable {
    rows: Vec<TableRow>,
    labels: Option<Vec<(String, String)>>,
    rewriters: HashMap<String, Rewriter>,
}

impl QueryResultsTable {
    pub fn new(rows: Vec<TableRow>) -> Self {
        Self {
            rows,
            labels: None,
            rewriters: HashMap::new(),
        }
    }

    /// Set column headers as ordered `(column id, label)` pairs.
    ///
    /// Labelled columns come first, in this order. Columns that appear in the
    /// first row but have no label follow, headed by their id.
    pub fn with_labels<I, K, V>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.labels = Some(
            labels
                .into_iter()
                .map(|(id, label)| (id.into(), label.into()))
                .collect(),
        );
        self
    }

    pub fn with_rewriter<F>(mut self, column: impl Into<String>, rewriter: F) -> Self
    where
        F: Fn(&Value, &TableRow) -> String + Send + Sync + 'static,
    {
        self.rewriters.insert(column.into(), Box::new(rewriter));
        self
    }

    /// Columns in display order with their header text.
    fn columns(&self) -> Vec<(&str, &str)> {
        let mut columns: Vec<(&str, &str)> = self
            .labels
            .iter()
            .flatten()
            .map(|(id, label)| (id.as_str(), label.as_str()))
            .collect();

        if let Some(first) = self.rows.first() {
            for id in first.keys() {
                if !columns.iter().any(|(known, _)| *known == id.as_str()) {
                    columns.push((id.as_str(), id.as_str()));
                }
            }
        }

        columns
    }

    fn cell(&self, column: &str, row: &TableRow) -> String {
        let value = row.get(column).unwrap_or(&Value::Null);

        if let Some(rewriter) = self.rewriters.get(column) {
            return rewriter(value, row);
        }

        match value {
            Value::Null => String::new(),
            Value::Array(items) => {
                let items: String = items
                    .iter()
                    .map(|item| format!("<li>{}</li>", escape(item)))
                    .collect();
                format!("<ul>{items}</ul>")
            }
            other => escape(other),
        }
    }

    /// Render as an HTML table with one header row.
    pub fn to_html(&self) -> String {
        if self.rows.is_empty() && self.labels.is_none() {
            return EMPTY_NOTICE.to_string();
        }

        let columns = self.columns();
        debug!(
            rows = self.rows.len(),
            columns = columns.len(),
            "rendering results table"
        );

        let mut html = String::from("<table><tbody><tr>");
        for (_, label) in &columns {
            html.push_str(&format!("<th>{}</th>", html_escape::encode_text(label)));
        }
        html.push_str("</tr>");

        for row in &self.rows {
            html.push_str("<tr>");
            for (id, _) in &columns {
                html.push_str(&format!("<td>{}</td>", self.cell(id, row)));
            }
            html.push_str("</tr>");
        }

        html.push_str("</tbody></table>");
        html
    }

    /// Render for a Confluence page, wrapped in an inline `span` macro.
    ///
    /// `span_id` becomes the span's `id` parameter so the table can be
    /// located and replaced on later updates. A random UUID v4 is used when
    /// `macro_id` is `None`.
    pub fn to_confluence_xhtml(&self, span_id: &str, macro_id: Option<&str>) -> String {
        let macro_id = macro_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        format!(
            concat!(
                "<ac:structured-macro ac:name=\"span\" ac:schema-version=\"1\" ac:macro-id=\"{macro_id}\">",
                "<ac:parameter ac:name=\"id\">{span_id}</ac:parameter>",
                "<ac:parameter ac:name=\"atlassian-macro-output-type\">INLINE</ac:parameter>",
                "<ac:rich-text-body>",
                "<p class=\"auto-cursor-target\"><br /></p>",
                "{content}",
                "<p class=\"auto-cursor-target\"><br /></p>",
                "</ac:rich-text-body>",
                "</ac:structured-macro>"
            ),
            macro_id = html_escape::encode_double_quoted_attribute(&macro_id),
            span_id = html_escape::encode_text(span_id),
            content = self.to_html(),
        )
    }
}

fn escape(value: &Value) -> String {
    match value {
        Value::String(text) => html_escape::encode_text(text).into_owned(),
        Value::Null => String::new(),
        other => html_escape::encode_text(&other.to_string()).into_owned(),
    }
}
