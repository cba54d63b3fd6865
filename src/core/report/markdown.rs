//! Markdown report builder
//!
//! Accumulates blocks (headings, paragraphs, tables, ...) and joins them with a
//! blank line when rendered.

use crate::domain::{DextractError, Result, Table};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One heading of a table of contents, with its sub-headings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub title: String,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = TocEntry>) -> Self {
        self.children = children.into_iter().collect();
        self
    }
}

/// Anchor used for a heading: lowercase, `/` becomes `_`, space becomes `-`
pub fn anchor_for(heading: &str) -> String {
    heading.to_lowercase().replace('/', "_").replace(' ', "-")
}

/// Markdown document under construction
#[derive(Debug, Clone)]
pub struct MarkdownReport {
    blocks: Vec<String>,
}

impl MarkdownReport {
    /// Starts a report with a level-1 title
    pub fn new(title: impl AsRef<str>) -> Self {
        Self {
            blocks: vec![format!("# {}", title.as_ref())],
        }
    }

    /// Adds a heading, optionally followed by an HTML anchor
    pub fn add_heading(&mut self, heading: &str, level: usize, anchor: Option<&str>) {
        let mut block = format!("{} {}", "#".repeat(level.max(1)), heading);
        if let Some(anchor) = anchor {
            block.push_str(&format!(" <a name='{anchor}' id='{anchor}'></a>"));
        }
        self.blocks.push(block);
    }

    pub fn add_text(&mut self, text: &str) {
        self.blocks.push(text.to_string());
    }

    pub fn add_list<S: AsRef<str>>(&mut self, items: &[S], ordered: bool) {
        let prefix = if ordered { "1. " } else { "- " };
        let list = items
            .iter()
            .map(|item| format!("{prefix}{}", item.as_ref()))
            .collect::<Vec<_>>()
            .join("\n");
        self.blocks.push(list);
    }

    pub fn add_image(&mut self, image_path: &str, alt_text: &str) {
        self.blocks.push(format!("![{alt_text}]({image_path})"));
    }

    /// Adds a Term/Definition table
    ///
    /// A blank line inside a definition becomes `<br><br>`. Any other newline becomes a
    /// space unless it follows a backslash, so LaTeX such as `\neq` survives.
    pub fn add_definitions<T: AsRef<str>, D: AsRef<str>>(&mut self, definitions: &[(T, D)]) {
        let rows: Vec<Vec<String>> = definitions
            .iter()
            .map(|(term, definition)| {
                vec![
                    term.as_ref().to_string(),
                    flatten_definition(definition.as_ref()),
                ]
            })
            .collect();
        self.add_table(&["Term", "Definition"], &rows);
    }

    /// Adds a pipe table
    pub fn add_table<H: AsRef<str>>(&mut self, headers: &[H], rows: &[Vec<String>]) {
        let headers: Vec<&str> = headers.iter().map(AsRef::as_ref).collect();
        let mut lines = vec![
            format!("| {} |", headers.join(" | ")),
            format!("| {} |", vec!["---"; headers.len()].join(" | ")),
        ];
        lines.extend(rows.iter().map(|row| format!("| {} |", row.join(" | "))));
        self.blocks.push(lines.join("\n"));
    }

    pub fn add_code_block(&mut self, code: &str, language: &str) {
        self.blocks.push(format!("```{language}\n{code}\n```"));
    }

    pub fn add_blockquote(&mut self, quote: &str) {
        self.blocks.push(format!("> {quote}"));
    }

    pub fn add_horizontal_rule(&mut self) {
        self.blocks.push("---".to_string());
    }

    /// Renders a table inside a horizontally scrolling container
    ///
    /// Missing values render as empty cells and `|` inside values is escaped.
    pub fn add_table_data(&mut self, table: &Table) {
        let headers: Vec<String> = table.column_names().map(escape_cell).collect();
        let rows: Vec<Vec<String>> = (0..table.n_rows())
            .filter_map(|i| table.row(i))
            .map(|row| row.iter().map(|v| escape_cell(&v.to_string())).collect())
            .collect();

        let mut inner = MarkdownReport { blocks: Vec::new() };
        inner.add_table(&headers, &rows);
        self.blocks.push(format!(
            "<div style=\"overflow-x: auto;\">\n\n{}\n\n</div>",
            inner.blocks.join("")
        ));
    }

    /// Adds raw markdown
    pub fn add_markdown(&mut self, markdown: &str) {
        self.blocks.push(markdown.to_string());
    }

    /// Adds a numbered, nested table of contents
    ///
    /// Returns each heading's anchor so the caller can attach them to the headings
    /// when they are added.
    ///
    /// # Errors
    ///
    /// Returns a validation error if two headings share a title, since their anchors
    /// would clash.
    pub fn add_table_of_contents(&mut self, entries: &[TocEntry]) -> Result<HashMap<String, String>> {
        let mut markdown = String::new();
        let mut anchors = HashMap::new();
        collect_toc(entries, 0, &mut markdown, &mut anchors)?;
        self.blocks.push(markdown);
        Ok(anchors)
    }

    /// Renders the document
    pub fn render(&self) -> String {
        self.blocks.join("\n\n")
    }

    /// Writes the rendered document as UTF-8, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.render())?;
        Ok(())
    }
}

fn collect_toc(
    entries: &[TocEntry],
    level: usize,
    markdown: &mut String,
    anchors: &mut HashMap<String, String>,
) -> Result<()> {
    for (index, entry) in entries.iter().enumerate() {
        let anchor = anchor_for(&entry.title);
        markdown.push_str(&format!(
            "{}{}. [{}](#{})\n",
            "    ".repeat(level),
            index + 1,
            entry.title,
            anchor
        ));

        if anchors.insert(entry.title.clone(), anchor).is_some() {
            return Err(DextractError::Validation(format!(
                "Duplicate heading '{}' in table of contents",
                entry.title
            )));
        }

        collect_toc(&entry.children, level + 1, markdown, anchors)?;
    }
    Ok(())
}

fn flatten_definition(definition: &str) -> String {
    let definition = definition.replace("\n\n", "<br><br>");
    let mut flattened = String::with_capacity(definition.len());
    let mut previous = None;
    for c in definition.chars() {
        if c == '\n' && previous != Some('\\') {
            flattened.push(' ');
        } else {
            flattened.push(c);
        }
        previous = Some(c);
    }
    flattened
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
