use serde_json::{json, Map, Value};

/// Notion rejects text objects longer than this many characters.
pub const MAX_RUN_CHARS: usize = 2000;

/// A styled span of text inside a block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextRun {
    pub content: String,
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

impl TextRun {
    /// Plain run, truncated to [`MAX_RUN_CHARS`] code points.
    pub fn plain(content: &str) -> Self {
        Self {
            content: truncate_chars(content, MAX_RUN_CHARS),
            ..Default::default()
        }
    }

    pub fn bold(content: &str) -> Self {
        Self {
            bold: true,
            ..Self::plain(content)
        }
    }

    pub fn italic(content: &str) -> Self {
        Self {
            italic: true,
            ..Self::plain(content)
        }
    }

    pub fn to_json(&self) -> Value {
        let mut run = json!({
            "type": "text",
            "text": { "content": self.content },
        });
        let mut annotations = Map::new();
        if self.bold {
            annotations.insert("bold".into(), Value::Bool(true));
        }
        if self.italic {
            annotations.insert("italic".into(), Value::Bool(true));
        }
        if self.code {
            annotations.insert("code".into(), Value::Bool(true));
        }
        if !annotations.is_empty() {
            run["annotations"] = Value::Object(annotations);
        }
        run
    }
}

/// One unit of page content as written to Notion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(Vec<TextRun>),
    BulletedItem(String),
    NumberedItem(String),
    Divider,
}

impl Block {
    /// Heading levels outside 1..=3 are clamped into range.
    pub fn heading(level: u8, text: &str) -> Self {
        Block::Heading {
            level: level.clamp(1, 3),
            text: text.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Block::Heading { level: 1, .. } => "heading_1",
            Block::Heading { level: 2, .. } => "heading_2",
            Block::Heading { .. } => "heading_3",
            Block::Paragraph(_) => "paragraph",
            Block::BulletedItem(_) => "bulleted_list_item",
            Block::NumberedItem(_) => "numbered_list_item",
            Block::Divider => "divider",
        }
    }

    /// Runs carried by the block; headings and list items always hold exactly
    /// one unstyled run.
    pub fn runs(&self) -> Vec<TextRun> {
        match self {
            Block::Heading { text, .. } | Block::BulletedItem(text) | Block::NumberedItem(text) => {
                vec![TextRun::plain(text)]
            }
            Block::Paragraph(runs) => runs.clone(),
            Block::Divider => Vec::new(),
        }
    }

    pub fn to_json(&self) -> Value {
        let kind = self.kind();
        let body = match self {
            Block::Divider => json!({}),
            _ => {
                let rich_text: Vec<Value> = self.runs().iter().map(TextRun::to_json).collect();
                json!({ "rich_text": rich_text })
            }
        };
        let mut block = Map::new();
        block.insert("object".into(), json!("block"));
        block.insert("type".into(), json!(kind));
        block.insert(kind.into(), body);
        Value::Object(block)
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
