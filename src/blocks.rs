//! Typed view of Notion content blocks.
//!
//! The API returns loosely-shaped JSON objects tagged by a `type` string with
//! the payload stored under a key of the same name. [`Block::from_json`]
//! folds that into the closed [`BlockKind`] set so the parser can match
//! exhaustively. Anything unexpected decodes to [`BlockKind::Unsupported`]
//! rather than failing.

use serde_json::Value;

/// Ordered text runs of a rich-text field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText(pub Vec<String>);

impl RichText {
    /// Plain concatenation of all runs.
    pub fn plain(&self) -> String {
        self.0.concat()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|run| run.is_empty())
    }

    /// Read an array of rich-text objects, taking each run's `plain_text`.
    pub fn from_json(value: &Value) -> Option<Self> {
        let runs = value.as_array()?;
        Some(RichText(
            runs.iter()
                .filter_map(|run| run.get("plain_text").and_then(Value::as_str))
                .map(str::to_string)
                .collect(),
        ))
    }
}

impl From<&str> for RichText {
    fn from(text: &str) -> Self {
        RichText(vec![text.to_string()])
    }
}

/// Content kind of a block, with the fields the mirror needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph(RichText),
    /// Heading level 1 to 3.
    Heading { level: u8, text: RichText },
    BulletedListItem(RichText),
    NumberedListItem(RichText),
    ToDo { text: RichText, checked: bool },
    Toggle(RichText),
    Quote(RichText),
    Code(RichText),
    Callout(RichText),
    Divider,
    TableRow(Vec<RichText>),
    ColumnList,
    Column,
    SyncedBlock,
    ChildPage,
    /// Any other kind. Carries its rich text if the payload had one.
    Unsupported { kind: String, text: Option<RichText> },
}

impl BlockKind {
    fn decode(kind: &str, payload: Option<&Value>) -> Self {
        // Structural kinds are identified by name alone.
        match kind {
            "child_page" => return BlockKind::ChildPage,
            "column_list" => return BlockKind::ColumnList,
            "column" => return BlockKind::Column,
            "synced_block" => return BlockKind::SyncedBlock,
            "divider" => return BlockKind::Divider,
            _ => {}
        }

        let Some(payload) = payload else {
            return BlockKind::Unsupported {
                kind: kind.to_string(),
                text: None,
            };
        };
        let text = || {
            payload
                .get("rich_text")
                .and_then(RichText::from_json)
                .unwrap_or_default()
        };

        match kind {
            "paragraph" => BlockKind::Paragraph(text()),
            "heading_1" => BlockKind::Heading { level: 1, text: text() },
            "heading_2" => BlockKind::Heading { level: 2, text: text() },
            "heading_3" => BlockKind::Heading { level: 3, text: text() },
            "bulleted_list_item" => BlockKind::BulletedListItem(text()),
            "numbered_list_item" => BlockKind::NumberedListItem(text()),
            "to_do" => BlockKind::ToDo {
                text: text(),
                checked: payload
                    .get("checked")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            "toggle" => BlockKind::Toggle(text()),
            "quote" => BlockKind::Quote(text()),
            "code" => BlockKind::Code(text()),
            "callout" => BlockKind::Callout(text()),
            "table_row" => BlockKind::TableRow(
                payload
                    .get("cells")
                    .and_then(Value::as_array)
                    .map(|cells| {
                        cells
                            .iter()
                            .map(|cell| RichText::from_json(cell).unwrap_or_default())
                            .collect()
                    })
                    .unwrap_or_default(),
            ),
            other => BlockKind::Unsupported {
                kind: other.to_string(),
                text: payload.get("rich_text").and_then(RichText::from_json),
            },
        }
    }

    /// Kinds that group other blocks and may hide child-page references.
    pub fn is_transparent_container(&self) -> bool {
        matches!(
            self,
            BlockKind::ColumnList
                | BlockKind::Column
                | BlockKind::Callout(_)
                | BlockKind::Toggle(_)
                | BlockKind::BulletedListItem(_)
                | BlockKind::NumberedListItem(_)
                | BlockKind::Quote(_)
                | BlockKind::SyncedBlock
        )
    }
}

/// One node of a page's content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub id: String,
    pub has_children: bool,
    pub kind: BlockKind,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            has_children: false,
            kind,
        }
    }

    pub fn with_children(mut self) -> Self {
        self.has_children = true;
        self
    }

    /// Decode one element of a `blocks.children.list` result.
    pub fn from_json(value: &Value) -> Self {
        let kind = value.get("type").and_then(Value::as_str).unwrap_or("");
        Self {
            id: value
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            has_children: value
                .get("has_children")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            kind: BlockKind::decode(kind, value.get(kind)),
        }
    }

    /// True if the reader should look inside this block for child pages.
    pub fn may_hide_pages(&self) -> bool {
        self.has_children && self.kind.is_transparent_container()
    }
}
