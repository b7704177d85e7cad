//! Block flattening.
//!
//! Renders a page's direct blocks as plain text, one line per block, using a
//! light Markdown-like notation. Child pages are not inlined; the crawler
//! visits them as documents of their own.

use crate::blocks::{Block, BlockKind, RichText};

/// Flatten blocks to text. Empty lines are dropped before joining.
///
/// Never fails: unknown or payload-less blocks render as nothing.
pub fn parse_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter_map(render_block)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_block(block: &Block) -> Option<String> {
    let line = match &block.kind {
        BlockKind::Paragraph(text) | BlockKind::Callout(text) => text.plain(),
        BlockKind::Heading { level, text } => {
            format!("{} {}", "#".repeat(usize::from(*level).clamp(1, 3)), text.plain())
        }
        BlockKind::BulletedListItem(text) => format!("- {}", text.plain()),
        BlockKind::NumberedListItem(text) => format!("1. {}", text.plain()),
        BlockKind::ToDo { text, checked } => {
            let mark = if *checked { "x" } else { " " };
            format!("[{}] {}", mark, text.plain())
        }
        BlockKind::Toggle(text) | BlockKind::Quote(text) => format!("> {}", text.plain()),
        BlockKind::Code(text) => format!("```\n{}\n```", text.plain()),
        BlockKind::Divider => "---".to_string(),
        BlockKind::TableRow(cells) => cells
            .iter()
            .map(RichText::plain)
            .collect::<Vec<_>>()
            .join(" | "),
        BlockKind::Unsupported {
            text: Some(text), ..
        } => text.plain(),
        BlockKind::ChildPage
        | BlockKind::ColumnList
        | BlockKind::Column
        | BlockKind::SyncedBlock
        | BlockKind::Unsupported { text: None, .. } => return None,
    };
    Some(line)
}
