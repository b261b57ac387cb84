//! Markdown to Notion block conversion for generated scripts.
//!
//! A single forward pass classifies each line; consecutive plain lines are
//! buffered and joined into one paragraph. Only paragraphs get inline
//! styling: `[visual cues]` become italic runs, otherwise `**bold**` spans
//! are honoured.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Block, TextRun};

static VISUAL_CUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]").expect("valid visual cue regex"));

/// Convert generated markdown into blocks. Never fails; anything that is not
/// recognised ends up in a paragraph. The result always ends with a divider.
pub fn convert(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        let head = line.trim_start();
        let body = head.trim_end();

        if body.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            continue;
        }

        let block = if let Some(rest) = head.strip_prefix("# ") {
            Block::Heading { level: 1, text: rest.trim_end().to_string() }
        } else if let Some(rest) = head.strip_prefix("## ") {
            Block::Heading { level: 2, text: rest.trim_end().to_string() }
        } else if let Some(rest) = head.strip_prefix("### ") {
            Block::Heading { level: 3, text: rest.trim_end().to_string() }
        } else if let Some(rest) = head.strip_prefix("- ").or_else(|| head.strip_prefix("* ")) {
            Block::BulletedItem(rest.trim_end().to_string())
        } else if is_numbered(head) {
            // Falls back to the whole line when there is no ". " separator.
            let item = head.split_once(". ").map(|(_, rest)| rest).unwrap_or(head);
            Block::NumberedItem(item.trim_end().to_string())
        } else if body.starts_with("**") && body.ends_with("**") {
            Block::Paragraph(vec![TextRun::bold(&body.replace("**", ""))])
        } else {
            paragraph.push(body);
            continue;
        };

        flush_paragraph(&mut paragraph, &mut blocks);
        blocks.push(block);
    }

    flush_paragraph(&mut paragraph, &mut blocks);
    blocks.push(Block::Divider);
    blocks
}

/// `"1. "` through `"9. "`.
fn is_numbered(line: &str) -> bool {
    let mut chars = line.chars();
    matches!(chars.next(), Some('1'..='9')) && chars.as_str().starts_with(". ")
}

fn flush_paragraph(buffer: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if buffer.is_empty() {
        return;
    }
    let text = buffer.join(" ");
    buffer.clear();
    if !text.is_empty() {
        blocks.push(Block::Paragraph(inline_runs(&text)));
    }
}

/// Split paragraph text into styled runs.
pub fn inline_runs(text: &str) -> Vec<TextRun> {
    let mut runs = Vec::new();

    if VISUAL_CUE_RE.is_match(text) {
        let mut last = 0;
        for cue in VISUAL_CUE_RE.find_iter(text) {
            push_nonblank(&mut runs, &text[last..cue.start()], TextRun::plain);
            runs.push(TextRun::italic(cue.as_str()));
            last = cue.end();
        }
        push_nonblank(&mut runs, &text[last..], TextRun::plain);
    } else if text.contains("**") {
        for (i, part) in text.split("**").enumerate() {
            if i % 2 == 1 {
                push_nonblank(&mut runs, part, TextRun::bold);
            } else {
                push_nonblank(&mut runs, part, TextRun::plain);
            }
        }
    } else {
        runs.push(TextRun::plain(text));
    }

    if runs.is_empty() {
        runs.push(TextRun::plain(text));
    }
    runs
}

fn push_nonblank(runs: &mut Vec<TextRun>, segment: &str, make: fn(&str) -> TextRun) {
    if !segment.trim().is_empty() {
        runs.push(make(segment));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MAX_RUN_CHARS;

    fn para(text: &str) -> Block {
        Block::Paragraph(vec![TextRun::plain(text)])
    }

    #[test]
    fn plain_text_is_one_paragraph() {
        let blocks = convert("Just some words\nthat keep going");
        assert_eq!(
            blocks,
            vec![para("Just some words that keep going"), Block::Divider]
        );
    }

    #[test]
    fn blank_input_is_only_divider() {
        assert_eq!(convert(""), vec![Block::Divider]);
        assert_eq!(convert("\n  \n\t\n"), vec![Block::Divider]);
    }

    #[test]
    fn heading_then_body() {
        assert_eq!(
            convert("# Title\n\nBody text"),
            vec![
                Block::Heading { level: 1, text: "Title".into() },
                para("Body text"),
                Block::Divider,
            ]
        );
    }

    #[test]
    fn heading_levels() {
        let blocks = convert("## Two\n### Three\n#### Four");
        assert_eq!(blocks[0], Block::Heading { level: 2, text: "Two".into() });
        assert_eq!(blocks[1], Block::Heading { level: 3, text: "Three".into() });
        assert_eq!(blocks[2], para("#### Four"));
    }

    #[test]
    fn bullet_items() {
        assert_eq!(
            convert("- item one\n- item two"),
            vec![
                Block::BulletedItem("item one".into()),
                Block::BulletedItem("item two".into()),
                Block::Divider,
            ]
        );
        assert_eq!(convert("* star")[0], Block::BulletedItem("star".into()));
    }

    #[test]
    fn marker_without_text_gives_empty_item() {
        assert_eq!(convert("- ")[0], Block::BulletedItem(String::new()));
        assert_eq!(convert("  - \t")[0], Block::BulletedItem(String::new()));
        assert_eq!(convert("3. ")[0], Block::NumberedItem(String::new()));
    }

    #[test]
    fn numbered_items() {
        let blocks = convert("1. First\n9. Ninth. With a dot\n10. Ten");
        assert_eq!(blocks[0], Block::NumberedItem("First".into()));
        assert_eq!(blocks[1], Block::NumberedItem("Ninth. With a dot".into()));
        // two-digit numbers are not list markers
        assert_eq!(blocks[2], para("10. Ten"));
    }

    #[test]
    fn whole_bold_line() {
        assert_eq!(
            convert("**Important**"),
            vec![
                Block::Paragraph(vec![TextRun::bold("Important")]),
                Block::Divider,
            ]
        );
        assert_eq!(
            convert("**Tip:** use **both**"),
            vec![
                Block::Paragraph(vec![TextRun::bold("Tip: use both")]),
                Block::Divider,
            ]
        );
    }

    #[test]
    fn visual_cue_is_italic() {
        assert_eq!(
            convert("Check [b-roll: city shot] this out"),
            vec![
                Block::Paragraph(vec![
                    TextRun::plain("Check "),
                    TextRun::italic("[b-roll: city shot]"),
                    TextRun::plain(" this out"),
                ]),
                Block::Divider,
            ]
        );
    }

    #[test]
    fn brackets_win_over_bold() {
        let runs = inline_runs("**Look** [zoom in] now");
        assert_eq!(
            runs,
            vec![
                TextRun::plain("**Look** "),
                TextRun::italic("[zoom in]"),
                TextRun::plain(" now"),
            ]
        );
    }

    #[test]
    fn inline_bold_alternates() {
        let runs = inline_runs("This is **really** important and **fun**");
        assert_eq!(
            runs,
            vec![
                TextRun::plain("This is "),
                TextRun::bold("really"),
                TextRun::plain(" important and "),
                TextRun::bold("fun"),
            ]
        );
    }

    #[test]
    fn blank_segments_are_dropped() {
        assert_eq!(inline_runs("[a] [b]"), vec![TextRun::italic("[a]"), TextRun::italic("[b]")]);
        assert_eq!(inline_runs("** **"), vec![TextRun::plain("** **")]);
    }

    #[test]
    fn empty_brackets_are_plain() {
        assert_eq!(inline_runs("call foo[] now"), vec![TextRun::plain("call foo[] now")]);
    }

    #[test]
    fn headings_and_items_skip_inline_parsing() {
        let blocks = convert("## A **bold** [cue]\n- **x**");
        assert_eq!(blocks[0].runs(), vec![TextRun::plain("A **bold** [cue]")]);
        assert_eq!(blocks[1].runs(), vec![TextRun::plain("**x**")]);
    }

    #[test]
    fn markers_flush_pending_paragraph() {
        let blocks = convert("intro line\nsecond line\n## Next\nafter");
        assert_eq!(
            blocks,
            vec![
                para("intro line second line"),
                Block::Heading { level: 2, text: "Next".into() },
                para("after"),
                Block::Divider,
            ]
        );
    }

    #[test]
    fn indented_and_crlf_lines() {
        let blocks = convert("  # Title\r\n\r\n   - item\r\n  text  \r\n");
        assert_eq!(
            blocks,
            vec![
                Block::Heading { level: 1, text: "Title".into() },
                Block::BulletedItem("item".into()),
                para("text"),
                Block::Divider,
            ]
        );
    }

    #[test]
    fn horizontal_rule_is_kept_as_text() {
        let blocks = convert("---");
        assert_eq!(blocks, vec![para("---"), Block::Divider]);
    }

    #[test]
    fn long_paragraph_is_truncated() {
        let text = "a".repeat(MAX_RUN_CHARS * 2);
        let blocks = convert(&text);
        match &blocks[0] {
            Block::Paragraph(runs) => assert_eq!(runs[0].content.len(), MAX_RUN_CHARS),
            other => panic!("unexpected block {:?}", other),
        }
    }
}
