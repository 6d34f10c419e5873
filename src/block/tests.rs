use super::{Block, WireError, decode_stream, split_blocks};

fn texts(lines: &[&str]) -> Vec<String> {
    split_blocks(lines.iter().copied()).map(|b| b.text).collect()
}

fn stream(lines: &[&str]) -> String {
    split_blocks(lines.iter().copied()).map(|b| b.encode()).collect()
}

// ----------------------------------------------------------------------------
// Wire format
// ----------------------------------------------------------------------------

#[test]
fn test_encode_layout() {
    let block = Block::new("f.py:1: error: bad").at("f.py", Some(1), None);
    assert_eq!(block.encode(), "f.py\x1f1\x1f\x1f\x1f\x1ff.py:1: error: bad\0");
}

#[test]
fn test_encode_context_block() {
    assert_eq!(
        Block::new("Found 8 errors").encode(),
        "\x1f\x1f\x1f\x1f\x1fFound 8 errors\0"
    );
}

#[test]
fn test_roundtrip_preserves_fields() {
    let block = Block {
        path: "dir with space/a.rs".into(),
        line: Some(3),
        column: None,
        end_line: Some(4),
        end_column: Some(0),
        text: "line one\n\tline two\x1fwith separator\n\x1b[31mred\x1b[0m".into(),
    };
    assert_eq!(Block::decode(&block.encode()), Ok(block));
}

#[test]
fn test_roundtrip_empty_text() {
    let block = Block::default();
    assert_eq!(Block::decode(&block.encode()), Ok(block));
}

#[test]
fn test_encode_drops_nul() {
    let block = Block::new("a\0b");
    assert_eq!(block.encode().matches('\0').count(), 1);
    assert_eq!(Block::decode(&block.encode()).unwrap().text, "ab");
}

#[test]
fn test_decode_errors() {
    assert_eq!(Block::decode("a\x1f1\x1f"), Err(WireError::MissingFields(3)));
    assert_eq!(
        Block::decode("a\x1fx\x1f\x1f\x1f\x1ftext"),
        Err(WireError::InvalidNumber {
            field: "line",
            value: "x".into()
        })
    );
}

// ----------------------------------------------------------------------------
// Heuristic segmentation
// ----------------------------------------------------------------------------

#[test]
fn test_same_location_single_block() {
    assert_eq!(
        texts(&["a.py:1: error: x\n", "a.py:1: error: y\n"]),
        ["a.py:1: error: x\na.py:1: error: y"]
    );
}

#[test]
fn test_different_location_two_blocks() {
    assert_eq!(
        texts(&["a.py:1: error: x\n", "a.py:2: error: y\n"]),
        ["a.py:1: error: x", "a.py:2: error: y"]
    );
}

#[test]
fn test_end_to_end_scenario() {
    let output = "f.py:1: error: bad\nfoo(\n)\n\nf.py:2: warning: also bad\n";
    let lines: Vec<&str> = output.split_inclusive('\n').collect();
    let blocks: Vec<Block> = split_blocks(lines).collect();

    assert_eq!(
        blocks,
        [
            Block::new("f.py:1: error: bad\nfoo(\n)").at("f.py", Some(1), None),
            Block::new("f.py:2: warning: also bad").at("f.py", Some(2), None),
        ]
    );
}

#[test]
fn test_stream_separators() {
    let s = stream(&["a.py:1: error: x\n", "a.py:2: error: y\n"]);
    assert!(!s.starts_with('\0'));
    assert_eq!(s.matches('\0').count(), 2);
    assert!(!s.contains("\n\0"));
    assert!(!s.contains("\0\n"));
}

#[test]
fn test_final_newline_not_emitted() {
    assert_eq!(texts(&["a.py:1: error: x\n", "context\n"]), ["a.py:1: error: x\ncontext"]);
}

#[test]
fn test_crlf_terminators() {
    assert_eq!(texts(&["a.py:1: error: x\r\n", "more\r\n"]), ["a.py:1: error: x\nmore"]);
}

#[test]
fn test_note_attaches_to_following_location() {
    let blocks: Vec<Block> = split_blocks([
        "a.py:1: error: first\n",
        "b.py: note: In function \"f\":\n",
        "b.py:5: error: inside f\n",
        "b.py:6: error: also inside f\n",
    ])
    .collect();

    assert_eq!(blocks.len(), 2);
    assert_eq!(
        blocks[1].text,
        "b.py: note: In function \"f\":\nb.py:5: error: inside f\nb.py:6: error: also inside f"
    );
    assert_eq!(blocks[1].path, "b.py");
    assert_eq!(blocks[1].line, Some(5));
}

#[test]
fn test_note_for_other_path_closed_by_location() {
    assert_eq!(
        texts(&[
            "b.py: note: In function \"f\":\n",
            "b.py:5: error: inside f\n",
            "c.py:1: error: elsewhere\n",
        ]),
        ["b.py: note: In function \"f\":\nb.py:5: error: inside f", "c.py:1: error: elsewhere"]
    );
}

#[test]
fn test_note_without_location_keeps_path() {
    let blocks: Vec<Block> = split_blocks(["x.py: note: context only\n"]).collect();
    assert_eq!(blocks[0].path, "x.py");
    assert_eq!(blocks[0].line, None);
}

#[test]
fn test_summary_and_separator_start_blocks() {
    assert_eq!(
        texts(&[
            "a.py:1: error: x\n",
            "Found 1 error in 1 file\n",
            "===== FAILURES =====\n",
            "____ test_x ____\n",
            "trace line\n",
        ]),
        [
            "a.py:1: error: x",
            "Found 1 error in 1 file",
            "===== FAILURES =====",
            "____ test_x ____\ntrace line",
        ]
    );
}

#[test]
fn test_summary_clears_location() {
    // After a summary, the same location does not merge into the summary
    // block but also does not start yet another block on its own.
    assert_eq!(
        texts(&["a.py:1: error: x\n", "Found 1 error\n", "a.py:1: error: x\n", "tail\n"]),
        ["a.py:1: error: x", "Found 1 error\na.py:1: error: x\ntail"]
    );
}

#[test]
fn test_leading_continuation_lines() {
    assert_eq!(
        texts(&["Running checks...\n", "a.py:1: error: x\n", "a.py:2: error: y\n"]),
        ["Running checks...\na.py:1: error: x", "a.py:2: error: y"]
    );
}

#[test]
fn test_blank_lines_only() {
    assert!(texts(&["\n", "\n"]).is_empty());
    assert!(texts(&[]).is_empty());
}

#[test]
fn test_extra_blank_line_is_idempotent() {
    let base = texts(&["a.py:1: error: x\n", "ctx\n", "\n", "a.py:2: error: y\n"]);
    let extra = texts(&["a.py:1: error: x\n", "ctx\n", "\n", "\n", "a.py:2: error: y\n"]);
    let before_boundary = texts(&["a.py:1: error: x\n", "ctx\n", "\n", "a.py:2: error: y\n", "\n"]);
    assert_eq!(base, extra);
    assert_eq!(base, before_boundary);
    assert_eq!(base, ["a.py:1: error: x\nctx", "a.py:2: error: y"]);
}

#[test]
fn test_blank_line_is_hard_boundary() {
    assert_eq!(
        texts(&["a.py:1: error: x\n", "\n", "a.py:1: error: x\n"]),
        ["a.py:1: error: x", "a.py:1: error: x"]
    );
}

#[test]
fn test_ansi_colored_lines_keep_color() {
    let blocks: Vec<Block> = split_blocks([
        "\x1b[1ma.py:1:\x1b[0m \x1b[31merror\x1b[0m: x\n",
        "\x1b[1ma.py:2:\x1b[0m \x1b[31merror\x1b[0m: y\n",
    ])
    .collect();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].text, "\x1b[1ma.py:1:\x1b[0m \x1b[31merror\x1b[0m: x");
    assert_eq!(blocks[1].line, Some(2));
}

#[test]
fn test_lazy_on_infinite_input() {
    let lines = (1..).map(|n| format!("a.py:{n}: error: e\n"));
    let first: Vec<Block> = split_blocks(lines).take(3).collect();
    assert_eq!(first.len(), 3);
    assert_eq!(first[2].line, Some(3));
}

#[test]
fn test_decode_stream_of_segmented_output() {
    let s = stream(&["a.py:1:2: error: x\n", "  ^\n", "b.py:3: note: n\n"]);
    let blocks = decode_stream(&s).unwrap();
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].column, Some(2));
    assert_eq!(blocks[0].text, "a.py:1:2: error: x\n  ^");
    assert_eq!(blocks[1].path, "b.py");
}
