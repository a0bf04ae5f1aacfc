/// Splits a document's body into slide blocks on `---` lines that sit at
/// column 0 and outside a fenced code block. Blocks are returned with
/// leading/trailing blank lines intact; an empty trailing block (a
/// document ending in `---`) is dropped.
pub fn split_top_level_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut block_start = 0;
    let mut fence: Option<(char, usize)> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let content = line.trim_end_matches('\n').trim_end_matches('\r');
        let trimmed = content.trim_start();
        let indent = content.len() - trimmed.len();

        match fence {
            Some((ch, len)) => {
                if indent < 4 && is_fence_marker(trimmed, ch).is_some_and(|n| n >= len) {
                    fence = None;
                }
            }
            None => {
                if indent < 4 {
                    if let Some((ch, len)) = open_fence_marker(trimmed) {
                        fence = Some((ch, len));
                    } else if trimmed == "---" {
                        blocks.push(&text[block_start..offset]);
                        block_start = offset + line.len();
                    }
                }
            }
        }

        offset += line.len();
    }

    if block_start < text.len() {
        blocks.push(&text[block_start..]);
    }

    blocks.into_iter().filter(|b| !b.trim().is_empty()).collect()
}

fn open_fence_marker(trimmed: &str) -> Option<(char, usize)> {
    let ch = trimmed.chars().next()?;
    if ch != '`' && ch != '~' {
        return None;
    }
    let len = trimmed.chars().take_while(|&c| c == ch).count();
    (len >= 3).then_some((ch, len))
}

fn is_fence_marker(trimmed: &str, ch: char) -> Option<usize> {
    if !trimmed.chars().all(|c| c == ch) || trimmed.is_empty() {
        return None;
    }
    Some(trimmed.len())
}
