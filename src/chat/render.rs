//! Terminal rendering of lightly-structured message text.
//!
//! Recognizes headings (`#`), bullet and numbered list items, fenced code
//! blocks with an optional language tag, inline `[text](url)` links and
//! `**bold**` markers. Everything else is prose.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, text: String },
    Paragraph(String),
    Bullet(String),
    Numbered { number: u32, text: String },
    Code { language: Option<String>, code: String },
}

impl Block {
    fn is_list_item(&self) -> bool {
        matches!(self, Block::Bullet(_) | Block::Numbered { .. })
    }
}

pub fn parse(content: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let trimmed = line.trim();

        if let Some(fence) = trimmed.strip_prefix("```") {
            flush_paragraph(&mut paragraph, &mut blocks);
            let language = fence.trim();
            let language = (!language.is_empty()).then(|| language.to_string());

            // An unterminated fence runs to the end of the message.
            let mut code = Vec::new();
            for code_line in lines.by_ref() {
                if code_line.trim_start().starts_with("```") {
                    break;
                }
                code.push(code_line);
            }
            blocks.push(Block::Code {
                language,
                code: code.join("\n"),
            });
            continue;
        }

        if trimmed.is_empty() {
            flush_paragraph(&mut paragraph, &mut blocks);
            continue;
        }

        if let Some((level, text)) = heading(trimmed) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Heading {
                level,
                text: render_inline(text),
            });
        } else if let Some(text) = bullet(trimmed) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Bullet(render_inline(text)));
        } else if let Some((number, text)) = numbered(trimmed) {
            flush_paragraph(&mut paragraph, &mut blocks);
            blocks.push(Block::Numbered {
                number,
                text: render_inline(text),
            });
        } else {
            paragraph.push(trimmed);
        }
    }

    flush_paragraph(&mut paragraph, &mut blocks);
    blocks
}

fn flush_paragraph(paragraph: &mut Vec<&str>, blocks: &mut Vec<Block>) {
    if paragraph.is_empty() {
        return;
    }
    blocks.push(Block::Paragraph(render_inline(&paragraph.join(" "))));
    paragraph.clear();
}

fn heading(line: &str) -> Option<(u8, &str)> {
    let level = line.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let text = line[level..].strip_prefix(' ')?;
    Some((level as u8, text.trim()))
}

fn bullet(line: &str) -> Option<&str> {
    ["- ", "* ", "+ "]
        .iter()
        .find_map(|marker| line.strip_prefix(marker))
        .map(str::trim)
}

fn numbered(line: &str) -> Option<(u32, &str)> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let number = line[..digits].parse().ok()?;
    let rest = &line[digits..];
    let text = rest
        .strip_prefix(". ")
        .or_else(|| rest.strip_prefix(") "))?;
    Some((number, text.trim()))
}

/// Rewrites `[label](url)` as `label <url>` and drops `**` emphasis markers.
pub fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('[') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let link = after.find("](").and_then(|close| {
            let label = &after[..close];
            let tail = &after[close + 2..];
            let end = tail.find(')')?;
            (!label.contains('[')).then_some((label, &tail[..end], close + 2 + end + 1))
        });

        match link {
            Some((label, url, consumed)) => {
                if label.is_empty() || label == url {
                    out.push_str(url);
                } else {
                    out.push_str(label);
                    out.push_str(" <");
                    out.push_str(url);
                    out.push('>');
                }
                rest = &after[consumed..];
            }
            None => {
                out.push('[');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    out.replace("**", "")
}

/// Renders message content for a terminal. Code blocks are framed so they
/// stand apart from prose.
pub fn render(content: &str) -> String {
    let blocks = parse(content);
    let mut out = String::new();
    let mut prev: Option<&Block> = None;

    for block in &blocks {
        if let Some(p) = prev
            && !(p.is_list_item() && block.is_list_item())
        {
            out.push('\n');
        }

        match block {
            Block::Heading { level, text } => {
                out.push_str(text);
                out.push('\n');
                let underline = if *level == 1 { '=' } else { '-' };
                out.extend(std::iter::repeat_n(underline, text.chars().count()));
                out.push('\n');
            }
            Block::Paragraph(text) => {
                out.push_str(text);
                out.push('\n');
            }
            Block::Bullet(text) => {
                out.push_str(&format!("  • {}\n", text));
            }
            Block::Numbered { number, text } => {
                out.push_str(&format!("  {}. {}\n", number, text));
            }
            Block::Code { language, code } => {
                match language {
                    Some(lang) => out.push_str(&format!("  ┌── {}\n", lang)),
                    None => out.push_str("  ┌──\n"),
                }
                for line in code.lines() {
                    out.push_str(&format!("  │ {}\n", line));
                }
                out.push_str("  └──\n");
            }
        }

        prev = Some(block);
    }

    out.trim_end_matches('\n').to_string()
}
