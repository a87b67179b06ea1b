//! Heading-delimited sections of a Markdown body
//!
//! A section starts at a heading line and runs until the next heading of
//! the same or a higher level (fewer `#`). Lines inside fenced code blocks
//! are never headings.

use std::ops::Range;

/// `(level, text)` of an ATX heading line
pub fn parse_heading(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = rest.trim().trim_end_matches('#').trim_end();
    Some((level, text))
}

/// Heading info per line, `None` for ordinary lines
pub fn heading_map<'a>(lines: &[&'a str]) -> Vec<Option<(usize, &'a str)>> {
    let mut in_fence = false;
    lines
        .iter()
        .map(|&line| {
            let trimmed = line.trim_start();
            if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
                in_fence = !in_fence;
                return None;
            }
            if in_fence { None } else { parse_heading(line) }
        })
        .collect()
}

/// Line ranges (heading included) of every section whose heading matches
pub fn section_ranges(lines: &[&str], is_match: impl Fn(&str) -> bool) -> Vec<Range<usize>> {
    let headings = heading_map(lines);
    let mut ranges = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        match headings[i] {
            Some((level, text)) if is_match(text) => {
                let end = (i + 1..lines.len())
                    .find(|&j| matches!(headings[j], Some((l, _)) if l <= level))
                    .unwrap_or(lines.len());
                ranges.push(i..end);
                i = end;
            }
            _ => i += 1,
        }
    }
    ranges
}

/// Content lines (heading excluded) of the first matching section
pub fn section_body<'a>(body: &'a str, is_match: impl Fn(&str) -> bool) -> Option<Vec<&'a str>> {
    let lines: Vec<&str> = body.lines().collect();
    let range = section_ranges(&lines, is_match).into_iter().next()?;
    Some(lines[range.start + 1..range.end].to_vec())
}

/// Body with every matching section removed
pub fn remove_sections(body: &str, is_match: impl Fn(&str) -> bool) -> String {
    let lines: Vec<&str> = body.lines().collect();
    let ranges = section_ranges(&lines, is_match);
    if ranges.is_empty() {
        return body.to_string();
    }
    let kept: Vec<&str> = lines
        .iter()
        .enumerate()
        .filter(|(i, _)| !ranges.iter().any(|r| r.contains(i)))
        .map(|(_, line)| *line)
        .collect();
    collapse_blank_lines(&kept.join("\n"))
}

/// Squash runs of blank lines into a single blank line
pub fn collapse_blank_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for line in text.lines() {
        let blank = line.trim().is_empty();
        if blank && out.last().is_some_and(|prev| prev.trim().is_empty()) {
            continue;
        }
        out.push(line);
    }
    out.join("\n")
}
