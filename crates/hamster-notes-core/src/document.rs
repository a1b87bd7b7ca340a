use serde::{Deserialize, Serialize};
use thiserror::Error;

const FENCE: &str = "---";

/// Line span of a front-matter block, as a metadata cache reports it.
///
/// `start_line` is the opening `---` fence and `end_line` the closing one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrontmatterBlock {
    pub start_line: usize,
    pub end_line: usize,
}

/// Errors produced when addressing a document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    /// Requested row is past the end of the document.
    #[error("line {line} is out of range (document has {total} lines)")]
    LineOutOfRange { line: usize, total: usize },
}

/// Read-only snapshot of a markdown note plus its cached front-matter position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    lines: Vec<String>,
    frontmatter: Option<FrontmatterBlock>,
}

impl Document {
    /// Split `text` into rows and locate the front-matter block, if any.
    pub fn parse(text: &str) -> Self {
        let lines: Vec<String> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
            .collect();
        let frontmatter = locate_frontmatter(&lines);
        Self { lines, frontmatter }
    }

    pub fn frontmatter(&self) -> Option<FrontmatterBlock> {
        self.frontmatter
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Row at a 0-based index.
    pub fn line(&self, index: usize) -> Result<&str, DocumentError> {
        self.lines
            .get(index)
            .map(String::as_str)
            .ok_or(DocumentError::LineOutOfRange {
                line: index,
                total: self.lines.len(),
            })
    }

    /// Raw rows `[start_line, end_line)` of the front-matter block joined with `\n`.
    pub fn frontmatter_slice(&self) -> Option<String> {
        let block = self.frontmatter?;
        Some(self.lines[block.start_line..block.end_line].join("\n"))
    }
}

fn locate_frontmatter(lines: &[String]) -> Option<FrontmatterBlock> {
    if lines.first().map(|l| l.trim_end()) != Some(FENCE) {
        return None;
    }
    lines
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, line)| line.trim_end() == FENCE)
        .map(|(end_line, _)| FrontmatterBlock {
            start_line: 0,
            end_line,
        })
}
