//! Turning an editor line into a Hamster fact description.
//!
//! A fact reads `description@project,, #tag1, #tag2,`: the `,,` delimiter
//! separates free text from the trailing tag block, and an `@` already present
//! in the line wins over the note's `project`.

use tracing::debug;

use crate::frontmatter::FrontmatterMetadata;

/// Prefix of an unchecked markdown task.
pub const CHECKBOX: &str = "- [ ] ";
/// Separator between the description and the appended tag block.
pub const TAG_DELIMITER: &str = ",,";

/// Editor markup removed from a task line, in application order.
const MARKUP: [&str; 5] = [CHECKBOX, "[[#", "[[", "]]", "`"];

/// True when the line starts with an unchecked checkbox.
pub fn is_task(line: &str) -> bool {
    line.starts_with(CHECKBOX)
}

/// Strip checkbox, wiki-link and code markup from a line and trim it.
///
/// Removing one pattern can splice together another (a backtick between two
/// `[` leaves `[[` behind), so the pass is repeated until the text stops
/// changing. Every pass that changes the text shortens it, so this terminates.
pub fn sanitize(line: &str) -> String {
    let mut current = sanitize_once(line);
    loop {
        let next = sanitize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn sanitize_once(line: &str) -> String {
    MARKUP
        .iter()
        .fold(line.to_string(), |text, pattern| text.replace(*pattern, ""))
        .trim()
        .to_string()
}

/// Build the fact description for `line`, or `None` if it is not a task.
pub fn compose(line: &str, metadata: &FrontmatterMetadata) -> Option<String> {
    if !is_task(line) {
        debug!("line is not an unchecked task");
        return None;
    }

    let mut task = sanitize(line);

    if !task.contains('@') {
        if let Some(project) = metadata.project() {
            task = annotate_project(&task, project);
        }
    }

    if let Some(tags) = metadata.tags() {
        if !task.contains(TAG_DELIMITER) {
            task.push_str(TAG_DELIMITER);
        }
        task.push_str(&format_tags(&tags));
    }

    Some(task)
}

fn annotate_project(task: &str, project: &str) -> String {
    match task.split_once(TAG_DELIMITER) {
        Some((description, rest)) => format!("{description}@{project}{TAG_DELIMITER}{rest}"),
        None => format!("{task}@{project}"),
    }
}

fn format_tags(tags: &[String]) -> String {
    tags.iter().map(|tag| format!(" #{},", tag.trim())).collect()
}
