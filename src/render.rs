//! Plain-text rendering of a `Snapshot` for terminals.
//!
//! Catalog bodies carry inline HTML; it is reduced to text here. Browser
//! rendering is the host page's job and consumes the serialized snapshot.

use crate::catalog::{Action, Effect, ImageRef, Layout, Node, Step};
use crate::navigator::{Commands, Content, Progress, SectionInfo, Snapshot};
use std::fmt;

pub const OUTCOME_HINT: &str = "Outcome reached. Use Restart to try another path.";

pub fn render_snapshot(snapshot: &Snapshot<'_>, writer: &mut impl fmt::Write) -> fmt::Result {
    writeln!(writer, "{}", snapshot.title)?;
    writeln!(writer, "{}", "=".repeat(snapshot.title.chars().count().max(3)))?;
    render_tabs(&snapshot.commands, writer)?;

    match &snapshot.content {
        Content::Step {
            section,
            index: _,
            step,
        } => {
            writeln!(writer, "{}", position_line(section, &snapshot.progress))?;
            render_step(step, writer)?;
        }
        Content::AllSteps { section, steps } => {
            writeln!(writer, "{}", section_heading(section))?;
            writeln!(writer, "All steps")?;
            for (idx, step) in steps.iter().enumerate() {
                writeln!(writer)?;
                writeln!(writer, "{}.", idx + 1)?;
                render_step(step, writer)?;
            }
        }
        Content::Node { node } => render_node(node, &snapshot.progress, writer)?,
        Content::Missing => writeln!(writer, "(nothing to show)")?,
    }

    render_commands(&snapshot.commands, writer)
}

/// Render into a fresh `String`.
pub fn snapshot_to_string(snapshot: &Snapshot<'_>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = render_snapshot(snapshot, &mut out);
    out
}

fn render_tabs(commands: &Commands<'_>, writer: &mut impl fmt::Write) -> fmt::Result {
    if commands.sections.len() < 2 {
        return Ok(());
    }
    let tabs: Vec<String> = commands
        .sections
        .iter()
        .map(|tab| {
            if tab.active {
                format!("[{}]", tab.label)
            } else {
                tab.label.to_string()
            }
        })
        .collect();
    writeln!(writer, "sections: {}", tabs.join(" | "))
}

fn section_heading(section: &SectionInfo<'_>) -> String {
    match section.path_label {
        Some(path) => format!("{} • {path}", section.label),
        None => section.label.to_string(),
    }
}

fn position_line(section: &SectionInfo<'_>, progress: &Progress) -> String {
    let mut line = format!("{} • Step {}", section_heading(section), progress.ordinal);
    if let Some(total) = progress.total {
        line.push_str(&format!(" of {total}"));
    }
    if let Some(percent) = progress.percent {
        line.push_str(&format!(" [{percent}%]"));
    }
    line
}

fn render_step(step: &Step, writer: &mut impl fmt::Write) -> fmt::Result {
    writeln!(writer, "## {}", plain_text(&step.title))?;
    let body = plain_text(&step.body);
    if !body.is_empty() {
        writeln!(writer, "{body}")?;
    }
    if let Some(note) = step.note.as_deref() {
        writeln!(writer, "  note: {}", plain_text(note))?;
    }
    for warning in &step.warnings {
        writeln!(writer, "  warning: {}", plain_text(warning))?;
    }
    render_images(&step.images, &step.layout, writer)
}

fn render_images(
    images: &[ImageRef],
    layout: &Layout,
    writer: &mut impl fmt::Write,
) -> fmt::Result {
    if images.is_empty() {
        return Ok(());
    }
    if *layout == Layout::Pair {
        let srcs: Vec<&str> = images.iter().map(|img| img.src.as_str()).collect();
        return writeln!(writer, "  images: {}", srcs.join(" | "));
    }
    for image in images {
        match image.alt.as_deref().filter(|alt| !alt.is_empty()) {
            Some(alt) => writeln!(writer, "  image: {} ({alt})", image.src)?,
            None => writeln!(writer, "  image: {}", image.src)?,
        }
    }
    Ok(())
}

fn render_node(node: &Node, progress: &Progress, writer: &mut impl fmt::Write) -> fmt::Result {
    writeln!(writer, "Node: {} • depth {}", node.id, progress.ordinal)?;
    writeln!(writer, "## {}", plain_text(&node.title))?;
    let text = plain_text(&node.text);
    if !text.is_empty() {
        writeln!(writer, "{text}")?;
    }
    for (idx, choice) in node.choices().iter().enumerate() {
        writeln!(writer, "  {}) {}", idx + 1, plain_text(&choice.label))?;
    }
    if node.is_terminal() {
        writeln!(writer, "{OUTCOME_HINT}")?;
    }
    Ok(())
}

fn render_commands(commands: &Commands<'_>, writer: &mut impl fmt::Write) -> fmt::Result {
    for action in commands.actions {
        writeln!(writer, "  * {}", describe_action(action))?;
    }
    if let Some(path) = commands.offered_path {
        writeln!(writer, "Alternative steps available: `path {path}`")?;
    }

    let mut available = Vec::new();
    if commands.can_go_back {
        available.push("back".to_string());
    }
    if commands.can_go_next {
        available.push("next".to_string());
    }
    if !commands.choices.is_empty() {
        available.push(format!("1-{}", commands.choices.len()));
    }
    if commands.can_show_all {
        available.push("all".to_string());
    }
    if !commands.paths.is_empty() {
        available.push("path <name>".to_string());
        available.push("main".to_string());
    }
    available.push("jump <key>:<index>".to_string());
    available.push("reset".to_string());
    writeln!(writer, "> {}", available.join(", "))
}

pub fn describe_action(action: &Action) -> String {
    match &action.effect {
        Effect::CopyText { text } => format!("{} (copy \"{text}\")", action.label),
        Effect::OpenSection {
            fragment,
            anchor: Some(anchor),
        } => format!("{} (open {fragment}{anchor})", action.label),
        Effect::OpenSection {
            fragment,
            anchor: None,
        } => format!("{} (open {fragment})", action.label),
        Effect::OpenUrl { url } => format!("{} ({url})", action.label),
    }
}

/// Reduce inline HTML to one line of text: tags dropped, list items bulleted,
/// common entities decoded, whitespace collapsed.
pub fn plain_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let Some(close) = rest[open..].find('>') else {
            text.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let tag = &rest[open + 1..open + close];
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        if name == "li" && !tag.starts_with('/') {
            text.push_str(" • ");
        } else {
            text.push(' ');
        }
        rest = &rest[open + close + 1..];
    }
    text.push_str(rest);

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&amp;", "&");
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin;

    #[test]
    fn plain_text_strips_markup() {
        assert_eq!(
            plain_text("Wear it on your <b>left wrist</b> &amp; tighten."),
            "Wear it on your left wrist & tighten."
        );
        assert_eq!(
            plain_text("<ol>\n <li>Unplug.</li>\n <li>Peel.</li></ol>"),
            "• Unplug. • Peel."
        );
        assert_eq!(plain_text("a < b"), "a < b");
    }

    #[test]
    fn renders_linear_step_with_progress() {
        let repo = builtin::repository().unwrap();
        let mut nav = repo.navigator("study_procedures").unwrap();
        let text = snapshot_to_string(&nav.next().unwrap());
        assert!(text.starts_with("Study participation procedures\n"));
        assert!(text.contains("[Section 5.1: Wearing DIRT Watch]"));
        assert!(text.contains("Step 2 of 6 [20%]"));
        assert!(text.contains("## Wearing the DIRT watch"));
        assert!(text.contains("image: assets/procedure_1.jpg"));
        assert!(text.contains("> back, next, all"));
    }

    #[test]
    fn renders_result_node_with_actions() {
        let repo = builtin::repository().unwrap();
        let mut nav = repo.navigator("troubleshooter").unwrap();
        nav.choose(0).unwrap();
        let text = snapshot_to_string(&nav.choose(2).unwrap());
        assert!(text.contains("Node: r_notcharging • depth 3"));
        assert!(text.contains(OUTCOME_HINT));
        assert!(text.contains("* Open Section 2 (open charging_device.html)"));
    }
}
