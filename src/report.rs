//! Markdown report rendering.
//!
//! A pure function of the final snapshot: findings with severity icons and
//! ready-to-apply update blocks, diagrams in mermaid fences, collapsible
//! agent-output and error appendices.

use crate::channels::RunError;
use crate::model::{AgentOutput, Finding, Severity};
use crate::state::StateSnapshot;

/// Hidden marker the publisher prepends so re-runs can find and update the
/// previous comment.
pub const COMMENT_MARKER: &str = "<!-- docsmith-analysis -->";

fn severity_icon(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical => ":red_circle:",
        Severity::High => ":orange_circle:",
        Severity::Medium => ":yellow_circle:",
        Severity::Low => ":white_circle:",
        Severity::Info => ":blue_circle:",
    }
}

fn code_block(code: &str, language: &str) -> String {
    format!("```{language}\n{code}\n```")
}

fn collapsible(summary: &str, content: &str) -> String {
    format!("<details>\n<summary>{summary}</summary>\n\n{content}\n\n</details>")
}

/// Markdown table with columns padded to their widest cell.
fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let pad = |s: &str, w: usize| format!("{s:<w$}");
    let header_row = format!(
        "| {} |",
        headers
            .iter()
            .enumerate()
            .map(|(i, h)| pad(h, widths[i]))
            .collect::<Vec<_>>()
            .join(" | ")
    );
    let separator = format!(
        "| {} |",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join(" | ")
    );
    let mut lines = vec![header_row, separator];
    for row in rows {
        lines.push(format!(
            "| {} |",
            row.iter()
                .enumerate()
                .map(|(i, cell)| if i < widths.len() { pad(cell, widths[i]) } else { cell.clone() })
                .collect::<Vec<_>>()
                .join(" | ")
        ));
    }
    lines.join("\n")
}

fn format_finding(finding: &Finding) -> String {
    let mut parts = vec![format!(
        "### {} {}",
        severity_icon(finding.severity),
        finding.title
    )];

    let mut location = Vec::new();
    if let Some(path) = &finding.file_path {
        location.push(format!("`{path}`"));
    }
    if let Some(section) = &finding.target_section {
        location.push(format!("→ **{section}**"));
    }
    if !location.is_empty() {
        parts.push(location.join(" "));
    }

    parts.push(String::new());
    parts.push(finding.description.clone());

    if let Some(update) = &finding.recommended_update {
        parts.push(String::new());
        parts.push("**Recommended Update:**".to_string());
        parts.push(code_block(update.trim(), "markdown"));
    }

    if let Some(diagram) = &finding.diagram {
        parts.push(String::new());
        parts.push(code_block(diagram.trim(), "mermaid"));
    }

    parts.join("\n")
}

fn severity_summary(findings: &[Finding]) -> String {
    let mut counts = [0usize; 5];
    for finding in findings {
        counts[finding.severity.rank() as usize] += 1;
    }
    let rows: Vec<Vec<String>> = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ]
    .iter()
    .filter(|s| counts[s.rank() as usize] > 0)
    .map(|s| {
        vec![
            format!("{} {}", severity_icon(*s), s),
            counts[s.rank() as usize].to_string(),
        ]
    })
    .collect();
    format_table(&["Severity", "Count"], &rows)
}

fn format_agent_output(output: &AgentOutput) -> String {
    let mut content = vec![output.summary.clone()];
    if let Some(suggested) = &output.suggested_content {
        content.push(String::new());
        content.push(code_block(suggested.trim(), "markdown"));
    }
    if let Some(diagram) = &output.diagram {
        content.push(String::new());
        content.push(code_block(diagram.trim(), "mermaid"));
    }
    collapsible(
        &format!("Output from {}", output.agent),
        &content.join("\n"),
    )
}

fn format_errors(errors: &[RunError]) -> String {
    let listing = errors
        .iter()
        .map(|e| format!("- {e}"))
        .collect::<Vec<_>>()
        .join("\n");
    collapsible(
        &format!("{} error(s) during analysis", errors.len()),
        &listing,
    )
}

/// Renders the full report for a finished run.
#[must_use]
pub fn render(snapshot: &StateSnapshot) -> String {
    let mut sections: Vec<String> = vec!["# Documentation Analysis".to_string()];

    if let Some(meta) = &snapshot.change_metadata {
        sections.push(format!(
            "**{}/{}#{} — {}**",
            meta.owner, meta.repo, meta.number, meta.title
        ));
    }

    if snapshot.findings.is_empty() {
        sections.push("No documentation issues found. :tada:".to_string());
    } else {
        sections.push(format!(
            "Found **{}** documentation issue(s).",
            snapshot.findings.len()
        ));
        sections.push(severity_summary(&snapshot.findings));
        sections.push("## Findings".to_string());
        for finding in &snapshot.findings {
            sections.push(format_finding(finding));
        }
    }

    if !snapshot.validation_passed {
        sections.push(format!(
            "_Validation did not pass after {} analysis attempt(s); results may be incomplete._",
            snapshot.retry_count
        ));
    }

    if !snapshot.agent_outputs.is_empty() {
        sections.push("## Details".to_string());
        for output in &snapshot.agent_outputs {
            sections.push(format_agent_output(output));
        }
    }

    if !snapshot.errors.is_empty() {
        sections.push(format_errors(&snapshot.errors));
    }

    sections.join("\n\n")
}
