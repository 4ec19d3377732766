//! Mermaid diagram validation and sanitizing.
//!
//! Model-produced diagrams routinely carry characters that break rendering:
//! parentheses inside edge labels, unquoted special characters in node
//! labels, stray brackets. [`validate`] catches these; [`sanitize`] fixes
//! what it can; [`validate_and_sanitize`] chains the two and reports whether
//! the result is renderable.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

static FLOWCHART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(flowchart|graph)\s+(TD|TB|BT|RL|LR)").unwrap());
static SEQUENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^sequenceDiagram").unwrap());
static CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^classDiagram").unwrap());
static STATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^stateDiagram").unwrap());

/// Edge operator followed by a `|label|`.
static EDGE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(--?>|---|-\.->|==?>|~~>|--o|--x|<-->|<-\.->|<==?>)\|([^|]*)\|").unwrap()
});

/// Node id plus bracketed label, all bracket shapes.
static NODE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*(\[\[|\(\(|\[\(|\[/|>|\[|\(|\{)([^\]\)\}]+?)(\]\]|\)\)|\)\]|/\]|\]|\)|\})")
        .unwrap()
});

static SQUARE_NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\b([A-Za-z_][A-Za-z0-9_]*)\[([^\]"]+)\]"#).unwrap());

/// Trailing `\|?` captures an edge-label delimiter so those matches can be
/// left alone (the regex engine has no lookahead).
static ROUND_NODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\b([A-Za-z_][A-Za-z0-9_]*)\(([^)"]+)\)(\|?)"#).unwrap());

static PAREN_CHUNK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\([^)]*\)").unwrap());

static MERMAID_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```mermaid\s*\n(.*?)\n```").unwrap());

const PROBLEMATIC_IN_EDGE_LABELS: &[char] =
    &['(', ')', '[', ']', '{', '}', '<', '>', '"', '#', ';'];
const PROBLEMATIC_IN_NODE_LABELS: &[char] = &['(', ')', '&', '#', '<', '>'];

/// Recognized diagram families.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagramKind {
    Flowchart,
    Sequence,
    Class,
    State,
}

/// Detects the diagram family from its header line.
#[must_use]
pub fn detect_kind(code: &str) -> Option<DiagramKind> {
    let code = code.trim();
    if FLOWCHART.is_match(code) {
        Some(DiagramKind::Flowchart)
    } else if SEQUENCE.is_match(code) {
        Some(DiagramKind::Sequence)
    } else if CLASS.is_match(code) {
        Some(DiagramKind::Class)
    } else if STATE.is_match(code) {
        Some(DiagramKind::State)
    } else {
        None
    }
}

/// A reason a diagram will not render.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct DiagramIssue(pub String);

/// Checks a diagram for the issues that commonly break rendering: missing
/// header, unbalanced brackets, problematic characters in edge or node
/// labels.
pub fn validate(code: &str) -> Result<(), DiagramIssue> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        return Err(DiagramIssue("empty diagram code".into()));
    }
    if detect_kind(trimmed).is_none() {
        return Err(DiagramIssue(
            "no recognized diagram type (flowchart, sequenceDiagram, classDiagram, stateDiagram)"
                .into(),
        ));
    }
    check_bracket_balance(trimmed)?;
    check_edge_labels(trimmed)?;
    check_node_labels(trimmed)?;
    Ok(())
}

/// Bracket balance over the whole diagram, ignoring edge labels and quoted
/// strings.
fn check_bracket_balance(code: &str) -> Result<(), DiagramIssue> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut in_string = false;
    let mut string_char = '"';
    let mut in_edge_label = false;
    let mut prev = '\0';

    for (i, c) in code.char_indices() {
        if c == '|' && !in_string {
            in_edge_label = !in_edge_label;
            prev = c;
            continue;
        }
        if in_edge_label {
            prev = c;
            continue;
        }
        if (c == '"' || c == '\'') && prev != '\\' {
            if !in_string {
                in_string = true;
                string_char = c;
            } else if c == string_char {
                in_string = false;
            }
            prev = c;
            continue;
        }
        if in_string {
            prev = c;
            continue;
        }

        match c {
            '[' | '(' | '{' => stack.push((c, i)),
            ']' | ')' | '}' => {
                let Some((open, _)) = stack.pop() else {
                    return Err(DiagramIssue(format!(
                        "unbalanced bracket '{c}' at position {i}"
                    )));
                };
                let expected = match open {
                    '[' => ']',
                    '(' => ')',
                    _ => '}',
                };
                if c != expected {
                    return Err(DiagramIssue(format!(
                        "mismatched bracket: expected '{expected}', got '{c}' at position {i}"
                    )));
                }
            }
            _ => {}
        }
        prev = c;
    }

    if let Some((open, _)) = stack.first() {
        return Err(DiagramIssue(format!("unclosed bracket '{open}'")));
    }
    Ok(())
}

fn check_edge_labels(code: &str) -> Result<(), DiagramIssue> {
    for caps in EDGE_LABEL.captures_iter(code) {
        let label = &caps[2];
        for &c in PROBLEMATIC_IN_EDGE_LABELS {
            if label.contains(c) {
                return Err(DiagramIssue(format!(
                    "edge label contains problematic character '{c}': |{label}|"
                )));
            }
        }
    }
    Ok(())
}

fn check_node_labels(code: &str) -> Result<(), DiagramIssue> {
    for caps in NODE_LABEL.captures_iter(code) {
        let whole = &caps[0];
        if whole.contains('"') {
            continue;
        }
        let node_id = &caps[1];
        let label = &caps[3];
        for &c in PROBLEMATIC_IN_NODE_LABELS {
            if label.contains(c) {
                return Err(DiagramIssue(format!(
                    "node '{node_id}' has unquoted special character '{c}' in label: {label}"
                )));
            }
        }
    }
    Ok(())
}

/// Rewrites a diagram to fix the fixable: strips parenthesized chunks and
/// special characters from edge labels, quotes node labels that carry
/// special characters.
#[must_use]
pub fn sanitize(code: &str) -> String {
    let code = sanitize_edge_labels(code);
    sanitize_node_labels(&code)
}

fn sanitize_edge_labels(code: &str) -> String {
    EDGE_LABEL
        .replace_all(code, |caps: &regex::Captures<'_>| {
            let op = &caps[1];
            let label = PAREN_CHUNK.replace_all(&caps[2], "");
            let cleaned: String = label
                .chars()
                .filter(|c| !matches!(c, '[' | ']' | '{' | '}' | '<' | '>' | '#' | ';'))
                .collect();
            let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
            format!("{op}|{cleaned}|")
        })
        .into_owned()
}

fn sanitize_node_labels(code: &str) -> String {
    code.lines()
        .map(|line| {
            if line.trim().is_empty() || line.trim().starts_with("%%") {
                line.to_string()
            } else {
                sanitize_node_labels_in_line(line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Keywords that look like round-bracket nodes but are not.
const NON_NODE_IDS: &[&str] = &["subgraph", "end", "click", "style", "class", "linkstyle"];

fn sanitize_node_labels_in_line(line: &str) -> String {
    let needs_quoting =
        |label: &str| label.chars().any(|c| PROBLEMATIC_IN_NODE_LABELS.contains(&c));

    let result = SQUARE_NODE.replace_all(line, |caps: &regex::Captures<'_>| {
        let (id, label) = (&caps[1], &caps[2]);
        if needs_quoting(label) {
            format!("{id}[\"{}\"]", label.replace('"', "\\\""))
        } else {
            caps[0].to_string()
        }
    });

    ROUND_NODE
        .replace_all(&result, |caps: &regex::Captures<'_>| {
            let (id, label) = (&caps[1], &caps[2]);
            let trailing_pipe = &caps[3];
            if !trailing_pipe.is_empty() || NON_NODE_IDS.contains(&id.to_lowercase().as_str()) {
                return caps[0].to_string();
            }
            if needs_quoting(label) {
                format!("{id}(\"{}\"){trailing_pipe}", label.replace('"', "\\\""))
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Pulls diagram code out of a ```` ```mermaid ```` fence, or accepts bare
/// diagram text that starts with a recognized header.
#[must_use]
pub fn extract_diagram_code(text: &str) -> Option<String> {
    if let Some(caps) = MERMAID_FENCE.captures(text) {
        return Some(caps[1].trim().to_string());
    }
    let trimmed = text.trim();
    let bare_headers = ["flowchart", "graph", "sequenceDiagram", "classDiagram", "stateDiagram"];
    if bare_headers.iter().any(|h| trimmed.starts_with(h)) {
        return Some(trimmed.to_string());
    }
    None
}

/// Result of [`validate_and_sanitize`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sanitized {
    pub code: String,
    pub issue: Option<DiagramIssue>,
}

impl Sanitized {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issue.is_none()
    }
}

/// Validates, sanitizes, and re-validates in one call. The returned issue,
/// if any, describes why the sanitized output still will not render.
#[must_use]
pub fn validate_and_sanitize(code: &str) -> Sanitized {
    if code.trim().is_empty() {
        return Sanitized {
            code: String::new(),
            issue: Some(DiagramIssue("empty diagram code".into())),
        };
    }

    if let Err(issue) = validate(code) {
        debug!(%issue, "initial diagram validation failed");
    }

    let sanitized = sanitize(code);
    match validate(&sanitized) {
        Ok(()) => Sanitized {
            code: sanitized,
            issue: None,
        },
        Err(issue) => {
            warn!(%issue, "diagram still invalid after sanitizing");
            Sanitized {
                code: sanitized,
                issue: Some(issue),
            }
        }
    }
}
