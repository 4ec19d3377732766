//! Diagram handling as it happens in a run: extract from model prose,
//! sanitize, and decide renderability.

use docsmith::mermaid::{extract_diagram_code, validate_and_sanitize};

#[test]
fn model_reply_with_fence_and_chatter_yields_a_renderable_diagram() {
    let reply = "Sure, here is the requested overview:\n\n\
        ```mermaid\n\
        flowchart LR\n  \
        In[Webhook (PR event)] --> Fetch[Fetch & Parse]\n  \
        Fetch -->|metadata (title, body)| Audit[Audit]\n\
        ```\n\n\
        Let me know if you want a sequence diagram instead.";

    let code = extract_diagram_code(reply).unwrap();
    let out = validate_and_sanitize(&code);
    assert!(out.is_valid(), "issue: {:?}", out.issue);
    // parenthesized edge label chunk dropped, special node labels quoted
    assert!(out.code.contains("-->|metadata|"));
    assert!(out.code.contains("In[\"Webhook (PR event)\"]"));
    assert!(out.code.contains("Fetch[\"Fetch & Parse\"]"));
}

#[test]
fn structurally_broken_diagram_is_reported_not_repaired() {
    let reply = "flowchart TD\n  A[Start) --> B[End]";
    let out = validate_and_sanitize(reply);
    assert!(!out.is_valid());
    assert!(out.issue.unwrap().0.contains("bracket"));
}

#[test]
fn prose_without_a_diagram_extracts_nothing() {
    assert!(extract_diagram_code("I could not produce a diagram for this change.").is_none());
}
