//! Graphviz DOT export of the dependency graph.

use std::fmt::Write;

use crate::models::graph::{ComponentLookup, DependencyGraph};

/// Fill colour for a completion percentage.
pub fn progress_color(progress: u8) -> &'static str {
    match progress {
        0..=24 => "red",
        25..=49 => "orange",
        50..=74 => "yellow",
        75..=99 => "lightblue",
        _ => "green",
    }
}

fn escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

fn quote(name: &str) -> String {
    format!("\"{}\"", escape(name))
}

/// Render the graph as a DOT digraph.
///
/// Nodes are labelled `name\nNN%` and filled by progress; edges point from a
/// dependency to its dependent.
pub fn render(graph: &DependencyGraph, lookup: &dyn ComponentLookup) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "digraph dependencies {{");
    let _ = writeln!(out, "    rankdir=LR;");
    let _ = writeln!(out, "    node [shape=box, style=\"rounded,filled\"];");

    for name in graph.components() {
        let progress = lookup.progress_of(name).unwrap_or(0);
        let _ = writeln!(
            out,
            "    {} [label=\"{}\\n{}%\", fillcolor={}];",
            quote(name),
            escape(name),
            progress,
            progress_color(progress)
        );
    }

    for (dependency, dependent) in graph.edges() {
        let _ = writeln!(out, "    {} -> {};", quote(dependency), quote(dependent));
    }

    out.push_str("}\n");
    out
}
