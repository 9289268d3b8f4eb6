//! Knowledge graph overview.
//!
//! Summarizes what `rkg extract` produced: project metadata, the graph
//! fingerprint, and how many passages each bucket holds. An empty bucket
//! means questions about that topic will get the generic answer.

use anyhow::Result;
use std::io::{self, Write};
use std::path::Path;

use readme_kg_core::models::BucketId;
use readme_kg_core::retrieve::Retriever;

/// Run the inspect command: print a summary of the loaded graph.
pub fn run_inspect(retriever: &Retriever, path: &Path, verbose: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_summary(&mut out, retriever, path, verbose)?;
    Ok(())
}

pub fn write_summary<W: Write>(
    out: &mut W,
    retriever: &Retriever,
    path: &Path,
    verbose: bool,
) -> io::Result<()> {
    let graph = retriever.graph();

    writeln!(out, "readme-kg: Knowledge Graph")?;
    writeln!(out, "==========================")?;
    writeln!(out)?;
    writeln!(out, "  File:         {}", path.display())?;
    writeln!(out, "  Name:         {}", or_dash(graph.name()))?;
    writeln!(
        out,
        "  Language:     {}",
        or_dash(graph.programming_language().unwrap_or(""))
    )?;
    writeln!(
        out,
        "  Repository:   {}",
        or_dash(graph.code_repository().unwrap_or(""))
    )?;
    writeln!(out, "  Fingerprint:  {}", graph.fingerprint())?;
    writeln!(
        out,
        "  Scoring:      {}",
        if retriever.tfidf_available() {
            "tf-idf with keyword fallback"
        } else {
            "keyword overlap"
        }
    )?;
    writeln!(out)?;

    writeln!(out, "  {:<14} {:>8}", "BUCKET", "PASSAGES")?;
    for (bucket, passages) in graph.buckets() {
        writeln!(out, "  {:<14} {:>8}", bucket.as_str(), passages.len())?;
        if verbose {
            for p in passages {
                writeln!(out, "      - {}", first_line(p.raw_text()))?;
            }
        }
    }
    writeln!(out, "  {:<14} {:>8}", "total", graph.passage_count())?;

    writeln!(out)?;
    writeln!(out, "  FAQ entries:  {}", graph.faq().len())?;
    if verbose {
        for entry in graph.faq() {
            writeln!(out, "      - {}", entry.question())?;
        }
    }

    let empty: Vec<&str> = graph
        .buckets()
        .filter(|(_, p)| p.is_empty())
        .map(|(b, _)| b.as_str())
        .collect();
    if !empty.is_empty() {
        writeln!(out)?;
        writeln!(out, "  Empty buckets: {}", empty.join(", "))?;
    }

    if graph.passages(BucketId::Purpose).is_empty() {
        writeln!(out, "  Note: no description was extracted.")?;
    }
    Ok(())
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}
