//! `rkg ask` and `rkg chat`: question answering from the command line.
//!
//! Output formatting lives here only; the core hands back plain
//! [`AnswerResult`]s and [`Explanation`]s.

use anyhow::Result;
use std::io::{self, BufRead, Write};

use readme_kg_core::classify::Trigger;
use readme_kg_core::models::AnswerResult;
use readme_kg_core::retrieve::{Explanation, Retriever};
use readme_kg_core::scoring::RankedText;

/// Words that end a chat session.
const QUIT_WORDS: [&str; 3] = ["quit", "exit", "q"];

/// Ranked passages shown per strategy in `--explain` output.
const EXPLAIN_TOP: usize = 5;

/// Answer one question and print the result.
pub fn run_ask(retriever: &Retriever, question: &str, json: bool, explain: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match (json, explain) {
        (true, true) => {
            serde_json::to_writer_pretty(&mut out, &retriever.explain(question))?;
            writeln!(out)?;
        }
        (true, false) => {
            serde_json::to_writer_pretty(&mut out, &retriever.answer(question))?;
            writeln!(out)?;
        }
        (false, true) => write_explanation(&mut out, &retriever.explain(question))?,
        (false, false) => write_answer(&mut out, &retriever.answer(question))?,
    }
    Ok(())
}

/// Interactive loop over stdin. Shows a prompt only when stdin is a terminal.
pub fn run_chat(retriever: &Retriever) -> Result<()> {
    let interactive = atty::is(atty::Stream::Stdin);
    let stdin = io::stdin();
    let stdout = io::stdout();
    chat_loop(retriever, stdin.lock(), &mut stdout.lock(), interactive)
}

/// Answer each non-blank line until EOF or a quit word.
pub fn chat_loop<R: BufRead, W: Write>(
    retriever: &Retriever,
    input: R,
    out: &mut W,
    interactive: bool,
) -> Result<()> {
    if interactive {
        writeln!(
            out,
            "Ask about {} (type 'quit' to exit).",
            display_name(retriever)
        )?;
    }

    let mut lines = input.lines();
    loop {
        if interactive {
            write!(out, "> ")?;
            out.flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if QUIT_WORDS.contains(&question.to_lowercase().as_str()) {
            break;
        }
        write_answer(out, &retriever.answer(question))?;
        writeln!(out)?;
    }
    Ok(())
}

fn display_name(retriever: &Retriever) -> &str {
    let name = retriever.graph().name();
    if name.trim().is_empty() {
        "the project"
    } else {
        name
    }
}

/// Answer text followed by a one-line summary of how it was reached.
pub fn write_answer<W: Write>(out: &mut W, result: &AnswerResult) -> io::Result<()> {
    writeln!(out, "{}", result.text)?;
    writeln!(out)?;
    write!(
        out,
        "[bucket: {} | confidence: {:.2} ({}) | method: {}",
        result.bucket_label(),
        result.confidence,
        result.level,
        result.method
    )?;
    match &result.faq {
        Some(question) => writeln!(out, " | faq: {}]", question),
        None => writeln!(out, "]"),
    }
}

pub fn write_explanation<W: Write>(out: &mut W, ex: &Explanation) -> io::Result<()> {
    writeln!(out, "Query:       {}", ex.query)?;
    if ex.matches.is_empty() {
        writeln!(out, "Matches:     (none)")?;
    } else {
        let matches: Vec<String> = ex
            .matches
            .iter()
            .map(|m| format!("{} ({})", m.bucket, describe_trigger(&m.trigger)))
            .collect();
        writeln!(out, "Matches:     {}", matches.join(", "))?;
    }
    writeln!(
        out,
        "Classified:  {}",
        ex.classified.map(|b| b.as_str()).unwrap_or("unknown")
    )?;
    writeln!(out, "Candidates:  {}", ex.candidates)?;
    write_ranking(out, "TF-IDF", ex.tfidf.as_deref())?;
    write_ranking(out, "Keyword", ex.keyword.as_deref())?;
    writeln!(out)?;
    write_answer(out, &ex.answer)
}

fn describe_trigger(trigger: &Trigger) -> String {
    match trigger {
        Trigger::Word(w) => format!("word \"{}\"", w),
        Trigger::Stem(s) => format!("stem \"{}*\"", s),
        Trigger::Phrase(p) => format!("phrase \"{}\"", p),
        Trigger::Trailing(w) => format!("trailing \"{}\"", w),
    }
}

fn write_ranking<W: Write>(out: &mut W, label: &str, ranked: Option<&[RankedText]>) -> io::Result<()> {
    let Some(ranked) = ranked else {
        return writeln!(out, "{:<12} (not run)", format!("{}:", label));
    };
    writeln!(out, "{}:", label)?;
    for r in ranked.iter().take(EXPLAIN_TOP) {
        writeln!(out, "  {:.4}  {:<12}  {}", r.score, r.bucket.as_str(), preview(&r.text))?;
    }
    if ranked.len() > EXPLAIN_TOP {
        writeln!(out, "  ... {} more", ranked.len() - EXPLAIN_TOP)?;
    }
    Ok(())
}

/// First line of `text`, shortened to 60 characters.
fn preview(text: &str) -> String {
    let first = text.lines().next().unwrap_or("");
    if first.chars().count() > 60 {
        let cut: String = first.chars().take(57).collect();
        format!("{}...", cut)
    } else {
        first.to_string()
    }
}
