use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::document::{DocumentSource, RAGSystem};
use crate::error::RagError;

pub fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Strips surrounding quotes so pasted paths with spaces work.
pub fn parse_path(raw: &str) -> Option<&str> {
    let path = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if path.is_empty() {
        None
    } else {
        Some(path)
    }
}

pub fn load(rag: &mut RAGSystem, raw_path: &str) -> Result<(), String> {
    let path = parse_path(raw_path).ok_or("Usage: load <file.pdf>")?;
    let source = DocumentSource::from_path(path);

    let bar = spinner(&format!("Processing {}...", source.name()));
    let result = rag.process_document(&source);
    bar.finish_and_clear();

    let count = result.map_err(|e| format!("Failed to process document: {}", e))?;
    println!(
        "✅ Processed {} successfully! Created {} chunks.",
        source.name().bright_yellow(),
        count
    );
    Ok(())
}

pub async fn ask(rag: &mut RAGSystem, question: &str, show_context: bool) -> Result<(), String> {
    let question = question.trim();
    if question.is_empty() {
        return Err("Usage: ask <question>".to_string());
    }

    let bar = spinner("Searching for the answer...");
    let result = rag.generate_answer(question).await;
    bar.finish_and_clear();

    let answer = match result {
        Ok(answer) => answer,
        Err(RagError::Precondition(_)) if !rag.is_processed() => {
            println!("⏳ Please load a PDF first: {}", "load <file.pdf>".bright_yellow());
            return Ok(());
        }
        Err(e) => return Err(format!("Failed to generate answer: {}", e)),
    };

    println!("\n💡 Answer:");
    println!("{}", answer.text.as_str().bright_green());
    if answer.text.is_unparsed() {
        println!(
            "{}",
            "⚠️ The model did not follow the answer format; showing its raw output.".yellow()
        );
    }
    if show_context {
        println!("\n📚 Text used for the answer:");
        println!("{}", answer.context.dimmed());
    }
    println!();
    Ok(())
}

pub fn search(rag: &RAGSystem, query: &str) -> Result<(), String> {
    let query = query.trim();
    if query.is_empty() {
        return Err("Usage: search <query>".to_string());
    }

    let hits = rag
        .search(query, rag.config().retrieval.top_k)
        .map_err(|e| format!("Search failed: {}", e))?;

    println!("\n🔍 Most relevant passages for: {}", query.bright_yellow());
    for (rank, hit) in hits.iter().enumerate() {
        println!(
            "{}. [chunk {} | distance {:.4}] {}",
            rank + 1,
            hit.index,
            hit.distance,
            preview(&hit.text, 200)
        );
    }
    println!();
    Ok(())
}

pub fn info(rag: &RAGSystem) -> Result<(), String> {
    let info = rag
        .document_info()
        .ok_or("No document loaded. Use: load <file.pdf>")?;

    println!("\n📄 Document: {}", info.source_name.bright_yellow());
    println!("  Chunks:          {}", info.chunk_count);
    println!("  Words:           {}", info.word_count);
    println!("  Embedding model: {} ({}d)", info.embedding_model, info.dimension);
    println!("  Language model:  {}", rag.config().generator.model_name);
    println!("  Processed at:    {}", info.processed_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!();
    Ok(())
}

fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut)
}
