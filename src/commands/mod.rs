use colored::Colorize;

use crate::document::RAGSystem;

pub mod document;
pub mod system;

/// What the shell loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct CommandHandler {
    rag: RAGSystem,
    show_context: bool,
}

impl CommandHandler {
    pub fn new(rag: RAGSystem, show_context: bool) -> Self {
        Self { rag, show_context }
    }

    pub fn rag(&self) -> &RAGSystem {
        &self.rag
    }

    pub fn rag_mut(&mut self) -> &mut RAGSystem {
        &mut self.rag
    }

    pub fn show_context(&self) -> bool {
        self.show_context
    }

    pub async fn handle_command(&mut self, input: &str) -> Result<Flow, String> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Flow::Continue);
        }

        // Handle single-word commands first
        match input.to_lowercase().as_str() {
            "help" => {
                system::print_help();
                return Ok(Flow::Continue);
            }
            "exit" | "quit" => {
                system::print_goodbye();
                return Ok(Flow::Exit);
            }
            "info" => return document::info(&self.rag).map(|_| Flow::Continue),
            "context" => {
                self.show_context = !self.show_context;
                let state = if self.show_context { "on" } else { "off" };
                println!("📚 Showing context: {}", state.bright_yellow());
                return Ok(Flow::Continue);
            }
            "reset" => {
                self.rag.reset();
                println!("🗑️ Document discarded.");
                return Ok(Flow::Continue);
            }
            "load" => return Err("Usage: load <file.pdf>".to_string()),
            _ => {}
        }

        // Handle command prefixes
        if let Some(path) = strip_command(input, "load") {
            document::load(&mut self.rag, path)?;
        } else if let Some(query) = strip_command(input, "search") {
            document::search(&self.rag, query)?;
        } else if let Some(question) = strip_command(input, "ask") {
            document::ask(&mut self.rag, question, self.show_context).await?;
        } else {
            document::ask(&mut self.rag, input, self.show_context).await?;
        }
        Ok(Flow::Continue)
    }
}

/// Returns the argument when `input` starts with `command` followed by whitespace.
fn strip_command<'a>(input: &'a str, command: &str) -> Option<&'a str> {
    let head = input.get(..command.len())?;
    let rest = &input[command.len()..];
    if head.eq_ignore_ascii_case(command) && rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}
