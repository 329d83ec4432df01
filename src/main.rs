use anyhow::{bail, Context};
use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use pdfrag::commands::{document, system, CommandHandler, Flow};
use pdfrag::config::{Backend, RagConfig};
use pdfrag::llm::prompt::PromptLanguage;
use pdfrag::RAGSystem;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Ask questions about a PDF document", long_about = None)]
struct Args {
    /// PDF to process at startup
    #[arg(long)]
    pdf: Option<String>,

    /// Answer one question about --pdf and exit
    #[arg(short, long)]
    question: Option<String>,

    /// Language model name (Hugging Face repo id or Ollama tag)
    #[arg(long)]
    model: Option<String>,

    /// huggingface or ollama
    #[arg(long)]
    backend: Option<String>,

    #[arg(long)]
    api_url: Option<String>,

    #[arg(long)]
    embedding_model: Option<String>,

    #[arg(long)]
    chunk_size: Option<usize>,

    #[arg(long)]
    overlap: Option<usize>,

    #[arg(long)]
    top_k: Option<usize>,

    /// Prompt wording: en or ar
    #[arg(long)]
    language: Option<String>,

    /// Print the retrieved text under each answer
    #[arg(long)]
    show_context: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn build_config(args: &Args) -> anyhow::Result<RagConfig> {
    let mut config = RagConfig::from_env();

    if let Some(model) = &args.model {
        config.generator.model_name = model.clone();
    }
    if let Some(backend) = &args.backend {
        config.generator.backend = backend.parse::<Backend>()?;
    }
    if let Some(url) = &args.api_url {
        config.generator.api_url = Some(url.clone());
    }
    if let Some(model) = &args.embedding_model {
        config.embedding.model_name = model.clone();
    }
    if let Some(size) = args.chunk_size {
        config.chunking.chunk_size = size;
    }
    if let Some(overlap) = args.overlap {
        config.chunking.overlap = overlap;
    }
    if let Some(k) = args.top_k {
        config.retrieval.top_k = k;
    }
    if let Some(language) = &args.language {
        config.language = language.parse::<PromptLanguage>()?;
    }

    config.validate_all()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let config = build_config(&args)?;
    log::info!(
        "Using {} model {} with embeddings from {}",
        config.generator.backend,
        config.generator.model_name,
        config.embedding.model_name
    );

    let bar = document::spinner("Loading embedding model...");
    let rag = RAGSystem::from_config(config);
    bar.finish_and_clear();
    let rag = rag.context("Failed to initialise the question answering system")?;

    let mut handler = CommandHandler::new(rag, args.show_context);

    if let Some(question) = &args.question {
        let Some(pdf) = &args.pdf else {
            bail!("--question needs a document, pass it with --pdf <file.pdf>");
        };
        document::load(handler.rag_mut(), pdf).map_err(anyhow::Error::msg)?;
        document::ask(handler.rag_mut(), question, args.show_context)
            .await
            .map_err(anyhow::Error::msg)?;
        return Ok(());
    }

    println!("{}", "📄 PDF question answering".bright_cyan().bold());
    system::print_help();

    if let Some(pdf) = &args.pdf {
        if let Err(e) = document::load(handler.rag_mut(), pdf) {
            println!("{}", e.red());
        }
    }

    let mut rl = Editor::<(), DefaultHistory>::new()?;

    loop {
        match rl.readline("📄 ") {
            Ok(line) => {
                let input = line.trim();
                if !input.is_empty() {
                    let _ = rl.add_history_entry(input);
                }

                match handler.handle_command(input).await {
                    Ok(Flow::Exit) => break,
                    Ok(Flow::Continue) => {}
                    Err(e) => println!("{}", e.red()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    handler.rag_mut().release_models();
    Ok(())
}
