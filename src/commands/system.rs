use colored::Colorize;

pub fn print_help() {
    println!("\n📄 Document Commands:");
    println!("  load <file>      - Process a PDF document");
    println!("  info             - Show the loaded document");
    println!("  reset            - Forget the loaded document");
    println!();

    println!("❓ Question Commands:");
    println!("  ask <question>   - Ask about the document");
    println!("  <question>       - Same as ask");
    println!("  search <query>   - Show the most relevant passages");
    println!("  context          - Toggle showing the text used for each answer");
    println!("  Example: {}", "When was Andrew Summer born?".bright_yellow());
    println!();

    println!("⚙️ System Commands:");
    println!("  help  - Show this help menu");
    println!("  exit  - Exit the program");
    println!();
}

pub fn print_goodbye() {
    println!("👋 Goodbye!");
}
