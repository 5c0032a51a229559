use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use strata::buffer::BufferPool;
use strata::common::{DEFAULT_LRUK_K, DEFAULT_POOL_SIZE};
use strata::execution::Executor;
use strata::sql::parse;

const PROMPT: &str = "strata> ";

fn main() -> rustyline::Result<()> {
    env_logger::init();

    // The database lives under ./tables in the working directory.
    let pool = match BufferPool::new(".", DEFAULT_POOL_SIZE, DEFAULT_LRUK_K) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("failed to open database: {}", e);
            std::process::exit(1);
        }
    };
    let executor = Executor::new(pool);

    let mut rl = DefaultEditor::new()?;
    println!("Welcome to strata. Type SQL statements below, or 'quit' to exit.");

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("error reading line: {}", e);
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed, "quit" | "exit" | "\\q") {
            break;
        }
        let _ = rl.add_history_entry(trimmed);

        // A failed statement is rejected with its message; the session
        // continues.
        let statements = match parse(trimmed) {
            Ok(statements) => statements,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        for statement in statements {
            match executor.execute(statement) {
                Ok(Some(result)) => println!("{}", result),
                Ok(None) => println!("ok"),
                Err(e) => {
                    println!("{}", e);
                    break;
                }
            }
        }
    }

    Ok(())
}
