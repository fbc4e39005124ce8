//! REPL (Read-Eval-Print Loop) for Lail

use crate::config::Config;
use crate::error::CompileError;
use crate::interp::Value;
use crate::Session;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result as RlResult};
use std::path::PathBuf;

const PROMPT: &str = ">> ";
const CONTINUATION_PROMPT: &str = ".. ";
const HISTORY_FILE: &str = ".lail_history";

/// What a line of input asks the loop to do next
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Continue,
    Quit,
}

/// REPL state
pub struct Repl {
    editor: DefaultEditor,
    entry: Entry,
    history_path: Option<PathBuf>,
}

/// Accumulates input lines and evaluates each complete entry
struct Entry {
    session: Session,
    /// Lines of an unfinished entry
    pending: String,
}

impl Repl {
    pub fn new(config: Config) -> RlResult<Self> {
        let editor = DefaultEditor::new()?;
        let history_path = dirs_home().map(|h| h.join(HISTORY_FILE));

        let mut repl = Repl {
            editor,
            entry: Entry::new(Session::new(config)),
            history_path,
        };

        if let Some(ref path) = repl.history_path {
            let _ = repl.editor.load_history(path);
        }

        Ok(repl)
    }

    /// Run the REPL
    pub fn run(&mut self) -> RlResult<()> {
        println!("Lail REPL v{}", env!("CARGO_PKG_VERSION"));
        println!("Type :help for help, :quit to exit.\n");

        loop {
            let prompt = if self.entry.pending.is_empty() {
                PROMPT
            } else {
                CONTINUATION_PROMPT
            };
            match self.editor.readline(prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() && self.entry.pending.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(trimmed);

                    if self.entry.pending.is_empty() && trimmed.starts_with(':') {
                        if self.handle_command(trimmed) == Step::Quit {
                            break;
                        }
                        continue;
                    }

                    if let Some(text) = self.entry.feed(&line) {
                        println!("{text}");
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    self.entry.pending.clear();
                }
                Err(ReadlineError::Eof) => {
                    println!("Goodbye!");
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {err}");
                    break;
                }
            }
        }

        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }

        Ok(())
    }

    fn handle_command(&mut self, cmd: &str) -> Step {
        match cmd {
            ":quit" | ":q" | ":exit" => {
                println!("Goodbye!");
                Step::Quit
            }
            ":help" | ":h" | ":?" => {
                print_help();
                Step::Continue
            }
            ":clear" => {
                print!("\x1B[2J\x1B[1;1H");
                Step::Continue
            }
            ":env" => {
                for line in self.entry.bindings() {
                    println!("{line}");
                }
                Step::Continue
            }
            _ => {
                println!("Unknown command: {cmd}");
                println!("Type :help for help.");
                Step::Continue
            }
        }
    }
}

impl Entry {
    fn new(session: Session) -> Self {
        Entry {
            session,
            pending: String::new(),
        }
    }

    /// Global bindings as `name = value`, sorted by name
    fn bindings(&self) -> Vec<String> {
        let env = self.session.interpreter().global_env().borrow();
        let mut lines: Vec<String> = env
            .bindings()
            .iter()
            .map(|(name, value)| format!("{name} = {value}"))
            .collect();
        lines.sort();
        lines
    }

    /// Evaluate one line of input, returning what should be echoed
    ///
    /// Input that ends before a construct is closed is buffered and
    /// completed by the following lines.
    fn feed(&mut self, line: &str) -> Option<String> {
        if !self.pending.is_empty() {
            self.pending.push('\n');
        }
        self.pending.push_str(line);

        let program = match self.session.parse(&self.pending) {
            Ok(program) => program,
            Err(err) if is_incomplete(&err) && !line.trim().is_empty() => return None,
            Err(err) => {
                self.pending.clear();
                return Some(err.diagnostics().join("\n"));
            }
        };
        self.pending.clear();

        match self.session.eval(&program) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value.to_string()),
            Err(err) => Some(err.to_string()),
        }
    }
}

fn print_help() {
    println!("Lail REPL Commands:");
    println!("  :help, :h, :?   Show this help");
    println!("  :quit, :q       Exit the REPL");
    println!("  :clear          Clear the screen");
    println!("  :env            List global bindings");
    println!();
    println!("You can enter:");
    println!("  - Expressions: 1 + 2, if (x < y) {{ x }} else {{ y }}");
    println!("  - Bindings: let add = fn(a, b) {{ a + b }};");
    println!("  - Calls: add(1, 2), [1, 2, 3].tail()");
    println!("  - Imports: import \"lib.lail\";");
    println!();
    println!("Unfinished input continues on the next line; an empty line ends it.");
    println!();
    println!("Built-in functions:");
    println!("  out(x, ...)     Print values followed by a newline");
    println!("  head(x)         First element of an array or string");
    println!("  tail(x)         Everything after the first element");
    println!("  typeof(x)       Type name of a value");
}

/// Every diagnostic complains about running out of input
fn is_incomplete(err: &CompileError) -> bool {
    let errors = err.parse_errors();
    !errors.is_empty()
        && errors
            .iter()
            .all(|e| e.origin.is_none() && e.message.ends_with("Found: EOF"))
}

fn dirs_home() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE").ok().map(PathBuf::from)
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME").ok().map(PathBuf::from)
    }
}
