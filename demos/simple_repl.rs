// Simple REPL example that echoes what you type with "typed: " prefix
//
// Flags: --multiline, --mask, --dumb

use rawline::terminals::StdioTerminal;
use rawline::{Editor, Error, Hint};

fn main() {
    println!("Simple REPL - Type something and press Enter");
    println!("Type 'exit' (or press Ctrl-D) to quit");
    println!("Features: line editing, history (up/down), tab completion, hints");
    println!();

    let mut editor = Editor::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--multiline" => editor.set_multi_line(true),
            "--mask" => editor.set_mask_mode(true),
            "--dumb" => editor.set_dumb_mode(true),
            other => {
                eprintln!("unknown flag: {}", other);
                return;
            }
        }
    }

    editor.set_completer(|line: &str| {
        ["hello", "hello there", "help", "history", "exit"]
            .iter()
            .filter(|candidate| !line.is_empty() && candidate.starts_with(line))
            .map(|candidate| candidate.to_string())
            .collect::<Vec<_>>()
    });
    editor.set_hinter(|line: &str| {
        if line == "hello" {
            Some(Hint::new(" there").color(35).bold())
        } else {
            None
        }
    });

    let history_path = std::env::temp_dir().join("rawline_demo_history");
    let _ = editor.history_mut().load(&history_path);

    let mut terminal = StdioTerminal::new();

    loop {
        match editor.read_line(&mut terminal, "> ") {
            Ok(line) => {
                if line == "exit" {
                    println!("Goodbye!");
                    break;
                } else if line == "history" {
                    for (i, entry) in editor.history().iter().enumerate() {
                        println!("{:4}  {}", i, entry);
                    }
                } else if !line.is_empty() {
                    println!("typed: {}", line);
                }
            }
            Err(Error::Interrupted) => continue,
            Err(Error::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                eprintln!("error reading input: {}", e);
                break;
            }
        }
    }

    if let Err(e) = editor.history().save(&history_path) {
        eprintln!("could not save history: {}", e);
    }
}
