//! Interactive session: one environment persists across lines.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::evaluator;
use crate::lexer::Lexer;
use crate::object::environment::Env;
use crate::parser::Parser;

const PROMPT: &str = ">> ";

pub fn start(env: &Env) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("{}: cannot open terminal: {}", "error".red(), err);
            return;
        }
    };

    loop {
        match editor.readline(PROMPT) {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());

                let tokens = Lexer::new(&line).tokenize();
                let mut parser = Parser::new(tokens);
                let program = parser.parse_program();
                if !parser.errors().is_empty() {
                    print_parser_errors(parser.errors());
                    continue;
                }

                if let Some(result) = evaluator::eval_program(&program, env) {
                    println!("{}", result.inspect());
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}: {}", "error".red(), err);
                break;
            }
        }
    }
}

fn print_parser_errors(errors: &[String]) {
    eprintln!("{}", "parser errors:".red());
    for message in errors {
        eprintln!("\t{}", message);
    }
}
