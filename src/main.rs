use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser as ClapParser, Subcommand};
use colored::Colorize;

use heura_lang::evaluator;
use heura_lang::lexer::Lexer;
use heura_lang::manager::EventManager;
use heura_lang::object::environment::Env;
use heura_lang::object::Object;
use heura_lang::parser::Parser;
use heura_lang::repl;

const DEFAULT_RPC_ENDPOINT: &str = "https://mainnet.infura.io";

#[derive(ClapParser)]
#[command(name = "heura", version, about = "A scripting language for Ethereum contracts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and run a script
    Run {
        /// Path to the script
        file: PathBuf,
        /// RPC endpoint to connect
        #[arg(short, long, default_value = DEFAULT_RPC_ENDPOINT)]
        rpc: String,
        /// Endpoint used to watch for logs (defaults to the rpc endpoint)
        #[arg(short, long)]
        websocket: Option<String>,
        /// Build the script with no execution
        #[arg(short, long)]
        dry: bool,
    },
    /// Start an interactive session
    Repl {
        /// RPC endpoint to connect
        #[arg(short, long, default_value = DEFAULT_RPC_ENDPOINT)]
        rpc: String,
    },
    /// Print the version
    Version,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            file,
            rpc,
            websocket,
            dry,
        } => run_file(&file, &rpc, websocket.as_deref(), dry),
        Commands::Repl { rpc } => {
            let env = new_env(&rpc, &[]);
            repl::start(&env);
        }
        Commands::Version => println!("heura {}", env!("CARGO_PKG_VERSION")),
    }
}

fn new_env(endpoint: &str, args: &[String]) -> Env {
    let env = evaluator::new_env();
    {
        let mut root = env.borrow_mut();
        root.build_envs(std::env::vars());
        root.build_args(args);
        root.set("endpoint", Object::Str(endpoint.to_string()));
    }
    env
}

fn run_file(file: &Path, rpc: &str, websocket: Option<&str>, dry: bool) {
    let source = match fs::read_to_string(file) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}: cannot read {}: {}", "error".red(), file.display(), err);
            process::exit(1);
        }
    };

    let tokens = Lexer::new(&source).tokenize();
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    if !parser.errors().is_empty() {
        eprintln!("{}", "parser errors:".red());
        for message in parser.errors() {
            eprintln!("\t{}", message);
        }
        process::exit(1);
    }

    if dry {
        return;
    }

    let env = new_env(rpc, &[file.display().to_string()]);

    if let Some(result) = evaluator::eval_program(&program, &env) {
        println!("{}", result.inspect());
        if matches!(result, Object::Error(_)) {
            process::exit(1);
        }
    }

    // keep running only when reaction blocks were registered
    let mut manager = EventManager::new(websocket.unwrap_or(rpc), &env);
    if manager.is_empty() {
        return;
    }
    manager.run();
}
