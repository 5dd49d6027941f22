//! Waterkoker CLI - компилятор и интерактивная оболочка.
//!
//! Использование:
//!   waterkoker               - скомпилировать stdin в tas.bc
//!   waterkoker <file>        - скомпилировать файл
//!   waterkoker -e "src"      - скомпилировать строку
//!   waterkoker --repl        - запустить REPL
//!   waterkoker --help        - справка

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use waterkoker::compiler::{compile, compile_to_file, CompileOptions};
use waterkoker::interpreter::Interpreter;
use waterkoker::ir::IrBackend;
use waterkoker::lower::Lowerer;
use waterkoker::parser::{parse_expr, Parser};
use waterkoker::{CompileError, CompileResult};

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP: &str = r#"
Waterkoker - prefix-notation toy language compiler

USAGE:
    waterkoker [OPTIONS]            Compile standard input
    waterkoker [OPTIONS] <file>     Compile a file
    waterkoker [OPTIONS] -e "<src>" Compile source text
    waterkoker --repl               Start REPL (interactive mode)
    waterkoker --help, -h           Show this help
    waterkoker --version, -v        Show version

OPTIONS:
    -o <path>           Output file (default: tas.bc)
    --emit ir           Print the IR to stdout instead of writing a file
    --emit ast          Print each top-level construct as JSON
    --run               Evaluate every entry point and print the results
    --llvm              Use the LLVM backend (feature `llvm_backend`)

REPL COMMANDS:
    :help, :h           Show help
    :quit, :q, :exit    Exit REPL
    :ir                 Show the session module
    :ast <expr>         Show AST for expression
    :reset, :r          Start a fresh compilation unit

SYNTAX:
    7                   ; constant (single digit)
    a3                  ; parameter a3
    +12   -a0a1         ; add / subtract (prefix)
    d+a0a1.             ; define f0, f1, ... in order; '.' ends the body
    d1;2;a0.            ; body of several expressions, last is returned
    f0 1i2.             ; call f0(1, 2, 0, ..., 0); '.' ends the list
    +12                 ; a bare expression becomes `main`

LOGGING:
    RUST_LOG=debug waterkoker -e "+12" --emit ir
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Emit {
    File,
    Ir,
    Ast,
    Run,
}

enum Input {
    Stdin,
    File(PathBuf),
    Source(String),
}

enum Mode {
    Help,
    Version,
    Repl,
    Compile,
}

struct Args {
    mode: Mode,
    input: Input,
    emit: Emit,
    llvm: bool,
    options: CompileOptions,
}

fn main() {
    env_logger::init();

    let args = match parse_args(env::args().skip(1).collect()) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Use --help for usage information.");
            process::exit(1);
        }
    };

    match args.mode {
        Mode::Help => println!("{}", HELP),
        Mode::Version => println!("Waterkoker {}", VERSION),
        Mode::Repl => run_repl(),
        Mode::Compile => {
            if let Err(e) = run(&args) {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
    }
}

fn parse_args(raw: Vec<String>) -> Result<Args, String> {
    let mut args = Args {
        mode: Mode::Compile,
        input: Input::Stdin,
        emit: Emit::File,
        llvm: false,
        options: CompileOptions::default(),
    };

    let mut iter = raw.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => args.mode = Mode::Help,
            "--version" | "-v" => args.mode = Mode::Version,
            "--repl" => args.mode = Mode::Repl,
            "--run" => args.emit = Emit::Run,
            "--llvm" => args.llvm = true,
            "-e" | "--eval" => {
                let source = iter.next().ok_or("Missing source after -e")?;
                args.input = Input::Source(source);
            }
            "-o" | "--output" => {
                let path = iter.next().ok_or("Missing path after -o")?;
                args.options.output = PathBuf::from(path);
            }
            "--emit" => {
                args.emit = match iter.next().as_deref() {
                    Some("ir") => Emit::Ir,
                    Some("ast") => Emit::Ast,
                    Some(other) => return Err(format!("Unknown --emit kind: {}", other)),
                    None => return Err("Missing kind after --emit".to_string()),
                };
            }
            other if other.starts_with('-') => return Err(format!("Unknown option: {}", other)),
            file => args.input = Input::File(PathBuf::from(file)),
        }
    }

    Ok(args)
}

fn open_input(input: &Input) -> CompileResult<Box<dyn Read>> {
    Ok(match input {
        Input::Stdin => Box::new(io::stdin().lock()),
        Input::File(path) => Box::new(fs::File::open(path)?),
        Input::Source(source) => Box::new(io::Cursor::new(source.clone().into_bytes())),
    })
}

/// Выполнить команду компиляции.
fn run(args: &Args) -> CompileResult<()> {
    let reader = open_input(&args.input)?;

    if args.llvm {
        return run_llvm(args, reader);
    }

    let backend = IrBackend::new(args.options.module_name.clone());
    match args.emit {
        Emit::File => {
            compile_to_file(reader, backend, &args.options.output)?;
            println!("Ok");
        }
        Emit::Ir => print!("{}", compile(reader, backend)?),
        Emit::Ast => print_ast(reader)?,
        Emit::Run => {
            let module = compile(reader, backend)?;
            for value in Interpreter::new(&module).run_entry_points()? {
                println!("{}", value);
            }
        }
    }
    Ok(())
}

#[cfg(feature = "llvm_backend")]
fn run_llvm(args: &Args, reader: Box<dyn Read>) -> CompileResult<()> {
    use inkwell::context::Context;
    use waterkoker::llvm_backend::LlvmBackend;

    let context = Context::create();
    let backend = LlvmBackend::new(&context, &args.options.module_name);
    match args.emit {
        Emit::File => {
            compile_to_file(reader, backend, &args.options.output)?;
            println!("Ok");
        }
        Emit::Ir => print!("{}", compile(reader, backend)?),
        Emit::Ast => print_ast(reader)?,
        Emit::Run => {
            return Err(CompileError::Backend(
                "--run is only supported by the IR backend".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(not(feature = "llvm_backend"))]
fn run_llvm(_args: &Args, _reader: Box<dyn Read>) -> CompileResult<()> {
    Err(CompileError::Backend(
        "LLVM support not compiled in. Enable 'llvm_backend' feature.".to_string(),
    ))
}

fn print_ast(reader: Box<dyn Read>) -> CompileResult<()> {
    for node in Parser::new(reader) {
        let json = serde_json::to_string(&node?).map_err(|e| CompileError::Io(e.to_string()))?;
        println!("{}", json);
    }
    Ok(())
}

/// Сессия REPL: одна единица компиляции, которая растёт построчно.
struct Session {
    lowerer: Lowerer<IrBackend>,
    next_index: i32,
    /// Сколько точек входа уже выполнено.
    evaluated: usize,
}

impl Session {
    fn new() -> Self {
        Self {
            lowerer: Lowerer::new(IrBackend::new(CompileOptions::default().module_name)),
            next_index: 0,
            evaluated: 0,
        }
    }

    /// Понизить строку и выполнить новые точки входа.
    fn eval_line(&mut self, line: &str) -> CompileResult<Vec<i16>> {
        let mut parser = Parser::with_next_index(line.as_bytes(), self.next_index);
        for node in parser.by_ref() {
            self.lowerer.lower(node?)?;
        }
        self.next_index = parser.next_function_index();

        let module = self.lowerer.backend().module();
        let entries = &module.entry_points()[self.evaluated..];
        let mut interpreter = Interpreter::new(module);
        let values = entries
            .iter()
            .map(|&id| interpreter.call_function(id, &[]))
            .collect::<CompileResult<Vec<i16>>>()?;
        self.evaluated = module.entry_points().len();
        Ok(values)
    }
}

/// Запустить REPL.
fn run_repl() {
    println!("Waterkoker {} - prefix toy language", VERSION);
    println!("Type :help for commands, :quit to exit.\n");

    let mut rl = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("Failed to initialize readline: {}", e);
            process::exit(1);
        }
    };

    let mut session = Session::new();
    let history_path = dirs_next::data_dir()
        .map(|p| p.join("waterkoker").join("history.txt"))
        .unwrap_or_else(|| PathBuf::from(".waterkoker_history"));

    // Загрузить историю
    let _ = rl.load_history(&history_path);

    loop {
        match rl.readline("wk> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line.starts_with(':') {
                    match handle_command(line, &session) {
                        CommandResult::Continue => continue,
                        CommandResult::Exit => break,
                        CommandResult::Reset => {
                            session = Session::new();
                            println!("Session reset.");
                            continue;
                        }
                    }
                }

                match session.eval_line(line) {
                    Ok(values) => {
                        for value in values {
                            println!("{}", value);
                        }
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        eprintln!("Compilation unit discarded, session reset.");
                        session = Session::new();
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    // Сохранить историю
    if let Some(parent) = history_path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let _ = rl.save_history(&history_path);
}

enum CommandResult {
    Continue,
    Exit,
    Reset,
}

fn handle_command(cmd: &str, session: &Session) -> CommandResult {
    let parts: Vec<&str> = cmd.splitn(2, ' ').collect();
    let command = parts[0];
    let arg = parts.get(1).map(|s| s.trim());

    match command {
        ":help" | ":h" => {
            println!("{}", HELP);
            CommandResult::Continue
        }
        ":quit" | ":q" | ":exit" => CommandResult::Exit,
        ":reset" | ":r" => CommandResult::Reset,
        ":ir" => {
            print!("{}", session.lowerer.backend().module());
            CommandResult::Continue
        }
        ":ast" => {
            match arg {
                Some(expr) => match parse_expr(expr) {
                    Ok(node) => match serde_json::to_string_pretty(&node) {
                        Ok(json) => println!("{}", json),
                        Err(e) => eprintln!("Error: {}", e),
                    },
                    Err(e) => eprintln!("Parse error: {}", e),
                },
                None => println!("Usage: :ast <expression>"),
            }
            CommandResult::Continue
        }
        _ => {
            println!("Unknown command: {}", command);
            println!("Type :help for available commands.");
            CommandResult::Continue
        }
    }
}
