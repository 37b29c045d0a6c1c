//! A line-oriented driver over [`examplar::State`], for manually exercising a demonstration
//! session from a terminal. Not part of the crate's public contract — an application embedding
//! the engine drives [`State`] directly; this binary exists for interactive poking and recorded
//! transcripts the way a scripted GUI shell might.

use std::io::{self, Write};
use std::process::ExitCode;

use examplar::{Primitive, State, Value};

fn main() -> ExitCode {
    let mut state = State::new();
    println!("examplar demo-repl. Type `help` for commands, `quit` to exit.");

    loop {
        let prompt = format!("{}> ", state.current_mode().to_lowercase());
        let Some(line) = read_line(&prompt) else {
            println!();
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }
        if let Err(message) = dispatch(&mut state, line) {
            eprintln!("error: {message}");
        }
    }

    ExitCode::SUCCESS
}

/// Parses one command line and executes it against `state`.
fn dispatch(state: &mut State, line: &str) -> Result<(), String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else { return Ok(()) };
    let rest: Vec<&str> = words.collect();

    match command {
        "help" => {
            print_help();
            Ok(())
        }
        "mode" => {
            println!("{}", state.current_mode());
            Ok(())
        }
        "reg" => match rest.as_slice() {
            [value] => {
                let v = parse_value(value)?;
                let name = state.create_register(v).map_err(|e| e.to_string())?;
                println!("{name}");
                Ok(())
            }
            [name, value] => {
                let v = parse_value(value)?;
                state.update_register(name, v).map_err(|e| e.to_string())
            }
            _ => Err("usage: reg <value> | reg <name> <value>".to_string()),
        },
        "regs" => {
            println!("{}", state.get_register_names().join(" "));
            Ok(())
        }
        "list" => {
            let elements = rest.iter().map(|s| parse_primitive(s)).collect::<Result<Vec<_>, _>>()?;
            let name = state.create_list(elements).map_err(|e| e.to_string())?;
            println!("{name}");
            Ok(())
        }
        "lists" => {
            println!("{}", state.get_list_names().join(" "));
            Ok(())
        }
        "del" => {
            let [name] = rest.as_slice() else { return Err("usage: del <name>".to_string()) };
            if state.is_valid_register(name) {
                state.delete_register(name).map_err(|e| e.to_string())
            } else if state.is_valid_list(name) {
                state.delete_list(name).map_err(|e| e.to_string())
            } else {
                state.delete_function(name).map_err(|e| e.to_string())
            }
        }
        "value" => {
            let [name] = rest.as_slice() else { return Err("usage: value <name>".to_string()) };
            let v = state.get_value(name).map_err(|e| e.to_string())?;
            println!("{v:?}");
            Ok(())
        }
        "select" => match rest.as_slice() {
            [name] => {
                state.select(name, false).map_err(|e| e.to_string())?;
                Ok(())
            }
            [name, kind] if *kind == "var" => {
                state.select(name, true).map_err(|e| e.to_string())?;
                Ok(())
            }
            _ => Err("usage: select <name> [var]".to_string()),
        },
        "unselect" => {
            let [idx] = rest.as_slice() else { return Err("usage: unselect <idx>".to_string()) };
            let idx: usize = idx.parse().map_err(|_| "not a number".to_string())?;
            state.unselect(idx).map_err(|e| e.to_string())
        }
        "unselect_all" => {
            state.unselect_all();
            Ok(())
        }
        "selected" => {
            println!("{:?}", state.get_selected());
            Ok(())
        }
        "create_function" => state.create_function().map_err(|e| e.to_string()),
        "apply" => match rest.as_slice() {
            [name] => {
                let temp = state.apply(name, false).map_err(|e| e.to_string())?;
                println!("{temp}");
                Ok(())
            }
            [name, kind] if *kind == "var" => {
                let temp = state.apply(name, true).map_err(|e| e.to_string())?;
                println!("{temp}");
                Ok(())
            }
            _ => Err("usage: apply <function_name> [var]".to_string()),
        },
        "recurse" => {
            let temp = state.recurse().map_err(|e| e.to_string())?;
            println!("{temp}");
            Ok(())
        }
        "branch" => state.branch().map_err(|e| e.to_string()),
        "ret" => {
            let (remaining, function_name) = state.ret().map_err(|e| e.to_string())?;
            match function_name {
                Some(name) => println!("synthesized {name}"),
                None => println!("remaining examples: {remaining:?}"),
            }
            Ok(())
        }
        "cont" => state.cont().map_err(|e| e.to_string()),
        "builtins" => {
            let mut names: Vec<_> = state.get_builtins().into_keys().collect();
            names.sort();
            println!("{}", names.join(" "));
            Ok(())
        }
        "functions" => {
            println!("{}", state.get_custom_function_names().join(" "));
            Ok(())
        }
        _ => Err(format!("unknown command: {command} (try `help`)")),
    }
}

fn print_help() {
    println!(
        "commands:\n\
         \u{20}reg <value>               create a register\n\
         \u{20}reg <name> <value>        update a register\n\
         \u{20}list <v>...               create a list\n\
         \u{20}del <name>                delete a register/list/function\n\
         \u{20}value <name>              print the value bound to a name\n\
         \u{20}select <name> [var]       add a name to the selection\n\
         \u{20}unselect <idx>            remove one selection entry\n\
         \u{20}unselect_all              clear the selection\n\
         \u{20}selected                  print the current selection\n\
         \u{20}create_function           start a demonstration\n\
         \u{20}apply <fn> [var]          apply a function to the selection\n\
         \u{20}recurse                   apply a recursive self-call\n\
         \u{20}branch                    branch on the selected bool\n\
         \u{20}ret                       return the selected value\n\
         \u{20}cont                      resume after `ret` reported remaining examples\n\
         \u{20}builtins / functions      list available functions\n\
         \u{20}mode                      print the current mode\n\
         \u{20}quit                      exit"
    );
}

/// Parses `true`/`false`, an integer, or a float into a register-shaped [`Value`].
fn parse_value(raw: &str) -> Result<Value, String> {
    parse_primitive(raw).map(Value::from)
}

fn parse_primitive(raw: &str) -> Result<Primitive, String> {
    match raw {
        "true" => Ok(Primitive::Bool(true)),
        "false" => Ok(Primitive::Bool(false)),
        _ => raw
            .parse::<i64>()
            .map(Primitive::Int)
            .or_else(|_| raw.parse::<f64>().map(Primitive::Float))
            .map_err(|_| format!("not a value: {raw}")),
    }
}

/// Reads one line from stdin after printing a prompt. Returns `None` on EOF (Ctrl+D).
fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    if io::stdout().flush().is_err() {
        return None;
    }
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input).ok()?;
    if read == 0 {
        return None;
    }
    Some(input.trim_end_matches(['\r', '\n']).to_string())
}
