//! A primitive Prolog top level.
//!
//! Reads queries terminated by `.` from stdin and prints `yes.`, `no.`
//! or `Name = Value` lines per answer, `;`-separated with a final `.`.
//! An optional positional argument names a file to consult at startup.

use hornlog::interactive::interactive_machine;
use hornlog::machine::Machine;
use hornlog::parser;
use hornlog::term::Term;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut machine = interactive_machine();

    if let Some(path) = std::env::args().nth(1) {
        warnf(&format!("Opening {} ...\n", path));
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warnf(&format!("Can't open file: {}\n", e));
                return ExitCode::from(1);
            }
        };
        machine = match machine.consult(&text) {
            Ok(m) => m,
            Err(e) => {
                warnf(&format!("Can't load file: {}\n", e));
                return ExitCode::from(1);
            }
        };
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        warnf("?- ");
        let Some(line) = lines.next() else {
            warnf("\n");
            return ExitCode::SUCCESS;
        };
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warnf(&format!("Trouble reading from stdin: {}\n", e));
                return ExitCode::from(1);
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let goal = match parser::term(&line) {
            Ok(goal) => goal,
            Err(e) => {
                warnf(&format!("Problem parsing the query: {}\n", e));
                continue;
            }
        };
        run_query(&machine, goal);
    }
}

fn run_query(machine: &Machine, goal: Term) {
    // display names, first occurrence first, anonymous skipped
    let mut names: Vec<&str> = Vec::new();
    for var in goal.variables() {
        let name = var.name();
        if name != "_" && !names.contains(&name) {
            names.push(name);
        }
    }

    let answers = match machine.prove_all_term(goal) {
        Ok(answers) => answers,
        Err(e) => {
            warnf(&format!("error: {}\n\n", e));
            return;
        }
    };

    if answers.is_empty() {
        warnf("no.\n\n");
        return;
    }
    if names.is_empty() {
        warnf("yes.\n\n");
        return;
    }

    for (i, answer) in answers.iter().enumerate() {
        let lines: Vec<String> = names
            .iter()
            .map(|name| match answer.by_name(name) {
                Some(value) => format!("{} = {}", name, value),
                None => format!("{} = _", name),
            })
            .collect();
        warnf(&lines.join("\n"));
        if i == answers.len() - 1 {
            warnf("\t.\n\n");
        } else {
            warnf("\t;\n");
        }
    }
}

/// Formatted output on stderr, so redirected stdout stays clean.
fn warnf(text: &str) {
    eprint!("{}", text);
    io::stderr().flush().ok();
}
