use std::sync::OnceLock;

use qs_core::{Instruction, ScriptError, ScriptProgram};
use regex::Regex;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedScript {
    pub program: ScriptProgram,
    pub errors: Vec<ScriptError>,
}

fn label_regex() -> &'static Regex {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    LABEL.get_or_init(|| {
        Regex::new(r"^@([^:;\s]+)\s*:?\s*(?:;.*|//.*)?$").expect("label regex must compile")
    })
}

fn command_name_regex() -> &'static Regex {
    static NAME: OnceLock<Regex> = OnceLock::new();
    NAME.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)").expect("command name regex must compile")
    })
}

/// Parses script text, failing on the first malformed line.
pub fn parse_script(file_name: &str, source: &str) -> Result<ScriptProgram, ScriptError> {
    let parsed = parse_script_lossy(file_name, source);
    match parsed.errors.into_iter().next() {
        Some(error) => Err(error),
        None => Ok(parsed.program),
    }
}

/// Parses script text, skipping malformed lines and collecting their errors.
pub fn parse_script_lossy(file_name: &str, source: &str) -> ParsedScript {
    let mut instructions = Vec::new();
    let mut errors = Vec::new();
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);

    for (index, raw) in source.lines().enumerate() {
        let source_line = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") || line.starts_with(';') {
            continue;
        }

        match parse_line(line, source_line) {
            Ok(instruction) => instructions.push(instruction),
            Err(error) => {
                let error = error.with_location(file_name, source_line);
                warn!(file = file_name, line = source_line, "{}", error);
                errors.push(error);
            }
        }
    }

    ParsedScript {
        program: ScriptProgram::new(file_name, instructions),
        errors,
    }
}

fn parse_line(line: &str, source_line: usize) -> Result<Instruction, ScriptError> {
    if line.starts_with('@') {
        if !label_regex().is_match(line) {
            return Err(ScriptError::new(
                "PARSE_LABEL_INVALID",
                format!("Malformed label line \"{}\".", line),
            ));
        }
        let label = line
            .split(|ch: char| ch == ';' || ch.is_whitespace())
            .next()
            .unwrap_or(line);
        let label = label.split("//").next().unwrap_or(label);
        return Ok(Instruction::label(label, source_line));
    }

    let Some(captures) = command_name_regex().captures(line) else {
        return Err(ScriptError::new(
            "PARSE_LINE_INVALID",
            format!("Line \"{}\" is neither a label nor a command.", line),
        ));
    };
    let name = captures
        .get(1)
        .map(|found| found.as_str())
        .unwrap_or_default();
    let rest = line[name.len()..].trim_start();

    let (parameters, after) = if rest.starts_with('(') {
        let close = find_closing_paren(rest)?;
        (split_arguments(&rest[1..close])?, &rest[close + 1..])
    } else {
        (Vec::new(), rest)
    };

    Ok(Instruction::command(
        name,
        parameters,
        parse_result(after),
        line,
        source_line,
    ))
}

fn parse_result(after: &str) -> String {
    let without_comment = after.split("//").next().unwrap_or(after);
    let trimmed = without_comment.trim();
    let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed);
    trimmed.trim().to_string()
}

fn find_closing_paren(rest: &str) -> Result<usize, ScriptError> {
    let mut depth = 0usize;
    let mut in_quote = false;
    for (index, ch) in rest.char_indices() {
        match ch {
            '"' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Ok(index);
                }
            }
            _ => {}
        }
    }

    if in_quote {
        return Err(ScriptError::new(
            "PARSE_UNTERMINATED_STRING",
            "String literal is not terminated.",
        ));
    }
    Err(ScriptError::new(
        "PARSE_UNCLOSED_PAREN",
        "Parameter list is missing a closing parenthesis.",
    ))
}

fn split_arguments(raw: &str) -> Result<Vec<String>, ScriptError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut arguments = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut depth = 0usize;

    for ch in raw.chars() {
        match ch {
            '"' => {
                in_quote = !in_quote;
                current.push(ch);
            }
            '(' if !in_quote => {
                depth += 1;
                current.push(ch);
            }
            ')' if !in_quote => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if !in_quote && depth == 0 => {
                arguments.push(unquote(&current));
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if in_quote {
        return Err(ScriptError::new(
            "PARSE_UNTERMINATED_STRING",
            "String literal is not terminated.",
        ));
    }
    arguments.push(unquote(&current));
    Ok(arguments)
}

fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return trimmed[1..trimmed.len() - 1].to_string();
    }
    trimmed.to_string()
}
