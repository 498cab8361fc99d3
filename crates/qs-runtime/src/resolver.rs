use std::sync::OnceLock;

use qs_core::ScriptError;
use regex::{Captures, Regex};

use crate::world::World;

fn variable_regex() -> &'static Regex {
    static VARIABLE: OnceLock<Regex> = OnceLock::new();
    VARIABLE.get_or_init(|| {
        Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("variable regex must compile")
    })
}

fn comparison_regex() -> &'static Regex {
    static COMPARISON: OnceLock<Regex> = OnceLock::new();
    COMPARISON.get_or_init(|| {
        Regex::new(r"^(.*?)(==|!=|<>|>=|<=|>>|<<|>|<)(.*)$").expect("comparison regex must compile")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    GreaterOrEqual,
    LessOrEqual,
    Greater,
    Less,
}

impl Comparison {
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "==" => Some(Self::Equal),
            "!=" | "<>" => Some(Self::NotEqual),
            ">=" => Some(Self::GreaterOrEqual),
            "<=" => Some(Self::LessOrEqual),
            ">" | ">>" => Some(Self::Greater),
            "<" | "<<" => Some(Self::Less),
            _ => None,
        }
    }

    pub fn apply(self, left: i32, right: i32) -> bool {
        match self {
            Self::Equal => left == right,
            Self::NotEqual => left != right,
            Self::GreaterOrEqual => left >= right,
            Self::LessOrEqual => left <= right,
            Self::Greater => left > right,
            Self::Less => left < right,
        }
    }
}

/// Name of a `$name` variable reference, without the sigil.
pub fn variable_name(raw: &str) -> Option<&str> {
    let name = raw.trim().strip_prefix('$')?;
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        && !name.starts_with(|ch: char| ch.is_ascii_digit());
    valid.then_some(name)
}

/// Replaces every `$name` in `raw` with the variable's current value.
pub fn substitute(raw: &str, world: &dyn World) -> String {
    if !raw.contains('$') {
        return raw.to_string();
    }
    variable_regex()
        .replace_all(raw, |captures: &Captures<'_>| {
            world.get_variable(&captures[1]).to_string()
        })
        .into_owned()
}

/// Integer value of a parameter after substitution, if it is numeric.
pub fn resolve_int(raw: &str, world: &dyn World) -> Option<i32> {
    let resolved = substitute(raw, world);
    let trimmed = resolved.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    trimmed.parse::<i32>().ok()
}

fn operand_value(raw: &str, world: &dyn World) -> i32 {
    match variable_name(raw) {
        Some(name) => world.get_variable(name),
        None => raw.trim().parse::<i32>().unwrap_or(0),
    }
}

/// Evaluates `$var OP value|$var2`, or a bare operand as "non-zero".
pub fn evaluate_condition(expression: &str, world: &dyn World) -> Result<bool, ScriptError> {
    let expression = expression.trim();
    if expression.is_empty() {
        return Err(ScriptError::new(
            "CONDITION_EMPTY",
            "Condition expression is empty.",
        ));
    }

    let Some(captures) = comparison_regex().captures(expression) else {
        return Ok(operand_value(expression, world) != 0);
    };

    let left = captures[1].trim();
    let right = captures[3].trim();
    if left.is_empty() || right.is_empty() {
        return Err(ScriptError::new(
            "CONDITION_OPERAND_MISSING",
            format!("Condition \"{}\" is missing an operand.", expression),
        ));
    }

    let comparison = Comparison::parse(&captures[2]).ok_or_else(|| {
        ScriptError::new(
            "CONDITION_OPERATOR",
            format!("Unsupported operator \"{}\".", &captures[2]),
        )
    })?;

    Ok(comparison.apply(
        operand_value(left, world),
        operand_value(right, world),
    ))
}
