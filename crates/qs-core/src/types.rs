use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instruction {
    pub name: String,
    pub parameters: Vec<String>,
    pub result: String,
    pub is_label: bool,
    pub literal: String,
    pub source_line: usize,
}

impl Instruction {
    pub fn command(
        name: impl Into<String>,
        parameters: Vec<String>,
        result: impl Into<String>,
        literal: impl Into<String>,
        source_line: usize,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            result: result.into(),
            is_label: false,
            literal: literal.into(),
            source_line,
        }
    }

    pub fn label(literal: impl Into<String>, source_line: usize) -> Self {
        let literal = literal.into();
        Self {
            name: normalize_label(&literal),
            parameters: Vec::new(),
            result: String::new(),
            is_label: true,
            literal,
            source_line,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptProgram {
    pub file_name: String,
    pub instructions: Vec<Instruction>,
    pub labels: BTreeMap<String, usize>,
}

impl ScriptProgram {
    /// Builds the label table from the label markers in `instructions`.
    /// The first marker of a given name wins.
    pub fn new(file_name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        let mut labels = BTreeMap::new();
        for (index, instruction) in instructions.iter().enumerate() {
            if instruction.is_label {
                labels.entry(instruction.name.clone()).or_insert(index);
            }
        }
        Self {
            file_name: file_name.into(),
            instructions,
            labels,
        }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.get(&normalize_label(label)).copied()
    }

    pub fn literals(&self) -> Vec<String> {
        self.instructions
            .iter()
            .map(|instruction| instruction.literal.clone())
            .collect()
    }
}

/// Canonical `@name:` form used as the label table key.
pub fn normalize_label(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('@').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(':').unwrap_or(trimmed);
    format!("@{}:", trimmed.trim().to_lowercase())
}

/// Cache key for a script path: forward slashes, lowercase, no leading `./`.
pub fn normalize_script_path(raw: &str) -> String {
    let replaced = raw.trim().replace('\\', "/").to_lowercase();
    let mut path = replaced.as_str();
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path.trim_start_matches('/').to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Npc,
    Obj,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BelongObject {
    pub kind: ObjectKind,
    pub id: String,
}

impl BelongObject {
    pub fn npc(id: impl Into<String>) -> Self {
        Self {
            kind: ObjectKind::Npc,
            id: id.into(),
        }
    }

    pub fn obj(id: impl Into<String>) -> Self {
        Self {
            kind: ObjectKind::Obj,
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkLine {
    pub text: String,
    pub portrait_index: i32,
}
