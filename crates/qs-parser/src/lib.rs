mod text;

pub use text::{parse_script, parse_script_lossy, ParsedScript};
