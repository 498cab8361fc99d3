use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use qs_core::{normalize_script_path, ScriptError, ScriptProgram};
use qs_parser::parse_script_lossy;
use tracing::debug;
use walkdir::WalkDir;

pub trait ScriptLoader {
    /// Reads the source text for a normalised script path.
    fn read(&self, path: &str) -> Result<String, ScriptError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryScriptLoader {
    sources: BTreeMap<String, String>,
}

impl MemoryScriptLoader {
    pub fn new<I, K, V>(sources: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            sources: sources
                .into_iter()
                .map(|(path, source)| (normalize_script_path(path.as_ref()), source.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, path: &str, source: impl Into<String>) {
        self.sources
            .insert(normalize_script_path(path), source.into());
    }
}

impl ScriptLoader for MemoryScriptLoader {
    fn read(&self, path: &str) -> Result<String, ScriptError> {
        self.sources.get(path).cloned().ok_or_else(|| {
            ScriptError::new(
                "CACHE_SCRIPT_NOT_FOUND",
                format!("Script \"{}\" is not available.", path),
            )
        })
    }
}

/// Reads scripts from a directory tree, matching paths case-insensitively.
#[derive(Debug, Clone)]
pub struct DirScriptLoader {
    root: PathBuf,
    index: BTreeMap<String, PathBuf>,
}

impl DirScriptLoader {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ScriptError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(ScriptError::new(
                "CACHE_ROOT_NOT_DIR",
                format!("Script root is not a directory: {}", root.display()),
            ));
        }

        let mut index = BTreeMap::new();
        for entry in WalkDir::new(&root).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|error| {
                ScriptError::new("CACHE_ROOT_READ", format!("{}: {}", root.display(), error))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };
            index.insert(
                normalize_script_path(&relative.to_string_lossy()),
                entry.path().to_path_buf(),
            );
        }
        debug!(root = %root.display(), scripts = index.len(), "script root indexed");
        Ok(Self { root, index })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }
}

impl ScriptLoader for DirScriptLoader {
    fn read(&self, path: &str) -> Result<String, ScriptError> {
        let Some(file) = self.index.get(path) else {
            return Err(ScriptError::new(
                "CACHE_SCRIPT_NOT_FOUND",
                format!("Script \"{}\" not found under {}.", path, self.root.display()),
            ));
        };
        fs::read_to_string(file).map_err(|error| {
            ScriptError::new(
                "CACHE_SCRIPT_READ",
                format!("{}: {}", file.display(), error),
            )
        })
    }
}

/// Parsed programs keyed by normalised path. Owned by whoever builds the
/// engines; call [`ScriptCache::clear`] on map or save transitions.
pub struct ScriptCache {
    loader: Box<dyn ScriptLoader>,
    programs: HashMap<String, Rc<ScriptProgram>>,
    parse_errors: Vec<ScriptError>,
}

pub type SharedScriptCache = Rc<RefCell<ScriptCache>>;

impl ScriptCache {
    pub fn new(loader: impl ScriptLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            programs: HashMap::new(),
            parse_errors: Vec::new(),
        }
    }

    pub fn into_shared(self) -> SharedScriptCache {
        Rc::new(RefCell::new(self))
    }

    pub fn load(&mut self, path: &str) -> Result<Rc<ScriptProgram>, ScriptError> {
        let key = normalize_script_path(path);
        if let Some(program) = self.programs.get(&key) {
            return Ok(Rc::clone(program));
        }

        let source = self.loader.read(&key)?;
        let parsed = parse_script_lossy(&key, &source);
        debug!(
            script = key.as_str(),
            lines = parsed.program.len(),
            skipped = parsed.errors.len(),
            "loaded script"
        );
        self.parse_errors.extend(parsed.errors);
        let program = Rc::new(parsed.program);
        self.programs.insert(key, Rc::clone(&program));
        Ok(program)
    }

    /// Drains the errors for lines skipped while parsing. Each script's
    /// errors surface once, on the load that first parsed it.
    pub fn take_parse_errors(&mut self) -> Vec<ScriptError> {
        std::mem::take(&mut self.parse_errors)
    }

    /// Loads the first candidate that exists.
    pub fn load_first(&mut self, candidates: &[String]) -> Result<Rc<ScriptProgram>, ScriptError> {
        for candidate in candidates {
            match self.load(candidate) {
                Ok(program) => return Ok(program),
                Err(error) if error.code == "CACHE_SCRIPT_NOT_FOUND" => continue,
                Err(error) => return Err(error),
            }
        }
        Err(ScriptError::new(
            "CACHE_SCRIPT_NOT_FOUND",
            format!("None of [{}] could be loaded.", candidates.join(", ")),
        ))
    }

    pub fn insert(&mut self, program: ScriptProgram) -> Rc<ScriptProgram> {
        let key = normalize_script_path(&program.file_name);
        let program = Rc::new(program);
        self.programs.insert(key, Rc::clone(&program));
        program
    }

    pub fn contains(&self, path: &str) -> bool {
        self.programs.contains_key(&normalize_script_path(path))
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn clear(&mut self) {
        self.programs.clear();
        self.parse_errors.clear();
    }
}

/// Lookup order for a `RunScript` target: verbatim when it has a directory,
/// otherwise next to the caller, then the current map's folder, then the
/// common folder, then the bare name.
pub fn resolve_candidates(target: &str, current_file: Option<&str>, map_path: &str) -> Vec<String> {
    let target = normalize_script_path(target);
    if target.contains('/') {
        return vec![target];
    }

    let mut candidates = Vec::new();
    if let Some((dir, _)) = current_file.and_then(|file| file.rsplit_once('/')) {
        candidates.push(format!("{}/{}", dir, target));
    }
    let map_path = normalize_script_path(map_path);
    let map_name = map_path
        .rsplit('/')
        .next()
        .map(|name| name.split('.').next().unwrap_or(name))
        .unwrap_or_default();
    if !map_name.is_empty() {
        candidates.push(format!("script/map/{}/{}", map_name, target));
    }
    candidates.push(format!("script/common/{}", target));
    candidates.push(target);
    candidates.dedup();
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!("questscript-rs-{}-{}", name, nanos))
    }

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent should be created");
        }
        fs::write(path, content).expect("file should be written");
    }

    #[test]
    fn load_parses_once_and_reuses_the_program() {
        let loader = MemoryScriptLoader::new([("Script/Common/A.txt", "Say(\"hi\");")]);
        let mut cache = ScriptCache::new(loader);
        let first = cache.load("script\\common\\a.txt").expect("load should pass");
        let second = cache.load("SCRIPT/COMMON/A.TXT").expect("load should pass");
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first.file_name, "script/common/a.txt");
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.contains("script/common/a.txt"));
    }

    #[test]
    fn parse_errors_surface_once_for_the_load_that_parsed_the_script() {
        let loader = MemoryScriptLoader::new([(
            "broken.txt",
            "Say(\"unterminated);\nMessage(\"ok\");",
        )]);
        let mut cache = ScriptCache::new(loader);
        let program = cache.load("broken.txt").expect("lossy load should pass");
        assert_eq!(program.len(), 1);

        let errors = cache.take_parse_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, "PARSE_UNTERMINATED_STRING");
        assert_eq!(
            errors[0].location.as_ref().map(|location| location.line),
            Some(1)
        );

        cache.load("broken.txt").expect("cached load should pass");
        assert!(cache.take_parse_errors().is_empty());
    }

    #[test]
    fn load_first_skips_missing_candidates() {
        let loader = MemoryScriptLoader::new([("script/common/b.txt", "Return;")]);
        let mut cache = ScriptCache::new(loader);
        let program = cache
            .load_first(&["script/map/m1/b.txt".to_string(), "script/common/b.txt".to_string()])
            .expect("second candidate should load");
        assert_eq!(program.file_name, "script/common/b.txt");

        let error = cache
            .load_first(&["nope.txt".to_string()])
            .expect_err("missing script should fail");
        assert_eq!(error.code, "CACHE_SCRIPT_NOT_FOUND");
    }

    #[test]
    fn resolve_candidates_orders_caller_map_common_bare() {
        let candidates =
            resolve_candidates("Door.txt", Some("script/map/m1/intro.txt"), "map/M2.map");
        assert_eq!(
            candidates,
            vec![
                "script/map/m1/door.txt".to_string(),
                "script/map/m2/door.txt".to_string(),
                "script/common/door.txt".to_string(),
                "door.txt".to_string(),
            ]
        );
        assert_eq!(
            resolve_candidates("script/x/y.txt", None, ""),
            vec!["script/x/y.txt".to_string()]
        );
        assert_eq!(
            resolve_candidates("z.txt", None, ""),
            vec!["script/common/z.txt".to_string(), "z.txt".to_string()]
        );
    }

    #[test]
    fn dir_loader_matches_files_case_insensitively() {
        let root = temp_path("dir-loader");
        write_file(&root.join("Script").join("Common").join("Intro.txt"), "FadeIn;");
        write_file(&root.join("Script").join("Map").join("M1").join("Door.txt"), "Return;");
        write_file(&root.join("Main.txt"), "RunScript(\"intro.txt\");");

        let loader = DirScriptLoader::new(&root).expect("loader should index");
        assert_eq!(
            loader.paths().collect::<Vec<_>>(),
            vec![
                "main.txt",
                "script/common/intro.txt",
                "script/map/m1/door.txt"
            ]
        );
        let mut cache = ScriptCache::new(loader);
        let program = cache.load("script/common/intro.txt").expect("load");
        assert_eq!(program.instructions[0].name, "FadeIn");

        let missing = DirScriptLoader::new(root.join("missing")).expect_err("missing root");
        assert_eq!(missing.code, "CACHE_ROOT_NOT_DIR");
    }
}
