use std::fmt;
use std::fs::{self, File};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{MfaError, Result};

static TEMP_PREFIX: &str = ".aws-mfa-agent-credentials-";
static TEMP_SUFFIX: &str = ".tmp";

/// Owner read/write, used when the target does not exist yet.
#[cfg(unix)]
const DEFAULT_FILE_MODE: u32 = 0o600;
#[cfg(unix)]
const DEFAULT_DIR_MODE: u32 = 0o700;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Pair { key: String, value: String },
    Comment(String),
}

/// A named group of key/value pairs. Keys compare case-insensitively and keep
/// the order (and spelling) they were first written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    lines: Vec<Line>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            lines: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value with surrounding whitespace trimmed.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim())
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::Pair { key, value } => Some((key.as_str(), value.as_str())),
            Line::Comment(_) => None,
        })
    }

    fn set(&mut self, key: &str, value: &str) {
        let existing = self.lines.iter_mut().find_map(|line| match line {
            Line::Pair { key: k, value: v } if k.eq_ignore_ascii_case(key) => Some(v),
            _ => None,
        });
        match existing {
            Some(v) => *v = value.to_owned(),
            None => self.lines.push(Line::Pair {
                key: key.to_owned(),
                value: value.to_owned(),
            }),
        }
    }

    fn remove(&mut self, key: &str) {
        self.lines.retain(|line| match line {
            Line::Pair { key: k, .. } => !k.eq_ignore_ascii_case(key),
            Line::Comment(_) => true,
        });
    }

    fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Shared credentials file held in memory.
///
/// The store is the only owner of the parsed content for one invocation.
/// Mutations are in-memory until [`Store::save_atomic`] commits them.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    /// Keys found before the first header live in a nameless section that is
    /// always kept first and written without a header.
    sections: Vec<Section>,
}

impl Store {
    /// Loads `path`. A missing file yields an empty store bound to `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(MfaError::config("credentials file path is empty"));
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "credentials file not found, starting empty");
                return Ok(Self::empty(path));
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(MfaError::Parse {
                    path: path.to_owned(),
                    line: 0,
                    message: "file is not valid UTF-8".to_owned(),
                });
            }
            Err(e) => {
                return Err(MfaError::io(
                    format!("read credentials file {}", path.display()),
                    e,
                ))
            }
        };

        let sections = parse(path, &content)?;
        debug!(path = %path.display(), sections = sections.len(), "credentials file loaded");
        Ok(Self {
            path: path.to_owned(),
            sections,
        })
    }

    fn empty(path: &Path) -> Self {
        Self {
            path: path.to_owned(),
            sections: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .filter(|s| !s.name.is_empty())
            .map(|s| s.name.as_str())
    }

    /// Trimmed value, `None` when either the section or the key is absent.
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(key))
    }

    /// Like [`Store::get`], but absent and empty values are both errors.
    pub fn must_get(&self, section: &str, key: &str) -> Result<&str> {
        self.get(section, key)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| MfaError::missing_key(section, key))
    }

    /// Upserts `key`, creating the section when needed.
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.section_mut(section).set(key, value);
    }

    pub fn delete_key(&mut self, section: &str, key: &str) {
        if let Some(s) = self.sections.iter_mut().find(|s| s.name == section) {
            s.remove(key);
        }
    }

    /// Returns the named section, creating an empty one if needed.
    fn section_mut(&mut self, name: &str) -> &mut Section {
        let idx = match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None if name.is_empty() => {
                self.sections.insert(0, Section::new(name));
                0
            }
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx]
    }

    /// Writes the whole store next to the target and renames it into place.
    ///
    /// The target is either left untouched or fully replaced. The temporary
    /// file takes the target's permission bits, or `0600` for a new file, and
    /// is removed on every failure path.
    pub fn save_atomic(&self) -> Result<()> {
        self.save_atomic_with(|file, content| file.write_all(content))
    }

    pub(crate) fn save_atomic_with<F>(&self, write: F) -> Result<()>
    where
        F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
    {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        ensure_dir(dir)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(dir)
            .map_err(|e| MfaError::io("create temp credentials file", e))?;

        copy_permissions(&self.path, tmp.as_file())?;

        let content = self.to_string();
        write(tmp.as_file_mut(), content.as_bytes())
            .map_err(|e| MfaError::io("write temp credentials file", e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| MfaError::io("sync temp credentials file", e))?;

        // same directory, so this is a single rename
        tmp.persist(&self.path)
            .map_err(|e| MfaError::io("replace credentials file", e.error))?;

        info!(path = %self.path.display(), "credentials file saved");
        Ok(())
    }
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for section in self.sections.iter().filter(|s| !s.name.is_empty() || !s.is_empty()) {
            if !first {
                writeln!(f)?;
            }
            first = false;
            if !section.name.is_empty() {
                writeln!(f, "[{}]", section.name)?;
            }
            for line in &section.lines {
                match line {
                    Line::Pair { key, value } => writeln!(f, "{key} = {value}")?,
                    Line::Comment(text) => writeln!(f, "{text}")?,
                }
            }
        }
        Ok(())
    }
}

fn parse(path: &Path, content: &str) -> Result<Vec<Section>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut sections: Vec<Section> = Vec::new();
    let mut current = String::new();

    let error = |line: usize, message: &str| MfaError::Parse {
        path: path.to_owned(),
        line,
        message: message.to_owned(),
    };

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('#') || line.starts_with(';') {
            section_entry(&mut sections, &current)
                .lines
                .push(Line::Comment(line.to_owned()));
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let close = rest
                .rfind(']')
                .ok_or_else(|| error(line_no, "unterminated section header"))?;
            let trailing = rest[close + 1..].trim_start();
            if !(trailing.is_empty() || trailing.starts_with('#') || trailing.starts_with(';')) {
                return Err(error(line_no, "unexpected text after section header"));
            }
            let name = rest[..close].trim();
            if name.is_empty() {
                return Err(error(line_no, "empty section name"));
            }
            current = name.to_owned();
            // repeated headers merge into the first occurrence
            section_entry(&mut sections, &current);
            continue;
        }

        let split = line
            .find(|c: char| c == '=' || c == ':')
            .ok_or_else(|| error(line_no, "expected `key = value`"))?;
        let key = line[..split].trim();
        if key.is_empty() {
            return Err(error(line_no, "empty key"));
        }
        let value = line[split + 1..].trim();
        section_entry(&mut sections, &current).set(key, value);
    }

    Ok(sections)
}

fn section_entry<'a>(sections: &'a mut Vec<Section>, name: &str) -> &'a mut Section {
    let idx = match sections.iter().position(|s| s.name == name) {
        Some(idx) => idx,
        None => {
            sections.push(Section::new(name));
            sections.len() - 1
        }
    };
    &mut sections[idx]
}

#[cfg(unix)]
fn ensure_dir(dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    if dir.is_dir() {
        return Ok(());
    }
    fs::DirBuilder::new()
        .recursive(true)
        .mode(DEFAULT_DIR_MODE)
        .create(dir)
        .map_err(|e| MfaError::io(format!("create credentials dir {}", dir.display()), e))
}

#[cfg(not(unix))]
fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| MfaError::io(format!("create credentials dir {}", dir.display()), e))
}

#[cfg(unix)]
fn copy_permissions(target: &Path, tmp: &File) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mode = match fs::metadata(target) {
        Ok(meta) => meta.permissions().mode() & 0o777,
        Err(_) => DEFAULT_FILE_MODE,
    };
    tmp.set_permissions(fs::Permissions::from_mode(mode))
        .map_err(|e| MfaError::io("chmod temp credentials file", e))
}

#[cfg(not(unix))]
fn copy_permissions(target: &Path, tmp: &File) -> Result<()> {
    if let Ok(meta) = fs::metadata(target) {
        tmp.set_permissions(meta.permissions())
            .map_err(|e| MfaError::io("chmod temp credentials file", e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
# managed by hand
[default-long-term]
aws_access_key_id = AKIA_TEST
AWS_Secret_Access_Key =   SECRET_TEST
aws_mfa_device = arn:aws:iam::123456789012:mfa/me

[default]
aws_session_token = abc==
";

    fn write_sample(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("credentials");
        fs::write(&path, SAMPLE).unwrap();
        path
    }

    fn temp_leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(TEMP_PREFIX))
            .collect()
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".aws").join("credentials");

        let store = Store::load(&path).unwrap();
        assert_eq!(store.path(), path.as_path());
        assert_eq!(store.section_names().count(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn load_empty_path_is_config_error() {
        let err = Store::load("").unwrap_err();
        assert!(matches!(err, MfaError::Config(_)));
    }

    #[test]
    fn get_is_case_insensitive_and_trimmed() {
        let dir = TempDir::new().unwrap();
        let store = Store::load(write_sample(&dir)).unwrap();

        assert_eq!(store.get("default-long-term", "aws_secret_access_key"), Some("SECRET_TEST"));
        assert_eq!(store.get("default-long-term", "AWS_ACCESS_KEY_ID"), Some("AKIA_TEST"));
        assert_eq!(
            store.get("default-long-term", "aws_mfa_device"),
            Some("arn:aws:iam::123456789012:mfa/me")
        );
        assert_eq!(store.get("default", "aws_session_token"), Some("abc=="));
        assert_eq!(store.get("default", "missing"), None);
        assert_eq!(store.get("nope", "aws_session_token"), None);
        assert!(store.has_section("default"));
        assert!(!store.has_section("DEFAULT"));
    }

    #[test]
    fn must_get_rejects_absent_and_empty() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::load(dir.path().join("credentials")).unwrap();
        store.set("p", "empty", "   ");

        match store.must_get("p", "empty").unwrap_err() {
            MfaError::MissingKey { section, key } => {
                assert_eq!(section, "p");
                assert_eq!(key, "empty");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            store.must_get("other", "key").unwrap_err(),
            MfaError::MissingKey { .. }
        ));
    }

    #[test]
    fn set_upserts_and_delete_is_noop_when_absent() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::load(write_sample(&dir)).unwrap();

        store.set("default-long-term", "aws_access_key_id", "AKIA_NEW");
        store.set("fresh", "k", "v");
        store.delete_key("default", "aws_session_token");
        store.delete_key("default", "never_there");
        store.delete_key("no-such-section", "k");

        assert_eq!(store.get("default-long-term", "aws_access_key_id"), Some("AKIA_NEW"));
        assert_eq!(store.get("fresh", "k"), Some("v"));
        assert_eq!(store.get("default", "aws_session_token"), None);
        assert!(!store.has_section("no-such-section"));
        assert_eq!(
            store.section_names().collect::<Vec<_>>(),
            vec!["default-long-term", "default", "fresh"]
        );
    }

    #[test]
    fn upsert_keeps_original_key_spelling() {
        let dir = TempDir::new().unwrap();
        let mut store = Store::load(write_sample(&dir)).unwrap();
        store.set("default-long-term", "aws_secret_access_key", "ROTATED");

        let rendered = store.to_string();
        assert!(rendered.contains("AWS_Secret_Access_Key = ROTATED\n"));
        assert!(!rendered.contains("aws_secret_access_key"));
    }

    #[test]
    fn save_then_reload_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".aws").join("credentials");

        let mut store = Store::load(&path).unwrap();
        store.set("default-long-term", "aws_access_key_id", "AKIA_TEST");
        store.set("default-long-term", "aws_secret_access_key", "SECRET_TEST");
        store.set("default", "aws_access_key_id", "ASIA_TEST");
        store.save_atomic().unwrap();

        let loaded = Store::load(&path).unwrap();
        assert_eq!(loaded.must_get("default-long-term", "aws_access_key_id").unwrap(), "AKIA_TEST");
        assert_eq!(loaded.get("default", "aws_access_key_id"), Some("ASIA_TEST"));
        assert_eq!(loaded.to_string(), store.to_string());
        assert_eq!(fs::read_to_string(&path).unwrap(), store.to_string());
        assert!(temp_leftovers(path.parent().unwrap()).is_empty());
    }

    #[test]
    fn comments_survive_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir);

        let store = Store::load(&path).unwrap();
        store.save_atomic().unwrap();

        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.starts_with("# managed by hand\n\n[default-long-term]\n"));
        assert_eq!(Store::load(&path).unwrap().to_string(), saved);
    }

    #[test]
    fn repeated_headers_merge() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials");
        fs::write(&path, "[a]\nx = 1\n[b]\ny = 2\n[a]\nx = 3\nz = 4\n").unwrap();

        let store = Store::load(&path).unwrap();
        assert_eq!(store.get("a", "x"), Some("3"));
        assert_eq!(store.get("a", "z"), Some("4"));
        assert_eq!(store.section_names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials");

        for (content, expected_line) in [
            ("[ok]\nkey = v\n[broken\n", 3),
            ("[ok]\njust some words\n", 2),
            ("[]\n", 1),
            ("[ok]\n = value\n", 2),
        ] {
            fs::write(&path, content).unwrap();
            match Store::load(&path).unwrap_err() {
                MfaError::Parse { line, .. } => assert_eq!(line, expected_line, "{content:?}"),
                other => panic!("unexpected error for {content:?}: {other}"),
            }
        }
    }

    #[test]
    fn header_may_carry_trailing_comment() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials");

        fs::write(
            &path,
            "[default-long-term] # personal\naws_access_key_id = A\n[work]   ; shared\nregion = eu-west-1\n",
        )
        .unwrap();
        let store = Store::load(&path).unwrap();
        assert_eq!(store.get("default-long-term", "aws_access_key_id"), Some("A"));
        assert_eq!(store.get("work", "region"), Some("eu-west-1"));

        for content in ["[default] trailing\nkey = v\n", "[default]x\n"] {
            fs::write(&path, content).unwrap();
            match Store::load(&path).unwrap_err() {
                MfaError::Parse { line, .. } => assert_eq!(line, 1, "{content:?}"),
                other => panic!("unexpected error for {content:?}: {other}"),
            }
        }
    }

    #[test]
    fn non_utf8_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials");
        fs::write(&path, [0x5b, 0xff, 0xfe, 0x5d]).unwrap();

        assert!(matches!(Store::load(&path).unwrap_err(), MfaError::Parse { .. }));
    }

    #[test]
    fn failed_write_leaves_original_untouched() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir);
        let before = fs::read(&path).unwrap();

        let mut store = Store::load(&path).unwrap();
        store.set("default", "aws_session_token", "NEW_TOKEN");

        let err = store
            .save_atomic_with(|file, content| {
                file.write_all(&content[..content.len() / 2])?;
                Err(io::Error::new(ErrorKind::Other, "disk full"))
            })
            .unwrap_err();

        assert!(matches!(err, MfaError::Io { .. }));
        assert_eq!(fs::read(&path).unwrap(), before);
        assert!(temp_leftovers(dir.path()).is_empty());
    }

    #[test]
    fn failed_first_write_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials");

        let mut store = Store::load(&path).unwrap();
        store.set("default", "k", "v");
        let _ = store.save_atomic_with(|_, _| Err(io::Error::new(ErrorKind::Other, "boom")));

        assert!(!path.exists());
        assert!(temp_leftovers(dir.path()).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn save_uses_owner_only_mode_for_new_files() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("credentials");

        let mut store = Store::load(&path).unwrap();
        store.set("default", "k", "v");
        store.save_atomic().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "permissions mismatch (expected 0600)");
        let dir_mode = fs::metadata(path.parent().unwrap()).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
    }

    #[cfg(unix)]
    #[test]
    fn save_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir);
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let mut store = Store::load(&path).unwrap();
        store.set("default", "k", "v");
        store.save_atomic().unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }
}
