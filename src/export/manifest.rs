use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use super::split::Split;
use super::vocabulary::ClassVocabulary;

/// The `dataset.yaml` written next to `images/` and `labels/`.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetManifest {
    /// Dataset root, with forward slashes.
    pub root: String,
    pub train: String,
    pub val: String,
    pub names: Vec<String>,
}

impl DatasetManifest {
    /// Manifest for a dataset rooted at `root`. The root is made absolute
    /// when it exists on disk.
    pub fn new(root: &Path, vocabulary: &ClassVocabulary) -> Self {
        let absolute: PathBuf = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        Self {
            root: absolute.to_string_lossy().replace('\\', "/"),
            train: format!("images/{}", Split::Train.dir_name()),
            val: format!("images/{}", Split::Val.dir_name()),
            names: vocabulary.names().to_vec(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("# YOLO Dataset Configuration\n\n");
        let root = self.root.trim_end_matches('/');
        let _ = writeln!(out, "path: {root}/");
        let _ = writeln!(out, "train: {}", self.train);
        let _ = writeln!(out, "val: {}", self.val);
        out.push_str("names:\n");
        for (index, name) in self.names.iter().enumerate() {
            let _ = writeln!(out, "  {index}: {}", yaml_scalar(name));
        }
        out
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        fs::write(path, self.render())
    }
}

/// `name` as a YAML value: plain when it reads back as the same string,
/// double-quoted otherwise.
fn yaml_scalar(name: &str) -> String {
    const INDICATORS: &[char] = &[
        '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@',
        '`',
    ];
    let reserved = matches!(
        name.to_ascii_lowercase().as_str(),
        "true" | "false" | "yes" | "no" | "on" | "off" | "null" | "~"
    );
    let plain = !name.is_empty()
        && !reserved
        && name.trim() == name
        && name.parse::<f64>().is_err()
        && !name.starts_with(INDICATORS)
        && !name.contains(": ")
        && !name.contains(" #")
        && !name.ends_with(':')
        && !name.chars().any(|c| c.is_control() || "[]{},".contains(c));
    if plain {
        return name.to_string();
    }
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(quoted, "\\u{:04x}", u32::from(c));
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
