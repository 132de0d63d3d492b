//! Spec catalog: scanning, loading and authoring of spec files
//!
//! The catalog owns the loaded `TestSpec`/`SuiteSpec` entries; the
//! resolver only borrows them. Names are unique across the combined
//! test/suite namespace: loading a duplicate warns and keeps the first
//! occurrence, it never overwrites.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, warn};

use crate::common::{Error, Result};
use crate::spec::{SpecFile, SuiteSpec, TestSpec};

/// Kind of catalog entry, used by the authoring commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    Test,
    Suite,
}

impl SpecKind {
    fn noun(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Suite => "suite",
        }
    }
}

/// Sample spec written by `new` when no template is given
const TEST_TEMPLATE: &str = "\
type: test
name: CHANGE-ME
brief: One-line summary
description: |
  What this test verifies and why.
author: Unknown
category: Unknown
command: \"true\"
expect:
setup: []
teardown: []
";

const SUITE_TEMPLATE: &str = "\
type: suite
name: CHANGE-ME
brief: One-line summary
description: |
  What this suite groups together.
author: Unknown
category: Unknown
tests: []
suites: []
";

/// Catalog of test and suite specifications
#[derive(Debug, Default)]
pub struct Catalog {
    search_paths: Vec<PathBuf>,
    tests: Vec<(PathBuf, TestSpec)>,
    suites: Vec<(PathBuf, SuiteSpec)>,
    editor: String,
}

impl Catalog {
    pub fn new(editor: String) -> Self {
        Self {
            editor,
            ..Self::default()
        }
    }

    /// Add a directory to search for spec files
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    /// Scan all search paths for `*.yaml` spec files
    ///
    /// Missing directories are skipped silently; malformed files and
    /// duplicate names are skipped with a warning.
    pub fn scan(&mut self) -> Result<()> {
        for path in self.search_paths.clone() {
            debug!("searching for tests/suites in {}", path.display());
            let entries = match std::fs::read_dir(&path) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            let mut files: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "yaml"))
                .collect();
            files.sort();
            for file in files {
                if let Err(e) = self.load_spec_file(&file) {
                    warn!("skipping {} ({})", file.display(), e);
                }
            }
        }
        Ok(())
    }

    /// Load a single test/suite spec file
    pub fn load_spec_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let spec: SpecFile =
            serde_yaml::from_str(&content).map_err(|e| Error::spec_parse(path, e))?;

        if spec.name().is_empty() {
            return Err(Error::spec_parse(path, "spec name must not be empty"));
        }
        if self.knows_name(spec.name()) {
            warn!(
                "skipping {} ('{}' already in the catalog)",
                path.display(),
                spec.name()
            );
            return Ok(());
        }

        match spec {
            SpecFile::Test(test) => {
                debug!("loaded test '{}' from {}", test.name, path.display());
                self.tests.push((path.to_path_buf(), test));
            }
            SpecFile::Suite(suite) => {
                debug!("loaded suite '{}' from {}", suite.name, path.display());
                self.suites.push((path.to_path_buf(), suite));
            }
        }
        Ok(())
    }

    /// True if a test or suite with this name is already loaded
    pub fn knows_name(&self, name: &str) -> bool {
        self.find_test(name).is_some() || self.find_suite(name).is_some()
    }

    /// Loaded test specs, in load order
    pub fn tests(&self) -> impl Iterator<Item = &TestSpec> {
        self.tests.iter().map(|(_, t)| t)
    }

    /// Loaded suite specs, in load order
    pub fn suites(&self) -> impl Iterator<Item = &SuiteSpec> {
        self.suites.iter().map(|(_, s)| s)
    }

    /// Find a test spec by name
    pub fn find_test(&self, name: &str) -> Option<&TestSpec> {
        self.tests().find(|t| t.name == name)
    }

    /// Find a suite spec by name
    pub fn find_suite(&self, name: &str) -> Option<&SuiteSpec> {
        self.suites().find(|s| s.name == name)
    }

    fn find_file(&self, kind: SpecKind, name: &str) -> Option<&Path> {
        match kind {
            SpecKind::Test => self
                .tests
                .iter()
                .find(|(_, t)| t.name == name)
                .map(|(p, _)| p.as_path()),
            SpecKind::Suite => self
                .suites
                .iter()
                .find(|(_, s)| s.name == name)
                .map(|(p, _)| p.as_path()),
        }
    }

    /// Human description block for the `show` command
    pub fn describe(&self, kind: SpecKind, name: &str) -> Result<String> {
        match kind {
            SpecKind::Test => {
                let spec = self
                    .find_test(name)
                    .ok_or_else(|| Error::SpecNotFound(name.to_string(), kind.noun()))?;
                Ok(format!(
                    "{}\n--\nAuthor: {}",
                    spec.description.trim(),
                    spec.author
                ))
            }
            SpecKind::Suite => {
                let spec = self
                    .find_suite(name)
                    .ok_or_else(|| Error::SpecNotFound(name.to_string(), kind.noun()))?;
                Ok(format!(
                    "{}\n--\nTests: {}\nAuthor: {}",
                    spec.description.trim(),
                    spec.tests.join(", "),
                    spec.author
                ))
            }
        }
    }

    /// Create a new spec file at `<dir>/<name>.yaml` and open the editor
    ///
    /// With `template`, the file starts as a copy of the named existing
    /// spec; otherwise a built-in sample is used.
    pub fn create(
        &mut self,
        kind: SpecKind,
        name: &str,
        dir: &Path,
        template: Option<&str>,
    ) -> Result<()> {
        if self.knows_name(name) {
            return Err(Error::SpecExists(name.to_string(), kind.noun()));
        }

        let content = match template {
            Some(template) => {
                let source = self
                    .find_file(kind, template)
                    .ok_or_else(|| Error::SpecNotFound(template.to_string(), kind.noun()))?;
                std::fs::read_to_string(source)?
            }
            None => match kind {
                SpecKind::Test => TEST_TEMPLATE.to_string(),
                SpecKind::Suite => SUITE_TEMPLATE.to_string(),
            },
        };

        crate::common::paths::ensure_dir(dir)?;
        let path = dir.join(format!("{name}.yaml"));
        std::fs::write(&path, content)?;
        debug!("created {}", path.display());

        self.open_editor(&path)?;
        self.load_spec_file(&path)
    }

    /// Open the spec file backing a test/suite in the editor
    pub fn edit(&self, kind: SpecKind, name: &str) -> Result<()> {
        let path = self
            .find_file(kind, name)
            .ok_or_else(|| Error::SpecNotFound(name.to_string(), kind.noun()))?
            .to_path_buf();
        self.open_editor(&path)
    }

    fn open_editor(&self, path: &Path) -> Result<()> {
        let editor = which::which(&self.editor)
            .map_err(|_| Error::Config(format!("editor '{}' not found", self.editor)))?;
        let status = Command::new(editor).arg(path).status()?;
        if !status.success() {
            return Err(Error::Config(format!(
                "editor exited with status {status}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_spec(dir: &Path, file: &str, doc: &str) {
        fs::write(dir.join(file), doc).unwrap();
    }

    fn scan_dir(dir: &Path) -> Catalog {
        let mut catalog = Catalog::new("vi".to_string());
        catalog.add_search_path(dir);
        catalog.scan().unwrap();
        catalog
    }

    #[test]
    fn test_scan_loads_tests_and_suites() {
        let dir = TempDir::new().unwrap();
        write_spec(
            dir.path(),
            "a.yaml",
            "type: test\nname: a\nbrief: A\ncommand: \"true\"\n",
        );
        write_spec(
            dir.path(),
            "s.yaml",
            "type: suite\nname: s\nbrief: S\ntests: [a]\n",
        );

        let catalog = scan_dir(dir.path());
        assert!(catalog.find_test("a").is_some());
        assert!(catalog.find_suite("s").is_some());
        assert!(catalog.find_test("s").is_none());
    }

    #[test]
    fn test_duplicate_name_is_a_noop() {
        let dir = TempDir::new().unwrap();
        write_spec(
            dir.path(),
            "1-first.yaml",
            "type: test\nname: a\nbrief: first\ncommand: \"true\"\n",
        );
        write_spec(
            dir.path(),
            "2-second.yaml",
            "type: test\nname: a\nbrief: second\ncommand: \"false\"\n",
        );

        let catalog = scan_dir(dir.path());
        assert_eq!(catalog.tests().count(), 1);
        assert_eq!(catalog.find_test("a").unwrap().brief, "first");
    }

    #[test]
    fn test_duplicate_name_across_kinds_is_a_noop() {
        let dir = TempDir::new().unwrap();
        write_spec(
            dir.path(),
            "1-test.yaml",
            "type: test\nname: a\nbrief: A\ncommand: \"true\"\n",
        );
        write_spec(dir.path(), "2-suite.yaml", "type: suite\nname: a\nbrief: A\n");

        let catalog = scan_dir(dir.path());
        assert!(catalog.find_test("a").is_some());
        assert!(catalog.find_suite("a").is_none());
    }

    #[test]
    fn test_malformed_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_spec(dir.path(), "bad.yaml", "not a spec at all: [");
        write_spec(
            dir.path(),
            "good.yaml",
            "type: test\nname: ok\nbrief: ok\ncommand: \"true\"\n",
        );

        let catalog = scan_dir(dir.path());
        assert_eq!(catalog.tests().count(), 1);
    }

    #[test]
    fn test_missing_search_path_is_skipped() {
        let mut catalog = Catalog::new("vi".to_string());
        catalog.add_search_path("/nonexistent/testrig");
        assert!(catalog.scan().is_ok());
    }

    #[test]
    fn test_describe_suite_lists_tests() {
        let dir = TempDir::new().unwrap();
        write_spec(
            dir.path(),
            "s.yaml",
            "type: suite\nname: s\nbrief: S\ndescription: All checks\nauthor: QA\ntests: [a, b]\n",
        );

        let catalog = scan_dir(dir.path());
        let text = catalog.describe(SpecKind::Suite, "s").unwrap();
        assert!(text.contains("All checks"));
        assert!(text.contains("Tests: a, b"));
        assert!(text.contains("Author: QA"));
    }

    #[test]
    fn test_describe_unknown_name_fails() {
        let catalog = Catalog::new("vi".to_string());
        assert!(catalog.describe(SpecKind::Test, "nope").is_err());
    }
}
