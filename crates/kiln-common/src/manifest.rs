use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const MANIFEST_FILE: &str = "Kiln.toml";

/// The kind of artifact a program is compiled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutType {
    Executable,
    Library,
    Object,
}

impl OutType {
    pub fn as_str(self) -> &'static str {
        match self {
            OutType::Executable => "executable",
            OutType::Library => "library",
            OutType::Object => "object",
        }
    }
}

impl FromStr for OutType {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "executable" => Ok(OutType::Executable),
            "library" => Ok(OutType::Library),
            "object" => Ok(OutType::Object),
            other => Err(ManifestError::InvalidOutType(other.to_string())),
        }
    }
}

impl std::fmt::Display for OutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output settings supplied from outside the source tree.
///
/// Anything left `None` here has to come from the entry file's root export
/// declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOptions {
    pub out_name: Option<String>,
    pub out_type: Option<OutType>,
}

/// The parsed Kiln.toml manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub package: PackageSection,
    /// The directory containing the Kiln.toml file.
    pub root_dir: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageSection {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
}

impl Manifest {
    pub fn build_options(&self) -> Result<BuildOptions, ManifestError> {
        let out_type = self
            .package
            .kind
            .as_deref()
            .map(OutType::from_str)
            .transpose()?;
        Ok(BuildOptions {
            out_name: self.package.name.clone(),
            out_type,
        })
    }
}

/// Raw TOML structure for deserialization.
#[derive(Deserialize)]
struct RawManifest {
    #[serde(default)]
    package: PackageSection,
}

/// Errors that can occur when loading a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("no Kiln.toml found (searched from {0})")]
    NotFound(String),
    #[error("failed to read Kiln.toml: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("invalid Kiln.toml: {0}")]
    ParseError(String),
    #[error("invalid Kiln.toml: unknown package kind '{0}'")]
    InvalidOutType(String),
}

/// Walk up from `start_dir` looking for `Kiln.toml`.
pub fn find_manifest(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let candidate = current.join(MANIFEST_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Load and validate a Kiln.toml manifest from a file path.
pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let content = std::fs::read_to_string(path)?;
    let root_dir = path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    parse_manifest(&content, root_dir)
}

/// Parse and validate a Kiln.toml manifest from a string.
pub fn parse_manifest(content: &str, root_dir: PathBuf) -> Result<Manifest, ManifestError> {
    let raw: RawManifest =
        toml::from_str(content).map_err(|e| ManifestError::ParseError(e.to_string()))?;

    if let Some(kind) = raw.package.kind.as_deref() {
        OutType::from_str(kind)?;
    }

    Ok(Manifest {
        package: raw.package,
        root_dir,
    })
}

/// Find and load the manifest starting from a source file's directory.
pub fn find_and_load_manifest(source_file: &Path) -> Result<Manifest, ManifestError> {
    let start_dir = source_file.parent().unwrap_or_else(|| Path::new("."));
    let manifest_path = find_manifest(start_dir)
        .ok_or_else(|| ManifestError::NotFound(start_dir.display().to_string()))?;
    load_manifest(&manifest_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_manifest() {
        let toml = r#"
[package]
name = "hello"
kind = "executable"
"#;
        let manifest = parse_manifest(toml, PathBuf::from(".")).unwrap();
        let options = manifest.build_options().unwrap();
        assert_eq!(options.out_name.as_deref(), Some("hello"));
        assert_eq!(options.out_type, Some(OutType::Executable));
    }

    #[test]
    fn empty_manifest_supplies_nothing() {
        let manifest = parse_manifest("", PathBuf::from(".")).unwrap();
        assert_eq!(manifest.build_options().unwrap(), BuildOptions::default());
    }

    #[test]
    fn unknown_kind_rejected() {
        let toml = r#"
[package]
kind = "firmware"
"#;
        let err = parse_manifest(toml, PathBuf::from(".")).unwrap_err();
        assert!(matches!(err, ManifestError::InvalidOutType(ref k) if k == "firmware"));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = parse_manifest("[package", PathBuf::from(".")).unwrap_err();
        assert!(matches!(err, ManifestError::ParseError(_)));
    }

    #[test]
    fn out_type_round_trips_through_str() {
        for ty in [OutType::Executable, OutType::Library, OutType::Object] {
            assert_eq!(ty.as_str().parse::<OutType>().unwrap(), ty);
        }
    }

    #[test]
    fn find_manifest_walks_up() {
        let root = std::env::temp_dir().join(format!("kiln-manifest-{}", std::process::id()));
        let nested = root.join("src").join("deep");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join(MANIFEST_FILE), "[package]\nname = \"walk\"\n").unwrap();

        let found = find_manifest(&nested).unwrap();
        assert_eq!(found, root.join(MANIFEST_FILE));
        let manifest = find_and_load_manifest(&nested.join("main.kn")).unwrap();
        assert_eq!(manifest.package.name.as_deref(), Some("walk"));
        assert_eq!(manifest.root_dir, root);

        std::fs::remove_dir_all(&root).unwrap();
    }
}
