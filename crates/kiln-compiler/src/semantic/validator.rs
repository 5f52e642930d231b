use kiln_common::{OutType, Position};
use serde::Serialize;

use super::analysis::Analysis;
use crate::ast::{Program, RootExportDecl, SourceFile, UseDecl};

/// A `major.minor.patch` version triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl Version {
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parse `MAJOR.MINOR.PATCH`: exactly two dots, three decimal components.
pub fn parse_version_string(text: &str) -> Option<Version> {
    let mut parts = text.split('.');
    let (major, minor, patch) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some(Version {
        major: parse_component(major)?,
        minor: parse_component(minor)?,
        patch: parse_component(patch)?,
    })
}

/// Digits only. `u32::from_str` alone would also take a leading `+`.
fn parse_component(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Apply a root export declaration found during the declaration pass.
///
/// Only the entry file may carry one, and only once. The first declaration
/// fills whatever output name and kind the build options left open.
pub(super) fn collect_root_export(
    analysis: &mut Analysis,
    file: &SourceFile,
    is_entry: bool,
    decl: &RootExportDecl,
) {
    if !is_entry {
        analysis.error(
            file,
            decl.pos,
            "root export declaration only valid in root source file",
        );
        return;
    }

    let is_first = analysis.export.decl.is_none();

    for directive in &decl.directives {
        if directive.name != "version" {
            analysis.invalid_directive(file, directive);
            continue;
        }
        match parse_version_string(&directive.param) {
            Some(version) if is_first => analysis.export.version = Some(version),
            Some(_) => {}
            None => analysis.error(file, directive.pos, "invalid version string"),
        }
    }

    if !is_first {
        analysis.error(file, decl.pos, "only one root export declaration allowed");
        return;
    }

    analysis.export.decl = Some(decl.id);
    if analysis.export.out_name.is_none() {
        analysis.export.out_name = Some(decl.name.clone());
    }
    match decl.kind.parse::<OutType>() {
        Ok(kind) => {
            if analysis.export.out_type.is_none() {
                analysis.export.out_type = Some(kind);
            }
        }
        Err(_) => analysis.error(
            file,
            decl.pos,
            format!("invalid export type: '{}'", decl.kind),
        ),
    }
}

/// Use declarations accept no directives.
pub(super) fn check_use_directives(analysis: &mut Analysis, file: &SourceFile, decl: &UseDecl) {
    for directive in &decl.directives {
        analysis.invalid_directive(file, directive);
    }
}

/// Whole-program checks once both passes are done: the artifact must have
/// a name and a kind from somewhere.
pub(super) fn validate_program(analysis: &mut Analysis, program: &Program) {
    let (path, position) = match program.files.get(program.entry.0) {
        Some(entry) => (entry.path.as_str(), entry.root.pos),
        None => ("<program>", Position::default()),
    };

    if analysis.export.out_name.is_none() {
        analysis.diagnostics.error(
            path,
            position,
            "missing export declaration and output name not provided",
        );
    }
    if analysis.export.out_type.is_none() {
        analysis.diagnostics.error(
            path,
            position,
            "missing export declaration and export type not provided",
        );
    }
}
