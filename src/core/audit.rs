//! Project consistency audit: per-file inventory plus checks for empty files,
//! unexpected file types, banned dependencies and banned Python usages.
//! Python modules that nothing imports are listed separately for review.

use crate::config::toml_config::AuditSection;
use crate::domain::model::{AuditReport, FileInfo, ForbiddenUsage};
use crate::utils::error::{LauncherError, Result};
use glob::Pattern;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const DESCRIPTION_MAX_CHARS: usize = 160;
const EMPTY_DESCRIPTION: &str = "(empty file)";
const REQUIREMENTS_PATTERN: &str = "requirements*.txt";

pub fn build_report(root: &Path, section: &AuditSection) -> Result<AuditReport> {
    let import_patterns = section
        .forbidden_imports
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| LauncherError::InvalidConfigValueError {
                field: "audit.forbidden_imports".to_string(),
                value: p.clone(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let requirements = Pattern::new(REQUIREMENTS_PATTERN)?;

    let mut report = AuditReport {
        root: root.to_path_buf(),
        ..AuditReport::default()
    };
    let mut forbidden_dependencies = BTreeSet::new();
    let mut python_sources = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !section
                    .ignored_dirs
                    .iter()
                    .any(|ignored| entry.file_name().to_string_lossy() == ignored.as_str())
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let text = match fs::read(path) {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", path.display(), e);
                String::new()
            }
        };

        let line_count = text.lines().count();
        let info = FileInfo {
            path: relative.clone(),
            line_count,
            description: describe(path, &text),
            is_empty: line_count == 0,
            unexpected: is_unexpected(path, &section.allowed_suffixes),
        };
        if info.is_empty {
            report.empty_files.push(relative.clone());
        }
        if info.unexpected {
            report.unexpected_files.push(relative.clone());
        }
        report.files.push(info);

        let lowered = text.to_lowercase();
        if requirements.matches(&file_name) {
            for dependency in &section.forbidden_dependencies {
                if lowered.contains(&dependency.to_lowercase()) {
                    forbidden_dependencies.insert(dependency.clone());
                }
            }
        }

        let is_python = path.extension().is_some_and(|ext| ext == "py");
        if is_python {
            python_sources.push((relative.clone(), text.clone()));
        }
        if is_python && !section.skip_files.iter().any(|skip| *skip == file_name) {
            for needle in &section.forbidden_strings {
                if lowered.contains(&needle.to_lowercase()) {
                    report.forbidden_usages.push(ForbiddenUsage {
                        path: relative.clone(),
                        needle: needle.clone(),
                    });
                }
            }
            for pattern in &import_patterns {
                if pattern.is_match(&lowered) {
                    report.forbidden_usages.push(ForbiddenUsage {
                        path: relative.clone(),
                        needle: pattern.as_str().to_string(),
                    });
                }
            }
        }
    }

    report.forbidden_dependencies = forbidden_dependencies.into_iter().collect();
    report.unused_modules = detect_unused_modules(package_name(root).as_deref(), &python_sources)?;
    tracing::debug!(
        "Audited {} files under {}",
        report.files.len(),
        root.display()
    );
    Ok(report)
}

fn package_name(root: &Path) -> Option<String> {
    root.canonicalize()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
}

/// Dotted module path of a `.py` file relative to the audit root.
fn module_name(relative: &Path) -> String {
    relative
        .with_extension("")
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// `parent` is `module` itself or one of its dotted parents.
fn is_module_prefix(parent: &str, module: &str) -> bool {
    module == parent
        || (module.starts_with(parent) && module[parent.len()..].starts_with('.'))
}

/// Line-based scan of `import x` and `from x import y` statements.
/// `from x import y` yields `x.y`, `from x import *` yields `x`.
struct ImportScanner {
    plain: Regex,
    from: Regex,
}

impl ImportScanner {
    fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| LauncherError::config(format!("import pattern: {}", e)))
        };
        Ok(Self {
            plain: compile(r"^\s*import\s+(.+)$")?,
            from: compile(r"^\s*from\s+(\.*[\w.]*)\s+import\s+(.+)$")?,
        })
    }

    fn collect(&self, source: &str, targets: &mut BTreeSet<String>) {
        let mut lines = source.lines();
        while let Some(line) = lines.next() {
            let line = strip_comment(line);

            if let Some(caps) = self.plain.captures(line) {
                targets.extend(caps[1].split(',').filter_map(imported_name));
                continue;
            }

            let Some(caps) = self.from.captures(line) else {
                continue;
            };
            let module = caps[1].trim_start_matches('.');
            let mut names = caps[2].trim().to_string();
            if names.starts_with('(') && !names.contains(')') {
                for more in lines.by_ref() {
                    names.push(',');
                    names.push_str(strip_comment(more));
                    if more.contains(')') {
                        break;
                    }
                }
            }

            let names = names.replace(['(', ')'], "");
            for name in names.split(',').filter_map(imported_name) {
                let target = if name == "*" {
                    module.to_string()
                } else if module.is_empty() {
                    name
                } else {
                    format!("{}.{}", module, name)
                };
                if !target.is_empty() {
                    targets.insert(target);
                }
            }
        }
    }
}

fn strip_comment(line: &str) -> &str {
    line.split('#').next().unwrap_or_default()
}

/// `pkg.mod as alias` -> `pkg.mod`
fn imported_name(item: &str) -> Option<String> {
    let name = item.split_whitespace().next()?.trim_end_matches(';');
    (!name.is_empty()).then(|| name.to_string())
}

/// Modules whose dotted name, with or without the package prefix, is not
/// related by prefix to any import target. `__init__.py`, tests and scripts
/// with a `__main__` guard are never reported.
fn detect_unused_modules(
    package: Option<&str>,
    sources: &[(PathBuf, String)],
) -> Result<Vec<PathBuf>> {
    let scanner = ImportScanner::new()?;
    let mut targets = BTreeSet::new();
    for (_, source) in sources {
        scanner.collect(source, &mut targets);
    }

    let mut unused = Vec::new();
    for (path, source) in sources {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if file_name == "__init__.py" || file_name.starts_with("test_") {
            continue;
        }
        if path.components().any(|c| c.as_os_str() == "tests") {
            continue;
        }
        if source.contains("__main__") {
            continue;
        }

        let local = module_name(path);
        let mut names = vec![local.clone()];
        if let Some(package) = package {
            names.push(format!("{}.{}", package, local));
        }
        let imported = targets.iter().any(|target| {
            names
                .iter()
                .any(|name| is_module_prefix(name, target) || is_module_prefix(target, name))
        });
        if !imported {
            unused.push(path.clone());
        }
    }
    unused.sort();
    Ok(unused)
}

/// Dotfiles are never unexpected; everything else needs an allowed suffix.
fn is_unexpected(path: &Path, allowed_suffixes: &[String]) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    if name.starts_with('.') {
        return false;
    }
    match path.extension() {
        Some(ext) => {
            let ext = ext.to_string_lossy();
            !allowed_suffixes
                .iter()
                .any(|allowed| allowed.trim_start_matches('.') == ext)
        }
        None => true,
    }
}

/// First line of a Python module docstring, else the first non-empty line.
pub fn describe(path: &Path, text: &str) -> String {
    let is_python = path.extension().is_some_and(|ext| ext == "py");
    if is_python {
        if let Some(summary) = docstring_summary(text) {
            return summary;
        }
    }

    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.chars().take(DESCRIPTION_MAX_CHARS).collect())
        .unwrap_or_else(|| EMPTY_DESCRIPTION.to_string())
}

fn docstring_summary(text: &str) -> Option<String> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .skip_while(|line| line.is_empty() || line.starts_with('#'));

    let first = lines.next()?;
    let first = first.trim_start_matches(['r', 'R', 'u', 'U']);
    let Some(quote) = ["\"\"\"", "'''"]
        .into_iter()
        .find(|q| first.starts_with(q))
    else {
        return single_quoted_summary(first);
    };

    let opening = first[quote.len()..].trim_end_matches(quote).trim();
    if !opening.is_empty() {
        return Some(opening.to_string());
    }
    lines
        .find(|line| !line.is_empty())
        .filter(|line| *line != quote)
        .map(|line| line.trim_end_matches(quote).trim().to_string())
}

/// `"text"` or `'text'` on a single line.
fn single_quoted_summary(line: &str) -> Option<String> {
    let quote = line.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let body = &line[1..];
    let end = body.find(quote)?;
    let summary = body[..end].trim();
    (!summary.is_empty()).then(|| summary.to_string())
}

pub fn render_text(report: &AuditReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== MailBot audit: {} ===", report.root.display());
    let _ = writeln!(out);
    let _ = writeln!(out, "=== FILES ===");
    for info in &report.files {
        let _ = writeln!(
            out,
            "{} | {:4} lines | {}",
            info.path.display(),
            info.line_count,
            info.description
        );
    }

    let _ = writeln!(out);
    let mut section = |title: &str, items: Vec<String>| {
        let _ = writeln!(out, "{}:", title);
        if items.is_empty() {
            let _ = writeln!(out, " - none");
        }
        for item in items {
            let _ = writeln!(out, " - {}", item);
        }
    };
    let paths = |paths: &[std::path::PathBuf]| {
        paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
    };

    section("EMPTY FILES", paths(&report.empty_files));
    section("UNEXPECTED FILES", paths(&report.unexpected_files));
    section(
        "UNUSED MODULES (review, not counted)",
        paths(&report.unused_modules),
    );
    section("FORBIDDEN DEPENDENCIES", report.forbidden_dependencies.clone());
    section(
        "FORBIDDEN USAGES",
        report
            .forbidden_usages
            .iter()
            .map(|usage| format!("{}: {}", usage.path.display(), usage.needle))
            .collect(),
    );

    let _ = writeln!(
        out,
        "\nRESULT: {}",
        if report.is_clean() {
            "clean"
        } else {
            "fix the findings above before launching"
        }
    );
    out
}
