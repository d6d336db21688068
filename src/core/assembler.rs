//! Assembles the checked files into a single Markdown document.

use super::error::CoreError;
use super::{dotted_extension, to_slash_path, FileHandler, TreeGenerator};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Build manifests routed to the "Dependencies" section instead of "File Contents".
pub const DEPENDENCY_FILE_NAMES: &[&str] = &[
    "requirements.txt",
    "package.json",
    "Pipfile",
    "pyproject.toml",
    "pom.xml",
    "build.gradle",
];

const SQL_DIVIDER: &str = "\n\n-- -- -- -- -- -- -- -- -- --\n\n";
const ROOT_DIRECTORY_LABEL: &str = "(Root)";

/// Everything one export needs. Built fresh for each export.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub prompt_text: String,
    pub checked_file_paths: Vec<PathBuf>,
    pub project_root: PathBuf,
    /// Lowercase dotted extension (e.g. `.py`) to fence language tag.
    pub extension_map: BTreeMap<String, String>,
    pub show_structure: bool,
}

/// Files of one directory inside the "File Contents" section.
#[derive(Default)]
struct DirectoryGroup<'a> {
    sql: Vec<&'a Path>,
    other: Vec<&'a Path>,
}

pub struct DocumentAssembler;

impl DocumentAssembler {
    /// Renders the Markdown document for `request`.
    ///
    /// Output depends only on the request and the file contents; files are
    /// read in output order. Unreadable files are replaced by an inline error
    /// message instead of aborting.
    pub fn assemble(request: &ExportRequest) -> String {
        let prompt = request.prompt_text.trim();

        let mut selected: Vec<&Path> = request.checked_file_paths.iter().map(PathBuf::as_path).collect();
        selected.sort_by_key(|path| path.to_string_lossy().into_owned());
        selected.dedup();

        let (dependency_files, main_files): (Vec<&Path>, Vec<&Path>) =
            selected.iter().copied().partition(|path| is_dependency_file(path));

        let has_structure = request.show_structure && !selected.is_empty();
        let mut content = String::new();

        if !prompt.is_empty() {
            content.push_str("# 🎯 Objective\n\n");
            content.push_str(prompt);
            content.push_str("\n\n---\n\n");
        }

        if !has_structure && dependency_files.is_empty() && main_files.is_empty() {
            return content;
        }

        content.push_str(&format!(
            "## 📚 Project Context: `{}`\n\n",
            project_name(&request.project_root)
        ));
        content.push_str("This document provides the necessary files and structure for the task.\n\n");

        let mut section_counter = 1;

        if has_structure {
            let relative_paths: Vec<String> = selected
                .iter()
                .map(|path| relative_display(path, &request.project_root))
                .collect();
            content.push_str(&format!("### {section_counter}. Project Structure\n\n"));
            content.push_str(&format!(
                "```\n{}\n```\n\n",
                TreeGenerator::generate_tree(&relative_paths)
            ));
            section_counter += 1;
        }

        if !dependency_files.is_empty() {
            content.push_str(&format!("### {section_counter}. Dependencies\n\n"));
            for path in &dependency_files {
                content.push_str(&format!(
                    "#### `{}`\n*path: `{}`*\n\n",
                    file_name(path),
                    relative_display(path, &request.project_root)
                ));
                content.push_str("```\n");
                content.push_str(&FileHandler::read_for_export(path));
                content.push_str("\n```\n\n");
            }
            section_counter += 1;
        }

        if !main_files.is_empty() {
            content.push_str(&format!("### {section_counter}. File Contents\n\n"));
            for (directory, group) in group_by_directory(&main_files, &request.project_root) {
                let label = if directory.is_empty() {
                    ROOT_DIRECTORY_LABEL
                } else {
                    directory.as_str()
                };
                content.push_str(&format!("#### 📂 `{label}`\n\n"));

                if !group.sql.is_empty() {
                    Self::write_sql_block(&mut content, &group.sql, &request.project_root);
                }

                for path in &group.other {
                    let language = request
                        .extension_map
                        .get(&dotted_extension(path))
                        .map(String::as_str)
                        .unwrap_or("");
                    content.push_str(&format!(
                        "##### 📄 `{}`\n*path: `{}`*\n\n",
                        file_name(path),
                        relative_display(path, &request.project_root)
                    ));
                    content.push_str(&format!("```{language}\n"));
                    content.push_str(&FileHandler::read_for_export(path));
                    content.push_str("\n```\n\n");
                }
            }
        }

        tracing::info!(
            "Assembled document: {} dependency files, {} other files, {} bytes",
            dependency_files.len(),
            main_files.len(),
            content.len()
        );
        content
    }

    /// Merges all SQL files of one directory into a single `sql` fence.
    fn write_sql_block(content: &mut String, files: &[&Path], project_root: &Path) {
        content.push_str("##### 🗄️ SQL Files (Consolidated)\n\n");
        content.push_str("```sql\n");
        for (i, path) in files.iter().enumerate() {
            if i > 0 {
                content.push_str(SQL_DIVIDER);
            }
            content.push_str(&format!(
                "-- From: {} | path: {}\n",
                file_name(path),
                relative_display(path, project_root)
            ));
            match FileHandler::read_file_content(path) {
                Ok(sql) => content.push_str(sql.trim()),
                Err(e) => {
                    tracing::warn!("Failed to read SQL file {}: {}", path.display(), e);
                    content.push_str(&format!("/* Error reading file: {e} */"));
                }
            }
        }
        content.push_str("\n```\n\n");
    }

    /// Writes `text` to `destination` without ever leaving a partial file behind.
    pub fn write_to(destination: &Path, text: &str) -> Result<(), CoreError> {
        if destination.as_os_str().is_empty() {
            return Err(CoreError::ExportTarget(
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "no destination selected"),
                destination.to_path_buf(),
            ));
        }

        let export_error = |e: std::io::Error| CoreError::ExportTarget(e, destination.to_path_buf());
        let directory = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut temp_file = tempfile::NamedTempFile::new_in(directory).map_err(export_error)?;
        temp_file.write_all(text.as_bytes()).map_err(export_error)?;
        temp_file.flush().map_err(export_error)?;
        temp_file
            .persist(destination)
            .map_err(|e| export_error(e.error))?;

        tracing::info!("Document written to {}", destination.display());
        Ok(())
    }
}

pub fn is_dependency_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| DEPENDENCY_FILE_NAMES.contains(&name))
}

fn group_by_directory<'a>(
    files: &[&'a Path],
    project_root: &Path,
) -> BTreeMap<String, DirectoryGroup<'a>> {
    let mut groups: BTreeMap<String, DirectoryGroup<'a>> = BTreeMap::new();
    for &path in files {
        let relative = path.strip_prefix(project_root).unwrap_or(path);
        let directory = relative.parent().map(to_slash_path).unwrap_or_default();
        let group = groups.entry(directory).or_default();
        if dotted_extension(path) == ".sql" {
            group.sql.push(path);
        } else {
            group.other.push(path);
        }
    }
    for group in groups.values_mut() {
        group.sql.sort_by_key(|path| file_name(path));
        group.other.sort_by_key(|path| file_name(path));
    }
    groups
}

fn relative_display(path: &Path, project_root: &Path) -> String {
    to_slash_path(path.strip_prefix(project_root).unwrap_or(path))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn project_name(project_root: &Path) -> String {
    project_root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| project_root.display().to_string())
}
