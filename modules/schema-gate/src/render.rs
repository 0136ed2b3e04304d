//! Renders `*.sql.tmpl` files into plain migration files.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gtmpl::{Context, Template, Value};
use thiserror::Error;
use tracing::debug;

use crate::env_snapshot::EnvSnapshot;

/// File-name suffix marking an SQL migration template.
pub const TEMPLATE_SUFFIX: &str = ".sql.tmpl";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read templates from {dir}: {source}")]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read template {template:?}: {source}")]
    Read {
        template: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse template {template:?}: {message}")]
    Parse { template: String, message: String },

    #[error("failed to execute template {template:?}: {message}")]
    Execute { template: String, message: String },

    #[error("failed to create file {path} to render template {template:?}: {source}")]
    Create {
        template: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TemplateError {
    /// Name of the offending template, when the failure is tied to one.
    pub fn template(&self) -> Option<&str> {
        match self {
            TemplateError::ReadDir { .. } => None,
            TemplateError::Read { template, .. }
            | TemplateError::Parse { template, .. }
            | TemplateError::Execute { template, .. }
            | TemplateError::Create { template, .. } => Some(template),
        }
    }
}

/// Render every template in `templates_dir` into `migrations_dir`.
///
/// All templates are parsed into one group before anything is written, so a
/// file may call `{{ template "name" . }}` on a block defined in another.
/// A directory with no matching templates (or no directory at all) renders
/// nothing and succeeds. Returns the paths written, in template-name order.
pub fn render(
    templates_dir: &Path,
    migrations_dir: &Path,
    env: &EnvSnapshot,
) -> Result<Vec<PathBuf>, TemplateError> {
    let files = discover(templates_dir)?;
    if files.is_empty() {
        debug!(dir = %templates_dir.display(), "No templates to render");
        return Ok(Vec::new());
    }

    let mut group = Template::default();
    for (name, path) in &files {
        let source = fs::read_to_string(path).map_err(|source| TemplateError::Read {
            template: name.clone(),
            source,
        })?;
        group
            .add_template(name.as_str(), source)
            .map_err(|e| TemplateError::Parse {
                template: name.clone(),
                message: e.to_string(),
            })?;
    }

    let context = Context::from(env_value(env));
    let mut written = Vec::with_capacity(files.len());
    for (name, _) in &files {
        group.name = name.clone();
        let output = group.render(&context).map_err(|e| TemplateError::Execute {
            template: name.clone(),
            message: e.to_string(),
        })?;
        if output.trim().is_empty() {
            debug!(template = %name, "Template renders no SQL, nothing to write");
            continue;
        }

        let path = migrations_dir.join(output_name(name));
        fs::write(&path, output).map_err(|source| TemplateError::Create {
            template: name.clone(),
            path: path.clone(),
            source,
        })?;
        debug!(template = %name, output = %path.display(), "Rendered template");
        written.push(path);
    }

    Ok(written)
}

/// Output file name for a template: the name minus its trailing `.tmpl`.
pub fn output_name(template: &str) -> &str {
    template.strip_suffix(".tmpl").unwrap_or(template)
}

/// Template data: a map from variable name to value, so `{{ .KEY }}` resolves.
fn env_value(env: &EnvSnapshot) -> Value {
    let vars: HashMap<String, Value> = env
        .iter()
        .map(|(key, value)| (key.to_string(), Value::from(value.to_string())))
        .collect();
    Value::Map(vars)
}

/// Non-recursive listing of `*.sql.tmpl` regular files, sorted by name.
fn discover(dir: &Path) -> Result<Vec<(String, PathBuf)>, TemplateError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(TemplateError::ReadDir {
                dir: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| TemplateError::ReadDir {
            dir: dir.to_path_buf(),
            source,
        })?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.ends_with(TEMPLATE_SUFFIX) {
            continue;
        }
        // Follows symlinks, so a link to a template file still counts.
        let path = entry.path();
        if fs::metadata(&path).map(|m| m.is_file()).unwrap_or(false) {
            files.push((name, path));
        }
    }

    files.sort();
    Ok(files)
}
