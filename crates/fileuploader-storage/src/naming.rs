//! Destination file naming.
//!
//! Names are rendered from a [`TitlePolicy`], sanitized, and checked
//! against the upload directory and against names already handed out in
//! the current batch.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rand::Rng;

use fileuploader_core::config::upload::{NamePolicy, TitlePolicy};
use fileuploader_core::error::AppError;
use fileuploader_core::result::AppResult;

/// Characters used for random name segments and chunk tokens.
pub const RANDOM_CHARSET: &[u8] = b"_0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Upper bound on candidates tried before giving up on a name.
pub const MAX_NAME_ATTEMPTS: u32 = 10_000;

/// Generate a random string of `length` characters from [`RANDOM_CHARSET`].
pub fn random_string(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| RANDOM_CHARSET[rng.random_range(0..RANDOM_CHARSET.len())] as char)
        .collect()
}

/// Replace control characters and `< > : " / \ | ? *` with `_`, then
/// collapse runs of `_`.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if (c as u32) < 32 || "<>:\"/\\|?*".contains(c) {
            '_'
        } else {
            c
        };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Attributes of the uploaded file that names are rendered from.
#[derive(Debug, Clone, Copy)]
pub struct NameSource<'a> {
    /// Original name without extension.
    pub title: &'a str,
    /// Original extension without the dot.
    pub extension: &'a str,
    /// Size in bytes.
    pub size: u64,
}

/// A free destination name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedName {
    /// File name including extension.
    pub name: String,
    /// File name without extension.
    pub title: String,
}

struct Candidate {
    name: String,
    extension: String,
}

/// Produces destination names inside one upload directory.
#[derive(Debug, Clone)]
pub struct NamingEngine {
    upload_dir: PathBuf,
    replace: bool,
}

impl NamingEngine {
    /// Create an engine for `upload_dir`. With `replace`, existing files
    /// do not count as collisions.
    pub fn new(upload_dir: impl Into<PathBuf>, replace: bool) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            replace,
        }
    }

    /// Generate a name for `source` that is neither present on disk nor in
    /// `reserved`.
    ///
    /// Random policies draw a fresh random segment on each collision; other
    /// policies append ` (n)` to the name stem.
    pub fn generate(
        &self,
        policy: &TitlePolicy,
        source: &NameSource<'_>,
        reserved: &HashSet<String>,
    ) -> AppResult<GeneratedName> {
        let now = Utc::now();
        let first = render(policy, source, now);

        if self.replace {
            return Ok(finish(first));
        }

        let regenerates = match &policy.policy {
            NamePolicy::Auto => true,
            NamePolicy::Name => false,
            NamePolicy::Template(template) => template.contains("{random}"),
        };
        let stem = first
            .name
            .strip_suffix(first.extension.as_str())
            .unwrap_or(&first.name)
            .to_string();
        let extension = first.extension.clone();

        let mut candidate = first;
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            candidate.name = sanitize_filename(&candidate.name);
            if !self.is_taken(&candidate.name, reserved) {
                tracing::debug!(name = %candidate.name, attempt, "Generated file name");
                return Ok(finish(candidate));
            }

            candidate = if regenerates {
                render(policy, source, now)
            } else {
                Candidate {
                    name: format!("{stem} ({attempt}){extension}"),
                    extension: extension.clone(),
                }
            };
        }

        Err(AppError::conflict(format!(
            "No free name for '{stem}{extension}' after {MAX_NAME_ATTEMPTS} attempts"
        )))
    }

    fn is_taken(&self, name: &str, reserved: &HashSet<String>) -> bool {
        reserved.contains(name) || self.upload_dir.join(name).exists()
    }
}

fn finish(candidate: Candidate) -> GeneratedName {
    let name = sanitize_filename(&candidate.name);
    let title = if candidate.extension.is_empty() {
        name.clone()
    } else {
        name.strip_suffix(candidate.extension.as_str())
            .unwrap_or(&name)
            .to_string()
    };
    GeneratedName { name, title }
}

fn render(policy: &TitlePolicy, source: &NameSource<'_>, now: DateTime<Utc>) -> Candidate {
    let mut extension = if source.extension.is_empty() {
        String::new()
    } else {
        format!(".{}", source.extension)
    };

    let mut name = match &policy.policy {
        NamePolicy::Auto => random_string(policy.random_length),
        NamePolicy::Name => source.title.to_string(),
        NamePolicy::Template(template) => {
            if let Some(own) = template_extension(template) {
                if own != "{extension}" {
                    extension = format!(".{own}");
                }
            }
            substitute(template, source, policy.random_length, now)
        }
    };

    if !extension.is_empty() && !name.ends_with(&extension) {
        name.push_str(&extension);
    }
    Candidate { name, extension }
}

/// Trailing `.token` of a template when it looks like an extension.
fn template_extension(template: &str) -> Option<&str> {
    let (_, token) = template.rsplit_once('.')?;
    let looks_like_extension =
        !token.is_empty() && token.chars().all(|c| c.is_ascii_alphanumeric());
    (token == "{extension}" || looks_like_extension).then_some(token)
}

fn substitute(
    template: &str,
    source: &NameSource<'_>,
    random_length: usize,
    now: DateTime<Utc>,
) -> String {
    let mut out = template.to_string();
    if out.contains("{random}") {
        out = out.replace("{random}", &random_string(random_length));
    }
    out.replace("{file_name}", source.title)
        .replace("{file_size}", &source.size.to_string())
        .replace("{timestamp}", &now.timestamp().to_string())
        .replace("{date}", &now.format("%Y-%-m-%d_%H-%M-%S").to_string())
        .replace("{extension}", source.extension)
}
