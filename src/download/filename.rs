//! Filename derivation from URLs and safe path resolution for saved artifacts.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use url::Url;

/// Name used when a URL has no usable final segment.
pub const FALLBACK_FILENAME: &str = "download";

/// Derives the artifact filename from the URL's final path segment.
///
/// The segment is percent-decoded; query and fragment never contribute. If the
/// segment does not decode to valid UTF-8 the raw segment is kept. An empty
/// final segment yields [`FALLBACK_FILENAME`].
#[must_use]
pub fn filename_from_url(url: &Url) -> String {
    let Some(last) = url.path_segments().and_then(|mut s| s.next_back()) else {
        return FALLBACK_FILENAME.to_string();
    };
    if last.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }
    urlencoding::decode(last).map_or_else(|_| last.to_string(), Cow::into_owned)
}

/// Sanitizes a filename for the local filesystem.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim_matches('_').is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized.replace('.', "_")
    }
}

/// Resolves a path in `dir` that does not exist yet.
///
/// `tool.zip` becomes `tool_1.zip`, `tool_2.zip`, ... when taken.
#[must_use]
pub fn resolve_unique_path(dir: &Path, filename: &str) -> PathBuf {
    let filename = sanitize_filename(filename);
    let base_path = dir.join(&filename);
    if !base_path.exists() {
        return base_path;
    }

    let (stem, ext) = split_extension(&filename);
    let mut suffix: u64 = 1;
    loop {
        let candidate = dir.join(format!("{stem}_{suffix}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        suffix += 1;
    }
}

/// Splits `name` before its last extension, keeping compound `.tar.*` together.
fn split_extension(name: &str) -> (&str, &str) {
    if let Some(pos) = name.find(".tar.")
        && pos > 0
    {
        return (&name[..pos], &name[pos..]);
    }
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], &name[pos..]),
        _ => (name, ""),
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
