use std::fmt::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Local};

/// Default folder layout: `<root>/<YYYY>/<MM>`.
pub const DEFAULT_FOLDER_STRUCTURE: &str = "%Y/%m";

/// Directory an item captured at `created_date` belongs in.
///
/// `folder_structure` is a date pattern such as `"%Y/%m"`. The special value
/// `"none"` (case-insensitive) puts everything directly under `directory`.
pub fn target_dir(
    directory: &Path,
    folder_structure: &str,
    created_date: &DateTime<Local>,
) -> PathBuf {
    if folder_structure.eq_ignore_ascii_case("none") {
        return directory.to_path_buf();
    }

    let date_path = expand_date_format(folder_structure, created_date);

    // "2023/03" becomes two path components so this works on every platform.
    let mut path = directory.to_path_buf();
    for component in date_path.split('/') {
        if !component.is_empty() {
            path.push(component);
        }
    }
    path
}

/// Expand `%Y`, `%m` and `%d` in a single pass. Unknown tokens are kept as-is.
fn expand_date_format(format_str: &str, date: &DateTime<Local>) -> String {
    let mut result = String::with_capacity(format_str.len() + 4);
    let mut chars = format_str.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('Y') => {
                chars.next();
                let _ = write!(result, "{:04}", date.year());
            }
            Some('m') => {
                chars.next();
                let _ = write!(result, "{:02}", date.month());
            }
            Some('d') => {
                chars.next();
                let _ = write!(result, "{:02}", date.day());
            }
            _ => result.push(c),
        }
    }

    result
}

/// Check that a folder pattern only uses supported tokens.
pub fn validate_folder_structure(folder_structure: &str) -> Result<(), String> {
    if folder_structure.eq_ignore_ascii_case("none") {
        return Ok(());
    }
    let mut chars = folder_structure.chars();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.next() {
                Some('Y' | 'm' | 'd') => {}
                Some(other) => return Err(format!("unsupported token %{}", other)),
                None => return Err("dangling %".to_string()),
            }
        }
    }
    if folder_structure.split('/').any(|c| c == "..") {
        return Err("must not contain '..'".to_string());
    }
    Ok(())
}

/// Remove characters that are invalid on common filesystems:
/// `/`, `\`, `:`, `*`, `?`, `"`, `<`, `>`, `|`.
pub fn clean_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    if cleaned.is_empty() {
        return "_".to_string();
    }
    // "." and ".." would resolve to a directory.
    if cleaned.chars().all(|c| c == '.') {
        return cleaned.replace('.', "_");
    }
    cleaned
}

/// Next name in a collision chain.
///
/// `img.jpg` → `img (1).jpg`, `img (1).jpg` → `img (2).jpg`. A stem that
/// ends in a parenthesized integer has that integer incremented; anything
/// else gets ` (1)` appended before the extension.
pub fn alternate_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());

    let next_stem = match split_counter(&stem) {
        Some((prefix, n)) => format!("{}({})", prefix, n + 1),
        None => format!("{} (1)", stem),
    };

    let name = match ext {
        Some(ext) => format!("{}.{}", next_stem, ext),
        None => next_stem,
    };
    path.with_file_name(name)
}

/// Split `"img (3)"` into `("img ", 3)`. Returns `None` when the stem does not
/// end with a parenthesized integer or the counter cannot be incremented.
fn split_counter(stem: &str) -> Option<(&str, u64)> {
    let inner = stem.strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let digits = &inner[open + 1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u64 = digits.parse().ok()?;
    n.checked_add(1)?;
    Some((&stem[..open], n))
}
