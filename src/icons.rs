//! Window icon lookup.
//!
//! Icons are resolved from the window class through the desktop entries
//! installed under the XDG data directories: the first
//! `applications/**/<class>.desktop` (case-insensitive) provides its `Icon=`
//! value, either a theme icon name or an absolute path.

use log::{debug, trace};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Maps a window class to an icon name or path.
pub trait IconResolver {
    fn icon_for_class(&self, class: &str) -> Option<String>;
}

/// Resolver backed by `.desktop` files, caching every lookup.
#[derive(Debug, Default)]
pub struct DesktopEntryIcons {
    dirs: Vec<PathBuf>,
    cache: RefCell<HashMap<String, Option<String>>>,
}

impl DesktopEntryIcons {
    /// Search the `applications` directories below the given data roots.
    pub fn new(data_dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs: data_dirs.into_iter().map(|d| d.join("applications")).collect(),
            cache: RefCell::default(),
        }
    }

    /// `$XDG_DATA_HOME` (or `~/.local/share`) followed by `$XDG_DATA_DIRS`
    /// (or `/usr/local/share:/usr/share`).
    pub fn from_env() -> Self {
        let mut roots = Vec::new();
        match std::env::var_os("XDG_DATA_HOME") {
            Some(home) => roots.push(PathBuf::from(home)),
            None => {
                if let Some(home) = std::env::var_os("HOME") {
                    roots.push(PathBuf::from(home).join(".local/share"));
                }
            }
        }
        let system = std::env::var("XDG_DATA_DIRS")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "/usr/local/share:/usr/share".to_string());
        roots.extend(std::env::split_paths(&system));
        Self::new(roots)
    }

    fn lookup(&self, class: &str) -> Option<String> {
        let wanted = format!("{}.desktop", class.to_lowercase());
        for dir in &self.dirs {
            if let Some(file) = find_desktop_file(dir, &wanted) {
                trace!("desktop entry for {class}: {}", file.display());
                if let Some(icon) = read_icon_key(&file) {
                    return Some(icon);
                }
            }
        }
        debug!("no icon found for window class {class:?}");
        None
    }
}

impl IconResolver for DesktopEntryIcons {
    fn icon_for_class(&self, class: &str) -> Option<String> {
        if class.is_empty() {
            return None;
        }
        if let Some(hit) = self.cache.borrow().get(class) {
            return hit.clone();
        }
        let icon = self.lookup(class);
        self.cache.borrow_mut().insert(class.to_string(), icon.clone());
        icon
    }
}

/// Depth-first search for a file whose lowercased name ends with `wanted`.
fn find_desktop_file(dir: &Path, wanted: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_lowercase();
        if name.ends_with(wanted) {
            return Some(path);
        }
    }
    subdirs.iter().find_map(|d| find_desktop_file(d, wanted))
}

/// `Icon=` from the `[Desktop Entry]` group.
fn read_icon_key(file: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(file).ok()?;
    let mut in_entry = false;
    for line in contents.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            in_entry = line == "[Desktop Entry]";
            continue;
        }
        if !in_entry {
            continue;
        }
        if let Some(value) = line.strip_prefix("Icon=") {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_entry(root: &Path, rel: &str, body: &str) {
        let path = root.join("applications").join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn resolves_icon_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        write_entry(
            dir.path(),
            "org.mozilla.Firefox.desktop",
            "[Desktop Entry]\nName=Firefox\nIcon=firefox\n",
        );
        let icons = DesktopEntryIcons::new(vec![dir.path().to_path_buf()]);
        assert_eq!(icons.icon_for_class("firefox").as_deref(), Some("firefox"));
        assert_eq!(icons.icon_for_class("Firefox").as_deref(), Some("firefox"));
    }

    #[test]
    fn searches_subdirectories_and_ignores_actions() {
        let dir = tempfile::tempdir().unwrap();
        write_entry(
            dir.path(),
            "kde/kitty.desktop",
            "[Desktop Action new]\nIcon=wrong\n[Desktop Entry]\nIcon=/opt/kitty.png\n",
        );
        let icons = DesktopEntryIcons::new(vec![dir.path().to_path_buf()]);
        assert_eq!(icons.icon_for_class("kitty").as_deref(), Some("/opt/kitty.png"));
    }

    #[test]
    fn missing_entry_is_cached_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let icons = DesktopEntryIcons::new(vec![dir.path().to_path_buf()]);
        assert_eq!(icons.icon_for_class("nothing"), None);
        assert!(icons.cache.borrow().contains_key("nothing"));
        assert_eq!(icons.icon_for_class(""), None);
    }
}
