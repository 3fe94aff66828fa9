use std::path::PathBuf;

use dirs_next::home_dir;

/// Expands a leading `~` to the home directory; other paths are only trimmed.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    if trimmed == "~" {
        return home();
    }
    // Windows-style separators are accepted too
    match trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        Some(rest) => home().join(rest),
        None => PathBuf::from(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_home_prefix() {
        temp_env::with_var("HOME", Some("/home/planner"), || {
            assert_eq!(expand_tilde("~"), PathBuf::from("/home/planner"));
            assert_eq!(
                expand_tilde(" ~/forms/settings.json "),
                PathBuf::from("/home/planner/forms/settings.json")
            );
        });
    }

    #[test]
    fn leaves_other_paths_alone() {
        assert_eq!(expand_tilde("/etc/dynaform.json"), PathBuf::from("/etc/dynaform.json"));
        assert_eq!(expand_tilde("relative/~/path"), PathBuf::from("relative/~/path"));
    }
}
