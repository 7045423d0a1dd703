use std::path::{Path, PathBuf};

/// Expands a leading `~` or `~/` to the current user's home directory.
/// The path is returned unchanged (but trimmed) when no home is available.
pub fn expand_home(path: &str) -> PathBuf {
    expand_with_home(path, dirs::home_dir().as_deref())
}

fn expand_with_home(path: &str, home: Option<&Path>) -> PathBuf {
    let path = path.trim();
    match (path, home) {
        ("~", Some(home)) => home.to_path_buf(),
        (p, Some(home)) if p.starts_with("~/") => home.join(&p[2..]),
        (p, _) => PathBuf::from(p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_tilde_prefix() {
        let home = Path::new("/home/me");
        assert_eq!(
            expand_with_home("~/.aws/credentials", Some(home)),
            PathBuf::from("/home/me/.aws/credentials")
        );
        assert_eq!(expand_with_home(" ~ ", Some(home)), PathBuf::from("/home/me"));
    }

    #[test]
    fn leaves_other_paths_alone() {
        let home = Path::new("/home/me");
        assert_eq!(expand_with_home("/etc/creds", Some(home)), PathBuf::from("/etc/creds"));
        assert_eq!(expand_with_home("~other/creds", Some(home)), PathBuf::from("~other/creds"));
        assert_eq!(expand_with_home("", Some(home)), PathBuf::new());
    }

    #[test]
    fn no_home_keeps_tilde() {
        assert_eq!(expand_with_home("~/x", None), PathBuf::from("~/x"));
    }
}
