use std::path::{Path, PathBuf};

use crate::app::simpleperf::platform::Platform;

/// e.g. `$HOME/plugins/android/resources/simpleperf/darwin-x86_64/simpleperf`
pub fn release_binary_path(home: &Path, platform: &Platform) -> PathBuf {
    home.join("plugins")
        .join("android")
        .join("resources")
        .join("simpleperf")
        .join(platform.subdirectory())
        .join(platform.binary_name())
}

/// Source checkouts keep the tool under `$HOME/../../prebuilts`, e.g.
/// `prebuilts/tools/windows/simpleperf/simpleperf.exe`.
pub fn prebuilts_binary_path(home: &Path, platform: &Platform) -> PathBuf {
    home.join("..")
        .join("..")
        .join("prebuilts")
        .join("tools")
        .join(platform.subdirectory())
        .join("simpleperf")
        .join(platform.binary_name())
}

pub fn resolve_binary_path(home: &Path, platform: &Platform) -> PathBuf {
    let release = release_binary_path(home, platform);
    if release.exists() {
        return release;
    }
    prebuilts_binary_path(home, platform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::simpleperf::platform::OsFamily;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn prefers_release_path_when_present() {
        let tmp = TempDir::new().expect("tmp");
        let platform = Platform::new(OsFamily::Linux, true);
        let release = release_binary_path(tmp.path(), &platform);
        fs::create_dir_all(release.parent().expect("parent")).expect("mkdir");
        fs::write(&release, b"").expect("write");

        assert_eq!(resolve_binary_path(tmp.path(), &platform), release);
    }

    #[test]
    fn falls_back_to_prebuilts_path() {
        let tmp = TempDir::new().expect("tmp");
        let platform = Platform::new(OsFamily::Windows, true);
        let resolved = resolve_binary_path(tmp.path(), &platform);

        assert_eq!(resolved, prebuilts_binary_path(tmp.path(), &platform));
        assert!(resolved.ends_with("prebuilts/tools/windows-x86_64/simpleperf/simpleperf.exe"));
    }

    #[test]
    fn release_path_layout() {
        let platform = Platform::new(OsFamily::MacOs, true);
        let path = release_binary_path(Path::new("/opt/studio"), &platform);
        assert_eq!(
            path,
            PathBuf::from("/opt/studio/plugins/android/resources/simpleperf/darwin-x86_64/simpleperf")
        );
    }
}
