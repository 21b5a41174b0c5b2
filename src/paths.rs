use std::path::PathBuf;

const APP_IDENTIFIER: &str = "com.phyem.app";

/// Root directory for PhyEM data files.
/// `PHYEM_DATA_DIR` wins over the platform app-data location.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os("PHYEM_DATA_DIR") {
        return PathBuf::from(dir);
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push("Library/Application Support");
            dir.push(APP_IDENTIFIER);
            return dir;
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            let mut dir = PathBuf::from(appdata);
            dir.push(APP_IDENTIFIER);
            return dir;
        }
    }

    #[cfg(target_os = "linux")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let mut dir = PathBuf::from(home);
            dir.push(".local/share");
            dir.push(APP_IDENTIFIER);
            return dir;
        }
    }

    // Fallback
    PathBuf::from("data")
}

pub fn config_path() -> PathBuf {
    data_dir().join("phyem.toml")
}

pub fn reports_path() -> PathBuf {
    data_dir().join("data").join("student_reports.json")
}

pub fn forum_path() -> PathBuf {
    data_dir().join("data").join("global_forum.json")
}
