use std::fs;
use std::path::Path;

const LOG_INDICATORS: &[&str] = &[
    "node-gyp",
    "binding.gyp",
    "gyp info",
    "node-pre-gyp",
    "prebuild-install",
    "make:",
    "gcc",
    "g++",
    "clang",
    "compiling",
    "building native extensions",
    "building wheel",
];
const NATIVE_FILE_NAMES: &[&str] = &[
    "binding.gyp",
    "wscript",
    "Makefile",
    "CMakeLists.txt",
    "configure",
    "configure.ac",
    "configure.in",
];
const NATIVE_EXTENSIONS: &[&str] = &[".so", ".node", ".dll", ".dylib", ".bundle"];
const MAX_SCAN_DEPTH: usize = 12;

/// Spots packages that compile native code during installation.
pub struct NativeBuildDetector;

impl NativeBuildDetector {
    /// Whether an install log shows a native toolchain at work.
    pub fn detect_in_log(log: &str) -> bool {
        let log = log.to_lowercase();
        LOG_INDICATORS.iter().any(|indicator| log.contains(indicator))
    }

    pub fn is_native_artifact(file_name: &str) -> bool {
        NATIVE_FILE_NAMES.contains(&file_name)
            || file_name.starts_with("configure")
            || NATIVE_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext))
    }

    /// Native build files and compiled extensions under `dir`, as paths
    /// relative to it, sorted.
    pub fn scan_directory(dir: &Path) -> Vec<String> {
        let mut found = Vec::new();
        Self::scan(dir, dir, 0, &mut found);
        found.sort();
        found
    }

    fn scan(root: &Path, dir: &Path, depth: usize, found: &mut Vec<String>) {
        if depth > MAX_SCAN_DEPTH {
            return;
        }
        // unreadable directories are skipped
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                Self::scan(root, &path, depth + 1, found);
            } else if file_type.is_file() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if Self::is_native_artifact(&name) {
                    let relative = path.strip_prefix(root).unwrap_or(&path);
                    found.push(relative.to_string_lossy().into_owned());
                }
            }
        }
    }
}
