use std::path::{Path, PathBuf};

pub const DEBUG_LOG_FILE: &str = "log.json";

/// Output tree: `{root}/{course}/{section}/{unit}/{index}_{title}.*`.
/// Segments are joined as given; callers pass sanitized titles.
#[derive(Debug, Clone)]
pub struct CoursePaths {
    root: PathBuf,
    course: String,
}

impl CoursePaths {
    pub fn new(root: impl Into<PathBuf>, course_title: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            course: course_title.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn course_dir(&self) -> PathBuf {
        self.root.join(&self.course)
    }

    pub fn unit_dir(&self, section: &str, unit: &str) -> PathBuf {
        self.course_dir().join(section).join(unit)
    }
}

pub fn save_name(index: usize, title: &str) -> String {
    format!("{}_{}", index, title.trim_end())
}
