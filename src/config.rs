use std::path::PathBuf;

pub const CMMLU_URL: &str =
    "https://huggingface.co/datasets/haonan-li/cmmlu/resolve/main/cmmlu_v1_0_1.zip";

pub const DEFAULT_DATA_ROOT: &str = "data/teacher_data";
pub const DEFAULT_ARCHIVE_NAME: &str = "cmmlu_v1_0_1.zip";
pub const DEFAULT_EXTRACT_DIR: &str = "cmmlu_extracted";
pub const DEFAULT_MERGED_DIR: &str = "cmmlu_all_subjects";
pub const DEFAULT_SUBJECTS_DIR: &str = "subjects";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub url: String,
    pub data_root: PathBuf,
    pub archive_name: String,
    pub extract_dir: String,
    pub merged_dir: String,
    pub subjects_dir: String,
    // 1 loads sequentially
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            url: CMMLU_URL.to_string(),
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            extract_dir: DEFAULT_EXTRACT_DIR.to_string(),
            merged_dir: DEFAULT_MERGED_DIR.to_string(),
            subjects_dir: DEFAULT_SUBJECTS_DIR.to_string(),
            concurrency: 1,
        }
    }
}

impl PipelineConfig {
    pub fn with_data_root(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            ..Self::default()
        }
    }

    pub fn archive_path(&self) -> PathBuf {
        self.data_root.join(&self.archive_name)
    }

    pub fn extract_path(&self) -> PathBuf {
        self.data_root.join(&self.extract_dir)
    }

    pub fn merged_path(&self) -> PathBuf {
        self.data_root.join(&self.merged_dir)
    }

    pub fn subjects_path(&self) -> PathBuf {
        self.data_root.join(&self.subjects_dir)
    }
}
