mod download;

use std::path::PathBuf;

pub use download::download_model;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model not found: {0}")]
    NotFound(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ModelError>;

/// Whisper model variants in whisper.cpp GGML format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhisperModel {
    Tiny,
    TinyEn,
    Base,
    BaseEn,
    Small,
    SmallEn,
    Medium,
    MediumEn,
    LargeV3,
    LargeV3Turbo,
}

impl WhisperModel {
    pub const ALL: [WhisperModel; 10] = [
        Self::Tiny,
        Self::TinyEn,
        Self::Base,
        Self::BaseEn,
        Self::Small,
        Self::SmallEn,
        Self::Medium,
        Self::MediumEn,
        Self::LargeV3,
        Self::LargeV3Turbo,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Tiny => "whisper-tiny",
            Self::TinyEn => "whisper-tiny.en",
            Self::Base => "whisper-base",
            Self::BaseEn => "whisper-base.en",
            Self::Small => "whisper-small",
            Self::SmallEn => "whisper-small.en",
            Self::Medium => "whisper-medium",
            Self::MediumEn => "whisper-medium.en",
            Self::LargeV3 => "whisper-large-v3",
            Self::LargeV3Turbo => "whisper-large-v3-turbo",
        }
    }

    pub fn dir_name(&self) -> &'static str {
        self.name()
    }

    pub fn size_bytes(&self) -> u64 {
        match self {
            Self::Tiny | Self::TinyEn => 75_000_000,
            Self::Base | Self::BaseEn => 142_000_000,
            Self::Small | Self::SmallEn => 466_000_000,
            Self::Medium | Self::MediumEn => 1_530_000_000,
            Self::LargeV3 => 3_100_000_000,
            Self::LargeV3Turbo => 1_600_000_000,
        }
    }

    /// Resolve a user-supplied model identifier.
    ///
    /// Accepts canonical names (`whisper-base.en`), bare variants
    /// (`base.en`, `large`, `large-turbo`), and the `faster-whisper-*`
    /// names some other tooling uses for the same weights.
    pub fn resolve(identifier: &str) -> Result<Self> {
        let id = identifier.trim();
        let bare = id
            .strip_prefix("faster-whisper-")
            .or_else(|| id.strip_prefix("whisper-"))
            .unwrap_or(id);
        let model = match bare {
            "tiny" => Self::Tiny,
            "tiny.en" => Self::TinyEn,
            "base" => Self::Base,
            "base.en" => Self::BaseEn,
            "small" => Self::Small,
            "small.en" => Self::SmallEn,
            "medium" => Self::Medium,
            "medium.en" => Self::MediumEn,
            "large" | "large-v3" => Self::LargeV3,
            "large-turbo" | "large-v3-turbo" => Self::LargeV3Turbo,
            _ => return Err(ModelError::NotFound(identifier.to_string())),
        };
        Ok(model)
    }
}

impl std::fmt::Display for WhisperModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

pub fn models_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sotto")
        .join("models")
}

pub fn model_path(model: WhisperModel) -> PathBuf {
    models_dir().join(model.dir_name())
}

/// Path of the GGML weights file the engine loads.
pub fn model_file(model: WhisperModel) -> PathBuf {
    model_path(model).join("model.bin")
}

pub fn is_downloaded(model: WhisperModel) -> bool {
    model_file(model).exists()
}

/// Resolve + cache hit or download. Returns the path of the local
/// weights file.
pub async fn ensure_available<F>(model: WhisperModel, on_progress: F) -> Result<PathBuf>
where
    F: Fn(u64, u64),
{
    if is_downloaded(model) {
        return Ok(model_file(model));
    }
    download_model(model, on_progress).await
}
