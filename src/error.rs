use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlantDocError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Frame selection error: {0}")]
    Frame(#[from] FrameError),

    #[error("Vision model error: {0}")]
    Model(#[from] ModelError),

    #[error("Invalid input: {0}")]
    Input(#[from] InputError),

    #[error("System error: {message}")]
    System { message: String },
}

/// Failures while turning a video upload into a still frame
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Unsupported or corrupt video: {details}")]
    UnopenableVideo { details: String },

    #[error("No readable frame in video")]
    NoReadableFrame,

    #[error("No usable frame could be extracted from video")]
    NoUsableFrame,

    #[error("Failed to stage video for decoding: {source}")]
    Scratch {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode selected frame: {details}")]
    Encode { details: String },
}

/// Failures talking to the external vision model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model API key is not configured (set GEMINI_API_KEY or model.api_key)")]
    NotConfigured,

    #[error("Invalid model API key: {details}")]
    InvalidCredential { details: String },

    #[error("Model API rate limit reached, wait a moment and try again: {details}")]
    RateLimited { details: String },

    #[error("Image was blocked by the model's safety filters: {details}")]
    ContentBlocked { details: String },

    #[error("Model API error: {message}")]
    Upstream { message: String },
}

/// Uploads rejected before any decoding or model call
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Upload is empty")]
    Empty,

    #[error("Upload of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("Unsupported media type: {mime_type}")]
    UnsupportedMedia { mime_type: String },
}

impl PlantDocError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    /// What the caller should do about this failure
    pub fn remedy(&self) -> &'static str {
        match self {
            Self::Model(ModelError::NotConfigured) => {
                "Configure an API key from https://aistudio.google.com/app/apikey"
            }
            Self::Model(ModelError::InvalidCredential { .. }) => {
                "Check the API key at https://aistudio.google.com/app/apikey"
            }
            Self::Model(ModelError::RateLimited { .. }) => "Wait a moment before trying again",
            Self::Model(ModelError::ContentBlocked { .. }) => {
                "Try a clearer photo of the plant"
            }
            Self::Frame(FrameError::UnopenableVideo { .. })
            | Self::Frame(FrameError::NoReadableFrame)
            | Self::Frame(FrameError::NoUsableFrame) => {
                "Upload a different video or a photo instead"
            }
            Self::Input(_) => "Upload a supported photo or video under the size limit",
            Self::Config(_) => "Fix the configuration and try again",
            _ => "Try again",
        }
    }
}

impl FrameError {
    pub fn unopenable<S: Into<String>>(details: S) -> Self {
        Self::UnopenableVideo {
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlantDocError>;
