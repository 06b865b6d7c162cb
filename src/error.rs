use thiserror::Error;

/// Errors that prevent an ad view controller from being built.
///
/// Everything recoverable (skip-offset parsing, platform workarounds) is
/// logged and falls back instead of surfacing here.
#[derive(Error, Debug)]
pub enum AdError {
    #[error("ad configuration is missing")]
    MissingConfig,

    #[error("failed to decode ad configuration: {0}")]
    ConfigDecode(#[from] serde_json::Error),

    #[error("ad configuration does not have a disk media path")]
    MissingMediaFile,
}

pub type Result<T> = std::result::Result<T, AdError>;

/// Standard VAST error codes, substituted into `[ERRORCODE]` tracking macros
/// by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VastErrorCode {
    XmlParsing,
    WrapperTimeout,
    NoAdsResponse,
    GeneralLinearAdError,
    Undefined,
}

impl VastErrorCode {
    pub fn code(&self) -> u32 {
        match self {
            VastErrorCode::XmlParsing => 100,
            VastErrorCode::WrapperTimeout => 301,
            VastErrorCode::NoAdsResponse => 303,
            VastErrorCode::GeneralLinearAdError => 400,
            VastErrorCode::Undefined => 900,
        }
    }
}
