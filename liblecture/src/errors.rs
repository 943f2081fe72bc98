use std::fmt::Formatter;

#[derive(Debug, PartialEq)]
pub enum LectureError {
    /// Parameter names the missing setting (token, base url, output directory...)
    MissingPrecondition(String),
    InvalidBaseUrl(String),
    /// The token can't be carried in a cookie header
    InvalidToken,
    NetworkError(String),
    ErrorStatusCode {
        status_code: String,
        url: String,
    },
    /// The response body of an api call wasn't json
    InvalidJson {
        endpoint: String,
        message: String,
    },
    /// The response body was json, but not in the shape we expected
    UnexpectedPayload {
        endpoint: String,
        message: String,
    },
    /// parameters are file path, additional error message
    FileOperationError {
        file_name: String,
        message: String,
    },
    /// Parameter is path to the cache file
    CacheCorrupted(String),
    ExtractorFailed {
        program: String,
        message: String,
    },
    ChannelClosed,
}

impl LectureError {
    pub(crate) fn file_op(path: &std::path::Path, e: std::io::Error) -> Self {
        LectureError::FileOperationError {
            file_name: path.to_string_lossy().to_string(),
            message: format!("{} | {}", e, e.kind()),
        }
    }
}

impl std::fmt::Display for LectureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            LectureError::MissingPrecondition(what) => {
                format!("{what} is missing or could not be determined")
            }
            LectureError::InvalidBaseUrl(url) => format!("invalid base url received : {url}"),
            LectureError::InvalidToken => {
                "the token contains characters that can't be sent in a cookie".to_string()
            }
            LectureError::NetworkError(err) => format!("error connecting to internet. {err}"),
            LectureError::ErrorStatusCode { status_code, url } => {
                format!("server returned an error response. {url} => {status_code}")
            }
            LectureError::InvalidJson { endpoint, message } => {
                format!("response from {endpoint} is not valid json. {message}")
            }
            LectureError::UnexpectedPayload { endpoint, message } => {
                format!("unexpected response shape from {endpoint}. {message}")
            }
            LectureError::FileOperationError { file_name, message } => {
                format!("{message} : {file_name}")
            }
            LectureError::CacheCorrupted(file_name) => {
                format!("session cache {file_name} is corrupted")
            }
            LectureError::ExtractorFailed { program, message } => {
                format!("stream extractor {program} failed. {message}")
            }
            LectureError::ChannelClosed => "Channel closed before run completion".to_string(),
        };
        write!(f, "{str}")
    }
}

impl std::error::Error for LectureError {}

pub type Result<T> = std::result::Result<T, LectureError>;
