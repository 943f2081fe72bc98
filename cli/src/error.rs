use std::fmt::Formatter;

#[derive(Debug)]
pub enum Error {
    /// parameters are file path, additional error message
    FileOperation { file_name: String, message: String },
    /// A settings or credentials file that isn't the json we expect
    InvalidFile { file_name: String, message: String },
    MissingCredentials,
    MissingOutputDirectory,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            Self::FileOperation { file_name, message } => format!("{message} : {file_name}"),
            Self::InvalidFile { file_name, message } => {
                format!("{file_name} could not be read. {message}")
            }
            Self::MissingCredentials => {
                "token or base missing (or could not find cache file)".to_string()
            }
            Self::MissingOutputDirectory => "could not determine output directory".to_string(),
        };
        write!(f, "{msg}")
    }
}

impl std::error::Error for Error {}

impl Error {
    pub fn file_op(path: &std::path::Path, e: std::io::Error) -> Self {
        Self::FileOperation {
            file_name: path.to_string_lossy().to_string(),
            message: format!("{} | {}", e, e.kind()),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
