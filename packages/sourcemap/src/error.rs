use thiserror::Error;

#[derive(Error, Debug)]
pub enum LineMapError {
    #[error("failed to write source map: {0}")]
    SourceMap(#[from] sourcemap::Error),

    #[error("source map output was not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
