use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// The XML parsed but is not a sheet description.
    InvalidMarkup(String),
    Xml(roxmltree::Error),
    /// Image bytes that could not be decoded.
    Image(image::ImageError),
    Pdf(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidMarkup(reason) => write!(f, "not a valid sheet description: {reason}"),
            Error::Xml(e) => write!(f, "sheet XML error: {e}"),
            Error::Image(e) => write!(f, "unreadable image: {e}"),
            Error::Pdf(e) => write!(f, "PDF assembly failed: {e}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Xml(e) => Some(e),
            Error::Image(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::InvalidMarkup(_) | Error::Pdf(_) => None,
        }
    }
}

impl From<roxmltree::Error> for Error {
    fn from(e: roxmltree::Error) -> Self {
        Error::Xml(e)
    }
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
