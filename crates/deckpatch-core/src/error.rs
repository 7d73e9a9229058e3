use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("Invalid OOXML package: {message}")]
    InvalidPackage { message: String },

    #[error("Missing part '{part_path}' in package")]
    MissingPart { part_path: String },

    #[error("XML parsing error at {location}: {message}")]
    XmlParse { message: String, location: String },

    #[error("XML serialization error: {0}")]
    XmlWrite(String),

    #[error("Invalid relationship: {message}")]
    InvalidRelationship { message: String },

    #[error("Invalid edit payload: {message}")]
    InvalidEdit { message: String },

    #[error("Media '{src}' could not be read: {message}")]
    Media { src: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeckError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats_correctly() {
        let err = DeckError::InvalidPackage {
            message: "not a zip".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid OOXML package: not a zip");
    }

    #[test]
    fn error_missing_part_formats_correctly() {
        let err = DeckError::MissingPart {
            part_path: "ppt/slides/slide3.xml".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Missing part 'ppt/slides/slide3.xml' in package"
        );
    }
}
