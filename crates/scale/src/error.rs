#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScaleError {
    #[error("unexpected end of input at offset {0}")]
    UnexpectedEof(usize),
    #[error("{0} undecoded bytes left after value")]
    LeftoverBytes(usize),
    #[error("type `{0}` has no decoder")]
    UnsupportedType(String),
    #[error("runtime metadata version {0} is not supported")]
    UnsupportedMetadata(u8),
    #[error("{0}")]
    Invalid(String),
}


impl ScaleError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ScaleError::Invalid(msg.into())
    }
}
