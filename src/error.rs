pub type CustomResult<T> = core::result::Result<T, CustomError>;

#[derive(Debug, PartialEq)]
pub enum CustomError {
    Config(String),
    UnsupportedTechnology(String),
    DbConnection,
    QueryExecution,
    DbTransaction,
}

impl std::error::Error for CustomError {}
impl core::fmt::Display for CustomError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::result::Result<(), core::fmt::Error> {
        write!(f, "{self:?}")
    }
}
