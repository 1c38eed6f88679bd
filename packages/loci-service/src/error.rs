pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Qdrant error: {message}")]
	Qdrant { message: String },
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<loci_storage::Error> for Error {
	fn from(err: loci_storage::Error) -> Self {
		match err {
			loci_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			loci_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			loci_storage::Error::NotFound(message) => Self::Storage { message },
			loci_storage::Error::Json(inner) => Self::Storage { message: inner.to_string() },
			loci_storage::Error::Qdrant(inner) => Self::Qdrant { message: inner.to_string() },
		}
	}
}
