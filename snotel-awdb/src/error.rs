/// Error types for the AWDB library
use thiserror::Error;

/// Main error type for AWDB operations
#[derive(Error, Debug)]
pub enum AwdbError {
    /// Transport-level failure (connect, timeout, body read)
    #[error("Request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// The HTTP client itself could not be configured
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// The service answered with a non-success status
    #[error("Request to {url} returned status {status}")]
    HttpStatus { url: String, status: u16 },

    /// Failed to parse the station catalog
    #[error("Failed to parse station catalog: {0}")]
    Parse(String),

    /// The report could not be read as a header-plus-rows table
    #[error("Malformed report: {0}")]
    MalformedReport(String),

    /// Failed to read or write CSV data
    #[error("Failed to process CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Filesystem failure while persisting a table
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configured endpoint is not a valid base URL
    #[error("Invalid endpoint URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A single station failed while fetching the whole set
    #[error("Fetching station {triplet} failed: {source}")]
    StationFetch {
        triplet: String,
        #[source]
        source: Box<AwdbError>,
    },
}

impl AwdbError {
    /// True for failures talking to the service, as opposed to bad data.
    pub fn is_network(&self) -> bool {
        match self {
            AwdbError::Network { .. } | AwdbError::HttpStatus { .. } => true,
            AwdbError::StationFetch { source, .. } => source.is_network(),
            _ => false,
        }
    }
}

/// Type alias for Results using AwdbError
pub type Result<T> = std::result::Result<T, AwdbError>;
