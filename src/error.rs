use core::fmt;

/// Result alias for `gsdmm`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by corpus construction, fitting and evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Length mismatch between two sequences that must align.
    DimensionMismatch {
        /// Expected length.
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// A document's declared token total disagrees with its counts.
    InvalidDocument {
        /// Position of the document in the corpus (or 0 when standalone).
        index: usize,
        /// Declared total.
        declared: usize,
        /// Sum of the per-token counts.
        actual: usize,
    },

    /// A document lists the same token id more than once.
    DuplicateToken {
        /// Position of the document in the corpus (or 0 when standalone).
        index: usize,
        /// The repeated token id.
        token: usize,
    },

    /// A cluster index past the next free slot was requested.
    InvalidClusterIndex {
        /// Requested index.
        index: usize,
        /// Number of active clusters at the time.
        active: usize,
    },

    /// A document was removed from a cluster whose counts cannot contain it.
    NotInCluster {
        /// Cluster position.
        cluster: usize,
    },

    /// Opening another cluster would exceed the configured maximum.
    ClusterCapacity {
        /// Configured maximum number of clusters.
        max: usize,
    },

    /// A sampling weight vector could not be drawn from.
    DegenerateWeights {
        /// What was wrong with the vector.
        reason: String,
    },

    /// Malformed corpus input.
    Parse {
        /// 1-based line number.
        line: usize,
        /// Error message.
        message: String,
    },

    /// Underlying I/O failure.
    Io(String),

    /// Generic error with message.
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "length mismatch: expected {expected}, found {found}")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::InvalidDocument {
                index,
                declared,
                actual,
            } => write!(
                f,
                "document {index} declares {declared} tokens but its counts sum to {actual}"
            ),
            Error::DuplicateToken { index, token } => {
                write!(f, "document {index} lists token {token} more than once")
            }
            Error::InvalidClusterIndex { index, active } => {
                write!(
                    f,
                    "cluster index {index} skips past the next free slot ({active} active)"
                )
            }
            Error::NotInCluster { cluster } => {
                write!(f, "document is not a member of cluster {cluster}")
            }
            Error::ClusterCapacity { max } => {
                write!(f, "cannot open more than {max} clusters")
            }
            Error::DegenerateWeights { reason } => {
                write!(f, "cannot sample from weight vector: {reason}")
            }
            Error::Parse { line, message } => write!(f, "line {line}: {message}"),
            Error::Io(msg) => write!(f, "i/o error: {msg}"),
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}
