use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("a uniqueness constraint rejected the write on `{collection}`: {detail}")]
    DuplicateKey {
        collection: &'static str,
        detail: String,
    },
    #[error("failed to save document `{id}` in `{collection}`")]
    Save {
        collection: &'static str,
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load document `{id}` from `{collection}`")]
    Load {
        collection: &'static str,
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to query `{collection}`")]
    Query {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete from `{collection}`")]
    Delete {
        collection: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("transaction failed: {context}")]
    Transaction {
        context: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("order write targeted `{id}`, which is missing or belongs to another parent")]
    OrderWriteMismatch { id: Uuid },
    #[error("environment variable `{var}` is not set")]
    MissingEnvVar { var: &'static str },
}

/// Whether a driver error is an E11000 duplicate key rejection.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        *err.kind,
        ErrorKind::Write(WriteFailure::WriteError(ref write)) if write.code == 11000
    )
}
