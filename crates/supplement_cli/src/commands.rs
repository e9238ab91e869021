//! One subcommand, one service call.
//!
//! # Invariants
//! - Each invocation decodes its input, calls exactly one service operation
//!   and prints the result.
//! - Error kinds map to stable exit codes (see [`CliError::exit_code`]).

use crate::args::Command;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Read;
use supplement_core::db::DbError;
use supplement_core::{
    LoggingError, PatchDocument, PatchError, ServiceError, Supplement, SupplementRepository,
    SupplementService,
};

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_INVALID_INPUT: u8 = 2;
pub const EXIT_NOT_FOUND: u8 = 3;
pub const EXIT_ALREADY_EXISTS: u8 = 4;

#[derive(Debug)]
pub enum CliError {
    /// Payload could not be read or decoded.
    Input(String),
    Patch(PatchError),
    Service(ServiceError),
    Db(DbError),
    Logging(LoggingError),
    Output(serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Input(_) | Self::Patch(_) => EXIT_INVALID_INPUT,
            Self::Service(ServiceError::InvalidSupplement(_)) => EXIT_INVALID_INPUT,
            Self::Service(ServiceError::NotFound(_)) => EXIT_NOT_FOUND,
            Self::Service(ServiceError::AlreadyExists(_)) => EXIT_ALREADY_EXISTS,
            Self::Service(ServiceError::Store(_))
            | Self::Db(_)
            | Self::Logging(_)
            | Self::Output(_) => EXIT_FAILURE,
        }
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input(message) => write!(f, "malformed input: {message}"),
            Self::Patch(err) => write!(f, "malformed update: {err}"),
            Self::Service(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "cannot encode output: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Input(_) => None,
            Self::Patch(err) => Some(err),
            Self::Service(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<ServiceError> for CliError {
    fn from(value: ServiceError) -> Self {
        Self::Service(value)
    }
}

impl From<PatchError> for CliError {
    fn from(value: PatchError) -> Self {
        Self::Patch(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

/// Runs `command` against `service` and returns what should go to stdout.
pub fn execute<R: SupplementRepository>(
    service: &SupplementService<R>,
    command: Command,
) -> Result<Option<String>, CliError> {
    match command {
        Command::Create { payload } => {
            let supplement: Supplement = decode(&payload)?;
            service.create(&supplement)?;
            Ok(None)
        }
        Command::Get { gtin } => {
            let supplement = service.find_by_gtin(&gtin)?;
            encode(&supplement).map(Some)
        }
        Command::Update { gtin, payload } => {
            let document: PatchDocument = decode(&payload)?;
            let patch = document.into_patch(&gtin)?;
            service.update(&gtin, &patch)?;
            Ok(None)
        }
        Command::Delete { gtin } => {
            service.delete(&gtin)?;
            Ok(None)
        }
        Command::List => encode(&service.list_all()?).map(Some),
    }
}

fn decode<T: serde::de::DeserializeOwned>(payload: &str) -> Result<T, CliError> {
    let text = if payload == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|err| CliError::Input(format!("cannot read stdin: {err}")))?;
        buffer
    } else {
        payload.to_string()
    };

    serde_json::from_str(&text).map_err(|err| CliError::Input(err.to_string()))
}

fn encode<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value).map_err(CliError::Output)
}
