//! Typed host calls.
//!
//! The frontend addresses the host with `{ "method": ..., "arguments": ... }`.
//! Calls are parsed into a closed [`Command`] set up front, so an unknown
//! method is an error at the boundary rather than a silent `false`.

use base64::engine::{general_purpose, Engine as _};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::provision::{DatabaseProvisioner, ProvisionError};

pub const COPY_DB: &str = "copyDb";

#[derive(Debug, Clone, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CopyDb { db_data: Vec<u8> },
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("unknown method '{0}'")]
    UnknownMethod(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
}

/// `dbData` as sent by the frontend: a plain byte array or base64 text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    Bytes(Vec<u8>),
    Base64(String),
}

impl Payload {
    fn into_bytes(self) -> Result<Vec<u8>, ChannelError> {
        match self {
            Payload::Bytes(bytes) => Ok(bytes),
            Payload::Base64(text) => general_purpose::STANDARD
                .decode(text.trim())
                .map_err(|e| ChannelError::InvalidArguments(format!("dbData: {e}"))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CopyDbArgs {
    #[serde(rename = "dbData")]
    db_data: Payload,
}

impl Command {
    /// Parses the arguments of a `copyDb` call.
    pub fn copy_db(arguments: serde_json::Value) -> Result<Self, ChannelError> {
        let args: CopyDbArgs = serde_json::from_value(arguments)
            .map_err(|e| ChannelError::InvalidArguments(e.to_string()))?;
        Ok(Command::CopyDb {
            db_data: args.db_data.into_bytes()?,
        })
    }
}

impl TryFrom<MethodCall> for Command {
    type Error = ChannelError;

    fn try_from(call: MethodCall) -> Result<Self, Self::Error> {
        match call.method.as_str() {
            COPY_DB => Command::copy_db(call.arguments),
            _ => Err(ChannelError::UnknownMethod(call.method)),
        }
    }
}

pub fn dispatch(
    command: Command,
    provisioner: &DatabaseProvisioner,
    destination: &Path,
) -> Result<bool, ChannelError> {
    match command {
        Command::CopyDb { db_data } => {
            provisioner.provision(destination, &db_data)?;
            Ok(true)
        }
    }
}
