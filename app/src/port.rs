#![allow(async_fn_in_trait)]

use derive_more::derive::{Display, Error, From};

use crate::core::Document;
use crate::descriptor::AirMode;

pub trait ProductSource {
    /// Fetches a fresh snapshot of all products of the account.
    async fn fetch_products(&self) -> anyhow::Result<Document>;
}

pub trait ModeCommandChannel {
    async fn set_mode(&self, modem: &str, mode: AirMode) -> Result<(), CommandError>;
}

#[derive(Debug, Display, Error, From)]
pub enum CommandError {
    /// The vendor answered, but refused the command.
    #[display("Mode {code} rejected for modem {modem} with status {status}: {message}")]
    RemoteRejected {
        modem: String,
        code: &'static str,
        status: u16,
        message: String,
    },

    #[display("Error sending command: {_0:?}")]
    #[from]
    Transport(anyhow::Error),
}
