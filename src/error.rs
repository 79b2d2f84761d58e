// SPDX-FileCopyrightText: 2026 umdkit contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

use crate::dds::PixelFormat;

#[derive(Error, Debug)]
pub enum Error {
    /// The input data has the wrong shape, such as mismatched stream lengths or out of range indices.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The pixel data isn't in a format the texture writer understands.
    #[error("unsupported pixel format: {0:?}")]
    UnsupportedFormat(PixelFormat),
    /// Writing a binary record failed.
    #[error("error writing binary data: {err}")]
    Io {
        #[from]
        err: binrw::Error,
    },
    /// Reading or writing a settings or semantic table failed.
    #[error("error serializing or deserializing json: {err}")]
    Json {
        #[from]
        err: serde_json::Error,
    },
    /// Emitting an XML document failed.
    #[error("error writing xml: {0}")]
    Xml(String),
}

impl Error {
    pub(crate) fn invalid(detail: impl Into<String>) -> Self {
        Error::InvalidArgument(detail.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
