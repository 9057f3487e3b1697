// Matinee
// Copyright (C) 2025 Throneless Tech

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use serde_json::Error as SerdeError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MatineeError {
    /// Bad user input. Reported inline; the workflow step repeats.
    #[error("Validation error: `{0}`")]
    Validation(String),
    /// A non-admin invoked an admin-only action.
    #[error("Authorization error: sender is not an admin")]
    Authorization,
    /// Any failure while calling the chat transport.
    #[error("Transport error: `{0}`")]
    Transport(String),
    #[error("Not found: `{0}`")]
    NotFound(String),
    /// Runner process could not be spawned.
    #[error("Launch error: `{0}`")]
    Launch(String),
    #[error("I/O error: `{0}`")]
    Io(#[from] io::Error),
    #[error("Figment error: `{0}`")]
    Figment(#[from] Box<figment::Error>),
    #[error("Serialization/deserialization error: `{0}`")]
    Serde(#[from] SerdeError),
    #[error("HTTP error: `{0}`")]
    Http(#[from] reqwest::Error),
}

impl From<figment::Error> for MatineeError {
    fn from(err: figment::Error) -> Self {
        MatineeError::Figment(Box::new(err))
    }
}

pub type Result<T, E = MatineeError> = std::result::Result<T, E>;
