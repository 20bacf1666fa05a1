/* ************************************************************************
*   File: error.rs                                      Part of CircleMUD *
*  Usage: Error taxonomy shared by the world, builds and persistence      *
*                                                                         *
*  All rights reserved.  See license.doc for complete information.        *
*                                                                         *
*  Copyright (C) 1993, 94 by the Trustees of the Johns Hopkins University *
*  CircleMUD is based on DikuMUD, Copyright (C) 1990, 1991.               *
*  Rust port Copyright (C) 2023, 2024 Laurent Pautet                      *
************************************************************************ */

use thiserror::Error;

/*
 * NotFound and InvalidState carry text meant for the player who issued the
 * command; the interpreter sends it back verbatim.  ConfigMissing and
 * Corruption are logged as SYSERR and the player only gets an apology.
 */
#[derive(Debug, Error)]
pub enum MudError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("missing configuration: {0}")]
    ConfigMissing(String),

    #[error("corrupt data: {0}")]
    Corruption(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type MudResult<T> = Result<T, MudError>;

impl MudError {
    pub fn not_found(msg: impl Into<String>) -> MudError {
        MudError::NotFound(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> MudError {
        MudError::InvalidState(msg.into())
    }

    /* errors the player is allowed to see as-is */
    pub fn is_user_facing(&self) -> bool {
        matches!(self, MudError::NotFound(_) | MudError::InvalidState(_))
    }
}
