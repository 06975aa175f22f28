//! Data structures for unit and equipment configuration.
//!
//! Everything here is a plain serde record meant to be written in RON:
//! an equipment [`Catalog`] and [`UnitData`] records that reference it by
//! name. [`UnitData::build`] turns a record into a ready [`crate::unit::Unit`].
//!
//! **Note:** This module contains no IO. It parses text handed to it;
//! reading files is the caller's job.

mod catalog;
mod unit_data;

pub use catalog::Catalog;
pub use unit_data::{CrewData, LocationData, MountData, UnitData};

use serde::de::DeserializeOwned;

use crate::error::{CombatError, Result};

/// Parse any data record from RON text. `source_name` labels errors.
///
/// # Errors
///
/// Returns [`CombatError::DataParse`] when the text does not parse.
pub fn from_ron_str<T: DeserializeOwned>(source_name: &str, text: &str) -> Result<T> {
    ron::from_str(text).map_err(|e| CombatError::DataParse {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })
}
