//! Validation and generation over the registry's two identifier spaces.
//!
//! A *key* is chosen by the caller: a non-negative integer of at most ten
//! digits with no leading zero, used as the store index. An *id* is minted
//! by the server at insert time: exactly ten digits with a leading digit of
//! 1 to 9, immutable, and used to address a record for update independently
//! of its key. The two spaces deliberately share the numeric format checks
//! but diverge on length and existence rules, which keeps insert (caller
//! supplies key, server supplies id) and update (caller supplies id, key is
//! looked up) symmetric.

use rand::Rng;
use thiserror::Error;

use crate::registry::VehicleRegistry;

/// Exact digit count of a server-generated id.
pub const ID_LENGTH: usize = 10;

/// Maximum digit count of a caller-chosen key.
pub const MAX_KEY_LENGTH: usize = 10;

/// Validation failures over keys and ids.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentError {
    #[error("{name} must be a number")]
    NotNumeric { name: &'static str },
    #[error("{name} cannot be negative")]
    Negative { name: &'static str },
    #[error("{name} cannot have leading zeros")]
    LeadingZeros { name: &'static str },
    #[error("Key is too long, max length - {MAX_KEY_LENGTH}")]
    KeyTooLong,
    #[error("Invalid id length: {got}, expected {ID_LENGTH}")]
    WrongIdLength { got: usize },
    #[error("No such element with this id")]
    IdNotFound,
    #[error("Element with such key already exists")]
    DuplicateKey,
    #[error("Element with such key not found")]
    KeyNotFound,
    #[error("id {id} has no backing record")]
    LookupInconsistency { id: u64 },
}

/// Shared numeric-format checks: an optional sign, digits only, no leading
/// zero on a multi-digit value.
fn check_numeric(text: &str, name: &'static str) -> Result<(), IdentError> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(IdentError::NotNumeric { name });
    }
    if text.starts_with('-') {
        return Err(IdentError::Negative { name });
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return Err(IdentError::LeadingZeros { name });
    }
    Ok(())
}

/// Validates a caller-chosen key and parses it.
///
/// # Errors
///
/// Rejects non-numeric, negative, leading-zero, and over-length values.
pub fn validate_key(text: &str) -> Result<u64, IdentError> {
    check_numeric(text, "Key")?;
    if text.len() > MAX_KEY_LENGTH {
        return Err(IdentError::KeyTooLong);
    }
    text.parse()
        .map_err(|_| IdentError::NotNumeric { name: "Key" })
}

/// Validates an id addressing an existing record and parses it.
///
/// # Errors
///
/// Applies the shared numeric checks, requires exactly [`ID_LENGTH`] digits,
/// and requires the id to be present in the registry.
pub fn validate_id(text: &str, registry: &VehicleRegistry) -> Result<u64, IdentError> {
    check_numeric(text, "Id")?;
    if text.len() != ID_LENGTH {
        return Err(IdentError::WrongIdLength { got: text.len() });
    }
    let id = text
        .parse()
        .map_err(|_| IdentError::NotNumeric { name: "Id" })?;
    if !registry.id_exists(id) {
        return Err(IdentError::IdNotFound);
    }
    Ok(id)
}

/// Mints a fresh id: ten random digits, the first in 1 to 9, retried on
/// collision until unique. Expected retries are negligible while the store
/// is far smaller than the 9 * 10^9 id space.
#[must_use]
pub fn generate_id(registry: &VehicleRegistry) -> u64 {
    let mut rng = rand::thread_rng();
    loop {
        let candidate = random_candidate(&mut rng);
        if !registry.id_exists(candidate) {
            return candidate;
        }
    }
}

fn random_candidate<R: Rng>(rng: &mut R) -> u64 {
    let mut id = u64::from(rng.gen_range(1_u8..=9));
    for _ in 1..ID_LENGTH {
        id = id * 10 + u64::from(rng.gen_range(0_u8..=9));
    }
    id
}

/// True when the registry holds a record under the given key.
#[must_use]
pub fn key_exists(registry: &VehicleRegistry, key: u64) -> bool {
    registry.contains_key(key)
}

/// Resolves the key of the record carrying the given id.
///
/// # Errors
///
/// Returns [`IdentError::LookupInconsistency`] when the id has no backing
/// record; callers validate existence first, so this marks an internal
/// invariant violation rather than user error.
pub fn key_for_id(registry: &VehicleRegistry, id: u64) -> Result<u64, IdentError> {
    registry
        .key_for_id(id)
        .ok_or(IdentError::LookupInconsistency { id })
}
