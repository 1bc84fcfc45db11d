//! Loading JSON datasets into a cache

use serde_json::Value;

use super::CliError;
use crate::cache::{Cache, CommitTime};

/// Load a JSON dataset into `cache` at `commit_time`.
///
/// The dataset is an object. Each member is either
///
/// - a string, stored as a single key-value pair, or
/// - an array of strings and non-negative integers, stored as a string set
///   with integers in decimal form. An array made only of integers that fit
///   in `u32` is also stored as the key's `u32` set; a mixed array has no
///   `u32` set.
///
/// Returns the number of keys loaded.
pub fn load_dataset<C: Cache + ?Sized>(
    dataset: &Value,
    cache: &C,
    commit_time: CommitTime,
) -> Result<usize, CliError> {
    let Value::Object(members) = dataset else {
        return Err(CliError::InvalidDataset(
            "expected a JSON object mapping keys to values".to_string(),
        ));
    };

    for (key, value) in members {
        match value {
            Value::String(s) => {
                cache.update_key_value(key, s, commit_time);
            }
            Value::Array(elements) => {
                let (strings, numbers) = split_elements(key, elements)?;
                let strings: Vec<&str> = strings.iter().map(String::as_str).collect();
                cache.update_value_set(key, &strings, commit_time);
                if numbers.len() == elements.len() {
                    cache.update_uint32_value_set(key, &numbers, commit_time);
                }
            }
            other => {
                return Err(CliError::InvalidDataset(format!(
                    "key '{key}': expected a string or an array, got {other}"
                )));
            }
        }
    }
    Ok(members.len())
}

fn split_elements(key: &str, elements: &[Value]) -> Result<(Vec<String>, Vec<u32>), CliError> {
    let mut strings = Vec::with_capacity(elements.len());
    let mut numbers = Vec::new();

    for element in elements {
        match element {
            Value::String(s) => strings.push(s.clone()),
            Value::Number(n) => {
                let number = n
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .ok_or_else(|| {
                        CliError::InvalidDataset(format!(
                            "key '{key}': {n} is not an unsigned 32-bit integer"
                        ))
                    })?;
                numbers.push(number);
                strings.push(number.to_string());
            }
            other => {
                return Err(CliError::InvalidDataset(format!(
                    "key '{key}': unsupported set element {other}"
                )));
            }
        }
    }
    Ok((strings, numbers))
}
