//! Configuration files, and the `serde` plumbing needed to read physical
//! quantities with explicit units from them.

pub mod evaluate;

use std::str::FromStr;

use serde::{Deserialize, Deserializer, de};

// TOML knows nothing about units, so quantities are written as strings such as
// "128 mm" and parsed by `uom`.

pub(crate) fn deserialize_uom<'d, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    String::deserialize(deserializer)?
        .parse::<T>()
        .map_err(de::Error::custom)
}

pub(crate) fn deserialize_uom_2d<'d, D, T>(deserializer: D) -> Result<(T, T), D::Error>
where
    D: Deserializer<'d>,
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let (x, y) = <(String, String)>::deserialize(deserializer)?;
    tr_pair_res((x.parse(), y.parse()))
        .map_err(de::Error::custom)
}

/// Transpose pair of `Result`
///
/// `Ok` if both elements `Ok`; otherwise the first `Err`.
fn tr_pair_res<O, E>((x, y): (Result<O, E>, Result<O, E>)) -> Result<(O, O), E> {
    Ok((x?, y?))
}
