use serde::{Deserialize, Deserializer};

pub mod car;
pub mod health;
pub mod mechanic;
pub mod stats;
pub mod task;

/// Deserialize a present-but-possibly-null field into `Some(Option<T>)`,
/// so partial updates can tell "leave unchanged" from "clear".
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
