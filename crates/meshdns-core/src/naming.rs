//! Mesh hostname → public name
//!
//! `normalize("host1.tailnetxyz.", "tailnetxyz", "example.com")` yields
//! `"host1.example.com"`. Suffixes are accepted with or without a leading
//! dot, and the mesh suffix with or without a trailing dot. DNS names are
//! case-insensitive and providers store them lowercased, so every name
//! produced here is lowercase.

use crate::error::{Error, Result};

/// Convert a peer's mesh hostname into its public name under `managed_suffix`
///
/// The hostname must be domain-qualified (end with `.`). The mesh suffix is
/// stripped together with the dot separating it from the local label; a
/// hostname outside the mesh suffix keeps all of its labels.
pub fn normalize(internal_hostname: &str, mesh_suffix: &str, managed_suffix: &str) -> Result<String> {
    let Some(qualified) = internal_hostname.strip_suffix('.') else {
        return Err(Error::invalid_hostname(
            internal_hostname,
            "must end with a trailing dot",
        ));
    };
    let qualified = qualified.to_ascii_lowercase();

    let mesh = trim_dots(mesh_suffix).to_ascii_lowercase();
    let label = if mesh.is_empty() {
        qualified.as_str()
    } else {
        match qualified.strip_suffix(mesh.as_str()) {
            Some(rest) if rest.ends_with('.') => rest.trim_end_matches('.'),
            Some("") => "",
            _ => qualified.as_str(),
        }
    };

    if label.is_empty() || label.starts_with('.') {
        return Err(Error::invalid_hostname(
            internal_hostname,
            "no local label before the mesh suffix",
        ));
    }

    let managed = trim_dots(managed_suffix);
    if managed.is_empty() {
        return Err(Error::config("managed suffix cannot be empty"));
    }

    Ok(format!("{label}.{}", managed.to_ascii_lowercase()))
}

/// Whether `name` lives under `managed_suffix`
///
/// Matching is on a label boundary, so "notexample.com" is not under
/// "example.com". The bare suffix itself is not a managed name. Case is
/// ignored on both sides.
pub fn is_managed(name: &str, managed_suffix: &str) -> bool {
    let managed = trim_dots(managed_suffix).to_ascii_lowercase();
    if managed.is_empty() {
        return false;
    }
    name.trim_end_matches('.')
        .to_ascii_lowercase()
        .strip_suffix(managed.as_str())
        .is_some_and(|rest| rest.len() > 1 && rest.ends_with('.'))
}

fn trim_dots(s: &str) -> &str {
    s.trim_matches('.')
}
