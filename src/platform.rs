//! Runtime platform gate.

use anyhow::{bail, Result};

/// Every collector speaks to Windows management interfaces; refuse to start
/// anywhere else rather than emit ten identical section failures.
pub fn ensure_supported() -> Result<()> {
    match std::env::consts::OS {
        "windows" => Ok(()),
        other => bail!("unsupported platform `{other}`; this tool reports on Windows hosts only"),
    }
}
