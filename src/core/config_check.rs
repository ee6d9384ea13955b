use crate::domain::model::ConfigCheck;
use crate::domain::ports::Operator;
use crate::utils::error::Result;
use std::path::Path;

/// Checks each expected file in `dir`. A missing file is a warning plus an
/// operator pause (when `pause` is set); the next file is always checked.
pub fn check_config_files<O: Operator + ?Sized>(
    dir: &Path,
    names: &[String],
    operator: &O,
    pause: bool,
) -> Result<Vec<ConfigCheck>> {
    let mut checks = Vec::with_capacity(names.len());

    for name in names {
        let path = dir.join(name);
        let present = path.is_file();
        if present {
            tracing::debug!("Found {}", path.display());
        } else {
            let message = format!("WARNING: configuration file {} not found", path.display());
            tracing::warn!("{}", message);
            if pause {
                operator.pause(&message)?;
            }
        }
        checks.push(ConfigCheck {
            name: name.clone(),
            path,
            present,
        });
    }

    Ok(checks)
}
