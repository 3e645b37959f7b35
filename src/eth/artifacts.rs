//! Artifact loading: bundled ABIs by name, or ABI JSON from a file or a
//! directory of files.

use std::fs;
use std::path::Path;

use crate::abi::Abi;
use crate::ast::Expression;

use super::EthError;

/// The bundled ERC20 interface.
pub const ERC20_ABI: &str = r#"[
  {"type":"function","name":"name","inputs":[],"outputs":[{"name":"","type":"string"}]},
  {"type":"function","name":"symbol","inputs":[],"outputs":[{"name":"","type":"string"}]},
  {"type":"function","name":"decimals","inputs":[],"outputs":[{"name":"","type":"uint8"}]},
  {"type":"function","name":"totalSupply","inputs":[],"outputs":[{"name":"","type":"uint256"}]},
  {"type":"function","name":"balanceOf","inputs":[{"name":"owner","type":"address"}],"outputs":[{"name":"","type":"uint256"}]},
  {"type":"function","name":"transfer","inputs":[{"name":"to","type":"address"},{"name":"value","type":"uint256"}],"outputs":[{"name":"","type":"bool"}]},
  {"type":"function","name":"transferFrom","inputs":[{"name":"from","type":"address"},{"name":"to","type":"address"},{"name":"value","type":"uint256"}],"outputs":[{"name":"","type":"bool"}]},
  {"type":"function","name":"approve","inputs":[{"name":"spender","type":"address"},{"name":"value","type":"uint256"}],"outputs":[{"name":"","type":"bool"}]},
  {"type":"function","name":"allowance","inputs":[{"name":"owner","type":"address"},{"name":"spender","type":"address"}],"outputs":[{"name":"","type":"uint256"}]},
  {"type":"event","name":"Transfer","inputs":[{"name":"from","type":"address","indexed":true},{"name":"to","type":"address","indexed":true},{"name":"value","type":"uint256","indexed":false}]},
  {"type":"event","name":"Approval","inputs":[{"name":"owner","type":"address","indexed":true},{"name":"spender","type":"address","indexed":true},{"name":"value","type":"uint256","indexed":false}]}
]"#;

/// Resolve the items of an `artifact` statement into named ABIs.
/// Identifiers name bundled artifacts; strings are filesystem paths, with a
/// fallback to the bundled set. The first binding of a name wins.
pub fn read_artifacts(items: &[Expression]) -> Result<Vec<(String, Abi)>, EthError> {
    let mut artifacts: Vec<(String, Abi)> = Vec::new();
    let mut add = |artifacts: &mut Vec<(String, Abi)>, name: String, abi: Abi| {
        if !artifacts.iter().any(|(existing, _)| *existing == name) {
            artifacts.push((name, abi));
        }
    };

    for item in items {
        match item {
            Expression::Identifier(name) => {
                add(&mut artifacts, name.clone(), builtin_artifact(name)?);
            }
            Expression::StringLiteral(value) => {
                let path = Path::new(value);
                if path.is_dir() {
                    let mut entries: Vec<_> = fs::read_dir(path)
                        .map_err(|e| EthError::new(format!("failed to read {}: {}", value, e)))?
                        .collect::<Result<_, _>>()
                        .map_err(|e| EthError::new(format!("failed to read {}: {}", value, e)))?;
                    entries.sort_by_key(|entry| entry.path());

                    for entry in entries {
                        let file = entry.path();
                        add(
                            &mut artifacts,
                            artifact_name(&file),
                            read_file_artifact(&file)?,
                        );
                    }
                } else if path.is_file() {
                    add(&mut artifacts, artifact_name(path), read_file_artifact(path)?);
                } else {
                    add(&mut artifacts, value.clone(), builtin_artifact(value)?);
                }
            }
            other => {
                return Err(EthError::new(format!(
                    "invalid artifact expression {}",
                    other
                )));
            }
        }
    }

    Ok(artifacts)
}

fn artifact_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn read_file_artifact(path: &Path) -> Result<Abi, EthError> {
    let data = fs::read_to_string(path)
        .map_err(|e| EthError::new(format!("failed to read {}: {}", path.display(), e)))?;
    Ok(Abi::from_json(&data)?)
}

pub fn builtin_artifact(name: &str) -> Result<Abi, EthError> {
    match name {
        "ERC20" => Ok(Abi::from_json(ERC20_ABI)?),
        _ => Err(EthError::new(format!("builtin artifact {} not found", name))),
    }
}
