//! `run <script>` (SPEC_FULL.md §4): execute a `package.json` "scripts"
//! entry, unchanged in spirit from the teacher's `handle_run_command`.

use std::process::{Command, Stdio};

use crate::config::Roots;
use crate::error::{Error, IoResultExt, Result};

pub fn run(roots: &Roots, script_name: &str, args: &[String]) -> Result<()> {
    let manifest_path = roots.manifest_path();
    let data = std::fs::read_to_string(&manifest_path)
        .map_err(|_| Error::ManifestMissing(manifest_path.display().to_string()))?;
    let json: serde_json::Value = serde_json::from_str(&data)?;

    let script_cmd = json
        .get("scripts")
        .and_then(|v| v.get(script_name))
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::Usage(format!("script '{script_name}' not found in package.json")))?;

    let full_cmd = if args.is_empty() {
        script_cmd.to_string()
    } else {
        format!("{} {}", script_cmd, args.join(" "))
    };

    println!("running '{script_name}': {full_cmd}");

    #[cfg(unix)]
    let status = Command::new("sh")
        .arg("-c")
        .arg(&full_cmd)
        .current_dir(&roots.output)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .fs_err(roots.output.display().to_string())?;

    #[cfg(windows)]
    let status = Command::new("cmd")
        .arg("/C")
        .arg(&full_cmd)
        .current_dir(&roots.output)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .fs_err(roots.output.display().to_string())?;

    if !status.success() {
        return Err(Error::Script(script_name.to_string(), status));
    }

    Ok(())
}
