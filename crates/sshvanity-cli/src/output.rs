//! Result printing and key files

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Serialize, Serializer};
use sshvanity_core::{Pattern, SearchResult, Zeroizing};

/// Everything the user needs from a match, as printed or serialized
#[derive(Serialize)]
pub struct KeyReport {
    pub public_key: String,
    #[serde(serialize_with = "serialize_secret")]
    pub private_key: Zeroizing<String>,
    pub fingerprint: String,
    pub pattern: Pattern,
    pub keys_tested: u64,
    pub time_secs: f64,
    pub keys_per_second: f64,
}

impl KeyReport {
    pub fn new(result: &SearchResult, comment: &str) -> Result<Self> {
        let private_key = result
            .keypair
            .private_key_openssh(comment)
            .context("failed to encode private key")?;

        Ok(Self {
            public_key: result.keypair.public_key_openssh().with_comment(comment),
            private_key,
            fingerprint: result.keypair.fingerprint(),
            pattern: result.pattern.clone(),
            keys_tested: result.keys_tested,
            time_secs: result.time_secs,
            keys_per_second: result.keys_per_second,
        })
    }

    pub fn print(&self) {
        println!();
        println!("MATCH FOUND for {}", self.pattern);
        println!("{:-<60}", "");
        println!("Public Key:  {}", self.public_key);
        println!("Fingerprint: {}", self.fingerprint);
        println!("{:-<60}", "");
        print!("{}", self.private_key.as_str());
        println!("{:-<60}", "");
        println!("Keys Tested: {}", self.keys_tested);
        println!("Time:        {:.2}s", self.time_secs);
        println!("Speed:       {:.0} keys/s", self.keys_per_second);
    }

    /// Write `<dir>/<name>` (owner-only on unix) and `<dir>/<name>.pub`.
    ///
    /// Existing files are never overwritten, and a failure leaves neither file
    /// behind.
    pub fn save(&self, dir: &Path, name: &str) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;

        let private_path = dir.join(name);
        let public_path = dir.join(format!("{}.pub", name));

        for path in [&private_path, &public_path] {
            if path.exists() {
                bail!("{} already exists", path.display());
            }
        }

        write_new(&private_path, self.private_key.as_bytes(), 0o600)?;
        if let Err(e) = write_new(&public_path, format!("{}\n", self.public_key).as_bytes(), 0o644)
        {
            let _ = fs::remove_file(&private_path);
            return Err(e);
        }

        Ok((private_path, public_path))
    }
}

fn serialize_secret<S: Serializer>(secret: &Zeroizing<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.as_str())
}

#[cfg_attr(not(unix), allow(unused_variables))]
fn write_new(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    file.write_all(contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sshvanity_core::{SearchConfig, VanitySearch};

    fn report() -> KeyReport {
        let search = VanitySearch::new(
            vec![Pattern::contains("AAAAC3Nza")],
            SearchConfig {
                threads: 1,
                batch_size: 1,
                ..Default::default()
            },
        )
        .unwrap();
        let result = search.run().unwrap().unwrap();
        KeyReport::new(&result, "cli@test").unwrap()
    }

    #[test]
    fn test_report_contents() {
        let report = report();
        assert!(report.public_key.ends_with(" cli@test"));
        assert!(report.fingerprint.starts_with("SHA256:"));
        assert!(report.private_key.contains("OPENSSH PRIVATE KEY"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["pattern"]["pattern_type"], "contains");
    }

    #[test]
    fn test_save_writes_both_files_once() {
        let dir = tempfile::tempdir().unwrap();
        let report = report();

        let (private_path, public_path) = report.save(dir.path(), "id_ed25519").unwrap();
        assert_eq!(fs::read_to_string(&public_path).unwrap(), format!("{}\n", report.public_key));
        assert_eq!(fs::read_to_string(&private_path).unwrap(), *report.private_key);

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&private_path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        assert!(report.save(dir.path(), "id_ed25519").is_err());
    }

    #[test]
    fn test_save_refuses_existing_public_file() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("id_ed25519.pub");
        fs::write(&stale, "old pub\n").unwrap();

        assert!(report().save(dir.path(), "id_ed25519").is_err());
        assert!(!dir.path().join("id_ed25519").exists());
        assert_eq!(fs::read_to_string(&stale).unwrap(), "old pub\n");
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_save_removes_private_key_when_public_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        // 252 bytes fits a file name, 256 with ".pub" does not
        let name = "k".repeat(252);

        assert!(report().save(dir.path(), &name).is_err());
        assert!(!dir.path().join(&name).exists());
    }

    #[test]
    fn test_json_exposes_private_key_text() {
        let report = report();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["private_key"], report.private_key.as_str());
    }
}
