//! Atomic label file publisher
//!
//! node-feature-discovery may read the features file at any moment, so
//! new content is written to a hidden sibling file and renamed into
//! place. Readers see either the old file or the new one.

use crate::collector::Features;
use crate::error::{FeatureDiscoveryError, IoResultExt, Result};
use chrono::{DateTime, Duration, Local, SecondsFormat};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Default node-feature-discovery local source file
pub const DEFAULT_OUTPUT_FILE: &str =
    "/etc/kubernetes/node-feature-discovery/features.d/rbln-features";

/// How long consumers may trust a published file
const EXPIRY_WINDOW_HOURS: i64 = 1;

/// Writes features to the label file
#[derive(Debug, Clone)]
pub struct FilePublisher {
    output_file: PathBuf,
    expiry: bool,
}

impl FilePublisher {
    /// Create a publisher with the expiry annotation enabled
    pub fn new(output_file: impl Into<PathBuf>) -> Self {
        Self {
            output_file: output_file.into(),
            expiry: true,
        }
    }

    /// Enable or disable the `# +expiry-time=` header
    pub fn with_expiry(mut self, enabled: bool) -> Self {
        self.expiry = enabled;
        self
    }

    /// File content for `features` as of `now`
    pub fn render(&self, features: &Features, now: DateTime<Local>) -> String {
        let labels = features.to_plain_text();
        if !self.expiry {
            return labels;
        }

        let expiry = (now + Duration::hours(EXPIRY_WINDOW_HOURS))
            .to_rfc3339_opts(SecondsFormat::Secs, false);
        format!("# +expiry-time={}\n{}", expiry, labels)
    }

    /// Publish `features`, replacing the previous file in one rename.
    ///
    /// The target directory must already exist. On error or cancellation
    /// the previous file is left as it was.
    pub fn save(&self, features: &Features, cancel: &CancellationToken) -> Result<()> {
        let text = self.render(features, Local::now());
        tracing::debug!("Collected features:\n{}", text);

        let dir = self.output_dir();
        let metadata = fs::metadata(&dir).with_publish_path(&dir)?;
        if !metadata.is_dir() {
            return Err(FeatureDiscoveryError::publish(
                &dir,
                std::io::Error::new(std::io::ErrorKind::Other, "output parent is not a directory"),
            ));
        }

        let temp_path = self.temp_path()?;
        if let Err(e) = Self::write_synced(&temp_path, text.as_bytes()) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        if cancel.is_cancelled() {
            let _ = fs::remove_file(&temp_path);
            return Err(FeatureDiscoveryError::Cancelled);
        }

        if let Err(e) = fs::rename(&temp_path, &self.output_file) {
            let _ = fs::remove_file(&temp_path);
            return Err(FeatureDiscoveryError::publish(&self.output_file, e));
        }

        tracing::debug!("Features saved to {:?}", self.output_file);
        Ok(())
    }

    fn output_dir(&self) -> PathBuf {
        match self.output_file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Hidden sibling of the target: `<dir>/.<file name>`
    fn temp_path(&self) -> Result<PathBuf> {
        let file_name = self
            .output_file
            .file_name()
            .ok_or_else(|| FeatureDiscoveryError::InvalidOutputPath(self.output_file.clone()))?;

        let mut hidden = std::ffi::OsString::from(".");
        hidden.push(file_name);
        Ok(self.output_dir().join(hidden))
    }

    fn write_synced(path: &Path, content: &[u8]) -> Result<()> {
        let mut file = File::create(path).with_publish_path(path)?;
        file.write_all(content).with_publish_path(path)?;
        file.sync_all().with_publish_path(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceProduct, DriverVersion};
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn sample_features() -> Features {
        let mut features = Features::default();
        features
            .record_devices(1, &DeviceProduct::from_device_id("1020").unwrap())
            .unwrap();
        features.driver_version = Some(DriverVersion::parse("1.3.73-release").unwrap());
        features
    }

    #[test]
    fn test_render_with_expiry() {
        let publisher = FilePublisher::new("/tmp/rbln-features");
        let now = Local.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();

        let text = publisher.render(&Features::default(), now);
        let mut lines = text.lines();
        let header = lines.next().unwrap();
        let stamp = header.strip_prefix("# +expiry-time=").unwrap();

        let parsed = DateTime::parse_from_rfc3339(stamp).unwrap();
        assert_eq!(parsed.with_timezone(&Local), now + Duration::hours(1));
        assert!(!stamp.contains('.'), "no sub-second precision: {}", stamp);
        assert_eq!(lines.next(), Some("rebellions.ai/npu.present=false"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_render_without_expiry() {
        let publisher = FilePublisher::new("/tmp/rbln-features").with_expiry(false);
        let text = publisher.render(&Features::default(), Local::now());
        assert_eq!(text, "rebellions.ai/npu.present=false\n");
    }

    #[test]
    fn test_save_replaces_file_and_cleans_temp() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("rbln-features");
        let publisher = FilePublisher::new(&target).with_expiry(false);
        let cancel = CancellationToken::new();

        publisher.save(&Features::default(), &cancel).unwrap();
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            "rebellions.ai/npu.present=false\n"
        );

        publisher.save(&sample_features(), &cancel).unwrap();
        assert_eq!(
            fs::read_to_string(&target).unwrap(),
            sample_features().to_plain_text()
        );
        assert!(!dir.path().join(".rbln-features").exists());
    }

    #[test]
    fn test_missing_directory_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("missing/rbln-features");
        let publisher = FilePublisher::new(&target);

        let err = publisher
            .save(&sample_features(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, FeatureDiscoveryError::Publish { .. }));
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn test_failed_publish_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("rbln-features");
        fs::write(&target, "rebellions.ai/npu.present=true\n").unwrap();
        let before = fs::read(&target).unwrap();

        // A directory squatting on the temp path makes the temp write fail
        fs::create_dir(dir.path().join(".rbln-features")).unwrap();

        let publisher = FilePublisher::new(&target);
        let err = publisher
            .save(&Features::default(), &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, FeatureDiscoveryError::Publish { .. }));
        assert_eq!(fs::read(&target).unwrap(), before);
    }

    #[test]
    fn test_cancelled_save_does_not_rename() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("rbln-features");
        fs::write(&target, "previous\n").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let publisher = FilePublisher::new(&target);
        let err = publisher.save(&sample_features(), &cancel).unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(fs::read_to_string(&target).unwrap(), "previous\n");
        assert!(!dir.path().join(".rbln-features").exists());
    }

    #[test]
    fn test_invalid_output_path() {
        let publisher = FilePublisher::new("/");
        assert!(matches!(
            publisher.save(&Features::default(), &CancellationToken::new()),
            Err(FeatureDiscoveryError::InvalidOutputPath(_))
        ));
    }

    #[test]
    fn test_reader_never_sees_torn_file() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("rbln-features");
        let publisher = FilePublisher::new(&target).with_expiry(false);
        let cancel = CancellationToken::new();

        let first = Features::default();
        let second = sample_features();
        publisher.save(&first, &cancel).unwrap();

        let allowed = [first.to_plain_text(), second.to_plain_text()];
        let done = Arc::new(AtomicBool::new(false));

        let reader = {
            let target = target.clone();
            let done = Arc::clone(&done);
            let allowed = allowed.clone();
            std::thread::spawn(move || {
                let mut samples = 0usize;
                while !done.load(Ordering::SeqCst) || samples == 0 {
                    let content = fs::read_to_string(&target).unwrap();
                    assert!(allowed.contains(&content), "torn read: {:?}", content);
                    samples += 1;
                }
                samples
            })
        };

        for i in 0..200 {
            let features = if i % 2 == 0 { &second } else { &first };
            publisher.save(features, &cancel).unwrap();
        }
        done.store(true, Ordering::SeqCst);

        assert!(reader.join().unwrap() > 0);
    }
}
