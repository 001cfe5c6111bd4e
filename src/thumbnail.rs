//! Window thumbnail cache.
//!
//! Captures run on a worker thread: wait for the workspace switch animation,
//! grab the window's rectangle with `grim`, shrink it with ImageMagick
//! (`magick`, or `convert` for v6), then check with the compositor that the
//! window is still on the workspace it was captured from.  Only then is the
//! image moved to `<cache>/<address>.png` next to a `<address>.meta` file.
//! The engine never waits on a capture; it only reads finished files by
//! path.

use crate::snapshot::ClientInfo;
use crate::window::{normalize_workspace_name, WindowAddress};
use log::{debug, trace, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Side length of the stored thumbnails.
pub const THUMBNAIL_SIZE: u32 = 256;

const CAPTURE_DELAY: Duration = Duration::from_millis(300);

/// Current workspace name of a window, as reported by a fresh compositor
/// query.  `None` when the window is gone.
pub type WorkspaceLookup = Arc<dyn Fn(&WindowAddress) -> Option<String> + Send + Sync>;

/// One window to capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureJob {
    pub address: WindowAddress,
    pub class: String,
    pub title: String,
    pub workspace: String,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl CaptureJob {
    pub fn from_client(client: &ClientInfo) -> Self {
        Self {
            address: client.address.clone(),
            class: client.class.clone(),
            title: client.title.clone(),
            workspace: normalize_workspace_name(&client.workspace.name).to_string(),
            x: client.at[0],
            y: client.at[1],
            width: client.size[0],
            height: client.size[1],
        }
    }

    fn geometry(&self) -> String {
        format!("{},{} {}x{}", self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, thiserror::Error)]
enum CaptureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{tool} exited with {status}")]
    Tool {
        tool: &'static str,
        status: std::process::ExitStatus,
    },
}

/// Content-addressed thumbnail store.
#[derive(Clone)]
pub struct ThumbnailCache {
    dir: PathBuf,
    resize_tool: Option<&'static str>,
    lookup: WorkspaceLookup,
    delay: Duration,
}

impl std::fmt::Debug for ThumbnailCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThumbnailCache")
            .field("dir", &self.dir)
            .field("resize_tool", &self.resize_tool)
            .finish()
    }
}

fn in_path(program: &str) -> bool {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|p| p.join(program).is_file()))
        .unwrap_or(false)
}

fn detect_resize_tool() -> Option<&'static str> {
    if !in_path("grim") {
        return None;
    }
    ["magick", "convert"].into_iter().find(|t| in_path(t))
}

impl ThumbnailCache {
    /// Open the cache at `dir`, detecting the capture tools.  Missing tools
    /// disable capturing with a single warning.
    pub fn new(dir: PathBuf, lookup: WorkspaceLookup) -> Self {
        let resize_tool = detect_resize_tool();
        if resize_tool.is_none() {
            warn!("thumbnail capture disabled: need grim and magick or convert in PATH");
        }
        Self::with_tool(dir, resize_tool, lookup)
    }

    /// Open the cache with an explicit resize tool (`None` disables capture).
    pub fn with_tool(dir: PathBuf, resize_tool: Option<&'static str>, lookup: WorkspaceLookup) -> Self {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("cannot create thumbnail cache {}: {e}", dir.display());
        }
        Self {
            dir,
            resize_tool,
            lookup,
            delay: CAPTURE_DELAY,
        }
    }

    /// `$XDG_CACHE_HOME/hyprws/thumbnails`, falling back to `~/.cache`.
    pub fn default_dir() -> PathBuf {
        let base = std::env::var_os("XDG_CACHE_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".cache")))
            .unwrap_or_else(std::env::temp_dir);
        base.join("hyprws").join("thumbnails")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_available(&self) -> bool {
        self.resize_tool.is_some()
    }

    fn image_path(&self, address: &WindowAddress) -> PathBuf {
        self.dir.join(format!("{}.png", address.as_str()))
    }

    fn meta_path(&self, address: &WindowAddress) -> PathBuf {
        self.dir.join(format!("{}.meta", address.as_str()))
    }

    /// Path of the stored thumbnail, if one exists.
    pub fn thumbnail_path(&self, address: &WindowAddress) -> Option<PathBuf> {
        let path = self.image_path(address);
        path.is_file().then_some(path)
    }

    /// Remove every stored thumbnail.
    pub fn clear(&self) {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return;
        };
        let mut removed = 0usize;
        for entry in entries.flatten() {
            let path = entry.path();
            let ours = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("png" | "meta" | "tmp")
            );
            if ours && std::fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        debug!("cleared {removed} files from {}", self.dir.display());
    }

    /// Queue captures on a worker thread.  Returns immediately.
    pub fn capture(&self, jobs: Vec<CaptureJob>) {
        let Some(tool) = self.resize_tool else {
            return;
        };
        let jobs: Vec<_> = jobs
            .into_iter()
            .filter(|j| j.width > 0 && j.height > 0)
            .collect();
        if jobs.is_empty() {
            return;
        }
        let cache = self.clone();
        let spawned = std::thread::Builder::new()
            .name("thumbnails".into())
            .spawn(move || {
                std::thread::sleep(cache.delay);
                for job in &jobs {
                    if let Err(e) = cache.capture_one(tool, job) {
                        debug!("thumbnail for {} failed: {e}", job.address);
                    }
                }
            });
        if let Err(e) = spawned {
            warn!("cannot spawn thumbnail worker: {e}");
        }
    }

    fn capture_one(&self, tool: &'static str, job: &CaptureJob) -> Result<(), CaptureError> {
        let full = self.dir.join(format!("{}.full.tmp", job.address.as_str()));
        let small = self.dir.join(format!("{}.small.tmp", job.address.as_str()));

        run_tool(
            "grim",
            Command::new("grim").args(["-s", "1", "-g", &job.geometry()]).arg(&full),
        )?;
        let size = format!("{THUMBNAIL_SIZE}x{THUMBNAIL_SIZE}");
        let resized = run_tool(
            tool,
            Command::new(tool)
                .arg(&full)
                .args(["-resize", &size])
                .arg(format!("png:{}", small.display())),
        );
        let _ = std::fs::remove_file(&full);
        resized?;

        self.commit(job, &small)?;
        Ok(())
    }

    /// Move a finished capture into place if the window is still on the
    /// workspace it was captured from.  Returns whether it was stored.
    fn commit(&self, job: &CaptureJob, temp: &Path) -> std::io::Result<bool> {
        let current = (self.lookup)(&job.address);
        if current.as_deref() != Some(job.workspace.as_str()) {
            trace!(
                "discarding thumbnail for {}: now on {:?}, captured on {}",
                job.address,
                current,
                job.workspace
            );
            std::fs::remove_file(temp)?;
            return Ok(false);
        }

        std::fs::rename(temp, self.image_path(&job.address))?;
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let mut meta = std::fs::File::create(self.meta_path(&job.address))?;
        writeln!(meta, "address={}", job.address.as_str())?;
        writeln!(meta, "class={}", job.class)?;
        writeln!(meta, "title={}", job.title)?;
        writeln!(meta, "workspace={}", job.workspace)?;
        writeln!(meta, "timestamp={timestamp}")?;
        writeln!(meta, "width={}", job.width)?;
        writeln!(meta, "height={}", job.height)?;
        trace!("stored thumbnail for {}", job.address);
        Ok(true)
    }
}

fn run_tool(tool: &'static str, cmd: &mut Command) -> Result<(), CaptureError> {
    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if status.success() {
        Ok(())
    } else {
        Err(CaptureError::Tool { tool, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::WorkspaceRef;

    fn job(addr: &str, workspace: &str) -> CaptureJob {
        CaptureJob {
            address: addr.into(),
            class: "kitty".into(),
            title: "zsh".into(),
            workspace: workspace.into(),
            x: 0,
            y: 0,
            width: 100,
            height: 50,
        }
    }

    fn cache_on(dir: &Path, current: &'static str) -> ThumbnailCache {
        let lookup: WorkspaceLookup = Arc::new(move |_| Some(current.to_string()));
        ThumbnailCache::with_tool(dir.to_path_buf(), None, lookup)
    }

    #[test]
    fn commit_stores_image_and_meta() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_on(dir.path(), "3");
        let temp = dir.path().join("x.small.tmp");
        std::fs::write(&temp, b"png").unwrap();

        assert!(cache.commit(&job("55aa", "3"), &temp).unwrap());
        let stored = cache.thumbnail_path(&"55aa".into()).unwrap();
        assert_eq!(stored, dir.path().join("55aa.png"));
        let meta = std::fs::read_to_string(dir.path().join("55aa.meta")).unwrap();
        assert!(meta.contains("workspace=3\n"));
        assert!(meta.contains("class=kitty\n"));
        assert!(!temp.exists());
    }

    #[test]
    fn commit_discards_when_window_moved() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_on(dir.path(), "4");
        let temp = dir.path().join("x.small.tmp");
        std::fs::write(&temp, b"png").unwrap();

        assert!(!cache.commit(&job("55aa", "3"), &temp).unwrap());
        assert!(cache.thumbnail_path(&"55aa".into()).is_none());
        assert!(!temp.exists());
    }

    #[test]
    fn clear_removes_cached_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_on(dir.path(), "3");
        std::fs::write(dir.path().join("a.png"), b"").unwrap();
        std::fs::write(dir.path().join("a.meta"), b"").unwrap();
        std::fs::write(dir.path().join("keep.txt"), b"").unwrap();
        cache.clear();
        assert!(!dir.path().join("a.png").exists());
        assert!(!dir.path().join("a.meta").exists());
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn unavailable_cache_ignores_captures() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache_on(dir.path(), "3");
        assert!(!cache.is_available());
        cache.capture(vec![job("a", "3")]);
        assert!(cache.thumbnail_path(&"a".into()).is_none());
    }

    #[test]
    fn job_from_client_uses_geometry() {
        let client = ClientInfo {
            address: "0xbeef".into(),
            workspace: WorkspaceRef { id: -98, name: "special:term".into() },
            at: [10, 20],
            size: [300, 200],
            ..Default::default()
        };
        let j = CaptureJob::from_client(&client);
        assert_eq!(j.workspace, "term");
        assert_eq!(j.geometry(), "10,20 300x200");
    }
}
