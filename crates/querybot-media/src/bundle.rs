//! Bundles result images into one ZIP archive.
//!
//! Every call stages its downloads in a private temp directory that is
//! removed when the call returns, whether it succeeded or not. The archive
//! itself is handed to the caller as a [`TempPath`]; dropping it deletes the
//! file.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use futures_util::future::try_join_all;
use reqwest::header::CONTENT_TYPE;
use tempfile::TempPath;
use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use querybot_core::types::ImageRef;

use crate::error::BundleError;

pub struct ArtifactBundler {
    client: reqwest::Client,
    work_dir: PathBuf,
}

impl ArtifactBundler {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            work_dir: work_dir.into(),
        }
    }

    /// Fetch every image and package them into a single archive.
    ///
    /// Fails as a whole if any single fetch fails; no archive is left behind.
    pub async fn bundle(&self, images: &[ImageRef]) -> Result<TempPath, BundleError> {
        if images.is_empty() {
            return Err(BundleError::Empty);
        }

        tokio::fs::create_dir_all(&self.work_dir).await?;
        let staging = tempfile::Builder::new()
            .prefix("bundle-")
            .tempdir_in(&self.work_dir)?;

        let fetches = images
            .iter()
            .enumerate()
            .map(|(index, image)| self.fetch(index, image, staging.path()));
        let files = try_join_all(fetches).await?;

        let (file, archive) = tempfile::Builder::new()
            .prefix("images-")
            .suffix(".zip")
            .tempfile_in(&self.work_dir)?
            .into_parts();

        tokio::task::spawn_blocking(move || write_archive(file, &files))
            .await
            .map_err(io::Error::other)??;

        info!(images = images.len(), archive = %archive.display(), "bundled result images");
        Ok(archive)
    }

    async fn fetch(&self, index: usize, image: &ImageRef, dir: &Path) -> Result<PathBuf, BundleError> {
        let url = image.url.as_str();
        let fetch_err = |source: reqwest::Error| BundleError::Fetch {
            url: url.to_string(),
            source,
        };

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fetch_err)?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await.map_err(fetch_err)?;

        let dest = dir.join(entry_name(index, url, content_type.as_deref()));
        tokio::fs::write(&dest, &bytes).await?;
        debug!(
            url,
            alt = image.alt.as_deref().unwrap_or_default(),
            bytes = bytes.len(),
            "fetched image"
        );
        Ok(dest)
    }
}

fn write_archive(file: File, files: &[PathBuf]) -> Result<(), BundleError> {
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        writer.start_file(name, options)?;
        let mut src = File::open(path)?;
        io::copy(&mut src, &mut writer)?;
    }

    writer.finish()?;
    Ok(())
}

/// Deterministic, collision-free archive entry name: `NN_<basename>[.ext]`.
fn entry_name(index: usize, url: &str, content_type: Option<&str>) -> String {
    let basename = reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .map(|s| {
            s.chars()
                .map(|c| {
                    if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                        c
                    } else {
                        '_'
                    }
                })
                .collect::<String>()
        })
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .unwrap_or_else(|| "image".to_string());

    let mut name = format!("{:02}_{}", index + 1, basename);
    if !basename.contains('.') {
        name.push('.');
        name.push_str(extension_for(content_type));
    }
    name
}

fn extension_for(content_type: Option<&str>) -> &'static str {
    let mime = content_type
        .and_then(|c| c.split(';').next())
        .map(str::trim)
        .unwrap_or_default();
    match mime {
        "image/gif" => "gif",
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn dir_entries(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    async fn serve_gif(server: &MockServer, at: &str) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "image/gif")
                    .set_body_bytes(b"GIF89a-fake".to_vec()),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn entry_name_uses_basename_and_index() {
        assert_eq!(
            entry_name(0, "https://img.example/a/plot.png", Some("image/png")),
            "01_plot.png"
        );
        assert_eq!(
            entry_name(9, "https://img.example/Calculate/MSP/MSP123?s=2", Some("image/gif")),
            "10_MSP123.gif"
        );
    }

    #[test]
    fn entry_name_falls_back_for_odd_urls() {
        assert_eq!(entry_name(1, "not a url", None), "02_image.bin");
        assert_eq!(entry_name(2, "https://img.example/", Some("image/jpeg; q=1")), "03_image.jpg");
    }

    #[tokio::test]
    async fn bundles_all_images_and_removes_staging() {
        let server = MockServer::start().await;
        serve_gif(&server, "/img/one").await;
        serve_gif(&server, "/img/two").await;

        let work = tempfile::tempdir().unwrap();
        let bundler = ArtifactBundler::new(work.path());
        let images = vec![
            ImageRef::new(format!("{}/img/one", server.uri())),
            ImageRef::new(format!("{}/img/two", server.uri())),
        ];

        let archive = bundler.bundle(&images).await.unwrap();
        assert!(archive.exists());
        assert_eq!(dir_entries(work.path()), vec![archive.to_path_buf()]);

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let mut names: Vec<String> = (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["01_one.gif", "02_two.gif"]);

        let archive_path = archive.to_path_buf();
        drop(archive);
        assert!(!archive_path.exists());
    }

    #[tokio::test]
    async fn one_failed_fetch_fails_the_bundle_and_cleans_up() {
        let server = MockServer::start().await;
        serve_gif(&server, "/img/one").await;
        Mock::given(method("GET"))
            .and(path("/img/two"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let work = tempfile::tempdir().unwrap();
        let bundler = ArtifactBundler::new(work.path());
        let u2 = format!("{}/img/two", server.uri());
        let images = vec![
            ImageRef::new(format!("{}/img/one", server.uri())),
            ImageRef::new(u2.clone()),
        ];

        let err = bundler.bundle(&images).await.unwrap_err();
        assert!(matches!(err, BundleError::Fetch { ref url, .. } if *url == u2));
        assert!(dir_entries(work.path()).is_empty());
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let work = tempfile::tempdir().unwrap();
        let err = ArtifactBundler::new(work.path()).bundle(&[]).await.unwrap_err();
        assert!(matches!(err, BundleError::Empty));
        assert!(dir_entries(work.path()).is_empty());
    }
}
