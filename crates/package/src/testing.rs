//! In-process `.nupkg` construction for tests.

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::result::ZipResult;
use zip::write::SimpleFileOptions;

/// Builds small package archives in memory. Every archive gets a manifest
/// with an id, version, author and description unless
/// [`without_manifest`](Self::without_manifest) is used.
#[derive(Debug, Clone)]
pub struct NupkgBuilder {
    id: String,
    version: String,
    description: String,
    metadata: Vec<String>,
    files: Vec<(String, Vec<u8>)>,
    with_manifest: bool,
}
impl NupkgBuilder {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
            description: "Test package".to_string(),
            metadata: Vec::new(),
            files: Vec::new(),
            with_manifest: true,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Raw XML appended inside `<metadata>`.
    pub fn metadata(mut self, xml: impl Into<String>) -> Self {
        self.metadata.push(xml.into());
        self
    }

    pub fn file(mut self, path: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.files.push((path.into(), data.into()));
        self
    }

    /// Embed `README.md` and declare it in the manifest.
    pub fn readme(self, data: impl Into<Vec<u8>>) -> Self {
        self.metadata("<readme>README.md</readme>").file("README.md", data)
    }

    /// Embed `icon.png` and declare it in the manifest.
    pub fn icon(self, data: impl Into<Vec<u8>>) -> Self {
        self.metadata("<icon>icon.png</icon>").file("icon.png", data)
    }

    pub fn without_manifest(mut self) -> Self {
        self.with_manifest = false;
        self
    }

    pub fn nuspec(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                r#"<package xmlns="http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd">"#,
                "<metadata><id>{}</id><version>{}</version><authors>Tester</authors>",
                "<description>{}</description>{}</metadata></package>",
            ),
            self.id,
            self.version,
            self.description,
            self.metadata.concat(),
        )
    }

    pub fn try_build(&self) -> ZipResult<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        if self.with_manifest {
            zip.start_file(format!("{}.nuspec", self.id), options)?;
            zip.write_all(self.nuspec().as_bytes())?;
        }
        for (path, data) in &self.files {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(data)?;
        }
        Ok(zip.finish()?.into_inner())
    }

    /// Panics if the archive cannot be written; only meant for test setup.
    pub fn build(&self) -> Vec<u8> {
        match self.try_build() {
            Ok(bytes) => bytes,
            Err(err) => panic!("NupkgBuilder::build: {err}"),
        }
    }
}
