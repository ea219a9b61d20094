//! Office Open XML (.docx) package codec.

use std::io::{Cursor, Read, Seek, Write};

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::codec::{reader, writer, DocumentCodec};
use crate::error::{DocxServerError, Result};
use crate::model::{DocumentModel, StyleSheet};

const DEFAULT_DOCUMENT_PART: &str = "word/document.xml";

/// Codec for WordprocessingML packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxCodec;

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Option<String>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut content = String::new();
            file.read_to_string(&mut content)
                .map_err(|e| DocxServerError::Format(format!("cannot read part {name}: {e}")))?;
            Ok(Some(content))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(DocxServerError::format(e)),
    }
}

fn read_binary_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>> {
    match archive.by_name(name) {
        Ok(mut file) => {
            let mut content = Vec::new();
            file.read_to_end(&mut content)
                .map_err(|e| DocxServerError::Format(format!("cannot read part {name}: {e}")))?;
            Ok(Some(content))
        }
        Err(ZipError::FileNotFound) => Ok(None),
        Err(e) => Err(DocxServerError::format(e)),
    }
}

/// Resolve a relationship target relative to the directory of its source part.
fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let mut segments: Vec<&str> = source_part.split('/').collect();
    segments.pop();
    for segment in target.split('/') {
        match segment {
            "." | "" => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// `word/_rels/document.xml.rels` for `word/document.xml`.
fn rels_part_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

impl DocumentCodec for DocxCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DocumentModel> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| DocxServerError::Format(format!("not a DOCX package: {e}")))?;

        let document_part = match read_part(&mut archive, "_rels/.rels")? {
            Some(rels) => reader::relationship_target(&rels, "officeDocument")?
                .map(|target| resolve_target("", &target))
                .unwrap_or_else(|| DEFAULT_DOCUMENT_PART.to_string()),
            None => DEFAULT_DOCUMENT_PART.to_string(),
        };

        let document_xml = read_part(&mut archive, &document_part)?.ok_or_else(|| {
            DocxServerError::Format(format!("package has no main document part ({document_part})"))
        })?;
        let document_rels = read_part(&mut archive, &rels_part_for(&document_part))?;

        let images = match &document_rels {
            Some(rels) => reader::image_targets(rels)?,
            None => Default::default(),
        };
        let blocks = reader::read_body(&document_xml, &mut |rel_id: &str| {
            match images.get(rel_id) {
                Some(target) => read_binary_part(&mut archive, &resolve_target(&document_part, target)),
                None => Ok(None),
            }
        })?;

        let styles_part = match &document_rels {
            Some(rels) => reader::relationship_target(rels, "styles")?
                .map(|target| resolve_target(&document_part, &target)),
            None => None,
        };
        let styles = match styles_part {
            Some(part) => match read_part(&mut archive, &part)? {
                Some(xml) => StyleSheet::from_styles(reader::read_styles(&xml)?),
                None => StyleSheet::builtin(),
            },
            None => StyleSheet::builtin(),
        };

        Ok(DocumentModel::from_parts(blocks, styles))
    }

    fn encode(&self, model: &DocumentModel) -> Result<Vec<u8>> {
        let parts = [
            ("[Content_Types].xml", writer::content_types_xml(model)?),
            ("_rels/.rels", writer::PACKAGE_RELS_XML.to_string()),
            ("word/document.xml", writer::document_xml(model)?),
            ("word/_rels/document.xml.rels", writer::document_rels_xml(model)?),
            ("word/styles.xml", writer::styles_xml(model.styles())?),
        ];

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in &parts {
            zip.start_file(*name, options)
                .map_err(|e| DocxServerError::internal(format!("zip write failed: {e}")))?;
            zip.write_all(content.as_bytes())?;
        }
        // Image data is already compressed.
        let media_options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        for (number, picture) in (1..).zip(writer::pictures(model)) {
            let name = format!("word/{}", writer::media_target(number, picture));
            zip.start_file(name, media_options)
                .map_err(|e| DocxServerError::internal(format!("zip write failed: {e}")))?;
            zip.write_all(picture.data())?;
        }
        let cursor = zip
            .finish()
            .map_err(|e| DocxServerError::internal(format!("zip write failed: {e}")))?;
        Ok(cursor.into_inner())
    }
}
