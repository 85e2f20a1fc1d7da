//! Document assembly: copy one page out of each captured single-page PDF
//! into a new document, in capture order.
//!
//! Each capture is a complete PDF with its own object numbering. Its objects
//! are renumbered past the ones already in the output, then only the objects
//! reachable from the page (content streams, resources, fonts, images) are
//! copied. Page-tree nodes are never copied; attributes the page inherited
//! from them (`MediaBox`, `Resources`, …) are materialised on the page first.

use crate::error::ExportError;
use crate::pipeline::capture::CapturedPage;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const PDF_VERSION: &str = "1.7";

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Bound on page-tree depth when resolving inherited attributes.
const MAX_TREE_DEPTH: usize = 64;

/// Tolerance, in points, for the page-size check.
const SIZE_TOLERANCE_PT: f64 = 1.0;

/// Builds the final multi-page document one captured page at a time.
pub struct DocumentAssembler {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentAssembler {
    pub fn new() -> Self {
        let mut document = Document::with_version(PDF_VERSION);
        let pages_id = document.new_object_id();
        Self {
            document,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append the single page of `page`. The intermediate file is removed
    /// when this returns, on success or failure.
    pub fn append(&mut self, page: CapturedPage) -> Result<(), ExportError> {
        let index = page.index();
        let source = Document::load(page.path()).map_err(|e| ExportError::AssemblyFailed {
            index,
            detail: format!("cannot parse captured document: {e}"),
        })?;
        let (width, height) = page.resolution().page_size_points();
        drop(page);

        self.append_document(index, source, (width, height))
    }

    /// Append the first page of an already-parsed document.
    fn append_document(
        &mut self,
        index: usize,
        mut source: Document,
        expected_size: (f64, f64),
    ) -> Result<(), ExportError> {
        let failed = |detail: String| ExportError::AssemblyFailed { index, detail };

        source.renumber_objects_with(self.document.max_id + 1);

        let page_id = *source
            .get_pages()
            .values()
            .next()
            .ok_or_else(|| failed("captured document has no pages".into()))?;
        let mut page = source
            .get_dictionary(page_id)
            .map_err(|e| failed(format!("page object is unreadable: {e}")))?
            .clone();

        for key in INHERITABLE {
            if !page.has(key) {
                if let Some(value) = inherited_attribute(&source, &page, key) {
                    page.set(key.to_vec(), value);
                }
            }
        }
        page.remove(b"Parent");

        check_page_size(index, &source, &page, expected_size);

        for id in reachable_objects(&source, page_id, &page) {
            if let Ok(object) = source.get_object(id) {
                self.document.objects.insert(id, object.clone());
            }
        }

        page.set("Parent", self.pages_id);
        self.document
            .objects
            .insert(page_id, Object::Dictionary(page));
        self.document.max_id = self.document.max_id.max(source.max_id);
        self.kids.push(Object::Reference(page_id));

        debug!("Appended page {} as object {:?}", index + 1, page_id);
        Ok(())
    }

    /// Close the page tree and serialise the document.
    pub fn finish(mut self) -> io::Result<Vec<u8>> {
        let count = self.kids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.document.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        self.document.save_to(&mut buf)?;
        Ok(buf)
    }

    /// Serialise and write to `output`, replacing any existing file.
    ///
    /// The bytes go to a sibling `.<name>.tmp` file which is then renamed
    /// over `output`, so a failed write leaves the previous file untouched.
    /// A replaced file keeps its permissions; a new one gets the process
    /// defaults. Returns the number of bytes written.
    pub fn write_to(self, output: &Path) -> Result<u64, ExportError> {
        let pages = self.page_count();
        let write_failed = |source: io::Error| ExportError::OutputWriteFailed {
            path: output.to_path_buf(),
            source,
        };
        let bytes = self.finish().map_err(write_failed)?;

        let parent = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(write_failed)?;

        let tmp_path = sibling_tmp_path(parent, output);
        if let Err(e) = write_synced(&tmp_path, &bytes, output)
            .and_then(|_| fs::rename(&tmp_path, output))
        {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                debug!("No temp file to remove at {}: {}", tmp_path.display(), cleanup);
            }
            return Err(write_failed(e));
        }

        info!(
            "Wrote {} pages ({} bytes) to {}",
            pages,
            bytes.len(),
            output.display()
        );
        Ok(bytes.len() as u64)
    }
}

fn sibling_tmp_path(parent: &Path, output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    parent.join(format!(".{name}.tmp"))
}

/// Write `bytes` to a fresh file at `path`, carrying over the permissions of
/// `replacing` when it exists, and flush it to disk.
fn write_synced(path: &Path, bytes: &[u8], replacing: &Path) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    if let Ok(existing) = fs::metadata(replacing) {
        if existing.is_file() {
            file.set_permissions(existing.permissions())?;
        }
    }
    file.sync_all()
}

/// Look `key` up on the page's ancestors.
fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

fn is_tree_node(object: &Object) -> bool {
    let dict = match object {
        Object::Dictionary(d) => d,
        _ => return false,
    };
    matches!(
        dict.get(b"Type").and_then(Object::as_name),
        Ok(b"Pages") | Ok(b"Catalog")
    )
}

fn push_references(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => items.iter().for_each(|o| push_references(o, out)),
        Object::Dictionary(dict) => dict.iter().for_each(|(_, o)| push_references(o, out)),
        Object::Stream(stream) => stream.dict.iter().for_each(|(_, o)| push_references(o, out)),
        _ => {}
    }
}

/// Every object reachable from `page`, excluding the page itself and the
/// page tree.
fn reachable_objects(doc: &Document, page_id: ObjectId, page: &Dictionary) -> BTreeSet<ObjectId> {
    let mut seen = BTreeSet::from([page_id]);
    let mut pending = Vec::new();
    page.iter().for_each(|(_, o)| push_references(o, &mut pending));

    let mut reachable = BTreeSet::new();
    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        let Ok(object) = doc.get_object(id) else {
            continue;
        };
        if is_tree_node(object) {
            continue;
        }
        push_references(object, &mut pending);
        reachable.insert(id);
    }
    reachable
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

fn check_page_size(index: usize, doc: &Document, page: &Dictionary, expected: (f64, f64)) {
    let media_box = page.get(b"MediaBox").ok().and_then(|o| match o {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    });
    let Some(Object::Array(values)) = media_box else {
        warn!("Page {} has no MediaBox", index + 1);
        return;
    };
    let coords: Vec<f64> = values.iter().filter_map(number).collect();
    if coords.len() != 4 {
        warn!("Page {} has a malformed MediaBox", index + 1);
        return;
    }
    let (width, height) = ((coords[2] - coords[0]).abs(), (coords[3] - coords[1]).abs());
    if (width - expected.0).abs() > SIZE_TOLERANCE_PT
        || (height - expected.1).abs() > SIZE_TOLERANCE_PT
    {
        warn!(
            "Page {} is {:.1}x{:.1}pt, expected {:.1}x{:.1}pt",
            index + 1,
            width,
            height,
            expected.0,
            expected.1
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Stream;

    /// A one-page document whose MediaBox sits on the Pages node, the way
    /// some encoders emit it.
    fn single_page(width: f32, height: f32, marker: &str) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            format!("BT /F1 24 Tf 10 10 Td ({marker}) Tj ET").into_bytes(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "Marker" => Object::string_literal(marker),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(width),
                    Object::Real(height),
                ],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn markers(bytes: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|id| {
                let page = doc.get_dictionary(*id).unwrap();
                String::from_utf8(page.get(b"Marker").unwrap().as_str().unwrap().to_vec()).unwrap()
            })
            .collect()
    }

    #[test]
    fn pages_keep_append_order() {
        let mut asm = DocumentAssembler::new();
        for (i, m) in ["a", "b", "c"].iter().enumerate() {
            asm.append_document(i, single_page(1440.0, 810.0, m), (1440.0, 810.0))
                .unwrap();
        }
        assert_eq!(asm.page_count(), 3);
        let bytes = asm.finish().unwrap();
        assert_eq!(markers(&bytes), vec!["a", "b", "c"]);
    }

    #[test]
    fn inherited_media_box_is_materialised() {
        let mut asm = DocumentAssembler::new();
        asm.append_document(0, single_page(2880.0, 1620.0, "x"), (2880.0, 1620.0))
            .unwrap();
        let bytes = asm.finish().unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box: Vec<f64> = page
            .get(b"MediaBox")
            .unwrap()
            .as_array()
            .unwrap()
            .iter()
            .filter_map(number)
            .collect();
        assert_eq!(media_box, vec![0.0, 0.0, 2880.0, 1620.0]);
        assert!(page.has(b"Resources"));
    }

    #[test]
    fn copied_resources_resolve() {
        let mut asm = DocumentAssembler::new();
        asm.append_document(0, single_page(100.0, 100.0, "p"), (100.0, 100.0))
            .unwrap();
        asm.append_document(1, single_page(100.0, 100.0, "q"), (100.0, 100.0))
            .unwrap();
        let doc = Document::load_mem(&asm.finish().unwrap()).unwrap();
        for id in doc.get_pages().values() {
            let page = doc.get_dictionary(*id).unwrap();
            let contents = page.get(b"Contents").unwrap().as_reference().unwrap();
            assert!(doc.get_object(contents).unwrap().as_stream().is_ok());
            let fonts = page
                .get(b"Resources")
                .unwrap()
                .as_dict()
                .unwrap()
                .get(b"Font")
                .unwrap()
                .as_dict()
                .unwrap();
            let font = fonts.get(b"F1").unwrap().as_reference().unwrap();
            assert!(doc.get_dictionary(font).is_ok());
        }
    }

    #[test]
    fn document_without_pages_fails_with_index() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        });
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);

        let mut asm = DocumentAssembler::new();
        let err = asm.append_document(4, doc, (1.0, 1.0)).unwrap_err();
        assert!(matches!(err, ExportError::AssemblyFailed { index: 4, .. }), "got {err:?}");
    }

    #[test]
    fn write_to_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("deck.pdf");
        std::fs::create_dir_all(out.parent().unwrap()).unwrap();
        std::fs::write(&out, b"old contents").unwrap();

        let mut asm = DocumentAssembler::new();
        asm.append_document(0, single_page(10.0, 10.0, "only"), (10.0, 10.0))
            .unwrap();
        let written = asm.write_to(&out).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(bytes.len() as u64, written);
        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert_eq!(markers(&bytes), vec!["only"]);

        let leftovers: Vec<_> = std::fs::read_dir(out.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1, "temp file left behind: {leftovers:?}");
    }

    fn one_page_assembler() -> DocumentAssembler {
        let mut asm = DocumentAssembler::new();
        asm.append_document(0, single_page(10.0, 10.0, "only"), (10.0, 10.0))
            .unwrap();
        asm
    }

    #[cfg(unix)]
    #[test]
    fn replaced_output_keeps_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("deck.pdf");
        std::fs::write(&out, b"old").unwrap();
        std::fs::set_permissions(&out, std::fs::Permissions::from_mode(0o640)).unwrap();

        one_page_assembler().write_to(&out).unwrap();

        let mode = std::fs::metadata(&out).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn new_output_gets_default_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let reference = dir.path().join("reference");
        File::create(&reference).unwrap();
        let out = dir.path().join("deck.pdf");

        one_page_assembler().write_to(&out).unwrap();

        let mode = |p: &Path| std::fs::metadata(p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode(&out), mode(&reference));
    }

    #[test]
    fn unwritable_output_reports_path_and_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("deck.pdf");
        std::fs::create_dir(&out).unwrap();

        let err = one_page_assembler().write_to(&out).unwrap_err();
        match &err {
            ExportError::OutputWriteFailed { path, .. } => assert_eq!(path, &out),
            other => panic!("expected OutputWriteFailed, got {other:?}"),
        }
        assert_eq!(err.exit_code(), 7);
        assert!(out.is_dir());
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("deck.pdf")]);
    }
}
