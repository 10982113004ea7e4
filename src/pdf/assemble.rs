//! Building the output document from a resolved selection.

use super::document::{unreadable, SourceDocument};
use crate::error::Result;
use crate::resolve::ResolvedSelection;
use crate::selection::{derive_selection, GenerationRequest, Layout};
use crate::source::{PageRef, PerSource};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;
use std::path::Path;

/// US Letter, used when a page has no MediaBox anywhere in its tree
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Attributes a page may inherit from its ancestors in the page tree
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Page keys that point back into the source page tree
const SKIPPED_KEYS: [&[u8]; 4] = [b"Parent", b"Annots", b"B", b"StructParents"];

/// Parse, order, validate and assemble in one go
pub fn generate(
    request: &GenerationRequest,
    documents: &PerSource<SourceDocument>,
) -> Result<(ResolvedSelection, Document)> {
    let page_counts = documents.map(SourceDocument::page_count);
    let selection = derive_selection(request, &page_counts)?;
    let output = assemble(&selection, documents, request.layout)?;
    Ok((selection, output))
}

/// Build a new document holding the selected pages in order.
///
/// Nothing is returned unless every page could be read.
pub fn assemble(
    selection: &ResolvedSelection,
    documents: &PerSource<SourceDocument>,
    layout: Layout,
) -> Result<Document> {
    let mut assembler = Assembler::new(documents);
    match layout {
        Layout::Sequential => {
            for &page in selection.pages() {
                assembler.import_page(page)?;
            }
        }
        Layout::TwoUp => {
            for (left, right) in selection.pairs() {
                assembler.two_up_sheet(left, right)?;
            }
        }
    }
    log::info!(
        "assembled {} page(s) onto {} sheet(s)",
        selection.len(),
        assembler.kids.len()
    );
    Ok(assembler.finish())
}

/// Save to a file
pub fn save<P: AsRef<Path>>(doc: &mut Document, path: P) -> Result<()> {
    doc.save(&path)?;
    Ok(())
}

struct Assembler<'a> {
    documents: &'a PerSource<SourceDocument>,
    output: Document,
    pages_tree_id: ObjectId,
    kids: Vec<Object>,
    /// Source object ID -> output object ID, per source document
    copied: PerSource<HashMap<ObjectId, ObjectId>>,
    /// Form XObjects already made for two-up sheets
    forms: HashMap<PageRef, ObjectId>,
}

impl<'a> Assembler<'a> {
    fn new(documents: &'a PerSource<SourceDocument>) -> Self {
        let mut output = Document::with_version("1.7");
        let pages_tree_id = output.new_object_id();
        Assembler {
            documents,
            output,
            pages_tree_id,
            kids: Vec::new(),
            copied: PerSource::default(),
            forms: HashMap::new(),
        }
    }

    /// Copy one source page as one output page
    fn import_page(&mut self, page: PageRef) -> Result<ObjectId> {
        let documents = self.documents;
        let source = &documents[page.source];
        let (_, page_dict) = source.page(page.source, page.page)?;
        let cache = &mut self.copied[page.source];

        let mut new_page = Dictionary::new();
        for (key, value) in page_dict.iter() {
            if SKIPPED_KEYS.contains(&key.as_slice()) {
                continue;
            }
            let value = copy_object_deep(&mut self.output, &source.doc, value, cache)
                .map_err(|e| unreadable(page.source, page.page, e))?;
            new_page.set(key.clone(), value);
        }

        for key in INHERITABLE {
            if new_page.has(key) {
                continue;
            }
            if let Some(value) = source.inherited(page_dict, key) {
                let value = copy_object_deep(&mut self.output, &source.doc, value, cache)
                    .map_err(|e| unreadable(page.source, page.page, e))?;
                new_page.set(key.to_vec(), value);
            }
        }

        if !new_page.has(b"MediaBox") {
            new_page.set("MediaBox", box_object(DEFAULT_MEDIA_BOX));
        }
        new_page.set("Parent", Object::Reference(self.pages_tree_id));

        let page_id = self.output.add_object(new_page);
        self.kids.push(Object::Reference(page_id));
        Ok(page_id)
    }

    /// Place two pages side by side on one sheet; `right` is blank when `None`
    fn two_up_sheet(&mut self, left: PageRef, right: Option<PageRef>) -> Result<ObjectId> {
        let mut slots = vec![left];
        slots.extend(right);

        let mut placed = Vec::new();
        for page in slots {
            let form = self.page_form(page)?;
            let media_box = self.media_box(page)?;
            placed.push((form, media_box));
        }

        // Each half is as large as the larger page of the pair
        let cell_width = placed
            .iter()
            .map(|(_, b)| box_width(b))
            .fold(0.0, f32::max);
        let cell_height = placed
            .iter()
            .map(|(_, b)| box_height(b))
            .fold(0.0, f32::max);

        let mut xobjects = Dictionary::new();
        let mut content = String::new();
        for (slot, (form, media_box)) in placed.iter().enumerate() {
            let name = format!("P{}", slot);
            xobjects.set(name.as_bytes(), Object::Reference(*form));

            let (width, height) = (box_width(media_box), box_height(media_box));
            let scale = if width > 0.0 && height > 0.0 {
                (cell_width / width).min(cell_height / height)
            } else {
                1.0
            };
            let x = slot as f32 * cell_width + (cell_width - width * scale) / 2.0
                - media_box[0] * scale;
            let y = (cell_height - height * scale) / 2.0 - media_box[1] * scale;
            content.push_str(&format!(
                "q {} 0 0 {} {} {} cm /{} Do Q\n",
                scale, scale, x, y, name
            ));
        }

        let mut resources = Dictionary::new();
        resources.set("XObject", Object::Dictionary(xobjects));
        let content_id = self
            .output
            .add_object(Stream::new(Dictionary::new(), content.into_bytes()));

        let sheet = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_tree_id)),
            (
                "MediaBox",
                box_object([0.0, 0.0, 2.0 * cell_width, cell_height]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        let sheet_id = self.output.add_object(sheet);
        self.kids.push(Object::Reference(sheet_id));
        Ok(sheet_id)
    }

    /// Wrap a source page as a Form XObject in the output
    fn page_form(&mut self, page: PageRef) -> Result<ObjectId> {
        if let Some(&id) = self.forms.get(&page) {
            return Ok(id);
        }

        let documents = self.documents;
        let source = &documents[page.source];
        let (page_id, page_dict) = source.page(page.source, page.page)?;
        let content = source
            .doc
            .get_page_content(page_id)
            .map_err(|e| unreadable(page.source, page.page, e))?;
        let media_box = self.media_box(page)?;

        let mut form = Dictionary::new();
        form.set("Type", Object::Name(b"XObject".to_vec()));
        form.set("Subtype", Object::Name(b"Form".to_vec()));
        form.set("FormType", Object::Integer(1));
        form.set("BBox", box_object(media_box));

        if let Some(resources) = source.inherited(page_dict, b"Resources") {
            let cache = &mut self.copied[page.source];
            let resources = copy_object_deep(&mut self.output, &source.doc, resources, cache)
                .map_err(|e| unreadable(page.source, page.page, e))?;
            form.set("Resources", resources);
        }

        let id = self.output.add_object(Stream::new(form, content));
        self.forms.insert(page, id);
        Ok(id)
    }

    fn media_box(&self, page: PageRef) -> Result<[f32; 4]> {
        let source = &self.documents[page.source];
        let (_, page_dict) = source.page(page.source, page.page)?;
        let media_box = source
            .inherited(page_dict, b"MediaBox")
            .and_then(|obj| resolve_box(&source.doc, obj))
            .unwrap_or(DEFAULT_MEDIA_BOX);
        Ok(media_box)
    }

    fn finish(mut self) -> Document {
        let count = self.kids.len() as i64;
        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(self.kids)),
            ("Count", Object::Integer(count)),
        ]);
        self.output
            .objects
            .insert(self.pages_tree_id, Object::Dictionary(pages));

        let catalog_id = self.output.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_tree_id)),
        ]));
        self.output.trailer.set("Root", catalog_id);
        self.output
    }
}

/// Deep copy an object from a source document into the output, following
/// references.
///
/// Each source object is copied at most once; its output ID is recorded
/// before its contents are copied so reference cycles terminate.
fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> lopdf::Result<Object> {
    match obj {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Ok(Object::Reference(new_id));
            }

            let referenced = source.get_object(*id)?;
            let new_id = output.new_object_id();
            cache.insert(*id, new_id);

            let copied = copy_object_deep(output, source, referenced, cache)?;
            output.objects.insert(new_id, copied);

            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => Ok(Object::Dictionary(copy_dictionary(
            output, source, dict, cache,
        )?)),
        Object::Array(arr) => {
            let new_arr = arr
                .iter()
                .map(|item| copy_object_deep(output, source, item, cache))
                .collect::<lopdf::Result<Vec<_>>>()?;
            Ok(Object::Array(new_arr))
        }
        Object::Stream(stream) => {
            let mut copied = Stream::new(
                copy_dictionary(output, source, &stream.dict, cache)?,
                stream.content.clone(),
            );
            copied.allows_compression = stream.allows_compression;
            Ok(Object::Stream(copied))
        }
        _ => Ok(obj.clone()),
    }
}

fn copy_dictionary(
    output: &mut Document,
    source: &Document,
    dict: &Dictionary,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> lopdf::Result<Dictionary> {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
    }
    Ok(new_dict)
}

fn resolve_box(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let obj = match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let values = obj.as_array().ok()?;
    if values.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = value.as_float().ok()?;
    }
    // Normalize so that [0],[1] is the lower-left corner
    Some([
        out[0].min(out[2]),
        out[1].min(out[3]),
        out[0].max(out[2]),
        out[1].max(out[3]),
    ])
}

fn box_width(b: &[f32; 4]) -> f32 {
    b[2] - b[0]
}

fn box_height(b: &[f32; 4]) -> f32 {
    b[3] - b[1]
}

fn box_object(b: [f32; 4]) -> Object {
    Object::Array(b.iter().map(|&v| Object::Real(v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MixError;
    use crate::pdf::document::tests::{test_pdf, test_source};
    use crate::resolve::resolve;
    use crate::selection::OrderInput;
    use crate::source::Source;

    fn documents(pages_a: u32, pages_b: u32) -> PerSource<SourceDocument> {
        PerSource::new(test_source("A", pages_a), test_source("B", pages_b))
    }

    fn select(documents: &PerSource<SourceDocument>, order: &str) -> ResolvedSelection {
        let candidate = crate::order::parse_order(order).unwrap().pages().collect();
        resolve(candidate, &documents.map(SourceDocument::page_count)).unwrap()
    }

    fn page_contents(doc: &Document) -> Vec<String> {
        doc.get_pages()
            .values()
            .map(|&id| String::from_utf8_lossy(&doc.get_page_content(id).unwrap()).into_owned())
            .collect()
    }

    fn form_content(doc: &Document, sheet_id: ObjectId, name: &[u8]) -> String {
        let sheet = doc.get_dictionary(sheet_id).unwrap();
        let resources = sheet.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        let form_id = xobjects.get(name).unwrap().as_reference().unwrap();
        let form = doc.get_object(form_id).unwrap().as_stream().unwrap();
        String::from_utf8_lossy(&form.content).into_owned()
    }

    #[test]
    fn test_sequential_order() {
        let docs = documents(3, 3);
        let selection = select(&docs, "B2,A1,A3,B1");
        let out = assemble(&selection, &docs, Layout::Sequential).unwrap();

        let contents = page_contents(&out);
        assert_eq!(contents.len(), 4);
        for (content, marker) in contents.iter().zip(["% B2", "% A1", "% A3", "% B1"]) {
            assert!(content.contains(marker), "{content:?} lacks {marker}");
        }
    }

    #[test]
    fn test_sequential_repeated_page() {
        let docs = documents(2, 1);
        let selection = select(&docs, "A1,A1");
        let out = assemble(&selection, &docs, Layout::Sequential).unwrap();

        let ids: Vec<ObjectId> = out.get_pages().into_values().collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);

        // The content stream is shared, not copied twice
        let contents = |id: ObjectId| {
            out.get_dictionary(id)
                .unwrap()
                .get(b"Contents")
                .unwrap()
                .as_reference()
                .unwrap()
        };
        assert_eq!(contents(ids[0]), contents(ids[1]));
    }

    #[test]
    fn test_sequential_carries_inherited_media_box() {
        let docs = documents(1, 1);
        let selection = select(&docs, "A1");
        let out = assemble(&selection, &docs, Layout::Sequential).unwrap();

        let page_id = out.get_pages()[&1];
        let page = out.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_float().unwrap(), 612.0);
        assert!(page.has(b"Resources"));
        assert_eq!(
            page.get(b"Parent").unwrap().as_reference().unwrap(),
            out.catalog()
                .unwrap()
                .get(b"Pages")
                .unwrap()
                .as_reference()
                .unwrap()
        );
    }

    #[test]
    fn test_two_up_grouping() {
        let docs = documents(5, 0);
        let selection = select(&docs, "A1-5");
        let out = assemble(&selection, &docs, Layout::TwoUp).unwrap();

        let sheets = out.get_pages();
        assert_eq!(sheets.len(), 3);

        let last = out.get_dictionary(sheets[&3]).unwrap();
        let xobjects = last
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"XObject")
            .unwrap()
            .as_dict()
            .unwrap();
        assert!(xobjects.has(b"P0"));
        assert!(!xobjects.has(b"P1"));

        let media_box = last.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_float().unwrap(), 1224.0);
        assert_eq!(media_box[3].as_float().unwrap(), 792.0);
    }

    #[test]
    fn test_two_up_order() {
        let docs = documents(3, 3);
        let selection = select(&docs, "B3,A1,A2");
        let out = assemble(&selection, &docs, Layout::TwoUp).unwrap();

        let sheets = out.get_pages();
        assert_eq!(sheets.len(), 2);
        assert!(form_content(&out, sheets[&1], b"P0").contains("% B3"));
        assert!(form_content(&out, sheets[&1], b"P1").contains("% A1"));
        assert!(form_content(&out, sheets[&2], b"P0").contains("% A2"));
    }

    #[test]
    fn test_two_up_reuses_forms() {
        let docs = documents(1, 1);
        let selection = select(&docs, "A1,A1");
        let out = assemble(&selection, &docs, Layout::TwoUp).unwrap();

        let sheet = out.get_dictionary(out.get_pages()[&1]).unwrap();
        let xobjects = sheet
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap()
            .get(b"XObject")
            .unwrap()
            .as_dict()
            .unwrap();
        assert_eq!(
            xobjects.get(b"P0").unwrap().as_reference().unwrap(),
            xobjects.get(b"P1").unwrap().as_reference().unwrap()
        );
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let docs = documents(3, 2);
        let selection = select(&docs, "A1-3,B2,B1,A2");

        for layout in [Layout::Sequential, Layout::TwoUp] {
            let mut first = Vec::new();
            assemble(&selection, &docs, layout)
                .unwrap()
                .save_to(&mut first)
                .unwrap();
            let mut second = Vec::new();
            assemble(&selection, &docs, layout)
                .unwrap()
                .save_to(&mut second)
                .unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_unreadable_page() {
        let mut broken = test_pdf("B", 2);
        let page_id = broken.get_pages()[&2];
        let content_id = broken
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_reference()
            .unwrap();
        broken.objects.remove(&content_id);

        let docs = PerSource::new(
            test_source("A", 1),
            SourceDocument::from_document(broken, "broken.pdf"),
        );
        let selection = select(&docs, "A1,B2");
        let err = assemble(&selection, &docs, Layout::Sequential).unwrap_err();
        assert!(matches!(
            err,
            MixError::SourcePageUnreadable {
                pdf: Source::B,
                page: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_generate_default_order() {
        let docs = documents(3, 2);
        let request = GenerationRequest {
            ranges: PerSource::new("2-".to_string(), "1".to_string()),
            order: OrderInput::default(),
            layout: Layout::Sequential,
        };
        let (selection, out) = generate(&request, &docs).unwrap();
        assert_eq!(selection.len(), 3);

        let contents = page_contents(&out);
        for (content, marker) in contents.iter().zip(["% A2", "% A3", "% B1"]) {
            assert!(content.contains(marker));
        }
    }

    #[test]
    fn test_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        let docs = documents(2, 2);
        let selection = select(&docs, "B1,A2");
        let mut out = assemble(&selection, &docs, Layout::Sequential).unwrap();
        save(&mut out, &path).unwrap();

        let reopened = SourceDocument::open(&path).unwrap();
        assert_eq!(reopened.page_count(), 2);
    }
}
