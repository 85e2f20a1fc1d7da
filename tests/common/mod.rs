//! Shared fixtures for the integration tests: a scripted renderer that
//! answers deck queries from a fixed layout and encodes real one-page PDFs.

#![allow(dead_code)]

use deck2pdf::{
    DeckQuery, MediaType, RendererError, RendererSession, SessionLauncher, SessionOptions,
    SlideCoordinate,
};
use lopdf::{dictionary, Document, Object, Stream};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Everything the fake renderer was asked to do, in order.
#[derive(Debug, Default)]
pub struct Log {
    pub launches: usize,
    pub closed: usize,
    pub viewports: Vec<(u32, u32)>,
    pub navigations: Vec<String>,
    pub media: Vec<MediaType>,
    pub gotos: Vec<SlideCoordinate>,
    pub waits: Vec<Duration>,
    pub encodes: Vec<(u32, u32)>,
}

/// Deck layout and failure injection for [`FakeLauncher`].
#[derive(Debug, Clone)]
pub struct FakeDeck {
    pub has_controller: bool,
    pub vertical_counts: Vec<u32>,
    /// `None` reports the real number of slides.
    pub reported_total: Option<usize>,
    /// Fail the navigation for this 0-based manifest index.
    pub fail_goto_at: Option<usize>,
    /// Return bytes that are not a PDF when capturing this manifest index.
    pub garbage_encode_at: Option<usize>,
    pub fail_launch: bool,
}

impl FakeDeck {
    pub fn new(vertical_counts: &[u32]) -> Self {
        Self {
            has_controller: true,
            vertical_counts: vertical_counts.to_vec(),
            reported_total: None,
            fail_goto_at: None,
            garbage_encode_at: None,
            fail_launch: false,
        }
    }

    pub fn without_controller() -> Self {
        Self {
            has_controller: false,
            ..Self::new(&[])
        }
    }

    fn coordinates(&self) -> Vec<SlideCoordinate> {
        self.vertical_counts
            .iter()
            .enumerate()
            .flat_map(|(h, &count)| {
                (0..count.max(1)).map(move |v| SlideCoordinate::new(h as u32, v))
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct FakeLauncher {
    deck: FakeDeck,
    log: Arc<Mutex<Log>>,
}

impl FakeLauncher {
    pub fn new(deck: FakeDeck) -> Self {
        Self {
            deck,
            log: Arc::default(),
        }
    }

    pub fn log(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap()
    }
}

impl SessionLauncher for FakeLauncher {
    type Session = FakeSession;

    fn launch(&self, _options: &SessionOptions) -> Result<FakeSession, RendererError> {
        if self.deck.fail_launch {
            return Err(RendererError::Launch("no browser here".into()));
        }
        self.log().launches += 1;
        Ok(FakeSession {
            deck: self.deck.clone(),
            log: Arc::clone(&self.log),
            current: SlideCoordinate::new(0, 0),
            current_index: 0,
        })
    }
}

pub struct FakeSession {
    deck: FakeDeck,
    log: Arc<Mutex<Log>>,
    current: SlideCoordinate,
    current_index: usize,
}

impl FakeSession {
    fn log(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap()
    }
}

impl RendererSession for FakeSession {
    fn set_viewport(&mut self, width: u32, height: u32) -> Result<(), RendererError> {
        self.log().viewports.push((width, height));
        Ok(())
    }

    fn navigate(&mut self, location: &str) -> Result<(), RendererError> {
        self.log().navigations.push(location.to_string());
        Ok(())
    }

    fn emulate_media(&mut self, media: MediaType) -> Result<(), RendererError> {
        self.log().media.push(media);
        Ok(())
    }

    fn evaluate(&mut self, expression: &str) -> Result<Value, RendererError> {
        if expression == DeckQuery::IsPresent.script() {
            return Ok(json!(self.deck.has_controller));
        }
        if !self.deck.has_controller {
            return Err(RendererError::Evaluation(
                "ReferenceError: Reveal is not defined".into(),
            ));
        }
        if expression == DeckQuery::TotalSlides.script() {
            let total = self
                .deck
                .reported_total
                .unwrap_or_else(|| self.deck.coordinates().len());
            return Ok(json!(total));
        }
        if expression == DeckQuery::HorizontalSlides.script() {
            return Ok(json!(self.deck.vertical_counts.len()));
        }
        for (h, &count) in self.deck.vertical_counts.iter().enumerate() {
            if expression == DeckQuery::VerticalSlides(h as u32).script() {
                return Ok(json!(count));
            }
        }
        for (index, coordinate) in self.deck.coordinates().into_iter().enumerate() {
            if expression == DeckQuery::GoTo(coordinate).script() {
                self.log().gotos.push(coordinate);
                if self.deck.fail_goto_at == Some(index) {
                    return Err(RendererError::Evaluation("navigation crashed".into()));
                }
                self.current = coordinate;
                self.current_index = index;
                return Ok(Value::Null);
            }
        }
        Err(RendererError::Evaluation(format!(
            "unexpected expression: {expression}"
        )))
    }

    fn wait(&mut self, duration: Duration) {
        self.log().waits.push(duration);
    }

    fn encode_viewport_as_page(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RendererError> {
        self.log().encodes.push((width, height));
        if self.deck.garbage_encode_at == Some(self.current_index) {
            return Ok(b"<html>not a pdf</html>".to_vec());
        }
        let marker = format!("{}-{}", self.current.horizontal, self.current.vertical);
        Ok(one_page_pdf(
            width as f32 * 0.75,
            height as f32 * 0.75,
            &marker,
        ))
    }

    fn close(&mut self) -> Result<(), RendererError> {
        self.log().closed += 1;
        Ok(())
    }
}

/// A one-page PDF of `width` × `height` points whose page carries `marker`.
pub fn one_page_pdf(width: f32, height: f32, marker: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        format!("q 0 0 {width} {height} re f Q").into_bytes(),
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width),
            Object::Real(height),
        ],
        "Contents" => content_id,
        "Resources" => dictionary! {},
        "Marker" => Object::string_literal(marker),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Page markers of an exported document, in page order.
pub fn page_markers(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_dictionary(*id).unwrap();
            String::from_utf8(page.get(b"Marker").unwrap().as_str().unwrap().to_vec()).unwrap()
        })
        .collect()
}

pub fn page_count(path: &Path) -> usize {
    Document::load(path).unwrap().get_pages().len()
}

/// MediaBox of every page, as `(width, height)` in points.
pub fn page_sizes(path: &Path) -> Vec<(f32, f32)> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_dictionary(*id).unwrap();
            let mb = page.get(b"MediaBox").unwrap().as_array().unwrap();
            let n = |o: &Object| match *o {
                Object::Integer(i) => i as f32,
                Object::Real(r) => r,
                ref other => panic!("not a number: {other:?}"),
            };
            (n(&mb[2]) - n(&mb[0]), n(&mb[3]) - n(&mb[1]))
        })
        .collect()
}

/// A deck file on disk. Its content is irrelevant to the fake renderer.
pub fn deck_file(dir: &Path) -> PathBuf {
    let path = dir.join("deck.html");
    std::fs::write(&path, "<html><body><div class=\"reveal\"></div></body></html>").unwrap();
    path
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("deck2pdf=debug")
        .with_test_writer()
        .try_init();
}
