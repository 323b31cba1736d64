//! Hook Installer for Privacy Guard.
//!
//! Instruments a page's sensitive entry points. Each surface is a trait for the
//! page's original capability; installing a hook wraps the original in a
//! decorator that emits a detection over the bridge and then delegates, so the
//! original's return value and side effects are untouched.
//!
//! Surfaces are installed independently. An absent or frozen surface is logged
//! and skipped; the rest of the page is still instrumented.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, PoisonError};

use reqwest::Url;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::services::context_bridge::BridgeEmitter;
use crate::services::pii_detector::{classify_form, FormSubmission};
use crate::types::detection::{Category, RawDetection};
use crate::types::errors::HookError;

/// Navigator properties commonly read for fingerprinting.
pub const IDENTIFYING_NAVIGATOR_PROPERTIES: &[&str] = &[
    "userAgent",
    "language",
    "languages",
    "platform",
    "hardwareConcurrency",
    "deviceMemory",
    "cookieEnabled",
    "doNotTrack",
    "maxTouchPoints",
];

/// Canvas context types that are fingerprinting vectors.
pub const FINGERPRINT_CONTEXT_TYPES: &[&str] = &["2d", "webgl", "webgl2"];

// ─── Surfaces ───

/// Common behavior of every instrumentable surface.
pub trait Surface {
    /// A frozen surface cannot be redefined and is left as is.
    fn is_frozen(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    Local,
    Session,
}

impl StorageArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageArea::Local => "localStorage",
            StorageArea::Session => "sessionStorage",
        }
    }
}

/// `localStorage` / `sessionStorage`.
pub trait KeyValueStorage: Surface + Send {
    fn area(&self) -> StorageArea;
    fn set_item(&mut self, key: &str, value: &str);
    fn get_item(&self, key: &str) -> Option<String>;
    fn remove_item(&mut self, key: &str);
    fn clear(&mut self);
}

/// `document.cookie`.
pub trait CookieAccessor: Surface + Send {
    fn read(&self) -> String;
    fn write(&mut self, cookie: &str);
}

/// `indexedDB.open`. Returns the page's request handle.
pub trait IndexedStorage: Surface + Send {
    fn open(&mut self, name: &str, version: Option<u32>) -> u64;
}

/// Canvas element prototype.
pub trait Canvas: Surface + Send {
    /// Returns a context handle, `None` for unsupported types.
    fn get_context(&mut self, context_type: &str) -> Option<u32>;
    fn to_data_url(&self, mime: Option<&str>) -> String;
    fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> Vec<u8>;
    fn to_blob(&self, mime: Option<&str>) -> Vec<u8>;
}

/// `navigator` property reads.
pub trait Navigator: Surface + Send {
    fn property(&self, name: &str) -> Option<String>;
}

/// `fetch` and `XMLHttpRequest.open`. Both return the page's request handle.
pub trait Network: Surface + Send {
    fn fetch(&mut self, url: &str, method: &str) -> u64;
    fn xhr_open(&mut self, method: &str, url: &str) -> u64;
}

/// Form submission.
pub trait Forms: Surface + Send {
    fn submit(&mut self, form: &FormSubmission);
}

// ─── Page ───

/// Identifies a surface in install reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    LocalStorage,
    SessionStorage,
    Cookies,
    IndexedDb,
    Canvas,
    Navigator,
    Network,
    Forms,
}

impl fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SurfaceKind::LocalStorage => "localStorage",
            SurfaceKind::SessionStorage => "sessionStorage",
            SurfaceKind::Cookies => "document.cookie",
            SurfaceKind::IndexedDb => "indexedDB",
            SurfaceKind::Canvas => "HTMLCanvasElement",
            SurfaceKind::Navigator => "navigator",
            SurfaceKind::Network => "fetch/XMLHttpRequest",
            SurfaceKind::Forms => "forms",
        };
        f.write_str(name)
    }
}

/// The sensitive surfaces of one page execution context.
///
/// A field is `None` when the page does not expose that surface.
pub struct PageSurfaces {
    /// The page's own URL, used to tell third-party requests apart.
    pub page_url: Url,
    pub local_storage: Option<Box<dyn KeyValueStorage>>,
    pub session_storage: Option<Box<dyn KeyValueStorage>>,
    pub cookies: Option<Box<dyn CookieAccessor>>,
    pub indexed_db: Option<Box<dyn IndexedStorage>>,
    pub canvas: Option<Box<dyn Canvas>>,
    pub navigator: Option<Box<dyn Navigator>>,
    pub network: Option<Box<dyn Network>>,
    pub forms: Option<Box<dyn Forms>>,
}

impl PageSurfaces {
    /// A page with no surfaces yet.
    pub fn new(page_url: Url) -> Self {
        Self {
            page_url,
            local_storage: None,
            session_storage: None,
            cookies: None,
            indexed_db: None,
            canvas: None,
            navigator: None,
            network: None,
            forms: None,
        }
    }
}

/// Outcome of instrumenting a page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub installed: Vec<SurfaceKind>,
    pub failed: Vec<(SurfaceKind, HookError)>,
}

impl InstallReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn is_installed(&self, kind: SurfaceKind) -> bool {
        self.installed.contains(&kind)
    }
}

/// Installs hooks on a page, surface by surface.
pub struct HookInstaller {
    emitter: BridgeEmitter,
}

impl HookInstaller {
    pub fn new(emitter: BridgeEmitter) -> Self {
        Self { emitter }
    }

    /// Wrap every surface that can be wrapped. Frozen surfaces are returned
    /// unwrapped; absent ones stay absent.
    pub fn install(&self, page: PageSurfaces) -> (PageSurfaces, InstallReport) {
        let mut report = InstallReport::default();
        let emitter = &self.emitter;
        let page_url = page.page_url.clone();

        let local_storage = install_one(SurfaceKind::LocalStorage, page.local_storage, &mut report, |s| {
            Box::new(StorageHook::new(s, emitter.clone())) as Box<dyn KeyValueStorage>
        });
        let session_storage = install_one(SurfaceKind::SessionStorage, page.session_storage, &mut report, |s| {
            Box::new(StorageHook::new(s, emitter.clone())) as Box<dyn KeyValueStorage>
        });
        let cookies = install_one(SurfaceKind::Cookies, page.cookies, &mut report, |s| {
            Box::new(CookieHook::new(s, emitter.clone())) as Box<dyn CookieAccessor>
        });
        let indexed_db = install_one(SurfaceKind::IndexedDb, page.indexed_db, &mut report, |s| {
            Box::new(IndexedStorageHook::new(s, emitter.clone())) as Box<dyn IndexedStorage>
        });
        let canvas = install_one(SurfaceKind::Canvas, page.canvas, &mut report, |s| {
            Box::new(CanvasHook::new(s, emitter.clone())) as Box<dyn Canvas>
        });
        let navigator = install_one(SurfaceKind::Navigator, page.navigator, &mut report, |s| {
            Box::new(NavigatorHook::new(s, emitter.clone())) as Box<dyn Navigator>
        });
        let network = install_one(SurfaceKind::Network, page.network, &mut report, |s| {
            Box::new(NetworkHook::new(s, page_url.clone(), emitter.clone())) as Box<dyn Network>
        });
        let forms = install_one(SurfaceKind::Forms, page.forms, &mut report, |s| {
            Box::new(FormHook::new(s, emitter.clone())) as Box<dyn Forms>
        });

        debug!(
            installed = report.installed.len(),
            failed = report.failed.len(),
            "page instrumentation finished"
        );

        let instrumented = PageSurfaces {
            page_url: page.page_url,
            local_storage,
            session_storage,
            cookies,
            indexed_db,
            canvas,
            navigator,
            network,
            forms,
        };
        (instrumented, report)
    }
}

fn install_one<T: Surface + ?Sized>(
    kind: SurfaceKind,
    original: Option<Box<T>>,
    report: &mut InstallReport,
    wrap: impl FnOnce(Box<T>) -> Box<T>,
) -> Option<Box<T>> {
    let Some(original) = original else {
        warn!(surface = %kind, "hook not installed: surface not present");
        report.failed.push((kind, HookError::SurfaceAbsent(kind.to_string())));
        return None;
    };
    if original.is_frozen() {
        warn!(surface = %kind, "hook not installed: surface is frozen");
        report.failed.push((kind, HookError::SurfaceFrozen(kind.to_string())));
        return Some(original);
    }
    report.installed.push(kind);
    Some(wrap(original))
}

// ─── Hooks ───

/// Wraps key-value storage. Every call is reported.
pub struct StorageHook<S: ?Sized> {
    inner: Box<S>,
    emitter: BridgeEmitter,
}

impl<S: KeyValueStorage + ?Sized> StorageHook<S> {
    pub fn new(inner: Box<S>, emitter: BridgeEmitter) -> Self {
        Self { inner, emitter }
    }

    fn report(&self, operation: &str, key: Option<&str>) {
        let area = self.inner.area().as_str();
        let mut detection = RawDetection::new(Category::Storage, format!("{}.{}", area, operation))
            .with("storage_type", area)
            .with("operation", operation);
        if let Some(key) = key {
            detection = detection.with("key", key);
        }
        self.emitter.dispatch(detection);
    }
}

impl<S: KeyValueStorage + ?Sized> Surface for StorageHook<S> {
    fn is_frozen(&self) -> bool {
        self.inner.is_frozen()
    }
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for StorageHook<S> {
    fn area(&self) -> StorageArea {
        self.inner.area()
    }

    fn set_item(&mut self, key: &str, value: &str) {
        self.report("setItem", Some(key));
        self.inner.set_item(key, value)
    }

    fn get_item(&self, key: &str) -> Option<String> {
        self.report("getItem", Some(key));
        self.inner.get_item(key)
    }

    fn remove_item(&mut self, key: &str) {
        self.report("removeItem", Some(key));
        self.inner.remove_item(key)
    }

    fn clear(&mut self) {
        self.report("clear", None);
        self.inner.clear()
    }
}

/// Wraps `document.cookie`. Reads and writes are reported; a write records
/// only the cookie name.
pub struct CookieHook<S: ?Sized> {
    inner: Box<S>,
    emitter: BridgeEmitter,
}

impl<S: CookieAccessor + ?Sized> CookieHook<S> {
    pub fn new(inner: Box<S>, emitter: BridgeEmitter) -> Self {
        Self { inner, emitter }
    }
}

impl<S: CookieAccessor + ?Sized> Surface for CookieHook<S> {
    fn is_frozen(&self) -> bool {
        self.inner.is_frozen()
    }
}

impl<S: CookieAccessor + ?Sized> CookieAccessor for CookieHook<S> {
    fn read(&self) -> String {
        self.emitter.dispatch(
            RawDetection::new(Category::Storage, "document.cookie read")
                .with("storage_type", "cookie")
                .with("operation", "read"),
        );
        self.inner.read()
    }

    fn write(&mut self, cookie: &str) {
        let name = cookie.split('=').next().unwrap_or_default().trim();
        self.emitter.dispatch(
            RawDetection::new(Category::Storage, "document.cookie write")
                .with("storage_type", "cookie")
                .with("operation", "write")
                .with("cookie_data", name),
        );
        self.inner.write(cookie)
    }
}

/// Wraps `indexedDB.open`.
pub struct IndexedStorageHook<S: ?Sized> {
    inner: Box<S>,
    emitter: BridgeEmitter,
}

impl<S: IndexedStorage + ?Sized> IndexedStorageHook<S> {
    pub fn new(inner: Box<S>, emitter: BridgeEmitter) -> Self {
        Self { inner, emitter }
    }
}

impl<S: IndexedStorage + ?Sized> Surface for IndexedStorageHook<S> {
    fn is_frozen(&self) -> bool {
        self.inner.is_frozen()
    }
}

impl<S: IndexedStorage + ?Sized> IndexedStorage for IndexedStorageHook<S> {
    fn open(&mut self, name: &str, version: Option<u32>) -> u64 {
        self.emitter.dispatch(
            RawDetection::new(Category::Storage, "IndexedDB access")
                .with("storage_type", "indexedDB")
                .with("operation", "open")
                .with("database", name),
        );
        self.inner.open(name, version)
    }
}

/// Wraps the canvas prototype. Context acquisition is reported only for
/// fingerprint-capable context types; pixel extraction always.
pub struct CanvasHook<S: ?Sized> {
    inner: Box<S>,
    emitter: BridgeEmitter,
    /// Last context type requested on this canvas.
    context_type: Mutex<Option<String>>,
}

impl<S: Canvas + ?Sized> CanvasHook<S> {
    pub fn new(inner: Box<S>, emitter: BridgeEmitter) -> Self {
        Self {
            inner,
            emitter,
            context_type: Mutex::new(None),
        }
    }

    fn report_extraction(&self, method: &str) {
        let context_type = self
            .context_type
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| "none".to_string());
        self.emitter.dispatch(
            RawDetection::new(Category::Fingerprinting, format!("Canvas {} called", method))
                .with("api", format!("canvas.{}", method))
                .with("context_type", context_type)
                .with("fingerprint_category", "canvas"),
        );
    }
}

impl<S: Canvas + ?Sized> Surface for CanvasHook<S> {
    fn is_frozen(&self) -> bool {
        self.inner.is_frozen()
    }
}

impl<S: Canvas + ?Sized> Canvas for CanvasHook<S> {
    fn get_context(&mut self, context_type: &str) -> Option<u32> {
        *self
            .context_type
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(context_type.to_string());
        if FINGERPRINT_CONTEXT_TYPES.contains(&context_type) {
            self.emitter.dispatch(
                RawDetection::new(
                    Category::Fingerprinting,
                    format!("Canvas {} context accessed", context_type),
                )
                .with("api", format!("canvas.getContext({})", context_type))
                .with("context_type", context_type)
                .with("fingerprint_category", "canvas"),
            );
        }
        self.inner.get_context(context_type)
    }

    fn to_data_url(&self, mime: Option<&str>) -> String {
        self.report_extraction("toDataURL");
        self.inner.to_data_url(mime)
    }

    fn get_image_data(&self, x: i32, y: i32, width: u32, height: u32) -> Vec<u8> {
        self.report_extraction("getImageData");
        self.inner.get_image_data(x, y, width, height)
    }

    fn to_blob(&self, mime: Option<&str>) -> Vec<u8> {
        self.report_extraction("toBlob");
        self.inner.to_blob(mime)
    }
}

/// Wraps navigator property reads. Each identifying property is reported on
/// its first read only; the hook lives for one page load.
pub struct NavigatorHook<S: ?Sized> {
    inner: Box<S>,
    emitter: BridgeEmitter,
    reported: Mutex<HashSet<String>>,
}

impl<S: Navigator + ?Sized> NavigatorHook<S> {
    pub fn new(inner: Box<S>, emitter: BridgeEmitter) -> Self {
        Self {
            inner,
            emitter,
            reported: Mutex::new(HashSet::new()),
        }
    }

    /// True the first time `name` is seen.
    fn first_read(&self, name: &str) -> bool {
        self.reported
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string())
    }
}

impl<S: Navigator + ?Sized> Surface for NavigatorHook<S> {
    fn is_frozen(&self) -> bool {
        self.inner.is_frozen()
    }
}

impl<S: Navigator + ?Sized> Navigator for NavigatorHook<S> {
    fn property(&self, name: &str) -> Option<String> {
        let value = self.inner.property(name);
        if value.is_some() && IDENTIFYING_NAVIGATOR_PROPERTIES.contains(&name) && self.first_read(name) {
            self.emitter.dispatch(
                RawDetection::new(Category::Fingerprinting, format!("navigator.{} accessed", name))
                    .with("api", format!("navigator.{}", name))
                    .with("fingerprint_category", "navigator"),
            );
        }
        value
    }
}

/// Wraps outgoing requests. Requests whose resolved origin differs from the
/// page's are reported as trackers; relative paths resolve to the page origin.
pub struct NetworkHook<S: ?Sized> {
    inner: Box<S>,
    page_url: Url,
    emitter: BridgeEmitter,
}

impl<S: Network + ?Sized> NetworkHook<S> {
    pub fn new(inner: Box<S>, page_url: Url, emitter: BridgeEmitter) -> Self {
        Self {
            inner,
            page_url,
            emitter,
        }
    }

    fn report_if_third_party(&self, url: &str, method: &str, request_type: &str) {
        if !is_third_party(&self.page_url, url) {
            return;
        }
        let label = match request_type {
            "xhr" => "XHR",
            _ => "fetch",
        };
        self.emitter.dispatch(
            RawDetection::new(Category::Tracker, format!("Third-party {} request", label))
                .with("target_url", url)
                .with("method", method)
                .with("request_type", request_type),
        );
    }
}

impl<S: Network + ?Sized> Surface for NetworkHook<S> {
    fn is_frozen(&self) -> bool {
        self.inner.is_frozen()
    }
}

impl<S: Network + ?Sized> Network for NetworkHook<S> {
    fn fetch(&mut self, url: &str, method: &str) -> u64 {
        self.report_if_third_party(url, method, "fetch");
        self.inner.fetch(url, method)
    }

    fn xhr_open(&mut self, method: &str, url: &str) -> u64 {
        self.report_if_third_party(url, method, "xhr");
        self.inner.xhr_open(method, url)
    }
}

/// True when `target`, resolved against the page URL, has a different origin.
///
/// A target that cannot be resolved at all is not reported.
pub fn is_third_party(page_url: &Url, target: &str) -> bool {
    match page_url.join(target) {
        Ok(resolved) => resolved.origin() != page_url.origin(),
        Err(_) => false,
    }
}

/// Wraps form submission. Submissions carrying PII are reported once each.
pub struct FormHook<S: ?Sized> {
    inner: Box<S>,
    emitter: BridgeEmitter,
}

impl<S: Forms + ?Sized> FormHook<S> {
    pub fn new(inner: Box<S>, emitter: BridgeEmitter) -> Self {
        Self { inner, emitter }
    }
}

impl<S: Forms + ?Sized> Surface for FormHook<S> {
    fn is_frozen(&self) -> bool {
        self.inner.is_frozen()
    }
}

impl<S: Forms + ?Sized> Forms for FormHook<S> {
    fn submit(&mut self, form: &FormSubmission) {
        let kinds = classify_form(form);
        if !kinds.is_empty() {
            let names: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
            self.emitter.dispatch(
                RawDetection::new(
                    Category::Pii,
                    format!("Form submission with PII: {}", names.join(", ")),
                )
                .with("pii_types", json!(names))
                .with("form_action", form.action.as_deref().unwrap_or("same-page"))
                .with("form_method", form.method.as_deref().unwrap_or("GET")),
            );
        }
        self.inner.submit(form)
    }
}
