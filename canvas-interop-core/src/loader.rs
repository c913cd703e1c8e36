//! Coalescing resource loader.
//!
//! Each instance keeps one waiter list per outstanding URL and resource kind.
//! The first request for a URL issues the browser fetch; later requests for
//! the same URL only join the list. The browser's completion removes the list
//! and every waiter fires once, in the order it was enqueued.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures::channel::oneshot;

use crate::bridge::Bridge;
use crate::error::{InteropError, Result};
use crate::host::ResourceKind;
use crate::image::RawImageData;
use crate::interop::CanvasInterop;

/// Success and failure callbacks of one requester.
pub struct Waiter<T: ?Sized> {
    on_loaded: Box<dyn FnOnce(&T)>,
    on_error: Box<dyn FnOnce(&str)>,
}

impl<T: ?Sized> Waiter<T> {
    pub fn new(on_loaded: impl FnOnce(&T) + 'static, on_error: impl FnOnce(&str) + 'static) -> Self {
        Self {
            on_loaded: Box::new(on_loaded),
            on_error: Box::new(on_error),
        }
    }
}

/// Outstanding requests of one resource kind, keyed by URL.
pub struct WaiterLists<T: ?Sized> {
    lists: HashMap<String, Vec<Waiter<T>>>,
}

impl<T: ?Sized> WaiterLists<T> {
    pub fn new() -> Self {
        Self {
            lists: HashMap::new(),
        }
    }

    /// Queue a waiter. Returns true when this is the first waiter for `url`
    /// and the caller must issue the fetch.
    pub fn enqueue(&mut self, url: &str, waiter: Waiter<T>) -> bool {
        match self.lists.get_mut(url) {
            Some(list) => {
                list.push(waiter);
                false
            }
            None => {
                self.lists.insert(url.to_string(), vec![waiter]);
                true
            }
        }
    }

    pub fn take(&mut self, url: &str) -> Option<Vec<Waiter<T>>> {
        self.lists.remove(url)
    }

    /// Drop every list and return the URLs that were outstanding.
    pub fn drain_urls(&mut self) -> Vec<String> {
        self.lists.drain().map(|(url, _)| url).collect()
    }

    pub fn is_pending(&self, url: &str) -> bool {
        self.lists.contains_key(url)
    }

    pub fn waiter_count(&self, url: &str) -> usize {
        self.lists.get(url).map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

impl<T: ?Sized> Default for WaiterLists<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fire every waiter once, in enqueue order.
pub(crate) fn deliver<T: ?Sized>(waiters: Vec<Waiter<T>>, outcome: std::result::Result<&T, &str>) {
    match outcome {
        Ok(payload) => {
            for waiter in waiters {
                (waiter.on_loaded)(payload);
            }
        }
        Err(message) => {
            for waiter in waiters {
                (waiter.on_error)(message);
            }
        }
    }
}

/// All outstanding requests of one canvas.
#[derive(Default)]
pub struct PendingRequests {
    pub text: WaiterLists<str>,
    pub binary: WaiterLists<[u8]>,
    pub image: WaiterLists<RawImageData>,
}

impl PendingRequests {
    pub fn drain_urls(&mut self) -> Vec<String> {
        let mut urls = self.text.drain_urls();
        urls.extend(self.binary.drain_urls());
        urls.extend(self.image.drain_urls());
        urls
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.binary.is_empty() && self.image.is_empty()
    }
}

type Issue = Box<dyn FnOnce(&CanvasInterop, &str)>;

impl CanvasInterop {
    pub fn load_text_file(
        &self,
        url: &str,
        on_loaded: impl FnOnce(&str) + 'static,
        on_error: impl FnOnce(&str) + 'static,
    ) -> Result<()> {
        self.request(
            "load_text_file",
            url,
            Waiter::<str>::new(on_loaded, on_error),
            |r| &mut r.text,
            Box::new(|canvas: &CanvasInterop, url: &str| {
                canvas
                    .host()
                    .load_resource(canvas.canvas_id(), ResourceKind::Text, url)
            }),
        )
    }

    pub fn load_binary_file(
        &self,
        url: &str,
        on_loaded: impl FnOnce(&[u8]) + 'static,
        on_error: impl FnOnce(&str) + 'static,
    ) -> Result<()> {
        self.request(
            "load_binary_file",
            url,
            Waiter::<[u8]>::new(on_loaded, on_error),
            |r| &mut r.binary,
            Box::new(|canvas: &CanvasInterop, url: &str| {
                canvas
                    .host()
                    .load_resource(canvas.canvas_id(), ResourceKind::Binary, url)
            }),
        )
    }

    /// Fetch and decode an image into RGBA8 pixels.
    pub fn load_image_bytes(
        &self,
        url: &str,
        on_loaded: impl FnOnce(&RawImageData) + 'static,
        on_error: impl FnOnce(&str) + 'static,
    ) -> Result<()> {
        self.request(
            "load_image_bytes",
            url,
            Waiter::<RawImageData>::new(on_loaded, on_error),
            |r| &mut r.image,
            Box::new(|canvas: &CanvasInterop, url: &str| {
                canvas
                    .host()
                    .load_resource(canvas.canvas_id(), ResourceKind::Image, url)
            }),
        )
    }

    /// Decode an encoded image (png, jpeg, ...) that is already in memory.
    /// Requests are coalesced by `image_name`.
    pub fn load_image_from_bytes(
        &self,
        bytes: Vec<u8>,
        mime_type: &str,
        image_name: &str,
        on_loaded: impl FnOnce(&RawImageData) + 'static,
        on_error: impl FnOnce(&str) + 'static,
    ) -> Result<()> {
        let mime_type = mime_type.to_string();
        self.request(
            "load_image_from_bytes",
            image_name,
            Waiter::<RawImageData>::new(on_loaded, on_error),
            |r| &mut r.image,
            Box::new(move |canvas: &CanvasInterop, name: &str| {
                canvas
                    .host()
                    .decode_image_bytes(canvas.canvas_id(), &bytes, &mime_type, name)
            }),
        )
    }

    pub async fn load_text_file_async(&self, url: &str) -> Result<String> {
        let (on_loaded, on_error, rx) = settle::<str>(url);
        self.load_text_file(url, on_loaded, on_error)?;
        await_settled(url, rx).await
    }

    pub async fn load_binary_file_async(&self, url: &str) -> Result<Vec<u8>> {
        let (on_loaded, on_error, rx) = settle::<[u8]>(url);
        self.load_binary_file(url, on_loaded, on_error)?;
        await_settled(url, rx).await
    }

    pub async fn load_image_bytes_async(&self, url: &str) -> Result<RawImageData> {
        let (on_loaded, on_error, rx) = settle::<RawImageData>(url);
        self.load_image_bytes(url, on_loaded, on_error)?;
        await_settled(url, rx).await
    }

    fn request<T: ?Sized + 'static>(
        &self,
        method: &'static str,
        url: &str,
        waiter: Waiter<T>,
        lists: fn(&mut PendingRequests) -> &mut WaiterLists<T>,
        issue: Issue,
    ) -> Result<()> {
        self.check_not_disposed(method)?;

        if !self.is_connected() {
            log::debug!("{method} '{url}' deferred until '{}' is connected", self.canvas_id());
            let url = url.to_string();
            self.events().webgl_initialized.add(move |canvas| {
                if let Err(e) = canvas.request(method, &url, waiter, lists, issue) {
                    log::warn!("deferred {method} '{url}' failed: {e}");
                }
            });
            return Ok(());
        }

        let first = lists(&mut self.requests().borrow_mut()).enqueue(url, waiter);
        if first {
            issue(self, url);
        } else {
            log::debug!("{method} '{url}' joined an outstanding request");
        }
        Ok(())
    }
}

type Settled<T> = oneshot::Receiver<Result<T>>;

/// Callback pair that resolves a oneshot channel from whichever fires first.
fn settle<T>(url: &str) -> (impl FnOnce(&T) + 'static, impl FnOnce(&str) + 'static, Settled<T::Owned>)
where
    T: ?Sized + ToOwned + 'static,
    T::Owned: 'static,
{
    let (tx, rx) = oneshot::channel();
    let tx = Rc::new(RefCell::new(Some(tx)));
    let tx_error = Rc::clone(&tx);
    let url = url.to_string();

    let on_loaded = move |value: &T| {
        if let Some(tx) = tx.borrow_mut().take() {
            let _ = tx.send(Ok(value.to_owned()));
        }
    };
    let on_error = move |message: &str| {
        if let Some(tx) = tx_error.borrow_mut().take() {
            let _ = tx.send(Err(InteropError::LoadFailed {
                url,
                message: message.to_string(),
            }));
        }
    };
    (on_loaded, on_error, rx)
}

async fn await_settled<T>(url: &str, rx: Settled<T>) -> Result<T> {
    match rx.await {
        Ok(result) => result,
        // Both callbacks were dropped: the waiter list was cleared on dispose.
        Err(oneshot::Canceled) => Err(InteropError::RequestAbandoned {
            url: url.to_string(),
        }),
    }
}

fn outcome<T>(kind: ResourceKind, url: &str, payload: Option<T>, error: Option<String>) -> std::result::Result<T, String> {
    match (payload, error) {
        (Some(payload), None) => Ok(payload),
        (Some(payload), Some(error)) => {
            log::warn!("'{url}' completed with both content and an error ({error}); using the content");
            Ok(payload)
        }
        (None, Some(error)) => Err(error),
        (None, None) => Err(format!("Error loading {}: {url}", kind.label())),
    }
}

impl Bridge {
    pub fn complete_text_file(
        &self,
        canvas_id: Option<&str>,
        url: &str,
        content: Option<String>,
        error: Option<String>,
    ) -> Result<()> {
        log::debug!(
            "text file '{url}' ({} chars) for canvas '{}'",
            content.as_ref().map_or(0, String::len),
            canvas_id.unwrap_or_default()
        );
        let Some(waiters) = self.take_waiters(canvas_id, url, |r| &mut r.text)? else {
            return Ok(());
        };
        let outcome = outcome(ResourceKind::Text, url, content, error);
        deliver(waiters, outcome.as_deref().map_err(String::as_str));
        Ok(())
    }

    pub fn complete_binary_file(
        &self,
        canvas_id: Option<&str>,
        url: &str,
        bytes: Option<Vec<u8>>,
        error: Option<String>,
    ) -> Result<()> {
        log::debug!(
            "binary file '{url}' ({} bytes) for canvas '{}'",
            bytes.as_ref().map_or(0, Vec::len),
            canvas_id.unwrap_or_default()
        );
        let Some(waiters) = self.take_waiters(canvas_id, url, |r| &mut r.binary)? else {
            return Ok(());
        };
        let outcome = outcome(ResourceKind::Binary, url, bytes, error);
        deliver(waiters, outcome.as_deref().map_err(String::as_str));
        Ok(())
    }

    pub fn complete_image_bytes(
        &self,
        canvas_id: Option<&str>,
        url: &str,
        width: i32,
        height: i32,
        pixels: Option<Vec<u8>>,
        error: Option<String>,
    ) -> Result<()> {
        log::debug!(
            "image '{url}' ({width} x {height}) for canvas '{}'",
            canvas_id.unwrap_or_default()
        );
        let Some(waiters) = self.take_waiters(canvas_id, url, |r| &mut r.image)? else {
            return Ok(());
        };
        let outcome = outcome(ResourceKind::Image, url, pixels, error).and_then(|pixels| {
            let width = u32::try_from(width).map_err(|_| format!("invalid image width {width}: {url}"))?;
            let height = u32::try_from(height).map_err(|_| format!("invalid image height {height}: {url}"))?;
            RawImageData::from_rgba(width, height, pixels)
        });
        deliver(waiters, outcome.as_ref().map_err(String::as_str));
        Ok(())
    }

    /// Remove the waiter list for `url`. `None` when the canvas or the list is
    /// gone, which is the disposed-instance race and is only logged.
    fn take_waiters<T: ?Sized>(
        &self,
        canvas_id: Option<&str>,
        url: &str,
        lists: fn(&mut PendingRequests) -> &mut WaiterLists<T>,
    ) -> Result<Option<Vec<Waiter<T>>>> {
        let canvas_id = canvas_id.ok_or(InteropError::MissingCanvasId)?;

        let Some(canvas) = self.find(canvas_id) else {
            if self.consume_disposed_request(url) {
                log::info!("'{url}' content received but the canvas interop '{canvas_id}' that started the request was already disposed");
            } else {
                log::warn!("'{url}' content received but the canvas interop '{canvas_id}' that started the request is not found");
            }
            return Ok(None);
        };

        let waiters = lists(&mut canvas.requests().borrow_mut()).take(url);
        if waiters.is_none() {
            log::debug!("'{url}' content received for '{canvas_id}' without a pending request");
        }
        Ok(waiters)
    }
}
