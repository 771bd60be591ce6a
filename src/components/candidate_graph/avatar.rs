//! Lazily loaded avatar images, memoized by URL for the cache's lifetime.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{Event, HtmlImageElement};

use super::types::{GraphNode, NodeKind};

/// Completion callback; `None` means the load failed.
pub type LoadDone<I> = Box<dyn FnOnce(Option<I>)>;

/// Starts an asynchronous image load and reports back exactly once.
pub trait ImageLoader {
	type Image: Clone + 'static;

	fn load(&self, url: &str, done: LoadDone<Self::Image>);
}

/// Loads through a detached `<img>` element.
pub struct HtmlImageLoader;

impl ImageLoader for HtmlImageLoader {
	type Image = HtmlImageElement;

	fn load(&self, url: &str, done: LoadDone<HtmlImageElement>) {
		let image = match HtmlImageElement::new() {
			Ok(image) => image,
			Err(err) => {
				warn!("could not create image element: {err:?}");
				done(None);
				return;
			}
		};
		image.set_cross_origin(Some("anonymous"));

		// Shared by load and error; detaches itself from both on first run.
		let target = image.clone();
		let settle = Closure::once_into_js(move |event: Event| {
			target.set_onload(None);
			target.set_onerror(None);
			done(outcome(&event.type_(), target));
		});
		image.set_onload(Some(settle.unchecked_ref()));
		image.set_onerror(Some(settle.unchecked_ref()));
		image.set_src(url);
	}
}

/// Only a `load` event yields an image; `error` and anything else is a failure.
fn outcome<I>(event_type: &str, image: I) -> Option<I> {
	(event_type == "load").then_some(image)
}

/// Additive-only: entries are never evicted, failures are never stored.
pub struct AvatarCache<L: ImageLoader> {
	loader: L,
	images: Rc<RefCell<HashMap<String, L::Image>>>,
	pending: Rc<RefCell<HashSet<String>>>,
}

impl<L: ImageLoader> AvatarCache<L> {
	pub fn new(loader: L) -> Self {
		Self {
			loader,
			images: Rc::default(),
			pending: Rc::default(),
		}
	}

	pub fn get(&self, url: &str) -> Option<L::Image> {
		self.images.borrow().get(url).cloned()
	}

	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.images.borrow().len()
	}

	/// Start loading `url` unless it is cached or already in flight.
	pub fn request(&self, url: &str) -> bool {
		if self.images.borrow().contains_key(url) || self.pending.borrow().contains(url) {
			return false;
		}
		self.pending.borrow_mut().insert(url.to_string());

		let (images, pending, key) = (self.images.clone(), self.pending.clone(), url.to_string());
		self.loader.load(
			url,
			Box::new(move |image| {
				pending.borrow_mut().remove(&key);
				match image {
					Some(image) => {
						images.borrow_mut().insert(key, image);
					}
					None => warn!("avatar failed to load: {key}"),
				}
			}),
		);
		true
	}

	/// Request every user avatar in `nodes`; returns how many loads started.
	pub fn prefetch(&self, nodes: &[GraphNode]) -> usize {
		nodes
			.iter()
			.filter(|node| node.kind == NodeKind::User)
			.filter_map(|node| node.avatar_url.as_deref())
			.filter(|url| self.request(url))
			.count()
	}
}
