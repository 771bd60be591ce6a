//! View transform and the fit-then-center camera choreography.

/// Seconds the fit-to-view transition takes.
pub const FIT_DURATION: f64 = 0.4;
/// Seconds the recenter-on-origin transition takes.
pub const CENTER_DURATION: f64 = 0.4;
/// Longest wait for the layout to settle before fitting anyway.
pub const MAX_SETTLE_WAIT: f64 = 1.5;
pub const FIT_PADDING: f64 = 40.0;
pub const MIN_SCALE: f64 = 0.1;
pub const MAX_SCALE: f64 = 10.0;
const MAX_FIT_SCALE: f64 = 2.5;

pub fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl ViewTransform {
	/// Unit scale with the graph origin in the middle of the viewport.
	pub fn centered(width: f64, height: f64) -> Self {
		Self {
			x: width / 2.0,
			y: height / 2.0,
			k: 1.0,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}

	fn lerp(&self, to: &Self, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}
}

/// Axis-aligned bounds in graph coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extent {
	pub min_x: f64,
	pub min_y: f64,
	pub max_x: f64,
	pub max_y: f64,
}

pub fn fit_to_view(extent: Extent, width: f64, height: f64, padding: f64) -> ViewTransform {
	let (w, h) = (
		(extent.max_x - extent.min_x).max(1.0),
		(extent.max_y - extent.min_y).max(1.0),
	);
	let (avail_w, avail_h) = ((width - 2.0 * padding).max(1.0), (height - 2.0 * padding).max(1.0));
	let k = (avail_w / w).min(avail_h / h).clamp(MIN_SCALE, MAX_FIT_SCALE);
	let (cx, cy) = (
		(extent.min_x + extent.max_x) / 2.0,
		(extent.min_y + extent.max_y) / 2.0,
	);
	ViewTransform {
		x: width / 2.0 - cx * k,
		y: height / 2.0 - cy * k,
		k,
	}
}

/// Keep the scale, move `(gx, gy)` to the middle of the viewport.
pub fn center_on(current: ViewTransform, gx: f64, gy: f64, width: f64, height: f64) -> ViewTransform {
	ViewTransform {
		x: width / 2.0 - gx * current.k,
		y: height / 2.0 - gy * current.k,
		k: current.k,
	}
}

#[derive(Clone, Copy, Debug)]
struct Tween {
	from: ViewTransform,
	to: ViewTransform,
	elapsed: f64,
	duration: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	Idle,
	AwaitingSettle,
	Fitting,
	Centering,
}

#[derive(Clone, Debug)]
pub struct Camera {
	pub transform: ViewTransform,
	phase: Phase,
	tween: Option<Tween>,
	waited: f64,
}

impl Camera {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			transform: ViewTransform::centered(width, height),
			phase: Phase::Idle,
			tween: None,
			waited: 0.0,
		}
	}

	#[cfg(test)]
	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Queue fit-to-view then center-on-origin, starting once the layout settles.
	pub fn start_choreography(&mut self) {
		self.phase = Phase::AwaitingSettle;
		self.tween = None;
		self.waited = 0.0;
	}

	/// Manual pan or zoom takes over the camera.
	pub fn interrupt(&mut self) {
		self.phase = Phase::Idle;
		self.tween = None;
	}

	fn animate_to(&mut self, to: ViewTransform, duration: f64) {
		self.tween = Some(Tween {
			from: self.transform,
			to,
			elapsed: 0.0,
			duration,
		});
	}

	pub fn step(
		&mut self,
		dt: f64,
		settled: bool,
		extent: impl FnOnce() -> Option<Extent>,
		width: f64,
		height: f64,
	) {
		if let Some(tween) = self.tween.as_mut() {
			tween.elapsed += dt;
			let t = (tween.elapsed / tween.duration).min(1.0);
			self.transform = tween.from.lerp(&tween.to, ease_out_cubic(t));
			if t >= 1.0 {
				self.tween = None;
			}
		}

		match self.phase {
			Phase::AwaitingSettle => {
				self.waited += dt;
				if !settled && self.waited < MAX_SETTLE_WAIT {
					return;
				}
				match extent() {
					Some(extent) => {
						let target = fit_to_view(extent, width, height, FIT_PADDING);
						self.animate_to(target, FIT_DURATION);
						self.phase = Phase::Fitting;
					}
					None => self.phase = Phase::Idle,
				}
			}
			Phase::Fitting if self.tween.is_none() => {
				let target = center_on(self.transform, 0.0, 0.0, width, height);
				self.animate_to(target, CENTER_DURATION);
				self.phase = Phase::Centering;
			}
			Phase::Centering if self.tween.is_none() => self.phase = Phase::Idle,
			_ => {}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const DT: f64 = 0.016;

	fn extent() -> Extent {
		Extent {
			min_x: -50.0,
			min_y: -100.0,
			max_x: 350.0,
			max_y: 100.0,
		}
	}

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() < 1e-6
	}

	#[test]
	fn fit_contains_extent_with_padding() {
		let t = fit_to_view(extent(), 800.0, 600.0, 40.0);
		assert!(close(t.k, 720.0 / 400.0));
		let left = extent().min_x * t.k + t.x;
		let right = extent().max_x * t.k + t.x;
		assert!(close(left, 40.0));
		assert!(close(right, 760.0));
	}

	#[test]
	fn center_keeps_scale() {
		let t = center_on(ViewTransform { x: 3.0, y: 4.0, k: 2.0 }, 0.0, 0.0, 800.0, 600.0);
		assert_eq!(t, ViewTransform { x: 400.0, y: 300.0, k: 2.0 });
	}

	#[test]
	fn waits_for_settle_before_fitting() {
		let mut camera = Camera::new(800.0, 600.0);
		camera.start_choreography();
		for _ in 0..10 {
			camera.step(DT, false, || Some(extent()), 800.0, 600.0);
		}
		assert_eq!(camera.phase(), Phase::AwaitingSettle);
		assert_eq!(camera.transform, ViewTransform::centered(800.0, 600.0));
		camera.step(DT, true, || Some(extent()), 800.0, 600.0);
		assert_eq!(camera.phase(), Phase::Fitting);
	}

	#[test]
	fn fits_then_centers_on_origin() {
		let mut camera = Camera::new(800.0, 600.0);
		camera.start_choreography();
		camera.step(DT, true, || Some(extent()), 800.0, 600.0);
		let fitted = fit_to_view(extent(), 800.0, 600.0, FIT_PADDING);

		let mut steps = 0;
		while camera.phase() == Phase::Fitting {
			camera.step(DT, true, || None, 800.0, 600.0);
			steps += 1;
			assert!(steps < 1000);
		}
		assert_eq!(camera.phase(), Phase::Centering);
		assert!(close(camera.transform.k, fitted.k));
		assert!(close(camera.transform.x, fitted.x));

		while camera.phase() == Phase::Centering {
			camera.step(DT, true, || None, 800.0, 600.0);
			steps += 1;
			assert!(steps < 1000);
		}
		assert_eq!(camera.phase(), Phase::Idle);
		assert!(close(camera.transform.x, 400.0));
		assert!(close(camera.transform.y, 300.0));
		assert!(close(camera.transform.k, fitted.k));
	}

	#[test]
	fn fits_anyway_after_max_wait() {
		let mut camera = Camera::new(800.0, 600.0);
		camera.start_choreography();
		let steps = (MAX_SETTLE_WAIT / DT).ceil() as usize + 1;
		for _ in 0..steps {
			camera.step(DT, false, || Some(extent()), 800.0, 600.0);
		}
		assert_eq!(camera.phase(), Phase::Fitting);
	}

	#[test]
	fn interrupt_stops_choreography() {
		let mut camera = Camera::new(800.0, 600.0);
		camera.start_choreography();
		camera.step(DT, true, || Some(extent()), 800.0, 600.0);
		camera.interrupt();
		let before = camera.transform;
		camera.step(DT, true, || Some(extent()), 800.0, 600.0);
		assert_eq!(camera.phase(), Phase::Idle);
		assert_eq!(camera.transform, before);
	}

	#[test]
	fn empty_graph_ends_idle() {
		let mut camera = Camera::new(800.0, 600.0);
		camera.start_choreography();
		camera.step(DT, true, || None, 800.0, 600.0);
		assert_eq!(camera.phase(), Phase::Idle);
	}
}
