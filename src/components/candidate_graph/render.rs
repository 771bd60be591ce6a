use std::f64::consts::PI;

use force_graph::DefaultNodeIdx;
use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::avatar::{AvatarCache, HtmlImageLoader};
use super::camera::ease_out_cubic;
use super::layout::{
	CAPTION_FONT_PX, GENERIC_FONT_PX, LABEL_FONT_PX, REPO_FONT_PX, REPO_HEIGHT, REPO_ICON_GAP,
	REPO_ICON_WIDTH, REPO_PADDING_X, TextMeasure, avatar_radius, font, repository_width,
};
use super::palette::{color_for, color_from_identity, display_name_for, initials_for};
use super::state::{GraphState, NodeBounds};
use super::types::{GraphNode, NodeKind};

const BACKGROUND: &str = "#1a1a2e";
const CHIP_FILL: &str = "rgba(15, 23, 42, 0.75)";
const FOCAL_OUTLINE: &str = "#f59e0b";
const REPO_ICON: &str = "\u{2387}";

pub fn render(
	state: &mut GraphState,
	ctx: &CanvasRenderingContext2d,
	avatars: &AvatarCache<HtmlImageLoader>,
) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let t = state.camera.transform;
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_edges(state, ctx);
	let recorded = draw_nodes(state, ctx, avatars);
	ctx.restore();
	state.record_bounds(recorded);
}

fn draw_edges(state: &GraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.camera.transform.k;
	let t = ease_out_cubic(state.hover.highlight_t);
	let has_highlight = state.has_active_highlight();

	state.sim.graph.visit_edges(|n1, n2, _| {
		let lit = !has_highlight || (state.is_highlighted(n1.index()) && state.is_highlighted(n2.index()));
		let (alpha, width) = if lit {
			(0.5 + 0.4 * t, (1.2 + 0.6 * t) / k)
		} else {
			(0.5 - 0.35 * t, 1.2 / k)
		};
		ctx.set_stroke_style_str(&format!("rgba(148, 163, 184, {alpha})"));
		ctx.set_line_width(width);
		ctx.begin_path();
		ctx.move_to(n1.x() as f64, n1.y() as f64);
		ctx.line_to(n2.x() as f64, n2.y() as f64);
		ctx.stroke();
	});
}

fn draw_nodes(
	state: &GraphState,
	ctx: &CanvasRenderingContext2d,
	avatars: &AvatarCache<HtmlImageLoader>,
) -> Vec<(DefaultNodeIdx, NodeBounds)> {
	let has_highlight = state.has_active_highlight();
	let t = ease_out_cubic(state.hover.highlight_t);
	let mut recorded = Vec::new();

	state.sim.graph.visit_nodes(|node| {
		let idx = node.index();
		let info = &node.data.user_data.node;
		let (x, y) = (node.x() as f64, node.y() as f64);
		let alpha = if has_highlight && !state.is_highlighted(idx) {
			1.0 - 0.7 * t
		} else {
			1.0
		};

		ctx.set_global_alpha(alpha);
		let bounds = match info.kind {
			NodeKind::RelationshipLabel => draw_label(ctx, info, x, y),
			NodeKind::User => {
				let image = info.avatar_url.as_deref().and_then(|url| avatars.get(url));
				draw_user(ctx, info, x, y, image.as_ref())
			}
			NodeKind::Repository => draw_repository(ctx, info, x, y),
			NodeKind::Generic => draw_generic(ctx, info, x, y),
		};
		ctx.set_global_alpha(1.0);
		recorded.push((idx, bounds));
	});
	recorded
}

/// Text centered on a translucent box sized to its metrics.
fn text_chip(
	ctx: &CanvasRenderingContext2d,
	text: &str,
	x: f64,
	y: f64,
	font_px: f64,
	fill: &str,
	color: &str,
) -> (f64, f64) {
	let width = ctx.text_width(text, font_px) + 6.0;
	let height = font_px + 4.0;
	ctx.set_fill_style_str(fill);
	rounded_rect(ctx, x - width / 2.0, y - height / 2.0, width, height, 2.0);
	ctx.fill();
	ctx.set_fill_style_str(color);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let _ = ctx.fill_text(text, x, y);
	(width, height)
}

fn draw_label(ctx: &CanvasRenderingContext2d, node: &GraphNode, x: f64, y: f64) -> NodeBounds {
	let (width, height) = text_chip(
		ctx,
		display_name_for(node),
		x,
		y,
		LABEL_FONT_PX,
		"rgba(30, 41, 59, 0.7)",
		"#cbd5e1",
	);
	NodeBounds::Rect { width, height }
}

fn draw_generic(ctx: &CanvasRenderingContext2d, node: &GraphNode, x: f64, y: f64) -> NodeBounds {
	let (width, height) = text_chip(
		ctx,
		display_name_for(node),
		x,
		y,
		GENERIC_FONT_PX,
		CHIP_FILL,
		color_for(node),
	);
	NodeBounds::Rect { width, height }
}

fn draw_user(
	ctx: &CanvasRenderingContext2d,
	node: &GraphNode,
	x: f64,
	y: f64,
	image: Option<&HtmlImageElement>,
) -> NodeBounds {
	let radius = avatar_radius(node.focal);
	let name = display_name_for(node);

	ctx.save();
	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	match image {
		Some(image) => {
			ctx.clip();
			let _ = ctx.draw_image_with_html_image_element_and_dw_and_dh(
				image,
				x - radius,
				y - radius,
				radius * 2.0,
				radius * 2.0,
			);
		}
		None => {
			ctx.set_fill_style_str(color_from_identity(name));
			ctx.fill();
			ctx.set_fill_style_str("white");
			ctx.set_font(&format!("bold {}", font(radius * 0.8)));
			ctx.set_text_align("center");
			ctx.set_text_baseline("middle");
			let _ = ctx.fill_text(&initials_for(name), x, y);
		}
	}
	ctx.restore();

	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	if node.focal {
		ctx.set_stroke_style_str(FOCAL_OUTLINE);
		ctx.set_line_width(3.0);
	} else {
		ctx.set_stroke_style_str("rgba(255, 255, 255, 0.8)");
		ctx.set_line_width(1.5);
	}
	ctx.stroke();

	let caption_dy = radius + 4.0 + CAPTION_FONT_PX / 2.0;
	let (caption_width, caption_height) =
		text_chip(ctx, name, x, y + caption_dy, CAPTION_FONT_PX, CHIP_FILL, "white");

	NodeBounds::Avatar {
		radius,
		caption_width,
		caption_height,
		caption_dy,
	}
}

fn draw_repository(ctx: &CanvasRenderingContext2d, node: &GraphNode, x: f64, y: f64) -> NodeBounds {
	let name = display_name_for(node);
	let width = repository_width(name, ctx);
	let (left, top) = (x - width / 2.0, y - REPO_HEIGHT / 2.0);

	ctx.set_fill_style_str(color_for(node));
	rounded_rect(ctx, left, top, width, REPO_HEIGHT, REPO_HEIGHT / 2.0);
	ctx.fill();

	ctx.set_fill_style_str("white");
	ctx.set_text_align("left");
	ctx.set_text_baseline("middle");
	ctx.set_font(&font(REPO_ICON_WIDTH));
	let _ = ctx.fill_text(REPO_ICON, left + REPO_PADDING_X, y);
	ctx.set_font(&font(REPO_FONT_PX));
	let _ = ctx.fill_text(name, left + REPO_PADDING_X + REPO_ICON_WIDTH + REPO_ICON_GAP, y);

	NodeBounds::Rect {
		width,
		height: REPO_HEIGHT,
	}
}

fn rounded_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
	let r = r.min(w / 2.0).min(h / 2.0);
	ctx.begin_path();
	ctx.move_to(x + r, y);
	let _ = ctx.arc_to(x + w, y, x + w, y + h, r);
	let _ = ctx.arc_to(x + w, y + h, x, y + h, r);
	let _ = ctx.arc_to(x, y + h, x, y, r);
	let _ = ctx.arc_to(x, y, x + w, y, r);
	ctx.close_path();
}
