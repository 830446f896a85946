use std::borrow::Cow;
use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::ActivityGraphState;
use super::types::{NodeKind, Position};

const BACKGROUND: &str = "#1a1a2e";
const STORE_COLOR: &str = "#f59e0b";
const ACTOR_COLOR: &str = "#6366f1";

pub const LABEL_MAX_CHARS: usize = 14;
pub const LABEL_MIN_ZOOM: f64 = 0.5;
const LABEL_SCREEN_PX: f64 = 11.0;

/// How an element relates to the hovered node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Focus {
	/// Nothing is hovered.
	None,
	/// The hovered node, a neighbor of it, or an edge touching it.
	Focused,
	/// Something else is hovered.
	Unfocused,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
	pub alpha: f64,
	pub width: f64,
}

pub fn edge_style(focus: Focus, fresh: bool) -> EdgeStyle {
	let mut style = match focus {
		Focus::None => EdgeStyle { alpha: 0.35, width: 1.0 },
		Focus::Focused => EdgeStyle { alpha: 0.9, width: 2.0 },
		Focus::Unfocused => EdgeStyle { alpha: 0.1, width: 1.0 },
	};
	if fresh {
		style.alpha = style.alpha.max(0.9);
		style.width += 1.5;
	}
	style
}

/// Actors cut off by the type filter fade out. Stores never do.
pub fn node_alpha(kind: NodeKind, has_visible_edge: bool, focus: Focus) -> f64 {
	let base = match kind {
		NodeKind::Actor if !has_visible_edge => 0.15,
		_ => 1.0,
	};
	match focus {
		Focus::None => base,
		Focus::Focused => 1.0,
		Focus::Unfocused => base * 0.25,
	}
}

/// Half side of a store square or radius of an actor circle.
pub fn node_size(kind: NodeKind, activity_count: u32) -> f64 {
	let count = f64::from(activity_count.min(10));
	match kind {
		NodeKind::Store => 14.0 + count * 1.2,
		NodeKind::Actor => 10.0 + count * 0.8,
	}
}

pub fn truncate_label(label: &str, max_chars: usize) -> Cow<'_, str> {
	match label.char_indices().nth(max_chars) {
		Some((end, _)) => Cow::Owned(format!("{}…", &label[..end])),
		None => Cow::Borrowed(label),
	}
}

/// Graph-space font size for node labels at zoom `k`, or `None` when labels are hidden.
pub fn label_font_size(k: f64) -> Option<f64> {
	(k > LABEL_MIN_ZOOM).then(|| LABEL_SCREEN_PX / k)
}

fn focus_of(state: &ActivityGraphState, highlighted: bool) -> Focus {
	match (state.hover.node, highlighted) {
		(None, _) => Focus::None,
		(Some(_), true) => Focus::Focused,
		(Some(_), false) => Focus::Unfocused,
	}
}

pub fn render(state: &ActivityGraphState, ctx: &CanvasRenderingContext2d, now_ms: f64) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx, now_ms);
	draw_nodes(state, ctx);
	ctx.restore();
}

fn draw_edges(state: &ActivityGraphState, ctx: &CanvasRenderingContext2d, now_ms: f64) {
	let k = state.transform.k;
	for (i, edge) in state.graph.edges.iter().enumerate() {
		let Some((s, t)) = state.visible_endpoints(i) else {
			continue;
		};
		let (Some(a), Some(b)) = (state.graph.nodes[s].position, state.graph.nodes[t].position) else {
			continue;
		};
		let touches = state.hover.node.is_some_and(|h| h == s || h == t);
		let style = edge_style(focus_of(state, touches), state.is_fresh(&edge.id, now_ms));

		ctx.set_global_alpha(style.alpha);
		ctx.set_stroke_style_str(edge.activity_type.color());
		ctx.set_line_width(style.width / k.max(0.5));
		ctx.begin_path();
		ctx.move_to(a.x, a.y);
		ctx.line_to(b.x, b.y);
		ctx.stroke();
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &ActivityGraphState, ctx: &CanvasRenderingContext2d) {
	let connected = state.nodes_with_visible_edges();
	let font = label_font_size(state.transform.k);

	for (i, node) in state.graph.nodes.iter().enumerate() {
		let Some(p) = node.position else {
			continue;
		};
		let kind = node.kind();
		let size = node_size(kind, node.activity_count);
		let alpha = node_alpha(kind, connected[i], focus_of(state, state.is_highlighted(i)));
		ctx.set_global_alpha(alpha);

		ctx.begin_path();
		match kind {
			NodeKind::Store => {
				rounded_square(ctx, p, size, size * 0.3);
				ctx.set_fill_style_str(STORE_COLOR);
			}
			NodeKind::Actor => {
				let _ = ctx.arc(p.x, p.y, size, 0.0, 2.0 * PI);
				ctx.set_fill_style_str(ACTOR_COLOR);
			}
		}
		ctx.fill();
		if state.hover.node == Some(i) {
			ctx.set_stroke_style_str("white");
			ctx.set_line_width(2.0 / state.transform.k);
			ctx.stroke();
		}

		ctx.set_fill_style_str("white");
		ctx.set_text_align("center");
		ctx.set_text_baseline("middle");
		ctx.set_font(&format!("bold {}px sans-serif", size * 0.8));
		let _ = ctx.fill_text(&node.initials, p.x, p.y);

		if let Some(px) = font {
			ctx.set_text_baseline("top");
			ctx.set_fill_style_str("rgba(255, 255, 255, 0.85)");
			ctx.set_font(&format!("{px}px sans-serif"));
			let _ = ctx.fill_text(&truncate_label(&node.label, LABEL_MAX_CHARS), p.x, p.y + size + 4.0);
		}
	}
	ctx.set_global_alpha(1.0);
}

fn rounded_square(ctx: &CanvasRenderingContext2d, center: Position, half: f64, radius: f64) {
	let (left, top, right, bottom) = (center.x - half, center.y - half, center.x + half, center.y + half);
	ctx.move_to(left + radius, top);
	let _ = ctx.arc_to(right, top, right, bottom, radius);
	let _ = ctx.arc_to(right, bottom, left, bottom, radius);
	let _ = ctx.arc_to(left, bottom, left, top, radius);
	let _ = ctx.arc_to(left, top, right, top, radius);
	ctx.close_path();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn hovering_emphasizes_touching_edges_and_dims_the_rest() {
		assert_eq!(edge_style(Focus::None, false).alpha, 0.35);
		let touching = edge_style(Focus::Focused, false);
		let other = edge_style(Focus::Unfocused, false);
		assert_eq!(touching.alpha, 0.9);
		assert_eq!(other.alpha, 0.1);
		assert!(touching.width > other.width);
	}

	#[test]
	fn fresh_edges_stand_out_even_when_dimmed() {
		let dimmed = edge_style(Focus::Unfocused, true);
		assert_eq!(dimmed.alpha, 0.9);
		assert!(dimmed.width > edge_style(Focus::Unfocused, false).width);
		assert!(edge_style(Focus::None, true).width > edge_style(Focus::None, false).width);
	}

	#[test]
	fn filtered_actors_fade_but_stores_stay() {
		assert!(node_alpha(NodeKind::Actor, false, Focus::None) < 0.5);
		assert_eq!(node_alpha(NodeKind::Actor, true, Focus::None), 1.0);
		assert_eq!(node_alpha(NodeKind::Store, false, Focus::None), 1.0);
		assert_eq!(node_alpha(NodeKind::Actor, false, Focus::Focused), 1.0);
		assert!(node_alpha(NodeKind::Store, true, Focus::Unfocused) > 0.0);
	}

	#[test]
	fn node_sizes_grow_then_cap_inside_hit_radius() {
		assert!(node_size(NodeKind::Store, 5) > node_size(NodeKind::Store, 0));
		assert_eq!(node_size(NodeKind::Store, 10), node_size(NodeKind::Store, 1_000));
		assert_eq!(node_size(NodeKind::Actor, 10), node_size(NodeKind::Actor, 1_000));
		assert!(node_size(NodeKind::Store, u32::MAX) < 28.0);
		assert!(node_size(NodeKind::Actor, u32::MAX) < 20.0);
		assert!(node_size(NodeKind::Actor, u32::MAX) < node_size(NodeKind::Store, u32::MAX));
	}

	#[test]
	fn long_labels_get_an_ellipsis() {
		assert_eq!(truncate_label("Corner Bakery", 14), "Corner Bakery");
		assert_eq!(truncate_label("Fourteen chars", 14), "Fourteen chars");
		assert_eq!(truncate_label("The Very Long Store Name", 14), "The Very Long …");
		assert_eq!(truncate_label("äöüäöüäöüäöüäöüäöü", 14), "äöüäöüäöüäöüäö…");
	}

	#[test]
	fn labels_hide_when_zoomed_out() {
		assert_eq!(label_font_size(0.5), None);
		assert_eq!(label_font_size(0.3), None);
		let near = label_font_size(2.0).unwrap();
		let far = label_font_size(0.6).unwrap();
		assert!(near < far);
		assert!((near * 2.0 - LABEL_SCREEN_PX).abs() < 1e-9);
	}
}
