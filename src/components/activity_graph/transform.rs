//! Turns an activity batch into a node/edge graph.

use std::collections::HashMap;

use crate::activity::ActivityEvent;

use super::types::{GraphData, GraphEdge, GraphNode, NodeKey};

const SHORT_ID_LEN: usize = 6;

/// Builds a fresh graph from `activities`.
///
/// Nodes already present in `previous` keep their position so the layout does not jump.
/// Counts and timestamps are rebuilt from this batch only. Events without an actor or a
/// store still count towards the node they do name but produce no edge.
pub fn build_graph(
	activities: &[ActivityEvent],
	previous: &HashMap<NodeKey, GraphNode>,
) -> GraphData {
	let mut nodes: Vec<GraphNode> = Vec::new();
	let mut index: HashMap<NodeKey, usize> = HashMap::new();
	let mut edges = Vec::new();

	for event in activities {
		let actor = event.actor_id().map(|id| {
			let key = NodeKey::Actor(id.to_string());
			let label = event
				.actor_label()
				.map(str::to_string)
				.unwrap_or_else(|| format!("Agent {}", short_id(id)));
			upsert(&mut nodes, &mut index, previous, key, label, event)
		});
		let store = event.store().map(|id| {
			let key = NodeKey::Store(id.to_string());
			let label = event
				.store_name()
				.map(str::to_string)
				.unwrap_or_else(|| format!("Store {}", short_id(id)));
			upsert(&mut nodes, &mut index, previous, key, label, event)
		});

		if let (Some(actor), Some(store)) = (actor, store) {
			edges.push(GraphEdge {
				id: event.id.clone(),
				source: nodes[actor].key.clone(),
				target: nodes[store].key.clone(),
				activity_type: event.kind,
				actor_name: nodes[actor].label.clone(),
				created_at: event.created_at,
				meta: event.meta.clone(),
			});
		}
	}

	GraphData { nodes, edges }
}

/// Keyed copy of `nodes`, the shape [`build_graph`] expects as its `previous` input.
pub fn node_map(nodes: &[GraphNode]) -> HashMap<NodeKey, GraphNode> {
	nodes
		.iter()
		.map(|node| (node.key.clone(), node.clone()))
		.collect()
}

fn upsert(
	nodes: &mut Vec<GraphNode>,
	index: &mut HashMap<NodeKey, usize>,
	previous: &HashMap<NodeKey, GraphNode>,
	key: NodeKey,
	label: String,
	event: &ActivityEvent,
) -> usize {
	let idx = *index.entry(key.clone()).or_insert_with(|| {
		let position = previous.get(&key).and_then(|prev| prev.position);
		nodes.push(GraphNode {
			initials: initials(&label),
			label,
			key,
			activity_count: 0,
			last_active: event.created_at,
			position,
			pinned: None,
		});
		nodes.len() - 1
	});

	let node = &mut nodes[idx];
	node.activity_count += 1;
	node.last_active = node.last_active.max(event.created_at);
	idx
}

/// Up to two uppercase letters: the first letters of the first two words, or the first
/// two characters of a single word.
pub fn initials(label: &str) -> String {
	let mut words = label.split_whitespace();
	let picked: String = match (words.next(), words.next()) {
		(Some(first), Some(second)) => first.chars().take(1).chain(second.chars().take(1)).collect(),
		(Some(only), None) => only.chars().take(2).collect(),
		_ => "?".to_string(),
	};
	picked.to_uppercase().chars().take(2).collect()
}

fn short_id(id: &str) -> &str {
	match id.char_indices().nth(SHORT_ID_LEN) {
		Some((end, _)) => &id[..end],
		None => id,
	}
}

#[cfg(test)]
mod tests {
	use chrono::{DateTime, Utc};
	use pretty_assertions::assert_eq;

	use super::*;
	use crate::activity::{ActivityType, MetaValue};
	use crate::components::activity_graph::types::{NodeKind, Position};

	fn ts(s: &str) -> DateTime<Utc> {
		s.parse().unwrap()
	}

	fn event(id: &str, actor: Option<&str>, store: Option<&str>, at: &str) -> ActivityEvent {
		ActivityEvent {
			id: id.into(),
			kind: ActivityType::OrderPlaced,
			actor_agent_id: actor.map(Into::into),
			actor_name: None,
			actor_display_name: actor.map(|a| format!("User {a}")),
			store_id: store.map(Into::into),
			created_at: ts(at),
			meta: Default::default(),
		}
	}

	#[test]
	fn two_orders_between_same_pair() {
		let activities = vec![
			event("a1", Some("u1"), Some("s1"), "2024-01-01T00:00:00Z"),
			event("a2", Some("u1"), Some("s1"), "2024-01-02T00:00:00Z"),
		];
		let graph = build_graph(&activities, &HashMap::new());

		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.edges.len(), 2);
		assert_eq!(graph.nodes[0].key, NodeKey::Actor("u1".into()));
		assert_eq!(graph.nodes[1].key, NodeKey::Store("s1".into()));
		for node in &graph.nodes {
			assert_eq!(node.activity_count, 2);
			assert_eq!(node.last_active, ts("2024-01-02T00:00:00Z"));
		}
		assert_eq!(graph.edges[0].id, "a1");
		assert_eq!(graph.edges[1].id, "a2");
	}

	#[test]
	fn last_active_is_max_not_last_seen() {
		let activities = vec![
			event("a2", Some("u1"), Some("s1"), "2024-01-02T00:00:00Z"),
			event("a1", Some("u1"), Some("s1"), "2024-01-01T00:00:00Z"),
		];
		let graph = build_graph(&activities, &HashMap::new());
		assert_eq!(graph.nodes[0].last_active, ts("2024-01-02T00:00:00Z"));
	}

	#[test]
	fn positions_carry_over_between_batches() {
		let first = build_graph(
			&[event("a1", Some("u1"), Some("s1"), "2024-01-01T00:00:00Z")],
			&HashMap::new(),
		);
		let mut placed = first.nodes.clone();
		placed[0].position = Some(Position::new(10.0, 20.0));
		placed[1].position = Some(Position::new(-5.0, 7.5));

		let second = build_graph(
			&[
				event("a2", Some("u2"), Some("s1"), "2024-01-03T00:00:00Z"),
				event("a1", Some("u1"), Some("s1"), "2024-01-01T00:00:00Z"),
			],
			&node_map(&placed),
		);
		let find = |key: NodeKey| second.nodes.iter().find(|n| n.key == key).unwrap();

		assert_eq!(
			find(NodeKey::Actor("u1".into())).position,
			Some(Position::new(10.0, 20.0))
		);
		assert_eq!(
			find(NodeKey::Store("s1".into())).position,
			Some(Position::new(-5.0, 7.5))
		);
		assert_eq!(find(NodeKey::Actor("u2".into())).position, None);
		// counts are per batch, not cumulative
		assert_eq!(find(NodeKey::Store("s1".into())).activity_count, 2);
		assert_eq!(find(NodeKey::Actor("u1".into())).activity_count, 1);
	}

	#[test]
	fn incomplete_events_count_but_make_no_edge() {
		let activities = vec![
			event("a1", Some("u1"), None, "2024-01-01T00:00:00Z"),
			event("a2", None, Some("s1"), "2024-01-01T00:00:00Z"),
			event("a3", None, None, "2024-01-01T00:00:00Z"),
		];
		let graph = build_graph(&activities, &HashMap::new());
		assert!(graph.edges.is_empty());
		assert_eq!(graph.nodes.len(), 2);
		assert!(graph.nodes.iter().all(|n| n.activity_count == 1));
	}

	#[test]
	fn equal_raw_ids_stay_separate_nodes() {
		let graph = build_graph(
			&[event("a1", Some("x"), Some("x"), "2024-01-01T00:00:00Z")],
			&HashMap::new(),
		);
		assert_eq!(graph.nodes.len(), 2);
		assert_eq!(graph.nodes[0].kind(), NodeKind::Actor);
		assert_eq!(graph.nodes[1].kind(), NodeKind::Store);
		assert_eq!(graph.edges.len(), 1);
	}

	#[test]
	fn store_label_uses_meta_then_fallback() {
		let mut named = event("a1", Some("u1"), Some("store-123456789"), "2024-01-01T00:00:00Z");
		named
			.meta
			.insert("store_name".into(), MetaValue::Text("Corner Bakery".into()));
		let unnamed = event("a2", Some("u1"), Some("store-987654321"), "2024-01-01T00:00:00Z");

		let graph = build_graph(&[named, unnamed], &HashMap::new());
		assert_eq!(graph.nodes[1].label, "Corner Bakery");
		assert_eq!(graph.nodes[1].initials, "CB");
		assert_eq!(graph.nodes[2].label, "Store store-");
	}

	#[test]
	fn actor_label_falls_back_to_short_id() {
		let mut anonymous = event("a1", Some("agent-42-long"), Some("s1"), "2024-01-01T00:00:00Z");
		anonymous.actor_display_name = None;
		let graph = build_graph(&[anonymous], &HashMap::new());
		assert_eq!(graph.nodes[0].label, "Agent agent-");
		assert_eq!(graph.edges[0].actor_name, "Agent agent-");
	}

	#[test]
	fn initials_are_at_most_two_chars() {
		assert_eq!(initials("ada lovelace byron"), "AL");
		assert_eq!(initials("zed"), "ZE");
		assert_eq!(initials("q"), "Q");
		assert_eq!(initials("   "), "?");
		assert_eq!(initials("ßeta"), "SS");
	}

	#[test]
	fn previous_map_is_not_mutated() {
		let first = build_graph(
			&[event("a1", Some("u1"), Some("s1"), "2024-01-01T00:00:00Z")],
			&HashMap::new(),
		);
		let previous = node_map(&first.nodes);
		let before = previous.clone();
		let _ = build_graph(
			&[event("a2", Some("u1"), Some("s1"), "2024-02-01T00:00:00Z")],
			&previous,
		);
		assert_eq!(previous, before);
	}
}
