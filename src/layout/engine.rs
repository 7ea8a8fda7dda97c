//! The flexbox layout pass.
//!
//! [`update_flexbox_layout`] runs one pass over a container's eligible
//! children through the [`FlexHost`] hooks:
//!
//! 1. collect visible, non-ignored children (reversed for `*-reverse`)
//! 2. break them into flows along the main axis
//! 3. clamp flow slack for main-axis compact containers
//! 4. place flows on the cross axis (`wrap-reverse`, `align-content`)
//! 5. distribute main-axis slack per flow (grow, else `justify-content`)
//! 6. align items on the cross axis within their flow
//! 7. record the total basis extents
//!
//! A layout request arriving while a pass runs is deferred: it raises the
//! container's update-again flag and the pass is re-run once afterwards.

use crate::geometry::Axis;

use super::child::FlexItem;
use super::container::FlexContainer;
use super::style::{AlignContent, AlignItems, AlignSelf, Wrap};

/// Hooks a node tree provides so the engine can read and write geometry.
pub trait FlexHost {
    type Node: Copy;

    fn flex_container(&self, node: Self::Node) -> Option<&FlexContainer>;
    fn flex_container_mut(&mut self, node: Self::Node) -> Option<&mut FlexContainer>;
    fn flex_item(&self, node: Self::Node) -> Option<&FlexItem>;

    /// Children in document order.
    fn flex_children(&self, node: Self::Node) -> Vec<Self::Node>;
    fn is_visible(&self, node: Self::Node) -> bool;

    /// Current size of `node` along `axis`.
    fn size_for_flexbox_layout(&self, node: Self::Node, axis: Axis) -> f64;

    /// Natural size of a child along `axis`: the cached basis, else its
    /// current size.
    fn flex_basis(&self, node: Self::Node, axis: Axis) -> f64 {
        let current = self.size_for_flexbox_layout(node, axis);
        self.flex_item(node).map_or(current, |item| item.flex_basis(axis, current))
    }

    fn set_position_via_flex(&mut self, node: Self::Node, axis: Axis, value: f64);
    fn set_size_via_flex(&mut self, node: Self::Node, axis: Axis, value: f64);

    /// Whether the container shrink-wraps its content along `axis`.
    fn is_compact(&self, _node: Self::Node, _axis: Axis) -> bool {
        false
    }

    /// Offset applied on top of centering for `baseline` alignment.
    fn baseline_offset(&self, _node: Self::Node) -> f64 {
        0.0
    }
}

/// Summary of a completed layout run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlexMetrics {
    pub flows: usize,
    pub total_basis_width: f64,
    pub total_basis_height: f64,
    /// 1, or 2 when a deferred request forced a re-run.
    pub passes: u32,
}

/// Lay out `node`'s children.
///
/// Returns `None` when `node` is not a flex container, is paused, or is
/// already mid-pass (in which case a re-run is scheduled).
pub fn update_flexbox_layout<H: FlexHost + ?Sized>(host: &mut H, node: H::Node) -> Option<FlexMetrics> {
    let container = host.flex_container_mut(node)?;
    if container.paused {
        return None;
    }
    if container.updating {
        container.update_again = true;
        tracing::debug!("layout requested mid-pass; deferring");
        return None;
    }
    container.updating = true;

    let mut passes = 0;
    let mut metrics = loop {
        if let Some(c) = host.flex_container_mut(node) {
            c.update_again = false;
        }
        let metrics = layout_pass(host, node);
        passes += 1;
        let again = host.flex_container(node).is_some_and(|c| c.update_again);
        if !again || passes >= 2 {
            break metrics;
        }
    };
    metrics.passes = passes;

    if let Some(c) = host.flex_container_mut(node) {
        c.updating = false;
        c.update_again = false;
        c.total_basis_width = metrics.total_basis_width;
        c.total_basis_height = metrics.total_basis_height;
    }
    tracing::debug!(
        flows = metrics.flows,
        passes,
        width = metrics.total_basis_width,
        height = metrics.total_basis_height,
        "flexbox layout"
    );
    Some(metrics)
}

// ---------------------------------------------------------------------------
// Pass internals
// ---------------------------------------------------------------------------

struct Item<N> {
    node: N,
    basis_main: f64,
    basis_cross: f64,
    grow: f64,
    align_self: AlignSelf,
    main_pos: f64,
    main_size: f64,
    cross_pos: f64,
    cross_size: f64,
}

#[derive(Default)]
struct Flow {
    /// Range into the item list.
    start: usize,
    end: usize,
    grow_count: f64,
    cross_size: f64,
    cross_pos: f64,
    consumed: f64,
    extra: f64,
}

fn layout_pass<H: FlexHost + ?Sized>(host: &mut H, node: H::Node) -> FlexMetrics {
    let Some(style) = host.flex_container(node).map(|c| c.style) else {
        return FlexMetrics::empty();
    };
    let main = style.direction.main_axis();
    let cross = main.cross();
    let container_main = host.size_for_flexbox_layout(node, main);
    let container_cross = host.size_for_flexbox_layout(node, cross);

    // 1. Eligible children.
    let mut items: Vec<Item<H::Node>> = host
        .flex_children(node)
        .into_iter()
        .filter(|&child| host.is_visible(child))
        .filter_map(|child| {
            let item = host.flex_item(child)?;
            if item.ignore_flex() {
                return None;
            }
            Some(Item {
                node: child,
                basis_main: host.flex_basis(child, main),
                basis_cross: host.flex_basis(child, cross),
                grow: item.grow(),
                align_self: item.align_self(),
                main_pos: 0.0,
                main_size: 0.0,
                cross_pos: 0.0,
                cross_size: 0.0,
            })
        })
        .collect();
    if items.is_empty() {
        return FlexMetrics::empty();
    }
    if style.direction.is_reverse() {
        items.reverse();
    }

    // 2. Flows.
    let wraps = style.wrap != Wrap::NoWrap;
    let main_gap = style.main_gap();
    let mut flows: Vec<Flow> = Vec::new();
    let mut pos = 0.0;
    for (index, item) in items.iter_mut().enumerate() {
        let starts_flow = match flows.last() {
            None => true,
            Some(_) => wraps && pos + main_gap + item.basis_main > container_main,
        };
        if starts_flow {
            flows.push(Flow {
                start: index,
                end: index,
                ..Flow::default()
            });
            pos = 0.0;
        } else {
            pos += main_gap;
        }
        let Some(current) = flows.last_mut() else {
            continue;
        };
        item.main_pos = pos;
        item.main_size = item.basis_main;
        pos += item.basis_main;
        current.end = index + 1;
        current.grow_count += item.grow;
        current.cross_size = current.cross_size.max(item.basis_cross);
        current.consumed = pos;
    }
    let mut max_main: f64 = 0.0;
    for flow in &mut flows {
        flow.extra = container_main - flow.consumed;
        max_main = max_main.max(flow.consumed);
    }

    // 3. Main-axis compact clamp.
    if host.is_compact(node, main) {
        let min_extra = flows.iter().map(|f| f.extra).fold(f64::INFINITY, f64::min);
        for flow in &mut flows {
            flow.extra -= min_extra;
        }
    }

    // 4. Flow placement on the cross axis.
    let cross_gap = style.cross_gap();
    let mut cross_pos = 0.0;
    for (i, flow) in flows.iter_mut().enumerate() {
        if i > 0 {
            cross_pos += cross_gap;
        }
        flow.cross_pos = cross_pos;
        cross_pos += flow.cross_size;
    }
    let total_cross = cross_pos;
    if style.wrap == Wrap::WrapReverse {
        for flow in &mut flows {
            flow.cross_pos = total_cross - (flow.cross_pos + flow.cross_size);
        }
        flows.reverse();
    }
    if !host.is_compact(node, cross) {
        let extra = container_cross - total_cross;
        let spread = distribute(style.align_content, extra, flows.len());
        for (i, flow) in flows.iter_mut().enumerate() {
            flow.cross_pos += spread.offset(i);
            flow.cross_size += spread.stretch;
        }
    }

    // 5. Main-axis slack within each flow.
    for flow in &flows {
        if flow.extra <= 0.0 {
            continue;
        }
        let members = &mut items[flow.start..flow.end];
        if flow.grow_count > 0.0 {
            let mut shift = 0.0;
            for item in members.iter_mut() {
                item.main_pos += shift;
                if item.grow > 0.0 {
                    let growth = flow.extra * (item.grow / flow.grow_count);
                    item.main_size += growth;
                    shift += growth;
                }
            }
        } else {
            let spread = distribute(style.justify_content.into(), flow.extra, members.len());
            for (i, item) in members.iter_mut().enumerate() {
                item.main_pos += spread.offset(i);
            }
        }
    }

    // 6. Cross-axis alignment.
    for flow in &flows {
        for item in &mut items[flow.start..flow.end] {
            let basis = item.basis_cross;
            let (pos, size) = match item.align_self.resolve(style.align_items) {
                AlignItems::Start => (flow.cross_pos, basis),
                AlignItems::End => (flow.cross_pos + flow.cross_size - basis, basis),
                AlignItems::Center => (flow.cross_pos + (flow.cross_size - basis) / 2.0, basis),
                AlignItems::Baseline => (
                    flow.cross_pos + (flow.cross_size - basis) / 2.0 + host.baseline_offset(item.node),
                    basis,
                ),
                AlignItems::Stretch => (flow.cross_pos, flow.cross_size),
            };
            item.cross_pos = pos;
            item.cross_size = size;
        }
    }

    for item in &items {
        host.set_position_via_flex(item.node, main, item.main_pos);
        host.set_size_via_flex(item.node, main, item.main_size);
        host.set_position_via_flex(item.node, cross, item.cross_pos);
        host.set_size_via_flex(item.node, cross, item.cross_size);
    }

    // 7. Totals.
    let (total_basis_width, total_basis_height) = match main {
        Axis::Horizontal => (max_main, total_cross),
        Axis::Vertical => (total_cross, max_main),
    };
    FlexMetrics {
        flows: flows.len(),
        total_basis_width,
        total_basis_height,
        passes: 1,
    }
}

impl FlexMetrics {
    fn empty() -> Self {
        Self {
            flows: 0,
            total_basis_width: 0.0,
            total_basis_height: 0.0,
            passes: 1,
        }
    }
}

/// Per-box offsets for leftover space.
struct Spread {
    first: f64,
    step: f64,
    stretch: f64,
}

impl Spread {
    fn offset(&self, index: usize) -> f64 {
        self.first + self.step * index as f64
    }
}

/// Spread `extra` over `count` consecutive boxes.
///
/// With negative `extra` the spacing modes never open negative gaps:
/// `space-around`/`space-evenly` fall back to centering, `space-between`
/// and `stretch` to start.
fn distribute(mode: AlignContent, extra: f64, count: usize) -> Spread {
    let none = Spread {
        first: 0.0,
        step: 0.0,
        stretch: 0.0,
    };
    if count == 0 {
        return none;
    }
    let n = count as f64;
    let mode = if extra < 0.0 {
        match mode {
            AlignContent::SpaceAround | AlignContent::SpaceEvenly => AlignContent::Center,
            AlignContent::SpaceBetween | AlignContent::Stretch => AlignContent::Start,
            other => other,
        }
    } else {
        mode
    };
    match mode {
        AlignContent::Start => none,
        AlignContent::End => Spread { first: extra, ..none },
        AlignContent::Center => Spread {
            first: extra / 2.0,
            ..none
        },
        AlignContent::SpaceBetween if count > 1 => Spread {
            step: extra / (n - 1.0),
            ..none
        },
        AlignContent::SpaceBetween => none,
        AlignContent::SpaceAround => Spread {
            first: extra / n / 2.0,
            step: extra / n,
            ..none
        },
        AlignContent::SpaceEvenly => Spread {
            first: extra / (n + 1.0),
            step: extra / (n + 1.0),
            ..none
        },
        AlignContent::Stretch => Spread {
            first: 0.0,
            step: extra / n,
            stretch: extra / n,
        },
    }
}
