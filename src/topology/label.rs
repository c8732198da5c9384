//! Path labels: monotone-path bookkeeping over chains of arcs.
//!
//! A label tags one arc as part of a monotone path. Labels of one arc are
//! linked horizontally; labels of one path are linked vertically across
//! consecutive arcs. Attaching a label splices it into any existing chain
//! with the same tag ending just below or starting just above, so repeated
//! insertion of the same logical mesh edge from adjacent cells becomes one
//! continuous chain instead of duplicated bookkeeping.

use crate::topology::graph::ReebGraph;
use crate::topology::handles::{ArcId, LabelId, NodeId};
use crate::topology::records::{Label, LabelTag};

impl ReebGraph {
    /// Finds a label with `tag` on any arc entering `n` from below.
    pub(crate) fn find_down_label(&self, n: NodeId, tag: LabelTag) -> LabelId {
        let mut a = self.node(n).down_arcs;
        while a.is_some() {
            let mut l = self.arc(a).label_head;
            while l.is_some() {
                if self.label(l).tag == tag {
                    return l;
                }
                l = self.label(l).h.next;
            }
            a = self.arc(a).high_links.next;
        }
        LabelId::NONE
    }

    /// Finds a label with `tag` on any arc leaving `n` upward.
    pub(crate) fn find_up_label(&self, n: NodeId, tag: LabelTag) -> LabelId {
        let mut a = self.node(n).up_arcs;
        while a.is_some() {
            let mut l = self.arc(a).label_head;
            while l.is_some() {
                if self.label(l).tag == tag {
                    return l;
                }
                l = self.label(l).h.next;
            }
            a = self.arc(a).low_links.next;
        }
        LabelId::NONE
    }

    /// Attaches a fresh `tag` label to a label-free arc and vertically
    /// splices it with same-tag chains meeting the arc's endpoints.
    pub(crate) fn attach_label(&mut self, arc: ArcId, tag: LabelTag) -> LabelId {
        debug_assert!(
            self.arc(arc).label_head.is_none(),
            "attach_label target must carry no labels"
        );
        let l = LabelId::new(self.labels.allocate());
        {
            let record = self.label_mut(l);
            *record = Label {
                arc,
                tag,
                ..Label::default()
            };
        }
        {
            let a = self.arc_mut(arc);
            a.label_head = l;
            a.label_tail = l;
        }

        let (low, high) = {
            let a = self.arc(arc);
            (a.low, a.high)
        };
        let below = self.find_down_label(low, tag);
        let above = self.find_up_label(high, tag);

        self.label_mut(l).v.prev = below;
        if below.is_some() {
            self.label_mut(below).v.next = l;
        }
        self.label_mut(l).v.next = above;
        if above.is_some() {
            self.label_mut(above).v.prev = l;
        }
        l
    }

    /// Unlinks `l` from its arc's horizontal label list.
    pub(crate) fn unlink_label_h(&mut self, l: LabelId) {
        let (arc, h) = {
            let label = self.label(l);
            (label.arc, label.h)
        };
        if h.prev.is_some() {
            self.label_mut(h.prev).h.next = h.next;
        } else {
            self.arc_mut(arc).label_head = h.next;
        }
        if h.next.is_some() {
            self.label_mut(h.next).h.prev = h.prev;
        } else {
            self.arc_mut(arc).label_tail = h.prev;
        }
    }

    /// Deletes the label chains that begin or end exactly at `n`, optionally
    /// restricted to one tag and one direction. Called whenever a node is
    /// about to disappear or a search has to clear its transient tags.
    pub(crate) fn simplify_labels(
        &mut self,
        n: NodeId,
        only: Option<LabelTag>,
        go_down: bool,
        go_up: bool,
    ) {
        // Chains ending here come in along a down-arc.
        if go_down {
            let mut a = self.node(n).down_arcs;
            while a.is_some() {
                let a_next = self.arc(a).high_links.next;
                let mut l = self.arc(a).label_head;
                while l.is_some() {
                    let l_next = self.label(l).h.next;
                    if self.label(l).v.next.is_none()
                        && only.is_none_or(|tag| tag == self.label(l).tag)
                    {
                        let mut cur = l;
                        while cur.is_some() {
                            let prev = self.label(cur).v.prev;
                            self.unlink_label_h(cur);
                            self.labels.release(cur.get());
                            cur = prev;
                        }
                    }
                    l = l_next;
                }
                a = a_next;
            }
        }

        // Chains starting here leave along an up-arc.
        if go_up && self.node_live(n) {
            let mut a = self.node(n).up_arcs;
            while a.is_some() {
                let a_next = self.arc(a).low_links.next;
                let mut l = self.arc(a).label_head;
                while l.is_some() {
                    let l_next = self.label(l).h.next;
                    if self.label(l).v.prev.is_none()
                        && only.is_none_or(|tag| tag == self.label(l).tag)
                    {
                        let mut cur = l;
                        while cur.is_some() {
                            let next = self.label(cur).v.next;
                            self.unlink_label_h(cur);
                            self.labels.release(cur.get());
                            cur = next;
                        }
                    }
                    l = l_next;
                }
                a = a_next;
            }
        }
    }

    /// Drops every label and resets the label pool; arcs keep no stale
    /// references. Run when the stream closes and labels lose their purpose.
    pub(crate) fn flush_labels(&mut self) {
        for a in self.arcs.iter_handles().collect::<Vec<_>>() {
            let arc = &mut self.arcs[a];
            arc.label_head = LabelId::NONE;
            arc.label_tail = LabelId::NONE;
        }
        self.labels = crate::arena::Pool::new();
    }
}
