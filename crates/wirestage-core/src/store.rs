//! The stage store: canonical, observable state shared by every stage.
//!
//! One store can back any number of [`crate::stage::Stage`] instances; all
//! client-scoped state (cursors, selections, marquee boxes) is keyed by an
//! opaque client id. Mutations are path-addressed: every entry point records
//! a [`Change`] naming what moved, and subscribers receive the changes of one
//! logical event as a single atomic batch, never a half-applied frame.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use uuid::Uuid;

use crate::element::{Element, ElementId, ElementRect, NewElement};

/// Opaque per-stage client identifier.
pub type ClientId = Uuid;

/// Marquee rectangle for one client, in world coordinates.
///
/// `hidden` means the box still exists but is not actively shown; it
/// suppresses a stale box between pointer-up and the next marquee drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub hidden: bool,
}

/// Path-addressed description of one mutation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Change {
    ElementCreated(ElementId),
    ElementRect(ElementId),
    ElementProps(ElementId),
    ElementRemoved(ElementId),
    Cursor(ClientId),
    Selection(ClientId),
    SelectionBox(ClientId),
    /// A plugin touched its slot in the extension namespace.
    Extension(String),
}

/// Handle returned by [`StageStore::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Rc<dyn Fn(&[Change])>;

struct StoreState {
    elements: HashMap<ElementId, Element>,
    cursors: HashMap<ClientId, Point>,
    selections: HashMap<ClientId, Vec<ElementId>>,
    selection_boxes: HashMap<ClientId, SelectionBox>,
    /// Free-form plugin namespace. The core never reads or validates it.
    extensions: HashMap<String, Box<dyn Any>>,
    pending: Vec<Change>,
    batch_depth: u32,
    subscribers: HashMap<u64, Subscriber>,
    next_subscription: u64,
}

impl StoreState {
    fn new() -> Self {
        Self {
            elements: HashMap::new(),
            cursors: HashMap::new(),
            selections: HashMap::new(),
            selection_boxes: HashMap::new(),
            extensions: HashMap::new(),
            pending: Vec::new(),
            batch_depth: 0,
            subscribers: HashMap::new(),
            next_subscription: 0,
        }
    }
}

/// Cheaply-cloneable shared handle to the stage state.
///
/// Single-threaded by design: all mutation happens synchronously inside
/// event handlers, so interior mutability via `RefCell` is sufficient. The
/// borrow rules enforce the run-to-completion policy of the event model.
#[derive(Clone)]
pub struct StageStore {
    inner: Rc<RefCell<StoreState>>,
}

impl Default for StageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("StageStore")
            .field("elements", &state.elements.len())
            .field("clients", &state.selections.len())
            .field("extensions", &state.extensions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreState::new())),
        }
    }

    /// Downgrade to a weak handle that outlives no stage.
    pub fn downgrade(&self) -> WeakStageStore {
        WeakStageStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    // --- observation ---

    /// Register an observer invoked with each committed change batch.
    pub fn subscribe(&self, f: impl Fn(&[Change]) + 'static) -> SubscriptionId {
        let mut state = self.inner.borrow_mut();
        let id = state.next_subscription;
        state.next_subscription += 1;
        state.subscribers.insert(id, Rc::new(f));
        SubscriptionId(id)
    }

    /// Remove an observer. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.borrow_mut().subscribers.remove(&id.0);
    }

    /// Group several mutations into one atomic batch.
    ///
    /// Observers see all changes made inside `f` as a single notification.
    /// Batches nest; only the outermost one flushes.
    pub fn batch<R>(&self, f: impl FnOnce(&StageStore) -> R) -> R {
        self.inner.borrow_mut().batch_depth += 1;
        let result = f(self);
        self.inner.borrow_mut().batch_depth -= 1;
        self.flush();
        result
    }

    fn record(&self, change: Change) {
        self.inner.borrow_mut().pending.push(change);
        self.flush();
    }

    fn flush(&self) {
        let (changes, subscribers) = {
            let mut state = self.inner.borrow_mut();
            if state.batch_depth > 0 || state.pending.is_empty() {
                return;
            }
            let changes = std::mem::take(&mut state.pending);
            let subscribers: Vec<Subscriber> = state.subscribers.values().cloned().collect();
            (changes, subscribers)
        };
        // Borrow released: observers are free to read the store.
        for subscriber in subscribers {
            subscriber(&changes);
        }
    }

    // --- elements ---

    /// Insert a new element with a fresh id and z-index 1. Returns the id.
    pub fn create_element(&self, spec: NewElement) -> ElementId {
        let id = Uuid::new_v4();
        self.inner
            .borrow_mut()
            .elements
            .insert(id, spec.into_element());
        log::debug!("created element {id}");
        self.record(Change::ElementCreated(id));
        id
    }

    /// Seed the store with several elements at once, as one batch.
    pub fn create_initial_elements(&self, specs: Vec<NewElement>) -> Vec<ElementId> {
        self.batch(|store| specs.into_iter().map(|s| store.create_element(s)).collect())
    }

    /// Snapshot of one element.
    pub fn element(&self, id: ElementId) -> Option<Element> {
        self.inner.borrow().elements.get(&id).cloned()
    }

    /// Placement of one element.
    pub fn element_rect(&self, id: ElementId) -> Option<ElementRect> {
        self.inner.borrow().elements.get(&id).map(|e| e.rect)
    }

    pub fn element_count(&self) -> usize {
        self.inner.borrow().elements.len()
    }

    /// All elements, back to front.
    pub fn elements_by_z(&self) -> Vec<(ElementId, Element)> {
        let mut elements: Vec<(ElementId, Element)> = self
            .inner
            .borrow()
            .elements
            .iter()
            .map(|(id, e)| (*id, e.clone()))
            .collect();
        elements.sort_by_key(|(_, e)| e.rect.z_index);
        elements
    }

    /// Ids of elements whose rect overlaps the given world-space box,
    /// back to front.
    pub fn elements_overlapping(&self, x: f64, y: f64, width: f64, height: f64) -> Vec<ElementId> {
        self.elements_by_z()
            .into_iter()
            .filter(|(_, e)| e.rect.overlaps(x, y, width, height))
            .map(|(id, _)| id)
            .collect()
    }

    /// World bounding box over all elements. `None` when the store is empty.
    pub fn content_bounds(&self) -> Option<Rect> {
        let state = self.inner.borrow();
        let mut bounds: Option<Rect> = None;
        for element in state.elements.values() {
            let b = element.rect.bounds();
            bounds = Some(match bounds {
                Some(acc) => acc.union(b),
                None => b,
            });
        }
        bounds
    }

    /// Mutate an element's placement. Missing ids degrade to a no-op.
    /// Returns whether the element existed.
    pub fn update_element_rect(&self, id: ElementId, f: impl FnOnce(&mut ElementRect)) -> bool {
        let updated = {
            let mut state = self.inner.borrow_mut();
            match state.elements.get_mut(&id) {
                Some(element) => {
                    f(&mut element.rect);
                    true
                }
                None => false,
            }
        };
        if updated {
            self.record(Change::ElementRect(id));
        }
        updated
    }

    /// Mutate an element's props. Missing ids degrade to a no-op.
    pub fn update_element_props(
        &self,
        id: ElementId,
        f: impl FnOnce(&mut crate::element::ElementProps),
    ) -> bool {
        let updated = {
            let mut state = self.inner.borrow_mut();
            match state.elements.get_mut(&id) {
                Some(element) => {
                    f(&mut element.props);
                    true
                }
                None => false,
            }
        };
        if updated {
            self.record(Change::ElementProps(id));
        }
        updated
    }

    /// Remove an element. The host owns deletion policy; client-scoped
    /// references to the removed id degrade to no-ops elsewhere.
    pub fn remove_element(&self, id: ElementId) -> Option<Element> {
        let removed = self.inner.borrow_mut().elements.remove(&id);
        if removed.is_some() {
            self.record(Change::ElementRemoved(id));
        }
        removed
    }

    /// Highest z-index currently in use (0 when empty).
    pub fn max_z_index(&self) -> u32 {
        self.inner
            .borrow()
            .elements
            .values()
            .map(|e| e.rect.z_index)
            .max()
            .unwrap_or(0)
    }

    /// Promote an element above everything else: new z = current max + 1.
    pub fn bring_to_front(&self, id: ElementId) -> bool {
        let top = self.max_z_index() + 1;
        self.update_element_rect(id, |rect| rect.z_index = top)
    }

    // --- client-scoped state ---

    /// Last known world-space pointer position for a client.
    pub fn cursor(&self, client: ClientId) -> Option<Point> {
        self.inner.borrow().cursors.get(&client).copied()
    }

    pub fn set_cursor(&self, client: ClientId, position: Point) {
        self.inner.borrow_mut().cursors.insert(client, position);
        self.record(Change::Cursor(client));
    }

    /// Ordered selection for a client (empty when the client never selected).
    pub fn selected_elements(&self, client: ClientId) -> Vec<ElementId> {
        self.inner
            .borrow()
            .selections
            .get(&client)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_selected(&self, client: ClientId, id: ElementId) -> bool {
        self.inner
            .borrow()
            .selections
            .get(&client)
            .is_some_and(|s| s.contains(&id))
    }

    /// Replace a client's selection.
    pub fn set_selection(&self, client: ClientId, selection: Vec<ElementId>) {
        self.inner.borrow_mut().selections.insert(client, selection);
        self.record(Change::Selection(client));
    }

    /// The client's marquee box, shown or hidden.
    pub fn selection_box(&self, client: ClientId) -> Option<SelectionBox> {
        self.inner.borrow().selection_boxes.get(&client).copied()
    }

    pub fn set_selection_box(&self, client: ClientId, selection_box: SelectionBox) {
        self.inner
            .borrow_mut()
            .selection_boxes
            .insert(client, selection_box);
        self.record(Change::SelectionBox(client));
    }

    /// Flag the client's marquee box hidden, keeping its geometry.
    pub fn hide_selection_box(&self, client: ClientId) {
        let updated = {
            let mut state = self.inner.borrow_mut();
            match state.selection_boxes.get_mut(&client) {
                Some(b) => {
                    b.hidden = true;
                    true
                }
                None => false,
            }
        };
        if updated {
            self.record(Change::SelectionBox(client));
        }
    }

    // --- extension namespace ---

    /// Read a plugin's extension slot. Returns `None` when the slot is
    /// absent or holds a different type. The closure must not mutate the
    /// store.
    pub fn extension<T: Any, R>(&self, key: &str, f: impl FnOnce(&T) -> R) -> Option<R> {
        let state = self.inner.borrow();
        state
            .extensions
            .get(key)
            .and_then(|boxed| boxed.downcast_ref::<T>())
            .map(f)
    }

    /// Mutate a plugin's extension slot, inserting `T::default()` when the
    /// slot is absent. The slot is taken out of the store while the closure
    /// runs, so the closure may freely call back into the store.
    pub fn extension_mut<T: Any + Default, R>(&self, key: &str, f: impl FnOnce(&mut T) -> R) -> R {
        let mut value: Box<T> = {
            let mut state = self.inner.borrow_mut();
            match state.extensions.remove(key) {
                Some(boxed) => boxed
                    .downcast::<T>()
                    .unwrap_or_else(|_| Box::new(T::default())),
                None => Box::new(T::default()),
            }
        };
        let result = f(&mut value);
        self.inner
            .borrow_mut()
            .extensions
            .insert(key.to_string(), value);
        self.record(Change::Extension(key.to_string()));
        result
    }
}

/// Weak store handle for observers that must not keep the stage alive.
#[derive(Clone)]
pub struct WeakStageStore {
    inner: Weak<RefCell<StoreState>>,
}

impl WeakStageStore {
    /// Upgrade back to a usable store handle.
    ///
    /// Panics if every strong handle is gone: using store accessors outside
    /// an active stage is a host integration bug, not a data condition, and
    /// must fail loudly.
    pub fn upgrade(&self) -> StageStore {
        match self.inner.upgrade() {
            Some(inner) => StageStore { inner },
            None => panic!("stage store accessed after its stage was dropped"),
        }
    }
}
